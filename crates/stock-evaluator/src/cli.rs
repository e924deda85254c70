use anyhow::{anyhow, bail, Context, Result};
use index_screener::{SortDirection, SortKey};

pub const USAGE: &str = "\
Usage:
  stock-evaluator score <SYMBOL>...
  stock-evaluator index <dax|sp500|nasdaq> [--sort <key>] [--asc] [--limit N]
  stock-evaluator search <QUERY>
  stock-evaluator watchlist [list|add <SYMBOL>|remove <SYMBOL>|toggle <SYMBOL>|clear]

Sort keys: symbol, name, price, pe, pb, roe, score (default: rank order)";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Score(Vec<String>),
    Index {
        key: String,
        sort: Option<SortKey>,
        direction: SortDirection,
        limit: Option<usize>,
    },
    Search(String),
    Watchlist(WatchlistAction),
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WatchlistAction {
    List,
    Add(String),
    Remove(String),
    Toggle(String),
    Clear,
}

/// Parse the arguments after the program name.
pub fn parse_args(args: &[String]) -> Result<Command> {
    let Some(command) = args.first() else {
        return Ok(Command::Help);
    };
    let rest = &args[1..];

    match command.as_str() {
        "score" => {
            let symbols: Vec<String> = rest.iter().filter(|a| !a.starts_with("--")).cloned().collect();
            if symbols.is_empty() {
                bail!("score needs at least one symbol");
            }
            Ok(Command::Score(symbols))
        }
        "index" => {
            let key = rest
                .first()
                .filter(|a| !a.starts_with("--"))
                .ok_or_else(|| anyhow!("index needs an index name"))?
                .clone();

            let sort = rest
                .iter()
                .position(|a| a == "--sort")
                .map(|i| rest.get(i + 1).ok_or_else(|| anyhow!("--sort needs a key")))
                .transpose()?
                .map(|s| s.parse::<SortKey>())
                .transpose()?;

            let direction = if rest.iter().any(|a| a == "--asc") {
                SortDirection::Asc
            } else {
                SortDirection::Desc
            };

            let limit = rest
                .iter()
                .position(|a| a == "--limit")
                .map(|i| rest.get(i + 1).ok_or_else(|| anyhow!("--limit needs a number")))
                .transpose()?
                .map(|s| s.parse::<usize>().context("--limit must be a number"))
                .transpose()?;

            Ok(Command::Index {
                key,
                sort,
                direction,
                limit,
            })
        }
        "search" => {
            let query = rest.join(" ");
            if query.trim().is_empty() {
                bail!("search needs a query");
            }
            Ok(Command::Search(query))
        }
        "watchlist" => {
            let symbol = || {
                rest.get(1)
                    .cloned()
                    .ok_or_else(|| anyhow!("watchlist {} needs a symbol", rest[0]))
            };
            let action = match rest.first().map(String::as_str) {
                None | Some("list") => WatchlistAction::List,
                Some("add") => WatchlistAction::Add(symbol()?),
                Some("remove") => WatchlistAction::Remove(symbol()?),
                Some("toggle") => WatchlistAction::Toggle(symbol()?),
                Some("clear") => WatchlistAction::Clear,
                Some(other) => bail!("Unknown watchlist action: {}", other),
            };
            Ok(Command::Watchlist(action))
        }
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => bail!("Unknown command: {}", other),
    }
}
