use crate::ScoredCompany;

fn relevance(company: &ScoredCompany, needle: &str) -> u8 {
    let name = company.name.to_lowercase();
    let symbol = company.symbol.to_lowercase();

    if name == needle || symbol == needle {
        3
    } else if name.starts_with(needle) || symbol.starts_with(needle) {
        2
    } else if name.contains(needle) || symbol.contains(needle) {
        1
    } else {
        0
    }
}

/// Find one company by symbol or name.
///
/// An exact symbol match wins outright. Otherwise the most relevant partial
/// match is returned (exact name 3, prefix 2, substring 1), the earliest one
/// on a tie.
pub fn search<'a>(query: &str, companies: &'a [ScoredCompany]) -> Option<&'a ScoredCompany> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    if let Some(exact) = companies.iter().find(|c| c.symbol.eq_ignore_ascii_case(query)) {
        return Some(exact);
    }

    let needle = query.to_lowercase();
    let mut best: Option<(&ScoredCompany, u8)> = None;
    for company in companies {
        let score = relevance(company, &needle);
        if score == 0 {
            continue;
        }
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((company, score));
        }
    }

    best.map(|(company, _)| company)
}
