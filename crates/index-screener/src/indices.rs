use serde::Serialize;

/// A named list of index constituents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarketIndex {
    pub key: &'static str,
    pub name: &'static str,
    pub symbols: &'static [&'static str],
}

pub const DAX: MarketIndex = MarketIndex {
    key: "dax",
    name: "DAX 40",
    symbols: &[
        "SAP.DE", "SIE.DE", "ALV.DE", "DTE.DE", "VOW3.DE", "MBG.DE", "ADS.DE", "BAS.DE", "BMW.DE",
        "DAI.DE", "DB1.DE", "DBK.DE", "EOAN.DE", "FRE.DE", "HEI.DE", "HEN3.DE", "IFX.DE", "LIN.DE",
        "MRK.DE", "MUV2.DE", "RWE.DE", "VOW.DE", "BEI.DE", "CON.DE", "DPW.DE", "HNR1.DE", "PUM.DE",
        "QIA.DE", "SHL.DE", "ZAL.DE", "1COV.DE", "AIR.DE", "BNR.DE", "ENR.DE", "FME.DE", "HFG.DE",
        "PAH3.DE", "P911.DE", "SRT3.DE", "WCH.DE",
    ],
};

pub const SP500: MarketIndex = MarketIndex {
    key: "sp500",
    name: "S&P 500 (Top 50)",
    symbols: &[
        "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA", "BRK.B", "UNH", "XOM", "JNJ",
        "JPM", "V", "PG", "MA", "HD", "CVX", "MRK", "ABBV", "PEP", "KO", "AVGO", "COST", "LLY",
        "TMO", "WMT", "MCD", "CSCO", "ACN", "ABT", "DHR", "ADBE", "VZ", "NKE", "NFLX", "CRM", "TXN",
        "PM", "NEE", "CMCSA", "DIS", "UPS", "HON", "INTC", "QCOM", "T", "AMGN", "BA", "IBM", "GE",
    ],
};

pub const NASDAQ: MarketIndex = MarketIndex {
    key: "nasdaq",
    name: "NASDAQ 100 (Top 50)",
    symbols: &[
        "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA", "AVGO", "COST", "ASML", "NFLX",
        "ADBE", "PEP", "CSCO", "TMUS", "AMD", "CMCSA", "INTC", "QCOM", "INTU", "TXN", "HON", "AMGN",
        "AMAT", "SBUX", "BKNG", "ISRG", "ADI", "GILD", "MDLZ", "VRTX", "REGN", "ADP", "LRCX", "PANW",
        "MU", "CSX", "KLAC", "SNPS", "CDNS", "MELI", "PYPL", "NXPI", "MAR", "ABNB", "MRNA", "ORLY",
        "FTNT", "CHTR", "CRWD",
    ],
};

impl MarketIndex {
    pub fn all() -> &'static [MarketIndex] {
        &[DAX, SP500, NASDAQ]
    }

    /// Case-insensitive lookup by key
    pub fn by_key(key: &str) -> Option<&'static MarketIndex> {
        let key = key.trim();
        Self::all().iter().find(|i| i.key.eq_ignore_ascii_case(key))
    }

    pub fn keys() -> Vec<&'static str> {
        Self::all().iter().map(|i| i.key).collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
