//! Instrument universe: market symbols, tradable assets and the benchmark.
//!
//! Parsed from configuration lists of the form `SYMBOL:Label, SYMBOL:Label`.
//! Market labels are display names; asset labels are asset types.

use std::collections::{BTreeSet, HashSet};

pub const DEFAULT_BENCHMARK: &str = "SPY";
pub const UNKNOWN_ASSET_TYPE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketSymbol {
    pub symbol: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSymbol {
    pub symbol: String,
    pub asset_type: String,
}

/// Who a symbol is, as shown on every record including error records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolIdentity {
    pub symbol: String,
    pub display_name: String,
    pub asset_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    pub market: Vec<MarketSymbol>,
    pub assets: Vec<AssetSymbol>,
    pub benchmark: String,
}

impl Universe {
    pub fn new(market: Vec<MarketSymbol>, assets: Vec<AssetSymbol>, benchmark: &str) -> Self {
        Self {
            market,
            assets,
            benchmark: benchmark.to_uppercase(),
        }
    }

    /// Market and asset symbols together, deduplicated and sorted.
    pub fn all_symbols(&self) -> Vec<String> {
        let unique: BTreeSet<&str> = self
            .market
            .iter()
            .map(|m| m.symbol.as_str())
            .chain(self.assets.iter().map(|a| a.symbol.as_str()))
            .collect();
        unique.into_iter().map(str::to_string).collect()
    }

    pub fn count(&self) -> usize {
        self.all_symbols().len()
    }

    pub fn is_market(&self, symbol: &str) -> bool {
        self.market.iter().any(|m| m.symbol == symbol)
    }

    pub fn is_asset(&self, symbol: &str) -> bool {
        self.assets.iter().any(|a| a.symbol == symbol)
    }

    pub fn is_benchmark(&self, symbol: &str) -> bool {
        self.benchmark == symbol
    }

    fn market_name(&self, symbol: &str) -> Option<&str> {
        self.market
            .iter()
            .find(|m| m.symbol == symbol)
            .map(|m| m.display_name.as_str())
    }

    /// Market display name, else the symbol itself.
    pub fn display_name(&self, symbol: &str) -> String {
        self.market_name(symbol).unwrap_or(symbol).to_string()
    }

    /// Market display name, else the configured asset type, else "Unknown".
    pub fn asset_type(&self, symbol: &str) -> String {
        self.market_name(symbol)
            .or_else(|| {
                self.assets
                    .iter()
                    .find(|a| a.symbol == symbol)
                    .map(|a| a.asset_type.as_str())
            })
            .unwrap_or(UNKNOWN_ASSET_TYPE)
            .to_string()
    }

    pub fn identity(&self, symbol: &str) -> SymbolIdentity {
        SymbolIdentity {
            symbol: symbol.to_string(),
            display_name: self.display_name(symbol),
            asset_type: self.asset_type(symbol),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("empty label for symbol: {0}")]
    EmptyLabel(String),
}

/// Parses `SYMBOL[:Label]` entries. A missing label is `None`.
pub fn parse_entries(input: &str) -> Result<Vec<(String, Option<String>)>, UniverseError> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let (symbol, label) = match trimmed.split_once(':') {
            Some((s, l)) => (s.trim(), Some(l.trim())),
            None => (trimmed, None),
        };
        if symbol.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = symbol.to_uppercase();
        if label.is_some_and(str::is_empty) {
            return Err(UniverseError::EmptyLabel(symbol));
        }
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        entries.push((symbol, label.map(str::to_string)));
    }

    Ok(entries)
}

/// Market entries; an unlabelled symbol is its own display name.
pub fn parse_market(input: &str) -> Result<Vec<MarketSymbol>, UniverseError> {
    Ok(parse_entries(input)?
        .into_iter()
        .map(|(symbol, label)| MarketSymbol {
            display_name: label.unwrap_or_else(|| symbol.clone()),
            symbol,
        })
        .collect())
}

/// Asset entries; an unlabelled symbol has an unknown asset type.
pub fn parse_assets(input: &str) -> Result<Vec<AssetSymbol>, UniverseError> {
    Ok(parse_entries(input)?
        .into_iter()
        .map(|(symbol, label)| AssetSymbol {
            symbol,
            asset_type: label.unwrap_or_else(|| UNKNOWN_ASSET_TYPE.to_string()),
        })
        .collect())
}
