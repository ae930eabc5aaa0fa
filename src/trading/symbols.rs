//! Mapping from signal-bot pair names to Kraken Futures symbols.

use std::collections::HashMap;

use anyhow::{anyhow, Result};

/// Pairs the signal bot is known to emit.
const BUILTIN_PAIRS: &[(&str, &str)] = &[
    ("XXBTZUSD", "PF_XBTUSD"),
    ("XBTUSD", "PF_XBTUSD"),
    ("BTCUSD", "PF_XBTUSD"),
    ("XETHZUSD", "PF_ETHUSD"),
    ("ETHUSD", "PF_ETHUSD"),
];

/// Immutable pair → symbol lookup with a fallback symbol.
///
/// Built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct SymbolMap {
    entries: HashMap<String, String>,
    default_symbol: String,
}

impl SymbolMap {
    /// Built-in Kraken mappings plus `overrides`, which win on conflict.
    pub fn new(default_symbol: &str, overrides: &[(String, String)]) -> Self {
        let mut entries: HashMap<String, String> = BUILTIN_PAIRS
            .iter()
            .map(|(pair, symbol)| (pair.to_string(), symbol.to_string()))
            .collect();

        for (pair, symbol) in overrides {
            entries.insert(pair.trim().to_uppercase(), symbol.trim().to_string());
        }

        Self {
            entries,
            default_symbol: default_symbol.to_string(),
        }
    }

    /// Exchange symbol for a source pair, or the default symbol.
    pub fn resolve(&self, pair: &str) -> &str {
        self.entries
            .get(&pair.trim().to_uppercase())
            .map(String::as_str)
            .unwrap_or(&self.default_symbol)
    }

    pub fn default_symbol(&self) -> &str {
        &self.default_symbol
    }

    /// Mappings sorted by pair, for display.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(pair, symbol)| (pair.as_str(), symbol.as_str()))
            .collect();
        entries.sort();
        entries
    }
}

/// Parse `PAIR=SYMBOL,PAIR=SYMBOL` into override entries.
pub fn parse_symbol_overrides(list: &str) -> Result<Vec<(String, String)>> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (pair, symbol) = item
                .split_once('=')
                .ok_or_else(|| anyhow!("symbol mapping '{}' is not PAIR=SYMBOL", item))?;
            let (pair, symbol) = (pair.trim(), symbol.trim());
            if pair.is_empty() || symbol.is_empty() {
                return Err(anyhow!("symbol mapping '{}' has an empty side", item));
            }
            Ok((pair.to_string(), symbol.to_string()))
        })
        .collect()
}
