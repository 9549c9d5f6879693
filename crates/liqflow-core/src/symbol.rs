//! Symbol normalization and the tracked-symbol registry.
//!
//! Configuration names instruments in pair form ("BTC/USDT") while both
//! exchange feeds use the native form without a separator ("BTCUSDT",
//! lowercased in per-symbol stream paths). `Symbol` is the canonical
//! native form; the registry maps between the two.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Normalized instrument identifier in exchange-native form (e.g., "BTCUSDT").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create from a pair with separator, e.g. "BTC/USDT" -> "BTCUSDT".
    pub fn from_pair(pair: &str) -> CoreResult<Self> {
        let (base, quote) = pair
            .split_once('/')
            .ok_or_else(|| CoreError::InvalidPair(pair.to_string()))?;

        let base = base.trim();
        let quote = quote.trim();
        if base.is_empty() || quote.is_empty() {
            return Err(CoreError::InvalidPair(pair.to_string()));
        }

        Ok(Self(format!("{base}{quote}").to_uppercase()))
    }

    /// Create from an already-native name, e.g. "BTCUSDT".
    pub fn from_native(name: &str) -> CoreResult<Self> {
        let name = name.trim();
        if name.is_empty() || name.contains('/') {
            return Err(CoreError::InvalidSymbol(name.to_string()));
        }
        Ok(Self(name.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase form used in per-symbol stream URLs ("btcusdt").
    pub fn stream_name(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed set of tracked symbols, built once from configuration.
///
/// The working set is immutable for the process lifetime. Insertion order
/// of the configured pairs is preserved; duplicates collapse.
#[derive(Debug, Clone)]
pub struct SymbolRegistry {
    symbols: Vec<Symbol>,
    index: HashSet<String>,
}

impl SymbolRegistry {
    /// Build the registry from configured pairs ("BTC/USDT", ...).
    pub fn from_pairs<I, S>(pairs: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut symbols = Vec::new();
        let mut index = HashSet::new();

        for pair in pairs {
            let symbol = Symbol::from_pair(pair.as_ref())?;
            if index.insert(symbol.as_str().to_string()) {
                symbols.push(symbol);
            }
        }

        Ok(Self { symbols, index })
    }

    /// Check whether a native symbol name is tracked.
    pub fn contains(&self, native: &str) -> bool {
        self.index.contains(&native.to_uppercase())
    }

    /// Resolve a native symbol name to its canonical `Symbol`, if tracked.
    pub fn resolve(&self, native: &str) -> Option<Symbol> {
        let name = native.to_uppercase();
        self.index.contains(&name).then_some(Symbol(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_from_pair() {
        let symbol = Symbol::from_pair("BTC/USDT").unwrap();
        assert_eq!(symbol.as_str(), "BTCUSDT");
        assert_eq!(symbol.stream_name(), "btcusdt");
    }

    #[test]
    fn test_symbol_from_pair_rejects_malformed() {
        assert!(Symbol::from_pair("BTCUSDT").is_err());
        assert!(Symbol::from_pair("/USDT").is_err());
        assert!(Symbol::from_pair("BTC/").is_err());
        assert!(Symbol::from_pair("").is_err());
    }

    #[test]
    fn test_symbol_from_native() {
        let symbol = Symbol::from_native("ethusdt").unwrap();
        assert_eq!(symbol.as_str(), "ETHUSDT");
        assert!(Symbol::from_native("ETH/USDT").is_err());
        assert!(Symbol::from_native("  ").is_err());
    }

    #[test]
    fn test_registry_contains_and_resolve() {
        let registry = SymbolRegistry::from_pairs(["BTC/USDT", "ETH/USDT"]).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("BTCUSDT"));
        assert!(!registry.contains("DOGEUSDT"));

        let resolved = registry.resolve("ETHUSDT").unwrap();
        assert_eq!(resolved.as_str(), "ETHUSDT");
        assert!(registry.resolve("DOGEUSDT").is_none());
    }

    #[test]
    fn test_registry_collapses_duplicates() {
        let registry = SymbolRegistry::from_pairs(["BTC/USDT", "BTC/USDT"]).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_preserves_order() {
        let registry = SymbolRegistry::from_pairs(["ETH/USDT", "BTC/USDT"]).unwrap();
        let names: Vec<&str> = registry.iter().map(Symbol::as_str).collect();
        assert_eq!(names, vec!["ETHUSDT", "BTCUSDT"]);
    }
}
