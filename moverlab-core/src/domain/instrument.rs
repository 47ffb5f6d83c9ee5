use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A tradable symbol together with its resolved display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub display_name: String,
}

impl Instrument {
    /// Instrument whose display name is the symbol itself.
    pub fn new(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self {
            display_name: symbol.clone(),
            symbol,
        }
    }

    pub fn with_name(symbol: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            display_name: display_name.into(),
        }
    }
}

/// Immutable symbol → display name table.
///
/// A missing entry is not an error: the symbol is used as its own name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameTable {
    names: BTreeMap<String, String>,
}

impl NameTable {
    pub fn new(names: BTreeMap<String, String>) -> Self {
        Self { names }
    }

    pub fn display_name<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.names.get(symbol).map(String::as_str).unwrap_or(symbol)
    }

    pub fn resolve(&self, symbol: &str) -> Instrument {
        Instrument::with_name(symbol, self.display_name(symbol))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for NameTable {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}
