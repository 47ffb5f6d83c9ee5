//! Universe configuration: the ordered instrument list for a run.
//!
//! Order matters: ties in the ranking are broken by position in this list.
//! The universe also carries the symbol → display name table.

use crate::domain::{Instrument, NameTable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Universes above this size still work but are outside the intended scale.
pub const MAX_UNIVERSE_SIZE: usize = 40;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("read universe file: {0}")]
    Read(#[from] std::io::Error),

    #[error("parse universe TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize universe: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("universe '{0}' has no symbols")]
    Empty(String),

    #[error("symbol '{0}' listed more than once")]
    Duplicate(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub name: String,
    pub symbols: Vec<String>,
    #[serde(default)]
    pub names: NameTable,
}

impl Universe {
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, UniverseError> {
        let universe: Self = toml::from_str(content)?;
        universe.validate()?;
        Ok(universe)
    }

    pub fn to_toml(&self) -> Result<String, UniverseError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject empty lists and duplicates; warn when larger than the intended scale.
    pub fn validate(&self) -> Result<(), UniverseError> {
        if self.symbols.is_empty() {
            return Err(UniverseError::Empty(self.name.clone()));
        }
        let mut seen = HashSet::new();
        for symbol in &self.symbols {
            if !seen.insert(symbol.as_str()) {
                return Err(UniverseError::Duplicate(symbol.clone()));
            }
        }
        if self.symbols.len() > MAX_UNIVERSE_SIZE {
            warn!(
                universe = %self.name,
                count = self.symbols.len(),
                "universe has more than {MAX_UNIVERSE_SIZE} symbols"
            );
        }
        Ok(())
    }

    pub fn symbol_refs(&self) -> Vec<&str> {
        self.symbols.iter().map(String::as_str).collect()
    }

    /// Position of a symbol in the universe; used as the ranking tie-breaker.
    pub fn position(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    pub fn instrument(&self, symbol: &str) -> Instrument {
        self.names.resolve(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The DAX 40 on XETRA, as Yahoo Finance symbols.
    pub fn dax40() -> Self {
        const MEMBERS: [(&str, &str); 40] = [
            ("ADS.DE", "Adidas"),
            ("AIR.DE", "Airbus"),
            ("ALV.DE", "Allianz"),
            ("BAS.DE", "BASF"),
            ("BAYN.DE", "Bayer"),
            ("BEI.DE", "Beiersdorf"),
            ("BMW.DE", "BMW"),
            ("BNR.DE", "Brenntag"),
            ("CBK.DE", "Commerzbank"),
            ("CON.DE", "Continental"),
            ("1COV.DE", "Covestro"),
            ("DB1.DE", "Deutsche Börse"),
            ("DBK.DE", "Deutsche Bank"),
            ("DHL.DE", "DHL Group"),
            ("DTE.DE", "Deutsche Telekom"),
            ("DTG.DE", "Daimler Truck"),
            ("EOAN.DE", "E.ON"),
            ("ENR.DE", "Siemens Energy"),
            ("FRE.DE", "Fresenius"),
            ("FME.DE", "Fresenius Medical Care"),
            ("HEI.DE", "Heidelberg Materials"),
            ("HEN3.DE", "Henkel"),
            ("HNR1.DE", "Hannover Rück"),
            ("IFX.DE", "Infineon"),
            ("MBG.DE", "Mercedes-Benz"),
            ("MRK.DE", "Merck"),
            ("MTX.DE", "MTU Aero Engines"),
            ("MUV2.DE", "Munich Re"),
            ("P911.DE", "Porsche AG"),
            ("PAH3.DE", "Porsche SE"),
            ("QIA.DE", "Qiagen"),
            ("RHM.DE", "Rheinmetall"),
            ("RWE.DE", "RWE"),
            ("SAP.DE", "SAP"),
            ("SHL.DE", "Siemens Healthineers"),
            ("SIE.DE", "Siemens"),
            ("SRT3.DE", "Sartorius"),
            ("SY1.DE", "Symrise"),
            ("VNA.DE", "Vonovia"),
            ("VOW3.DE", "Volkswagen"),
        ];

        Self {
            name: "DAX 40".into(),
            symbols: MEMBERS.iter().map(|(s, _)| s.to_string()).collect(),
            names: MEMBERS
                .iter()
                .map(|(s, n)| (s.to_string(), n.to_string()))
                .collect(),
        }
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::dax40()
    }
}
