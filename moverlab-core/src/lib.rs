//! MoverLab Core: domain types, market data, mover selection, chart rendering.
//!
//! This crate contains everything up to the chart files:
//! - Domain types (instruments, price series, mover records)
//! - Data providers (Yahoo Finance, CSV directory, synthetic) and alignment
//! - Universe definition with its symbol → name table
//! - Mover selection over the last two aligned trading days
//! - Portrait line charts, one file per mover

pub mod chart;
pub mod data;
pub mod domain;
pub mod selector;

pub use selector::{
    rank_movers, InstrumentDataMissing, MoverSelection, MoverSelector, SelectError,
    SelectorConfig,
};
