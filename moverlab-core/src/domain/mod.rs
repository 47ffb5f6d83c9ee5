//! Domain types: instruments, price series, ranked movers.

pub mod instrument;
pub mod mover;
pub mod series;

pub use instrument::{Instrument, NameTable};
pub use mover::{format_change, pct_change, MoverRecord, RankClass};
pub use series::{PricePoint, PriceSeries, SeriesError};
