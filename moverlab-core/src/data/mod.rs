//! Market data acquisition: providers, alignment, universe.

pub mod align;
pub mod circuit_breaker;
pub mod csv_import;
pub mod provider;
pub mod synthetic;
pub mod universe;
pub mod yahoo;

pub use align::{align_closes, CloseFrame};
pub use circuit_breaker::CircuitBreaker;
pub use csv_import::CsvProvider;
pub use provider::{BatchFetch, DailyBar, DataError, DataProvider, DataSource, FetchResult};
pub use synthetic::SyntheticProvider;
pub use universe::{Universe, UniverseError, MAX_UNIVERSE_SIZE};
pub use yahoo::YahooProvider;
