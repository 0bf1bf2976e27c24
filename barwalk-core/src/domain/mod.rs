//! Domain types: bars, positions, trades.

pub mod bar;
pub mod position;
pub mod trade;

pub use bar::{Bar, PriceBar};
pub use position::{Position, TimestampedValue, TradeDirection};
pub use trade::{ExitReason, Trade};
