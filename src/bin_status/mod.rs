//! Derived bin status: fill colour, lid state and the mounted display.

mod component;
mod state;

pub use component::{BinStatusComponent, DeleteOutcome, DELETE_FAILURE, DELETE_SUCCESS};
pub use state::{derive, Anomaly, BinState, FillIndicator, LidState, DEFAULT_CAPACITY_CM};
