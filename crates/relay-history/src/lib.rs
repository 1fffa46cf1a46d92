pub mod error;
pub mod store;

pub use error::HistoryError;
pub use store::{HistoryStore, LoadOutcome};
