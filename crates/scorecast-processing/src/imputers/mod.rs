//! Fitted imputers for missing values.
//!
//! Each imputer learns its fill value once from the training split and
//! replays it on every later call.

mod statistical;

pub use statistical::{MedianImputer, MostFrequentImputer};
