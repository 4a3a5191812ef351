use serde::{Deserialize, Serialize};

/// A candidate start time on a given day. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// `HH:MM`
    pub time: String,
    pub available: bool,
}
