//! Frame aggregator.

use serde::Serialize;
use std::fmt;

use crate::occupancy::SlotState;

/// Per-frame roll-up of slot states.
///
/// `empty_slots` lists every slot that is empty in this frame. It is not a
/// transition list; see [`FrameSummary::vacated_since`] for that.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FrameSummary {
    pub total: usize,
    pub occupied: usize,
    pub empty: usize,
    /// Ascending 1-based indices.
    pub empty_slots: Vec<usize>,
}

impl FrameSummary {
    pub fn from_states(states: &[SlotState]) -> Self {
        let mut empty_slots: Vec<usize> = states
            .iter()
            .filter(|s| !s.occupied)
            .map(|s| s.index)
            .collect();
        empty_slots.sort_unstable();
        let total = states.len();
        let empty = empty_slots.len();
        Self {
            total,
            occupied: total - empty,
            empty,
            empty_slots,
        }
    }

    /// One notice per empty slot, in index order.
    pub fn messages(&self) -> Vec<String> {
        self.empty_slots.iter().map(|&i| empty_notice(i)).collect()
    }

    /// Slots empty in this frame that were occupied in `previous`.
    ///
    /// Slots that did not exist in `previous` are never reported.
    pub fn vacated_since(&self, previous: &FrameSummary) -> Vec<usize> {
        self.empty_slots
            .iter()
            .copied()
            .filter(|&i| i <= previous.total && previous.empty_slots.binary_search(&i).is_err())
            .collect()
    }
}

pub fn empty_notice(index: usize) -> String {
    format!("Slot {} is now empty", index)
}

impl fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Parking: {}", self.total)?;
        writeln!(f, "Occupied: {}", self.occupied)?;
        write!(f, "Empty: {}", self.empty)
    }
}
