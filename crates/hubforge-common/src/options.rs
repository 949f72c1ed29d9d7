//! Build options for one layout run.

use crate::error::LayoutError;
use crate::limits::{MIN_SLOT_CAPACITY, SLOT_CAPACITY};
use serde::{Deserialize, Serialize};

/// Which dispatch table layout to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorldMode {
    /// Every type is known: compact vtables with slot reuse across unrelated
    /// subtrees, interface calls go through the vtable.
    #[default]
    Closed,
    /// Types may be added later: append-only class tables plus one itable
    /// segment per implemented interface.
    Open,
}

/// Policy knobs for a layout build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Dispatch table layout.
    pub world: WorldMode,
    /// Number of ids one type check slot may hold. Defaults to (and may not
    /// exceed) `SLOT_CAPACITY`; smaller values force overflow slots earlier.
    pub slot_capacity: u32,
    /// Re-check every pair of types against the naive closure after ids are
    /// assigned. Quadratic in the number of types.
    pub verify_type_checks: bool,
    /// Re-check every dispatch table entry against method resolution.
    pub verify_dispatch: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            world: WorldMode::Closed,
            slot_capacity: SLOT_CAPACITY,
            verify_type_checks: true,
            verify_dispatch: true,
        }
    }
}

impl LayoutOptions {
    pub fn with_world(mut self, world: WorldMode) -> Self {
        self.world = world;
        self
    }

    pub fn with_slot_capacity(mut self, slot_capacity: u32) -> Self {
        self.slot_capacity = slot_capacity;
        self
    }

    pub fn with_verify_type_checks(mut self, verify: bool) -> Self {
        self.verify_type_checks = verify;
        self
    }

    pub fn with_verify_dispatch(mut self, verify: bool) -> Self {
        self.verify_dispatch = verify;
        self
    }

    /// Reject option values the assigners cannot work with.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if !(MIN_SLOT_CAPACITY..=SLOT_CAPACITY).contains(&self.slot_capacity) {
            return Err(LayoutError::structural(format!(
                "slot capacity {} outside supported range {}..={}",
                self.slot_capacity, MIN_SLOT_CAPACITY, SLOT_CAPACITY
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/options_tests.rs"]
mod tests;
