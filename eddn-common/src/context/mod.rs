//! Cross-event state consulted by schemas.
//!
//! The journal observer is the only writer; schemas take a snapshot per event and never write.
//! Location and game version are guarded separately so one slow writer does not block readers
//! of the other.

mod location;
mod version;

pub use location::{star_pos, Location, LocationState};
pub use version::{GameVersion, GameVersionState, GAME_BUILD_KEY, GAME_VERSION_KEY};

use crate::Record;

#[derive(Debug, Default)]
pub struct Context {
    pub location: LocationState,
    pub version: GameVersionState,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a journal event to every part of the context that tracks it.
    pub fn observe(&self, event_type: &str, record: &Record) {
        self.version.observe(event_type, record);
        self.location.observe(event_type, record);
    }
}
