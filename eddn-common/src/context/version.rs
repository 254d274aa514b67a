use std::sync::RwLock;

use tracing::warn;

use crate::Record;

/// Record key carrying the game version until the sender lifts it into the EDDN header.
pub const GAME_VERSION_KEY: &str = "gameversion";
/// Record key carrying the game build until the sender lifts it into the EDDN header.
pub const GAME_BUILD_KEY: &str = "gamebuild";

/// Version information reported by the game client at startup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GameVersion {
    pub version: Option<String>,
    pub build: Option<String>,
    pub horizons: Option<bool>,
    pub odyssey: Option<bool>,
}

impl GameVersion {
    pub fn is_known(&self) -> bool {
        self.version.is_some()
    }

    /// Live clients run game version 4.0 or later; older ones are the legacy galaxy.
    pub fn is_live(&self) -> bool {
        self.version
            .as_deref()
            .and_then(|version| version.split('.').next())
            .and_then(|major| major.trim().parse::<u32>().ok())
            .is_some_and(|major| major >= 4)
    }

    /// Stamp the record with expansion flags and version header fields.
    ///
    /// `source` names the CAPI endpoint a record was built from (`CAPI-shipyard`). Such records
    /// report `CAPI-Live-shipyard` or `CAPI-Legacy-shipyard` as their game version and no build.
    pub fn augment_version(&self, record: Record, source: Option<&str>) -> Record {
        let record = match self.horizons {
            Some(horizons) => record.with_default("horizons", horizons),
            None => record,
        };
        let record = match self.odyssey {
            Some(odyssey) => record.with_default("odyssey", odyssey),
            None => record,
        };

        match source {
            Some(source) => {
                let endpoint = source.strip_prefix("CAPI-").unwrap_or(source);
                let galaxy = if self.is_live() { "Live" } else { "Legacy" };
                record
                    .with(GAME_VERSION_KEY, format!("CAPI-{galaxy}-{endpoint}"))
                    .with(GAME_BUILD_KEY, "")
            }
            None => record
                .with(GAME_VERSION_KEY, self.version.clone().unwrap_or_default())
                .with(GAME_BUILD_KEY, self.build.clone().unwrap_or_default()),
        }
    }
}

#[derive(Debug, Default)]
pub struct GameVersionState {
    current: RwLock<GameVersion>,
}

impl GameVersionState {
    pub fn snapshot(&self) -> GameVersion {
        self.current
            .read()
            .expect("poisoned game version lock")
            .clone()
    }

    pub fn set(&self, version: GameVersion) {
        self.modify(|current| *current = version);
    }

    /// Track version details from `Fileheader` and `LoadGame` events.
    pub fn observe(&self, event_type: &str, record: &Record) {
        match event_type {
            "Fileheader" | "LoadGame" => self.modify(|current| {
                if let Some(version) = record.get_str("gameversion") {
                    current.version = Some(version.to_owned());
                }
                if let Some(build) = record.get_str("build") {
                    current.build = Some(build.to_owned());
                }
                if let Some(horizons) = record.get_bool("Horizons") {
                    current.horizons = Some(horizons);
                }
                if let Some(odyssey) = record.get_bool("Odyssey") {
                    current.odyssey = Some(odyssey);
                }
            }),
            _ => {}
        }
    }

    fn modify(&self, f: impl FnOnce(&mut GameVersion)) {
        if let Ok(mut current) = self.current.write() {
            f(&mut current);
        } else {
            warn!("poisoned game version lock")
        }
    }
}
