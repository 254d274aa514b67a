use std::sync::RwLock;

use serde_json::Value;
use tracing::{debug, warn};

use crate::Record;

/// Where the commander currently is, as last reported by the journal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Location {
    pub system_name: Option<String>,
    pub system_address: Option<i64>,
    pub star_pos: Option<[f64; 3]>,
    pub station_name: Option<String>,
    pub market_id: Option<i64>,
}

impl Location {
    /// Check that the location fields a record reports agree with this snapshot.
    ///
    /// Nothing can be validated before the system is known. Each location field present in the
    /// record must then equal the tracked value; a record naming a station or market we are not
    /// tracking is stale and fails the check.
    pub fn check(&self, event_type: &str, record: &Record) -> bool {
        if self.system_name.is_none() {
            debug!(event_type, "location is not known yet");
            return false;
        }

        let system = record
            .get("StarSystem")
            .or_else(|| record.get("SystemName"));
        let matches = field_matches(system, self.system_name.as_deref())
            && field_matches(record.get("SystemAddress"), self.system_address)
            && field_matches(record.get("StationName"), self.station_name.as_deref())
            && field_matches(record.get("MarketID"), self.market_id);

        if !matches {
            debug!(
                event_type,
                tracked = ?self,
                "event location does not match tracked location"
            );
        }
        matches
    }

    /// Check the identity extracted from CAPI documents against this snapshot. Every part must be
    /// present and equal.
    pub fn matches(
        &self,
        system_name: Option<&str>,
        station_name: Option<&str>,
        market_id: Option<i64>,
    ) -> bool {
        system_name.is_some()
            && system_name == self.system_name.as_deref()
            && station_name.is_some()
            && station_name == self.station_name.as_deref()
            && market_id.is_some()
            && market_id == self.market_id
    }

    /// Add `StarPos` from the tracked location unless the record already carries one.
    pub fn augment_star_pos(&self, record: Record) -> Record {
        match self.star_pos {
            Some(star_pos) => record.with_default("StarPos", star_pos.to_vec()),
            None => record,
        }
    }

    pub fn augment_star_system(&self, record: Record) -> Record {
        match &self.system_name {
            Some(name) => record.with_default("StarSystem", name.as_str()),
            None => record,
        }
    }

    pub fn augment_system_address(&self, record: Record) -> Record {
        match self.system_address {
            Some(address) => record.with_default("SystemAddress", address),
            None => record,
        }
    }
}

fn field_matches<T>(reported: Option<&Value>, tracked: Option<T>) -> bool
where
    T: PartialEq<Value>,
{
    match reported {
        None | Some(Value::Null) => true,
        Some(value) => tracked.is_some_and(|tracked| tracked == *value),
    }
}

/// Reads a journal `StarPos` array.
pub fn star_pos(value: &Value) -> Option<[f64; 3]> {
    match value.as_array()?.as_slice() {
        [x, y, z] => Some([x.as_f64()?, y.as_f64()?, z.as_f64()?]),
        _ => None,
    }
}

/// The shared, lock-guarded location. Written by the journal observer, read by schemas through
/// [`LocationState::snapshot`].
#[derive(Debug, Default)]
pub struct LocationState {
    current: RwLock<Location>,
}

impl LocationState {
    pub fn snapshot(&self) -> Location {
        self.current
            .read()
            .expect("poisoned location lock")
            .clone()
    }

    pub fn set(&self, location: Location) {
        self.modify(|current| *current = location);
    }

    /// Track location changes reported by journal events.
    pub fn observe(&self, event_type: &str, record: &Record) {
        match event_type {
            "Location" | "FSDJump" | "CarrierJump" => self.modify(|current| {
                let docked = event_type != "FSDJump" && record.get_bool("Docked") == Some(true);
                *current = Location {
                    system_name: record.get_str("StarSystem").map(String::from),
                    system_address: record.get_i64("SystemAddress"),
                    star_pos: record.get("StarPos").and_then(star_pos),
                    station_name: record
                        .get_str("StationName")
                        .filter(|_| docked)
                        .map(String::from),
                    market_id: record.get_i64("MarketID").filter(|_| docked),
                };
            }),
            "Docked" => self.modify(|current| {
                if let Some(system) = record.get_str("StarSystem") {
                    if current.system_name.as_deref() != Some(system) {
                        current.star_pos = None;
                    }
                    current.system_name = Some(system.to_owned());
                }
                if let Some(address) = record.get_i64("SystemAddress") {
                    current.system_address = Some(address);
                }
                current.station_name = record.get_str("StationName").map(String::from);
                current.market_id = record.get_i64("MarketID");
            }),
            "Undocked" => self.modify(|current| {
                current.station_name = None;
                current.market_id = None;
            }),
            "Shutdown" => self.set(Location::default()),
            _ => {}
        }
    }

    fn modify(&self, f: impl FnOnce(&mut Location)) {
        if let Ok(mut current) = self.current.write() {
            f(&mut current);
        } else {
            // Poisoned lock: stop tracking, schemas will see a stale location and skip events
            warn!("poisoned location lock")
        }
    }
}
