use eddn_common::{Context, Record};
use serde_json::Value;

use super::{Outcome, Schema};
use crate::error::SchemaError;

pub const SCHEMA_NAME: &str = "journal";
pub const SCHEMA_REF: &str = "https://eddn.edcd.io/schemas/journal/1";

const EVENT_TYPES: &[&str] = &[
    "Docked",
    "FSDJump",
    "Scan",
    "Location",
    "SAASignalsFound",
    "CarrierJump",
];

/// Commander-specific fields, dropped wherever they appear at the top level.
const PERSONAL_FIELDS: &[&str] = &[
    "ActiveFine",
    "BoostUsed",
    "CockpitBreach",
    "FuelLevel",
    "FuelUsed",
    "JumpDist",
    "Latitude",
    "Longitude",
    "Wanted",
];

/// Commander-specific fields of each `Factions` entry.
const PERSONAL_FACTION_FIELDS: &[&str] = &[
    "HappiestSystem",
    "HomeSystem",
    "MyReputation",
    "SquadronFaction",
];

const LOCALISED_SUFFIX: &str = "_Localised";

/// The generic journal schema, for exploration and travel events.
pub struct JournalSchema;

impl Schema for JournalSchema {
    fn name(&self) -> &'static str {
        SCHEMA_NAME
    }

    fn schema_ref(&self) -> &'static str {
        SCHEMA_REF
    }

    fn event_types(&self) -> &'static [&'static str] {
        EVENT_TYPES
    }

    fn handle(
        &self,
        event_type: &str,
        record: &Record,
        context: &Context,
    ) -> Result<Outcome, SchemaError> {
        if !EVENT_TYPES.contains(&event_type) {
            return Ok(Outcome::NotApplicable);
        }

        let location = context.location.snapshot();
        let version = context.version.snapshot();
        if record.is_empty() || location.star_pos.is_none() || !version.is_known() {
            return Ok(Outcome::NotApplicable);
        }
        if !location.check(event_type, record) {
            return Ok(Outcome::NotApplicable);
        }

        let message = scrub(record.clone());

        let message = location.augment_star_system(message);
        let message = location.augment_system_address(message);
        let message = location.augment_star_pos(message);
        let message = version.augment_version(message, None);

        Ok(Outcome::Ready(message))
    }
}

/// Remove localised strings and personal fields.
pub fn scrub(record: Record) -> Record {
    let record: Record = record
        .into_inner()
        .into_iter()
        .filter(|(key, _)| !key.ends_with(LOCALISED_SUFFIX))
        .map(|(key, value)| (key, without_localised(value)))
        .collect::<serde_json::Map<_, _>>()
        .into();

    record
        .without_all(PERSONAL_FIELDS)
        .update("Factions", |factions| match factions {
            Value::Array(factions) => factions
                .into_iter()
                .map(|faction| match faction {
                    Value::Object(mut faction) => {
                        for field in PERSONAL_FACTION_FIELDS {
                            faction.shift_remove(*field);
                        }
                        Value::Object(faction)
                    }
                    other => other,
                })
                .collect(),
            other => other,
        })
}

fn without_localised(value: Value) -> Value {
    match value {
        Value::Object(map) => map
            .into_iter()
            .filter(|(key, _)| !key.ends_with(LOCALISED_SUFFIX))
            .map(|(key, value)| (key, without_localised(value)))
            .collect(),
        Value::Array(items) => items.into_iter().map(without_localised).collect(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => value,
    }
}
