//! EDDN schemas and the handlers that turn events into messages for them.
//!
//! Every handler follows the same sequence: check it applies, check the context is ready and
//! agrees with the event, scrub and reshape the event, augment it from the context, and finally
//! pass the dedup gate if the schema has one. Each stage takes the record by value, so the
//! caller's event is never modified.

use eddn_common::{Context, Record};
use serde_json::Value;

use crate::capi::CapiDocuments;
use crate::dedup::DedupStore;
use crate::error::SchemaError;

pub mod commerce;
pub mod fss_all_bodies_found;
pub mod fss_discovery_scan;
pub mod journal;
pub mod nav_beacon_scan;
pub mod outfitting;
pub mod shipyard;

/// Result of offering an event to a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The event is not for this schema, or the context is not ready for it.
    NotApplicable,
    /// The event applies but must not be sent.
    Suppressed(SuppressReason),
    /// The message is ready to be sent.
    Ready(Record),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// The same market was the last one reported for this schema.
    Duplicate,
    /// Nothing was left to report after filtering.
    EmptyList,
    /// A CAPI document had no timestamp to order it by.
    MissingTimestamp,
}

impl SuppressReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuppressReason::Duplicate => "duplicate",
            SuppressReason::EmptyList => "empty_list",
            SuppressReason::MissingTimestamp => "missing_timestamp",
        }
    }
}

/// A handler for journal events bound for one EDDN schema.
pub trait Schema: Send + Sync {
    /// Short name used for metrics and dedup slots.
    fn name(&self) -> &'static str;

    /// The versioned `$schemaRef` messages are sent under.
    fn schema_ref(&self) -> &'static str;

    /// Journal event types this schema accepts.
    fn event_types(&self) -> &'static [&'static str];

    fn handle(
        &self,
        event_type: &str,
        record: &Record,
        context: &Context,
    ) -> Result<Outcome, SchemaError>;

    /// The CAPI entry point, for schemas that also accept CAPI documents.
    fn as_capi(&self) -> Option<&dyn CapiSchema> {
        None
    }
}

/// A handler for the same messages built from CAPI documents instead of the journal.
pub trait CapiSchema: Send + Sync {
    fn handle_capi(
        &self,
        documents: &CapiDocuments,
        context: &Context,
    ) -> Result<Outcome, SchemaError>;
}

/// All schemas in registration order. Commerce schemas draw their dedup slots from `dedup`.
pub fn default_schemas(dedup: &DedupStore) -> Vec<Box<dyn Schema>> {
    vec![
        Box::new(journal::JournalSchema),
        Box::new(fss_discovery_scan::FssDiscoveryScanSchema),
        Box::new(fss_all_bodies_found::FssAllBodiesFoundSchema),
        Box::new(nav_beacon_scan::NavBeaconScanSchema),
        Box::new(outfitting::OutfittingSchema::new(dedup)),
        Box::new(shipyard::ShipyardSchema::new(dedup)),
    ]
}

/// Read an optional integer field, failing on any other type.
fn optional_i64(record: &Record, field: &'static str) -> Result<Option<i64>, SchemaError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or(SchemaError::InvalidField {
            field,
            expected: "an integer",
        }),
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::Outcome;
    use eddn_common::context::{GameVersion, Location};
    use eddn_common::{Context, Record};
    use serde_json::Value;

    pub const SYSTEM: &str = "Shinrarta Dezhra";
    pub const SYSTEM_ADDRESS: i64 = 3932277478106;
    pub const STATION: &str = "Jameson Memorial";
    pub const MARKET_ID: i64 = 128666762;
    pub const STAR_POS: [f64; 3] = [55.71875, 17.59375, 27.15625];

    pub fn record(value: Value) -> Record {
        Record::from_value(value).expect("fixture must be an object")
    }

    pub fn expect_ready(outcome: Outcome) -> Record {
        match outcome {
            Outcome::Ready(message) => message,
            other => panic!("expected a message, got {:?}", other),
        }
    }

    /// A context docked at Jameson Memorial on an Odyssey client.
    pub fn docked_context() -> Context {
        let context = Context::new();
        context.location.set(Location {
            system_name: Some(SYSTEM.to_string()),
            system_address: Some(SYSTEM_ADDRESS),
            star_pos: Some(STAR_POS),
            station_name: Some(STATION.to_string()),
            market_id: Some(MARKET_ID),
        });
        context.version.set(GameVersion {
            version: Some("4.0.0.1700".to_string()),
            build: Some("r294054/r0 ".to_string()),
            horizons: Some(true),
            odyssey: Some(true),
        });
        context
    }
}
