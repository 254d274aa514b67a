//! Modules sold at a station, reported from the journal `Outfitting` event or from the CAPI
//! shipyard document. Both adapters converge on [`OutfittingMessage`] and share one dedup slot.

use std::sync::Arc;

use eddn_common::{timestamp, Context, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::commerce::{capi_gate, finish, journal_gate, CapiGate, JournalGate};
use super::{CapiSchema, Outcome, Schema, SuppressReason};
use crate::capi::{listing_entries, CapiDocuments};
use crate::dedup::{DedupSlot, DedupStore};
use crate::error::SchemaError;
use crate::filters::reportable_modules;

pub const SCHEMA_NAME: &str = "outfitting";
pub const SCHEMA_REF: &str = "https://eddn.edcd.io/schemas/outfitting/2";

const EVENT_TYPES: &[&str] = &["Outfitting"];
const CAPI_SOURCE: &str = "CAPI-shipyard";

/// The `outfitting/2` message body, before version augmentation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfittingMessage {
    pub timestamp: String,
    pub system_name: String,
    pub station_name: String,
    pub market_id: i64,
    pub modules: Vec<String>,
}

pub struct OutfittingSchema {
    last_sent: Arc<DedupSlot>,
}

impl OutfittingSchema {
    pub fn new(dedup: &DedupStore) -> Self {
        Self {
            last_sent: dedup.slot(SCHEMA_NAME),
        }
    }
}

/// Turn a journal `Outfitting` event into the wire vocabulary: drop what the schema does not
/// carry, rename the location fields and replace `Items` with the filtered module names.
pub fn reshape(record: Record, modules: Vec<String>) -> Record {
    record
        .without_all(&["event", "Horizons"])
        .rename("StarSystem", "systemName")
        .rename("StationName", "stationName")
        .rename("MarketID", "marketId")
        .without("Items")
        .with("modules", modules)
}

impl Schema for OutfittingSchema {
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
        let market = match journal_gate(record, context)? {
            JournalGate::Open(market) => market,
            JournalGate::Closed(outcome) => return Ok(outcome),
        };

        // The event is written without items when the outfitting screen failed to load
        let Some(items) = record.get("Items").and_then(Value::as_array) else {
            return Ok(Outcome::NotApplicable);
        };
        let modules = reportable_modules(items, "Name");
        if modules.is_empty() {
            return Ok(Outcome::Suppressed(SuppressReason::EmptyList));
        }

        let mut message: OutfittingMessage =
            serde_json::from_value(reshape(record.clone(), modules).into_value())?;
        message.timestamp = timestamp::normalize(&message.timestamp)?;

        finish(&message, market.market_id, &self.last_sent, context, None)
    }

    fn as_capi(&self) -> Option<&dyn CapiSchema> {
        Some(self)
    }
}

impl CapiSchema for OutfittingSchema {
    fn handle_capi(
        &self,
        documents: &CapiDocuments,
        context: &Context,
    ) -> Result<Outcome, SchemaError> {
        // Modules are listed in the shipyard document
        let Some(modules) = documents
            .shipyard
            .as_ref()
            .and_then(|shipyard| shipyard.modules.as_ref())
        else {
            return Ok(Outcome::NotApplicable);
        };
        let (market, timestamp) = match capi_gate(documents, context) {
            CapiGate::Open { market, timestamp } => (market, timestamp),
            CapiGate::Closed(outcome) => return Ok(outcome),
        };

        let modules = reportable_modules(listing_entries(modules), "name");
        if modules.is_empty() {
            return Ok(Outcome::Suppressed(SuppressReason::EmptyList));
        }

        let message = OutfittingMessage {
            timestamp: timestamp::normalize(timestamp)?,
            system_name: market.system_name,
            station_name: market.station_name,
            market_id: market.market_id,
            modules,
        };

        finish(
            &message,
            message.market_id,
            &self.last_sent,
            context,
            Some(CAPI_SOURCE),
        )
    }
}
