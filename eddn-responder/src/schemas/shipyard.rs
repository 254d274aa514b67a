//! Ships sold at a station, from the journal `Shipyard` event or the CAPI shipyard document.

use std::sync::Arc;

use eddn_common::{timestamp, Context, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::commerce::{capi_gate, finish, journal_gate, CapiGate, JournalGate};
use super::{CapiSchema, Outcome, Schema, SuppressReason};
use crate::capi::{listing_entries, CapiDocuments};
use crate::dedup::{DedupSlot, DedupStore};
use crate::error::SchemaError;

pub const SCHEMA_NAME: &str = "shipyard";
pub const SCHEMA_REF: &str = "https://eddn.edcd.io/schemas/shipyard/2";

const EVENT_TYPES: &[&str] = &["Shipyard"];
const CAPI_SOURCE: &str = "CAPI-shipyard";

/// The `shipyard/2` message body, before version augmentation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipyardMessage {
    pub timestamp: String,
    pub system_name: String,
    pub station_name: String,
    pub market_id: i64,
    #[serde(
        rename = "allowCobraMkIV",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub allow_cobra_mk_iv: Option<bool>,
    pub ships: Vec<String>,
}

pub struct ShipyardSchema {
    last_sent: Arc<DedupSlot>,
}

impl ShipyardSchema {
    pub fn new(dedup: &DedupStore) -> Self {
        Self {
            last_sent: dedup.slot(SCHEMA_NAME),
        }
    }
}

/// Rename a journal `Shipyard` event into the wire vocabulary with `ships` replacing `PriceList`.
pub fn reshape(record: Record, ships: Vec<String>) -> Record {
    record
        .without_all(&["event", "Horizons"])
        .rename("StarSystem", "systemName")
        .rename("StationName", "stationName")
        .rename("MarketID", "marketId")
        .rename("AllowCobraMkIV", "allowCobraMkIV")
        .without("PriceList")
        .with("ships", ships)
}

fn ship_names<'a>(entries: impl IntoIterator<Item = &'a Value>, name_key: &str) -> Vec<String> {
    entries
        .into_iter()
        .filter_map(|entry| entry.get(name_key).and_then(Value::as_str))
        .map(String::from)
        .collect()
}

impl Schema for ShipyardSchema {
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

        let Some(price_list) = record.get("PriceList").and_then(Value::as_array) else {
            return Ok(Outcome::NotApplicable);
        };
        let ships = ship_names(price_list, "ShipType");
        if ships.is_empty() {
            return Ok(Outcome::Suppressed(SuppressReason::EmptyList));
        }

        let mut message: ShipyardMessage =
            serde_json::from_value(reshape(record.clone(), ships).into_value())?;
        message.timestamp = timestamp::normalize(&message.timestamp)?;

        finish(&message, market.market_id, &self.last_sent, context, None)
    }

    fn as_capi(&self) -> Option<&dyn CapiSchema> {
        Some(self)
    }
}

impl CapiSchema for ShipyardSchema {
    fn handle_capi(
        &self,
        documents: &CapiDocuments,
        context: &Context,
    ) -> Result<Outcome, SchemaError> {
        let Some(listing) = documents
            .shipyard
            .as_ref()
            .and_then(|shipyard| shipyard.ships.as_ref())
        else {
            return Ok(Outcome::NotApplicable);
        };
        let (market, timestamp) = match capi_gate(documents, context) {
            CapiGate::Open { market, timestamp } => (market, timestamp),
            CapiGate::Closed(outcome) => return Ok(outcome),
        };

        let mut ships = Vec::new();
        if let Some(available) = &listing.shipyard_list {
            ships.extend(ship_names(listing_entries(available), "name"));
        }
        if let Some(unavailable) = &listing.unavailable_list {
            ships.extend(ship_names(listing_entries(unavailable), "name"));
        }
        if ships.is_empty() {
            return Ok(Outcome::Suppressed(SuppressReason::EmptyList));
        }

        let message = ShipyardMessage {
            timestamp: timestamp::normalize(timestamp)?,
            system_name: market.system_name,
            station_name: market.station_name,
            market_id: market.market_id,
            allow_cobra_mk_iv: None,
            ships,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::outfitting::OutfittingSchema;
    use crate::schemas::test_utils::{
        docked_context, expect_ready, record, MARKET_ID, STATION, SYSTEM,
    };
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    fn shipyard_event(price_list: Value) -> Record {
        record(json!({
            "timestamp": "2024-03-01T12:40:00Z",
            "event": "Shipyard",
            "MarketID": MARKET_ID,
            "StationName": STATION,
            "StarSystem": SYSTEM,
            "Horizons": true,
            "AllowCobraMkIV": false,
            "PriceList": price_list,
        }))
    }

    fn capi_documents(ships: Value) -> CapiDocuments {
        serde_json::from_value(json!({
            "profile": {"lastSystem": {"name": SYSTEM}},
            "shipyard": {
                "id": MARKET_ID,
                "name": STATION,
                "timestamp": "2024-03-01T12:40:02Z",
                "ships": ships,
            },
        }))
        .unwrap()
    }

    #[test]
    fn journal_event_becomes_message() {
        let schema = ShipyardSchema::new(&DedupStore::new());
        let event = shipyard_event(json!([
            {"id": 128049249, "ShipType": "sidewinder", "ShipPrice": 25000},
            {"id": 128049267, "ShipType": "adder", "ShipPrice": 74000},
        ]));

        let message = expect_ready(schema.handle("Shipyard", &event, &docked_context()).unwrap());

        assert_json_eq!(
            message.into_value(),
            json!({
                "timestamp": "2024-03-01T12:40:00Z",
                "systemName": SYSTEM,
                "stationName": STATION,
                "marketId": MARKET_ID,
                "allowCobraMkIV": false,
                "ships": ["sidewinder", "adder"],
                "horizons": true,
                "odyssey": true,
                "gameversion": "4.0.0.1700",
                "gamebuild": "r294054/r0 ",
            })
        );
    }

    #[test]
    fn empty_price_list_is_suppressed() {
        let store = DedupStore::new();
        let schema = ShipyardSchema::new(&store);

        assert_eq!(
            schema
                .handle("Shipyard", &shipyard_event(json!([])), &docked_context())
                .unwrap(),
            Outcome::Suppressed(SuppressReason::EmptyList)
        );
        assert_eq!(store.slot(SCHEMA_NAME).last_sent(), None);
    }

    #[test]
    fn capi_lists_available_and_unavailable_ships() {
        let schema = ShipyardSchema::new(&DedupStore::new());
        let documents = capi_documents(json!({
            "shipyard_list": {
                "Sidewinder": {"id": 128049249, "name": "SideWinder", "basevalue": 32000},
                "Adder": {"id": 128049267, "name": "Adder", "basevalue": 87808},
            },
            "unavailable_list": [
                {"id": 128049255, "name": "Eagle", "unavailableReason": "Insufficient Rank"},
            ],
        }));

        let message = expect_ready(schema.handle_capi(&documents, &docked_context()).unwrap());

        assert_eq!(message.get("ships"), Some(&json!(["SideWinder", "Adder", "Eagle"])));
        assert!(!message.contains_key("allowCobraMkIV"));
        assert_eq!(message.get_str("gameversion"), Some("CAPI-Live-shipyard"));
        assert_eq!(message.get_str("gamebuild"), Some(""));
    }

    #[test]
    fn capi_after_journal_for_same_market_is_suppressed() {
        let schema = ShipyardSchema::new(&DedupStore::new());
        let context = docked_context();

        expect_ready(
            schema
                .handle(
                    "Shipyard",
                    &shipyard_event(json!([{"ShipType": "sidewinder"}])),
                    &context,
                )
                .unwrap(),
        );
        assert_eq!(
            schema
                .handle_capi(
                    &capi_documents(json!({"shipyard_list": {"Sidewinder": {"name": "SideWinder"}}})),
                    &context,
                )
                .unwrap(),
            Outcome::Suppressed(SuppressReason::Duplicate)
        );
    }

    #[test]
    fn slot_is_separate_from_outfitting() {
        let store = DedupStore::new();
        let outfitting = OutfittingSchema::new(&store);
        let shipyard = ShipyardSchema::new(&store);
        let context = docked_context();

        let outfitting_event = record(json!({
            "timestamp": "2024-03-01T12:39:58Z",
            "event": "Outfitting",
            "MarketID": MARKET_ID,
            "StationName": STATION,
            "StarSystem": SYSTEM,
            "Items": [{"Name": "Int_CargoRack_Size2_Class1"}],
        }));
        expect_ready(outfitting.handle("Outfitting", &outfitting_event, &context).unwrap());

        expect_ready(
            shipyard
                .handle(
                    "Shipyard",
                    &shipyard_event(json!([{"ShipType": "sidewinder"}])),
                    &context,
                )
                .unwrap(),
        );
    }

    #[test]
    fn drifted_capi_identity_fields_are_accepted() {
        let schema = ShipyardSchema::new(&DedupStore::new());
        let documents: CapiDocuments = serde_json::from_value(json!({
            "profile": {"lastSystem": {"name": SYSTEM}},
            "shipyard": {
                "MarketID": MARKET_ID,
                "StationName": STATION,
                "timestamp": "2024-03-01T12:40:02Z",
                "ships": {"unavailable_list": [{"name": "Eagle"}]},
            },
        }))
        .unwrap();

        let message = expect_ready(schema.handle_capi(&documents, &docked_context()).unwrap());
        assert_eq!(message.get_i64("marketId"), Some(MARKET_ID));
        assert_eq!(message.get_str("stationName"), Some(STATION));
    }

    #[test]
    fn journal_then_capi_without_market_id_do_not_apply() {
        let store = DedupStore::new();
        let schema = ShipyardSchema::new(&store);
        let context = docked_context();

        let event = shipyard_event(json!([{"ShipType": "sidewinder"}])).without("MarketID");
        assert_eq!(
            schema.handle("Shipyard", &event, &context).unwrap(),
            Outcome::NotApplicable
        );

        let mut documents = capi_documents(json!({"unavailable_list": [{"name": "Eagle"}]}));
        if let Some(shipyard) = documents.shipyard.as_mut() {
            shipyard.id = None;
        }
        assert_eq!(
            schema.handle_capi(&documents, &context).unwrap(),
            Outcome::NotApplicable
        );
        assert_eq!(store.slot(SCHEMA_NAME).last_sent(), None);
    }

    #[test]
    fn journal_after_capi_for_same_market_is_suppressed() {
        let schema = ShipyardSchema::new(&DedupStore::new());
        let context = docked_context();

        expect_ready(
            schema
                .handle_capi(
                    &capi_documents(json!({"shipyard_list": {"Sidewinder": {"name": "SideWinder"}}})),
                    &context,
                )
                .unwrap(),
        );
        assert_eq!(
            schema
                .handle(
                    "Shipyard",
                    &shipyard_event(json!([{"ShipType": "sidewinder"}])),
                    &context,
                )
                .unwrap(),
            Outcome::Suppressed(SuppressReason::Duplicate)
        );
    }

    #[test]
    fn capi_without_ships_does_not_apply() {
        let schema = ShipyardSchema::new(&DedupStore::new());

        assert_eq!(
            schema
                .handle_capi(&capi_documents(Value::Null), &docked_context())
                .unwrap(),
            Outcome::NotApplicable
        );
    }
}
