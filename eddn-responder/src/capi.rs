//! Documents returned by the Companion API (CAPI).
//!
//! CAPI is polled out of band and offers a slower view of what the journal reports inline.
//! Only the fields the schemas consume are typed; everything else is ignored on deserialization.

use serde::Deserialize;
use serde_json::Value;

/// One CAPI refresh. Every endpoint is fetched independently and may be missing.
///
/// Only the profile and shipyard documents feed a schema; the others are carried untyped.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CapiDocuments {
    pub profile: Option<ProfileDocument>,
    pub market: Option<Value>,
    pub shipyard: Option<ShipyardDocument>,
    #[serde(alias = "fleetCarrier")]
    pub fleet_carrier: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument {
    pub last_system: Option<SystemReference>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SystemReference {
    pub name: Option<String>,
}

/// The `/shipyard` endpoint, which also lists outfitting modules.
///
/// Older clients stored this document with journal-style identity fields, so `StationName`
/// and `MarketID` are accepted for `name` and `id`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ShipyardDocument {
    #[serde(alias = "MarketID")]
    pub id: Option<i64>,
    #[serde(alias = "StationName")]
    pub name: Option<String>,
    pub timestamp: Option<String>,
    pub modules: Option<Value>,
    pub ships: Option<ShipsListing>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ShipsListing {
    pub shipyard_list: Option<Value>,
    pub unavailable_list: Option<Value>,
}

/// Entries of a CAPI listing, which is either a JSON object keyed by id or a plain array.
pub fn listing_entries(listing: &Value) -> Vec<&Value> {
    match listing {
        Value::Object(entries) => entries.values().collect(),
        Value::Array(entries) => entries.iter().collect(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_capi_shapes() {
        let documents: CapiDocuments = serde_json::from_value(json!({
            "profile": {
                "commander": {"name": "Jameson"},
                "lastSystem": {"id": 3932277478106i64, "name": "Shinrarta Dezhra"},
                "lastStarport": {"id": 128666762, "name": "Jameson Memorial"},
            },
            "shipyard": {
                "id": 128666762,
                "name": "Jameson Memorial",
                "timestamp": "2024-03-01T12:30:05Z",
                "modules": {"128049250": {"name": "Int_CargoRack_Size2_Class1"}},
            },
            "fleetCarrier": null,
        }))
        .unwrap();

        let profile = documents.profile.unwrap();
        assert_eq!(
            profile.last_system.unwrap().name.as_deref(),
            Some("Shinrarta Dezhra")
        );
        let shipyard = documents.shipyard.unwrap();
        assert_eq!(shipyard.id, Some(128666762));
        assert!(shipyard.ships.is_none());
        assert!(documents.market.is_none());
        assert!(documents.fleet_carrier.is_none());
    }

    #[test]
    fn accepts_journal_style_identity() {
        let shipyard: ShipyardDocument = serde_json::from_value(json!({
            "MarketID": 128666762,
            "StationName": "Jameson Memorial",
        }))
        .unwrap();

        assert_eq!(shipyard.id, Some(128666762));
        assert_eq!(shipyard.name.as_deref(), Some("Jameson Memorial"));
    }

    #[test]
    fn null_modules_read_as_missing() {
        let shipyard: ShipyardDocument =
            serde_json::from_value(json!({"id": 1, "modules": null})).unwrap();
        assert!(shipyard.modules.is_none());
    }

    #[test]
    fn listing_entries_handles_objects_and_arrays() {
        assert_eq!(
            listing_entries(&json!({"1": {"name": "a"}, "2": {"name": "b"}})).len(),
            2
        );
        assert_eq!(listing_entries(&json!([{"name": "a"}])).len(), 1);
        assert!(listing_entries(&json!("nothing")).is_empty());
    }
}
