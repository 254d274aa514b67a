use eddn_common::{Context, Record};

use super::{Outcome, Schema};
use crate::error::SchemaError;

pub const SCHEMA_NAME: &str = "fssallbodiesfound";
pub const SCHEMA_REF: &str = "https://eddn.edcd.io/schemas/fssallbodiesfound/1";

const EVENT_TYPES: &[&str] = &["FSSAllBodiesFound"];

pub struct FssAllBodiesFoundSchema;

impl Schema for FssAllBodiesFoundSchema {
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

        let message = location.augment_star_pos(record.clone());
        let message = version.augment_version(message, None);

        Ok(Outcome::Ready(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::test_utils::{docked_context, expect_ready, record, SYSTEM, SYSTEM_ADDRESS};
    use serde_json::json;

    fn all_bodies_found(system_address: i64) -> Record {
        record(json!({
            "timestamp": "2024-03-01T12:31:00Z",
            "event": "FSSAllBodiesFound",
            "SystemName": SYSTEM,
            "SystemAddress": system_address,
            "Count": 24,
        }))
    }

    #[test]
    fn augments_star_pos() {
        let message = expect_ready(
            FssAllBodiesFoundSchema
                .handle(
                    "FSSAllBodiesFound",
                    &all_bodies_found(SYSTEM_ADDRESS),
                    &docked_context(),
                )
                .unwrap(),
        );

        assert_eq!(message.get_i64("Count"), Some(24));
        assert_eq!(
            message.get("StarPos"),
            Some(&json!([55.71875, 17.59375, 27.15625]))
        );
        assert_eq!(message.get_str("gameversion"), Some("4.0.0.1700"));
    }

    #[test]
    fn other_system_does_not_apply() {
        let outcome = FssAllBodiesFoundSchema
            .handle(
                "FSSAllBodiesFound",
                &all_bodies_found(10477373803),
                &docked_context(),
            )
            .unwrap();
        assert_eq!(outcome, Outcome::NotApplicable);
    }

    #[test]
    fn empty_record_does_not_apply() {
        let outcome = FssAllBodiesFoundSchema
            .handle("FSSAllBodiesFound", &Record::new(), &docked_context())
            .unwrap();
        assert_eq!(outcome, Outcome::NotApplicable);
    }
}
