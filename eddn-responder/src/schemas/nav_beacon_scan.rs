use eddn_common::{Context, Record};

use super::{Outcome, Schema};
use crate::error::SchemaError;

pub const SCHEMA_NAME: &str = "navbeaconscan";
pub const SCHEMA_REF: &str = "https://eddn.edcd.io/schemas/navbeaconscan/1";

const EVENT_TYPES: &[&str] = &["NavBeaconScan"];

/// Nav beacon scans only report a system address, so the system name is added from the
/// tracked location.
pub struct NavBeaconScanSchema;

impl Schema for NavBeaconScanSchema {
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
        if record.is_empty()
            || location.system_address.is_none()
            || location.star_pos.is_none()
            || !version.is_known()
        {
            return Ok(Outcome::NotApplicable);
        }
        if !location.check(event_type, record) {
            return Ok(Outcome::NotApplicable);
        }

        let message = location.augment_star_system(record.clone());
        let message = location.augment_star_pos(message);
        let message = version.augment_version(message, None);

        Ok(Outcome::Ready(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::test_utils::{docked_context, expect_ready, record, SYSTEM, SYSTEM_ADDRESS};
    use assert_json_diff::assert_json_include;
    use serde_json::json;

    #[test]
    fn adds_system_name_and_position() {
        let event = record(json!({
            "timestamp": "2024-03-01T12:31:00Z",
            "event": "NavBeaconScan",
            "SystemAddress": SYSTEM_ADDRESS,
            "NumBodies": 24,
        }));

        let message = expect_ready(
            NavBeaconScanSchema
                .handle("NavBeaconScan", &event, &docked_context())
                .unwrap(),
        );

        assert_json_include!(
            actual: message.into_value(),
            expected: json!({
                "SystemAddress": SYSTEM_ADDRESS,
                "NumBodies": 24,
                "StarSystem": SYSTEM,
                "StarPos": [55.71875, 17.59375, 27.15625],
            })
        );
    }

    #[test]
    fn beacon_of_another_system_does_not_apply() {
        let event = record(json!({
            "event": "NavBeaconScan",
            "SystemAddress": 10477373803i64,
            "NumBodies": 40,
        }));

        let outcome = NavBeaconScanSchema
            .handle("NavBeaconScan", &event, &docked_context())
            .unwrap();
        assert_eq!(outcome, Outcome::NotApplicable);
    }
}
