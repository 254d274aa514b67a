use eddn_common::{Context, Record};

use super::{Outcome, Schema};
use crate::error::SchemaError;

pub const SCHEMA_NAME: &str = "fssdiscoveryscan";
pub const SCHEMA_REF: &str = "https://eddn.edcd.io/schemas/fssdiscoveryscan/1";

const EVENT_TYPES: &[&str] = &["FSSDiscoveryScan"];

/// Honks: the number of bodies in a system.
pub struct FssDiscoveryScanSchema;

impl Schema for FssDiscoveryScanSchema {
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

        // Scan progress is personal; the event already names its system as `SystemName`
        let message = record.clone().without("Progress");

        let message = location.augment_star_pos(message);
        let message = version.augment_version(message, None);

        Ok(Outcome::Ready(message))
    }
}
