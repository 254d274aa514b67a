//! Route events to every schema that accepts them.

use eddn_common::metrics::{SCHEMA_ERRORS, SCHEMA_OUTCOMES};
use eddn_common::{Context, Record};
use tracing::{debug, instrument, warn};

use crate::capi::CapiDocuments;
use crate::dedup::DedupStore;
use crate::error::SchemaError;
use crate::schemas::{default_schemas, Outcome, Schema};

/// A finished message and the schema it is sent under.
#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
    pub schema: &'static str,
    pub schema_ref: &'static str,
    pub message: Record,
}

pub struct Dispatcher {
    schemas: Vec<Box<dyn Schema>>,
}

impl Dispatcher {
    pub fn new(schemas: Vec<Box<dyn Schema>>) -> Self {
        Self { schemas }
    }

    pub fn with_default_schemas(dedup: &DedupStore) -> Self {
        Self::new(default_schemas(dedup))
    }

    /// Offer a journal event to every schema declaring its type, in registration order.
    ///
    /// A failing schema is logged and skipped; the others still see the event.
    #[instrument(skip_all, fields(event_type = event_type))]
    pub fn dispatch(
        &self,
        event_type: &str,
        record: &Record,
        context: &Context,
    ) -> Vec<Submission> {
        self.schemas
            .iter()
            .filter(|schema| schema.event_types().contains(&event_type))
            .filter_map(|schema| {
                let outcome = schema.handle(event_type, record, context);
                record_outcome(schema.as_ref(), outcome)
            })
            .collect()
    }

    /// Offer a CAPI refresh to every schema with a CAPI entry point.
    #[instrument(skip_all)]
    pub fn dispatch_capi(
        &self,
        documents: &CapiDocuments,
        context: &Context,
    ) -> Vec<Submission> {
        self.schemas
            .iter()
            .filter_map(|schema| {
                let capi = schema.as_capi()?;
                let outcome = capi.handle_capi(documents, context);
                record_outcome(schema.as_ref(), outcome)
            })
            .collect()
    }
}

fn record_outcome(
    schema: &dyn Schema,
    outcome: Result<Outcome, SchemaError>,
) -> Option<Submission> {
    let name = schema.name();

    match outcome {
        Ok(Outcome::NotApplicable) => None,
        Ok(Outcome::Suppressed(reason)) => {
            debug!(schema = name, reason = reason.as_str(), "message suppressed");
            metrics::counter!(
                SCHEMA_OUTCOMES,
                "schema" => name,
                "outcome" => reason.as_str()
            )
            .increment(1);
            None
        }
        Ok(Outcome::Ready(message)) => {
            metrics::counter!(
                SCHEMA_OUTCOMES,
                "schema" => name,
                "outcome" => "ready"
            )
            .increment(1);
            Some(Submission {
                schema: name,
                schema_ref: schema.schema_ref(),
                message,
            })
        }
        Err(error) => {
            warn!(schema = name, "failed to build message: {}", error);
            metrics::counter!(SCHEMA_ERRORS, "schema" => name).increment(1);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::test_utils::{docked_context, record, MARKET_ID, STATION, SYSTEM};
    use crate::schemas::SuppressReason;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records the order it is called in and answers with a fixed outcome.
    struct Canned {
        name: &'static str,
        calls: &'static Mutex<Vec<&'static str>>,
        outcome: fn() -> Result<Outcome, SchemaError>,
    }

    impl Schema for Canned {
        fn name(&self) -> &'static str {
            self.name
        }

        fn schema_ref(&self) -> &'static str {
            "https://eddn.edcd.io/schemas/canned/1"
        }

        fn event_types(&self) -> &'static [&'static str] {
            &["Scan"]
        }

        fn handle(&self, _: &str, _: &Record, _: &Context) -> Result<Outcome, SchemaError> {
            self.calls.lock().unwrap().push(self.name);
            (self.outcome)()
        }
    }

    fn ready() -> Result<Outcome, SchemaError> {
        Ok(Outcome::Ready(Record::new().with("canned", true)))
    }

    fn failing() -> Result<Outcome, SchemaError> {
        Err(SchemaError::InvalidField {
            field: "canned",
            expected: "anything else",
        })
    }

    fn suppressed() -> Result<Outcome, SchemaError> {
        Ok(Outcome::Suppressed(SuppressReason::EmptyList))
    }

    #[test]
    fn failing_schema_does_not_stop_the_others() {
        static CALLS: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());
        let dispatcher = Dispatcher::new(vec![
            Box::new(Canned {
                name: "first",
                calls: &CALLS,
                outcome: failing,
            }),
            Box::new(Canned {
                name: "second",
                calls: &CALLS,
                outcome: suppressed,
            }),
            Box::new(Canned {
                name: "third",
                calls: &CALLS,
                outcome: ready,
            }),
        ]);

        let submissions = dispatcher.dispatch("Scan", &Record::new(), &Context::new());

        assert_eq!(*CALLS.lock().unwrap(), vec!["first", "second", "third"]);
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].schema, "third");
        assert_eq!(submissions[0].schema_ref, "https://eddn.edcd.io/schemas/canned/1");
    }

    #[test]
    fn unmatched_event_types_reach_no_schema() {
        static CALLS: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());
        let dispatcher = Dispatcher::new(vec![Box::new(Canned {
            name: "only",
            calls: &CALLS,
            outcome: ready,
        })]);

        assert!(dispatcher
            .dispatch("Music", &Record::new(), &Context::new())
            .is_empty());
        assert!(CALLS.lock().unwrap().is_empty());
    }

    #[test]
    fn default_schemas_route_by_event_type() {
        let dispatcher = Dispatcher::with_default_schemas(&DedupStore::new());
        let event = record(json!({
            "timestamp": "2024-03-01T12:30:00Z",
            "event": "Docked",
            "StarSystem": SYSTEM,
            "StationName": STATION,
            "MarketID": MARKET_ID,
        }));

        let submissions = dispatcher.dispatch("Docked", &event, &docked_context());

        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].schema, "journal");
    }

    #[test]
    fn capi_reaches_commerce_schemas_only() {
        let dispatcher = Dispatcher::with_default_schemas(&DedupStore::new());
        let documents: CapiDocuments = serde_json::from_value(json!({
            "profile": {"lastSystem": {"name": SYSTEM}},
            "shipyard": {
                "id": MARKET_ID,
                "name": STATION,
                "timestamp": "2024-03-01T12:30:00Z",
                "modules": [{"name": "Hpt_PulseLaser_Fixed_Small"}],
                "ships": {"shipyard_list": {"Adder": {"name": "Adder"}}},
            },
        }))
        .unwrap();

        let schemas: Vec<_> = dispatcher
            .dispatch_capi(&documents, &docked_context())
            .into_iter()
            .map(|submission| submission.schema)
            .collect();

        assert_eq!(schemas, vec!["outfitting", "shipyard"]);
    }
}
