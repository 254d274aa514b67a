use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

pub const EVENTS_RECEIVED: &str = "eddn_events_received_total";
pub const SCHEMA_OUTCOMES: &str = "eddn_schema_outcomes_total";
pub const SCHEMA_ERRORS: &str = "eddn_schema_errors_total";
pub const UPLOADS: &str = "eddn_uploads_total";
pub const UPLOAD_FAILURES: &str = "eddn_upload_failures_total";
pub const UPLOAD_DURATION: &str = "eddn_upload_duration_seconds";

/// Upload latencies, bounded above by the request timeout.
const UPLOAD_SECONDS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Bind a `TcpListener` on the provided bind address to serve a `Router` on it.
/// This function is intended to take a Router as returned by `setup_metrics_router`.
pub async fn serve(router: Router, bind: &str) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(bind).await?;

    axum::serve(listener, router).await?;

    Ok(())
}

/// Install the global recorder and build a Router exposing it on `/metrics`.
pub fn setup_metrics_router() -> Result<Router, BuildError> {
    let recorder_handle = setup_metrics_recorder()?;

    Ok(Router::new().route(
        "/metrics",
        get(move || std::future::ready(recorder_handle.render())),
    ))
}

pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = builder()?.install_recorder()?;
    describe_metrics();
    Ok(handle)
}

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(UPLOAD_DURATION.to_string()), UPLOAD_SECONDS)
}

fn describe_metrics() {
    describe_counter!(
        EVENTS_RECEIVED,
        Unit::Count,
        "Journal events that carried an event type"
    );
    describe_counter!(
        SCHEMA_OUTCOMES,
        Unit::Count,
        "Schema results by schema and outcome"
    );
    describe_counter!(
        SCHEMA_ERRORS,
        Unit::Count,
        "Events a schema failed to coerce"
    );
    describe_counter!(UPLOADS, Unit::Count, "Envelopes accepted by the sink");
    describe_counter!(
        UPLOAD_FAILURES,
        Unit::Count,
        "Envelopes the sink failed to deliver"
    );
    describe_histogram!(
        UPLOAD_DURATION,
        Unit::Seconds,
        "Time spent delivering one envelope"
    );
}
