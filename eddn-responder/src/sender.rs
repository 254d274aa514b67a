//! Deliver finished messages to the EDDN upload endpoint.
//!
//! Handlers never wait on the network: the responder queues each [`Submission`] on an unbounded
//! channel and [`run_uploader`] drains it in the background. Failed uploads are logged and
//! counted, and never retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use eddn_common::context::{GAME_BUILD_KEY, GAME_VERSION_KEY};
use eddn_common::metrics::{UPLOADS, UPLOAD_DURATION, UPLOAD_FAILURES};
use eddn_common::Record;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::dispatcher::Submission;
use crate::error::SenderError;

/// Who is uploading, as reported in every envelope header.
#[derive(Clone, Debug, PartialEq)]
pub struct UploaderIdentity {
    pub uploader_id: String,
    pub software_name: String,
    pub software_version: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Header {
    #[serde(rename = "uploaderID")]
    pub uploader_id: String,
    #[serde(rename = "softwareName")]
    pub software_name: String,
    #[serde(rename = "softwareVersion")]
    pub software_version: String,
    pub gameversion: String,
    pub gamebuild: String,
}

/// The EDDN upload document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Envelope {
    #[serde(rename = "$schemaRef")]
    pub schema_ref: &'static str,
    pub header: Header,
    pub message: Record,
}

impl Envelope {
    /// Wrap a message, lifting the game version fields it carries into the header.
    pub fn wrap(submission: Submission, identity: &UploaderIdentity) -> Self {
        let (message, gameversion) = submission.message.split_off(GAME_VERSION_KEY);
        let (message, gamebuild) = message.split_off(GAME_BUILD_KEY);

        Self {
            schema_ref: submission.schema_ref,
            header: Header {
                uploader_id: identity.uploader_id.clone(),
                software_name: identity.software_name.clone(),
                software_version: identity.software_version.clone(),
                gameversion: header_string(gameversion),
                gamebuild: header_string(gamebuild),
            },
            message,
        }
    }
}

fn header_string(value: Option<Value>) -> String {
    match value {
        Some(Value::String(value)) => value,
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[async_trait]
pub trait UploadSink: Send + Sync {
    async fn send(&self, envelope: &Envelope) -> Result<(), SenderError>;
}

/// Posts envelopes as JSON to an EDDN gateway.
pub struct HttpSink {
    client: reqwest::Client,
    url: reqwest::Url,
}

impl HttpSink {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, SenderError> {
        let url = reqwest::Url::parse(url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SenderError::ClientError)?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl UploadSink for HttpSink {
    async fn send(&self, envelope: &Envelope) -> Result<(), SenderError> {
        self.client
            .post(self.url.clone())
            .json(envelope)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// Logs envelopes instead of uploading them.
pub struct PrintSink {}

#[async_trait]
impl UploadSink for PrintSink {
    async fn send(&self, envelope: &Envelope) -> Result<(), SenderError> {
        let body = Value::from(envelope.message.clone());
        info!(
            schema_ref = envelope.schema_ref,
            header = ?envelope.header,
            body = %body,
            "envelope"
        );

        Ok(())
    }
}

/// Upload queued submissions one at a time until every sender half of the queue is dropped.
pub async fn run_uploader(
    mut queue: UnboundedReceiver<Submission>,
    identity: UploaderIdentity,
    sink: Arc<dyn UploadSink>,
) {
    while let Some(submission) = queue.recv().await {
        let schema = submission.schema;
        let envelope = Envelope::wrap(submission, &identity);

        let start = Instant::now();
        let result = sink.send(&envelope).await;
        metrics::histogram!(UPLOAD_DURATION, "schema" => schema)
            .record(start.elapsed().as_secs_f64());

        match result {
            Ok(()) => {
                metrics::counter!(UPLOADS, "schema" => schema).increment(1);
            }
            Err(error) => {
                warn!(schema, "failed to upload message: {}", error);
                metrics::counter!(UPLOAD_FAILURES, "schema" => schema).increment(1);
            }
        }
    }

    info!("upload queue closed");
}
