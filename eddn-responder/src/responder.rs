use std::sync::Arc;

use eddn_common::metrics::EVENTS_RECEIVED;
use eddn_common::{Context, Record};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::capi::CapiDocuments;
use crate::dedup::DedupStore;
use crate::dispatcher::{Dispatcher, Submission};

/// One line of input: a CAPI refresh wrapped as `{"capi": {...}}`, or a raw journal event.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InboundLine {
    Capi { capi: CapiDocuments },
    Journal(Record),
}

/// Entry point for both delivery paths. Updates the context, dispatches, and queues whatever
/// comes out for upload.
pub struct Responder {
    context: Arc<Context>,
    dispatcher: Dispatcher,
    queue: UnboundedSender<Submission>,
}

impl Responder {
    pub fn new(
        context: Arc<Context>,
        dispatcher: Dispatcher,
        queue: UnboundedSender<Submission>,
    ) -> Self {
        Self {
            context,
            dispatcher,
            queue,
        }
    }

    /// A responder with every known schema and a fresh dedup store.
    pub fn with_default_schemas(queue: UnboundedSender<Submission>) -> Self {
        let dedup = DedupStore::new();
        Self::new(
            Arc::new(Context::new()),
            Dispatcher::with_default_schemas(&dedup),
            queue,
        )
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Handle one journal event. Returns how many messages were queued.
    pub fn handle_event(&self, record: &Record) -> usize {
        let Some(event_type) = record.get_str("event") else {
            debug!("ignoring record without an event type");
            return 0;
        };
        metrics::counter!(EVENTS_RECEIVED).increment(1);

        self.context.observe(event_type, record);
        let submissions = self.dispatcher.dispatch(event_type, record, &self.context);
        self.enqueue(submissions)
    }

    /// Handle one CAPI refresh. Returns how many messages were queued.
    pub fn handle_capi(&self, documents: &CapiDocuments) -> usize {
        let submissions = self.dispatcher.dispatch_capi(documents, &self.context);
        self.enqueue(submissions)
    }

    /// Parse and handle one line of newline-delimited input.
    pub fn handle_line(&self, line: &str) -> Result<usize, serde_json::Error> {
        match serde_json::from_str(line)? {
            InboundLine::Capi { capi } => Ok(self.handle_capi(&capi)),
            InboundLine::Journal(record) => Ok(self.handle_event(&record)),
        }
    }

    /// Handle newline-delimited input until it ends. Lines that are not UTF-8 or not JSON are
    /// logged and skipped. A read error ends the input. Returns how many messages were queued.
    pub async fn handle_input<R: AsyncBufRead + Unpin>(&self, mut input: R) -> usize {
        let mut queued = 0;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match input.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(error) => {
                    warn!("failed to read input: {}", error);
                    break;
                }
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim(),
                Err(error) => {
                    warn!("skipping line that is not UTF-8: {}", error);
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }

            match self.handle_line(line) {
                Ok(count) => queued += count,
                Err(error) => warn!("skipping unreadable line: {}", error),
            }
        }

        queued
    }

    fn enqueue(&self, submissions: Vec<Submission>) -> usize {
        let mut queued = 0;
        for submission in submissions {
            let schema = submission.schema;
            match self.queue.send(submission) {
                Ok(()) => queued += 1,
                Err(_) => warn!(schema, "upload queue is closed, dropping message"),
            }
        }
        queued
    }
}
