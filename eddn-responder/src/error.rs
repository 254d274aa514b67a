use eddn_common::timestamp::TimestampError;
use thiserror::Error;

/// Enumeration of hard failures while transforming an event for a schema.
///
/// Expected gaps in the data (unknown location, empty inventory, duplicates) are not errors;
/// schemas report those through `Outcome`. These variants mean a value had a shape we cannot
/// coerce into the wire contract.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("field {field} has an unexpected type, expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(#[from] TimestampError),
    #[error("event does not fit the message schema: {0}")]
    MessageError(#[from] serde_json::Error),
}

/// Enumeration of errors related to delivering messages to the upload endpoint.
#[derive(Error, Debug)]
pub enum SenderError {
    #[error("error parsing upload url")]
    ParseUrlError(#[from] url::ParseError),
    #[error("failed to build http client: {0}")]
    ClientError(reqwest::Error),
    #[error("upload request failed: {0}")]
    RequestError(#[from] reqwest::Error),
}
