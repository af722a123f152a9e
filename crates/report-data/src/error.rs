use std::path::PathBuf;

use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStreamError;
use thiserror::Error;

/// Failures while retrieving or decoding a transactions object.
#[derive(Error, Debug)]
pub enum FetchError {
    /// A local object could not be opened or read.
    #[error("Failed to read object {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// S3 rejected or failed the `GetObject` call.
    #[error("Failed to get {location}: {message}")]
    S3 {
        location: String,
        message: String,
        #[source]
        source: Box<SdkError<GetObjectError>>,
    },

    /// The S3 response body stream broke off.
    #[error("Failed to read body of {location}: {source}")]
    ObjectBody {
        location: String,
        #[source]
        source: ByteStreamError,
    },

    /// The configured endpoint cannot be turned into an object URL.
    #[error("Invalid object store endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The HTTP request failed before a response arrived, or the body could
    /// not be read.
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The object store answered with a non-success status.
    #[error("Object store returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The body is not valid CSV.
    #[error("Failed to decode CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A date, quantity or unit price field is not valid UTF-8.
    #[error("CSV record {row}: {field} field is not valid UTF-8")]
    InvalidUtf8 { row: usize, field: &'static str },

    /// A record has fewer than the four positional fields.
    #[error("CSV record {row} has {found} fields, expected at least 4")]
    ShortRecord { row: usize, found: usize },
}
