//! Retrieval of transactions objects.
//!
//! A [`SourceLoader`] resolves a [`ReportRequest`] to the raw rows of one CSV
//! object. Three backends are provided: Amazon S3 through the AWS SDK with
//! the default credential chain, a local directory mirroring the bucket
//! layout, and an unsigned path-style HTTP object store.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use report_core::models::{ReportRequest, Row};
use reqwest::{Client, Url};
use tracing::{debug, info};

use crate::error::FetchError;
use crate::reader::decode_rows;

// ── SourceLoader ──────────────────────────────────────────────────────────────

/// Supplies the raw row sequence for one report request.
#[async_trait]
pub trait SourceLoader: Send + Sync {
    async fn fetch_rows(&self, request: &ReportRequest) -> Result<Vec<Row>, FetchError>;
}

// ── S3SourceLoader ────────────────────────────────────────────────────────────

/// Signed `GetObject` against S3 or an S3-compatible service.
#[derive(Debug, Clone)]
pub struct S3SourceLoader {
    client: aws_sdk_s3::Client,
}

impl S3SourceLoader {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Resolve credentials and region from the default AWS provider chain.
    ///
    /// `region` overrides the chain's region. `endpoint` points the client at
    /// an S3-compatible service and switches to path-style addressing.
    pub async fn from_env(
        region: Option<String>,
        endpoint: Option<String>,
        timeout: Duration,
    ) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let shared = loader.load().await;

        let mut config = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint {
            config = config.endpoint_url(endpoint).force_path_style(true);
        }
        Self::new(aws_sdk_s3::Client::from_conf(config.build()))
    }
}

#[async_trait]
impl SourceLoader for S3SourceLoader {
    async fn fetch_rows(&self, request: &ReportRequest) -> Result<Vec<Row>, FetchError> {
        let location = format!("s3://{}/{}", request.bucket, request.key);
        info!(%location, "fetching transactions object");

        let output = self
            .client
            .get_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .send()
            .await
            .map_err(|source| FetchError::S3 {
                location: location.clone(),
                message: DisplayErrorContext(&source).to_string(),
                source: Box::new(source),
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|source| FetchError::ObjectBody {
                location: location.clone(),
                source,
            })?
            .into_bytes();
        debug!(bytes = body.len(), %location, "transactions object received");
        decode_rows(&body[..])
    }
}

// ── FileSourceLoader ──────────────────────────────────────────────────────────

/// Reads `<root>/<bucket>/<key>` from the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSourceLoader {
    root: PathBuf,
}

impl FileSourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the on-disk path for `request`.
    ///
    /// Keys are split on `/`; `..` and absolute components are rejected so
    /// a request can never escape `root`.
    pub fn object_path(&self, request: &ReportRequest) -> Result<PathBuf, FetchError> {
        let relative = Path::new(&request.bucket).join(&request.key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(FetchError::Io {
                path: relative,
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "object path must stay inside the source directory",
                ),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl SourceLoader for FileSourceLoader {
    async fn fetch_rows(&self, request: &ReportRequest) -> Result<Vec<Row>, FetchError> {
        let path = self.object_path(request)?;
        info!(path = %path.display(), "reading transactions file");

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| FetchError::Io {
                path: path.clone(),
                source,
            })?;
        decode_rows(&bytes[..])
    }
}

// ── HttpSourceLoader ──────────────────────────────────────────────────────────

/// Fetches `<endpoint>/<bucket>/<key>` with a plain HTTP GET.
///
/// Works with any store that serves objects path-style, e.g. a public or
/// gateway-fronted S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct HttpSourceLoader {
    endpoint: Url,
    client: Client,
}

impl HttpSourceLoader {
    /// Build a loader for `endpoint`; every request is bounded by `timeout`.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, FetchError> {
        let invalid = |reason: String| FetchError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("endpoint cannot carry a path".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Request {
                url: endpoint.to_string(),
                source,
            })?;

        Ok(Self {
            endpoint: url,
            client,
        })
    }

    /// Object URL for `request`. Each key segment is percent-encoded.
    pub fn object_url(&self, request: &ReportRequest) -> Result<Url, FetchError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidEndpoint {
                endpoint: self.endpoint.to_string(),
                reason: "endpoint cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .push(&request.bucket)
            .extend(request.key.split('/'));
        Ok(url)
    }
}

#[async_trait]
impl SourceLoader for HttpSourceLoader {
    async fn fetch_rows(&self, request: &ReportRequest) -> Result<Vec<Row>, FetchError> {
        let url = self.object_url(request)?;
        info!(%url, "fetching transactions object");

        let request_error = |source: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(request_error)?;
        debug!(bytes = body.len(), "transactions object received");
        decode_rows(&body[..])
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
