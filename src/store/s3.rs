//! S3-backed stores.
//!
//! Both stores share one client and bucket. Image bytes live under their
//! storage keys (`images/...`); metadata values live as small JSON objects
//! under a configurable key prefix (default `meta/`).

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::debug;

use super::blob::{BlobMetadata, BlobObject, BlobStore, PutOptions};
use super::metadata::MetadataStore;
use crate::error::IoError;

const JSON_CONTENT_TYPE: &str = "application/json";

// =============================================================================
// Error Mapping
// =============================================================================

/// Translate an SDK error into an `IoError`, detecting missing objects.
fn map_sdk_error<E>(err: SdkError<E, HttpResponse>, location: &str) -> IoError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let code_is_missing = matches!(
        err.as_service_error().and_then(|e| e.code()),
        Some("NoSuchKey") | Some("NotFound")
    );
    let status_is_404 = err
        .raw_response()
        .map(|r| r.status().as_u16() == 404)
        .unwrap_or(false);

    if code_is_missing || status_is_404 {
        return IoError::NotFound(location.to_string());
    }

    let message = DisplayErrorContext(&err).to_string();
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => IoError::Connection(message),
        _ => IoError::S3(message),
    }
}

/// Turn a not-found error into `Ok(None)`.
fn found<T>(result: Result<T, IoError>) -> Result<Option<T>, IoError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(IoError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn content_length(len: Option<i64>) -> u64 {
    len.and_then(|l| u64::try_from(l).ok()).unwrap_or(0)
}

/// List every object under `prefix`, following continuation tokens.
async fn list_all(
    client: &Client,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<BlobMetadata>, IoError> {
    let mut objects = Vec::new();
    let mut continuation_token: Option<String> = None;
    let location = format!("s3://{}/{}", bucket, prefix);

    loop {
        let mut request = client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .max_keys(1000);

        if let Some(token) = continuation_token {
            request = request.continuation_token(token);
        }

        let result = request
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &location))?;

        for obj in result.contents() {
            if let Some(key) = obj.key() {
                objects.push(BlobMetadata {
                    key: key.to_string(),
                    size: content_length(obj.size()),
                    content_type: None,
                    etag: obj.e_tag().map(str::to_string),
                });
            }
        }

        if result.is_truncated() == Some(true) {
            continuation_token = result.next_continuation_token().map(|s| s.to_string());
        } else {
            break;
        }
    }

    objects.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(objects)
}

// =============================================================================
// Blob Store
// =============================================================================

/// Blob store over an S3 bucket. Keys map one-to-one to object keys.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    identifier: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        let bucket = bucket.into();
        let identifier = format!("s3://{}", bucket);
        Self {
            client,
            bucket,
            identifier,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, data: Bytes, options: PutOptions) -> Result<(), IoError> {
        debug!(key = key, size = data.len(), "Writing blob");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .set_content_type(options.content_type)
            .set_cache_control(options.cache_control)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &self.location(key)))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<BlobObject>, IoError> {
        let location = self.location(key);
        let resp = match found(
            self.client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| map_sdk_error(e, &location)),
        )? {
            Some(resp) => resp,
            None => return Ok(None),
        };

        let content_type = resp.content_type().map(str::to_string);
        let etag = resp.e_tag().map(str::to_string);

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| IoError::Connection(e.to_string()))?
            .into_bytes();

        Ok(Some(BlobObject {
            metadata: BlobMetadata {
                key: key.to_string(),
                size: data.len() as u64,
                content_type,
                etag,
            },
            data,
        }))
    }

    async fn head(&self, key: &str) -> Result<Option<BlobMetadata>, IoError> {
        let location = self.location(key);
        let head = found(
            self.client
                .head_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| map_sdk_error(e, &location)),
        )?;

        Ok(head.map(|h| BlobMetadata {
            key: key.to_string(),
            size: content_length(h.content_length()),
            content_type: h.content_type().map(str::to_string),
            etag: h.e_tag().map(str::to_string),
        }))
    }

    async fn delete(&self, key: &str) -> Result<(), IoError> {
        debug!(key = key, "Deleting blob");
        let result = self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &self.location(key)));
        found(result).map(|_| ())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobMetadata>, IoError> {
        list_all(&self.client, &self.bucket, prefix).await
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

// =============================================================================
// Metadata Store
// =============================================================================

/// Metadata store keeping each value as a JSON object under `prefix`.
#[derive(Clone)]
pub struct S3MetadataStore {
    client: Client,
    bucket: String,
    prefix: String,
    identifier: String,
}

impl S3MetadataStore {
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        let bucket = bucket.into();
        let prefix = prefix.into();
        let identifier = format!("s3://{}/{}", bucket, prefix);
        Self {
            client,
            bucket,
            prefix,
            identifier,
        }
    }

    /// Object key holding the value for `key`.
    pub fn object_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, self.object_key(key))
    }
}

#[async_trait]
impl MetadataStore for S3MetadataStore {
    async fn get(&self, key: &str) -> Result<Option<String>, IoError> {
        let location = self.location(key);
        let resp = match found(
            self.client
                .get_object()
                .bucket(&self.bucket)
                .key(self.object_key(key))
                .send()
                .await
                .map_err(|e| map_sdk_error(e, &location)),
        )? {
            Some(resp) => resp,
            None => return Ok(None),
        };

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| IoError::Connection(e.to_string()))?
            .into_bytes();

        String::from_utf8(data.to_vec())
            .map(Some)
            .map_err(|_| IoError::S3(format!("{} is not valid UTF-8", location)))
    }

    async fn put(&self, key: &str, value: String) -> Result<(), IoError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .content_type(JSON_CONTENT_TYPE)
            .body(ByteStream::from(value.into_bytes()))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &self.location(key)))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), IoError> {
        let result = self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &self.location(key)));
        found(result).map(|_| ())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, IoError> {
        let objects = list_all(&self.client, &self.bucket, &self.object_key(prefix)).await?;
        Ok(objects
            .into_iter()
            .filter_map(|obj| obj.key.strip_prefix(&self.prefix).map(str::to_string))
            .collect())
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn shared_key_prefix(&self) -> Option<&str> {
        Some(&self.prefix)
    }
}

// =============================================================================
// Client
// =============================================================================

/// Create an S3 client with optional custom endpoint and region.
///
/// Use a custom endpoint for S3-compatible services like MinIO or R2:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), "us-east-1").await;
/// ```
pub async fn create_s3_client(endpoint_url: Option<&str>, region: &str) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    // Custom endpoints generally need path-style addressing
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(endpoint_url.is_some())
        .build();

    Client::from_conf(s3_config)
}
