//! S3 object-store backend.
//!
//! Listing is paginated with continuation tokens. Writes always go through a
//! multipart upload so the part-sizing ladder applies uniformly: start at
//! 5 MiB and double until the object fits in 10 000 parts, then clip into
//! the service's hard part-size limits. Cold-tier objects are written with a
//! configurable storage class and retrieved with `RestoreObject`.

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    CompletedMultipartUpload, CompletedPart, GlacierJobParameters, RestoreRequest, StorageClass,
    Tier,
};
use aws_sdk_s3::Client as S3Client;
use aws_types::region::Region;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::config::{ConnectOptions, RestoreSpec, Secrets, DEFAULT_STORAGE_CLASS};
use crate::endpoint::{ByteStreamReader, Endpoint, ObjectMeta};
use crate::entry::Entry;
use crate::error::{StoreError, StoreResult};

/// Smallest part the service accepts (all but the last part).
const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;
/// Largest part the service accepts.
const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;
/// Most parts one upload may have.
const MAX_PARTS: u64 = 10_000;
/// Largest single object the service accepts.
const MAX_OBJECT_SIZE: u64 = 5 * 1024 * 1024 * 1024 * 1024;

/// Endpoint over one bucket + key prefix.
pub struct S3Endpoint {
    client: S3Client,
    bucket: String,
    prefix: String,
    storage_class: StorageClass,
    restore_spec: RestoreSpec,
}

impl S3Endpoint {
    /// Builds a client from static secrets. An `endpoint` in the secrets
    /// file redirects to a custom service (MinIO) with path-style keys.
    pub fn new(
        bucket: String,
        prefix: String,
        secrets: &Secrets,
        opts: &ConnectOptions,
    ) -> StoreResult<Self> {
        let access_key_id = secrets
            .access_key_id
            .as_deref()
            .ok_or_else(|| missing_secret("accessKeyId"))?;
        let secret_access_key = secrets
            .secret_access_key
            .as_deref()
            .ok_or_else(|| missing_secret("secretAccessKey"))?;
        let region = secrets
            .region
            .as_deref()
            .ok_or_else(|| missing_secret("region"))?;

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            secrets.session_token.clone(),
            None,
            "permafrost-secrets",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .behavior_version_latest();
        if let Some(endpoint) = &secrets.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = S3Client::from_conf(builder.build());

        let storage_class = StorageClass::from(
            opts.storage_class
                .as_deref()
                .unwrap_or(DEFAULT_STORAGE_CLASS),
        );

        Ok(Self {
            client,
            bucket,
            prefix: prefix.trim_matches('/').to_string(),
            storage_class,
            restore_spec: opts.restore_request.clone().unwrap_or_default(),
        })
    }

    /// Object key for a relative path.
    fn key_for(&self, path: &str) -> String {
        if self.prefix.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", self.prefix, path)
        }
    }

    /// Relative path for an object key: prefix stripped, leading `/` removed.
    fn relative_path(&self, key: &str) -> String {
        let stripped = if self.prefix.is_empty() {
            key
        } else {
            key.strip_prefix(self.prefix.as_str()).unwrap_or(key)
        };
        stripped.trim_start_matches('/').to_string()
    }

    async fn upload_parts(
        &self,
        key: &str,
        upload_id: &str,
        data: &mut ByteStreamReader,
        part_size: u64,
    ) -> StoreResult<Vec<CompletedPart>> {
        let mut parts = Vec::new();
        let mut part_number = 1i32;
        loop {
            let mut buf = Vec::new();
            (&mut *data).take(part_size).read_to_end(&mut buf).await?;
            // A zero-byte object still needs one (empty) part so the upload
            // can be completed.
            if buf.is_empty() && part_number > 1 {
                break;
            }
            let len = buf.len();
            let resp = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(buf))
                .send()
                .await
                .map_err(|e| {
                    StoreError::S3(format!("upload failed for {key} part {part_number}: {e}"))
                })?;
            debug!("uploaded part {part_number} ({len} bytes) of {key}");
            parts.push(
                CompletedPart::builder()
                    .set_e_tag(resp.e_tag().map(str::to_string))
                    .part_number(part_number)
                    .build(),
            );
            if (len as u64) < part_size {
                break;
            }
            part_number += 1;
        }
        Ok(parts)
    }
}

fn missing_secret(field: &str) -> StoreError {
    StoreError::Config(format!("s3 endpoint requires {field} in the secrets file"))
}

/// Picks a part size so the object fits in the part-count limit.
fn choose_part_size(size: u64) -> u64 {
    let mut part_size = MIN_PART_SIZE;
    while size.div_ceil(part_size) > MAX_PARTS {
        part_size *= 2;
        info!("Increasing part size to {part_size} bytes");
    }
    if part_size > MAX_PART_SIZE {
        info!("Clipping part size down to {MAX_PART_SIZE} bytes");
        part_size = MAX_PART_SIZE;
    }
    if part_size < MIN_PART_SIZE {
        info!("Clipping part size up to {MIN_PART_SIZE} bytes");
        part_size = MIN_PART_SIZE;
    }
    part_size
}

#[async_trait]
impl Endpoint for S3Endpoint {
    fn describe(&self) -> String {
        if self.prefix.is_empty() {
            format!("s3://{}", self.bucket)
        } else {
            format!("s3://{}/{}", self.bucket, self.prefix)
        }
    }

    async fn list(&self) -> StoreResult<Vec<Entry>> {
        let mut entries = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let mut req = self.client.list_objects_v2().bucket(&self.bucket);
            if !self.prefix.is_empty() {
                req = req.prefix(&self.prefix);
            }
            if let Some(t) = &token {
                req = req.continuation_token(t);
            }
            let resp = req.send().await.map_err(|e| {
                StoreError::S3(format!("list failed for {}: {e}", self.describe()))
            })?;

            for obj in resp.contents() {
                let Some(key) = obj.key() else { continue };
                let path = self.relative_path(key);
                // Directory markers and the bare prefix itself are not files.
                if path.is_empty() || path.ends_with('/') {
                    continue;
                }
                let mtime_ms = match obj.last_modified() {
                    Some(t) => t.to_millis().map_err(|e| {
                        StoreError::S3(format!("bad last-modified for {key}: {e}"))
                    })?,
                    None => 0,
                };
                entries.push(Entry {
                    path,
                    size: obj.size().unwrap_or(0).max(0) as u64,
                    mtime_ms,
                });
            }

            token = resp.next_continuation_token().map(str::to_string);
            if resp.is_truncated() != Some(true) || token.is_none() {
                break;
            }
        }
        Ok(entries)
    }

    async fn size(&self, path: &str) -> StoreResult<u64> {
        let key = self.key_for(path);
        let resp = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| StoreError::S3(format!("head failed for {key}: {e}")))?;
        Ok(resp.content_length().unwrap_or(0).max(0) as u64)
    }

    async fn read(&self, path: &str) -> StoreResult<ByteStreamReader> {
        let key = self.key_for(path);
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| StoreError::S3(format!("download failed for {key}: {e}")))?;
        Ok(Box::pin(resp.body.into_async_read()))
    }

    async fn write(&self, path: &str, mut data: ByteStreamReader, size: u64) -> StoreResult<()> {
        let key = self.key_for(path);
        let part_size = choose_part_size(size);

        let create = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(&key)
            .storage_class(self.storage_class.clone())
            .send()
            .await
            .map_err(|e| StoreError::S3(format!("multipart create failed for {key}: {e}")))?;
        let upload_id = create
            .upload_id()
            .ok_or_else(|| StoreError::S3(format!("no upload id returned for {key}")))?
            .to_string();

        let parts = match self.upload_parts(&key, &upload_id, &mut data, part_size).await {
            Ok(parts) => parts,
            Err(e) => {
                if let Err(abort_err) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&self.bucket)
                    .key(&key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    warn!("failed to abort multipart upload for {key}: {abort_err}");
                }
                return Err(e);
            }
        };

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(&key)
            .upload_id(&upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| StoreError::S3(format!("multipart complete failed for {key}: {e}")))?;

        debug!("uploaded {size} bytes to s3://{}/{key}", self.bucket);
        Ok(())
    }

    async fn remove(&self, path: &str) -> StoreResult<()> {
        let key = self.key_for(path);
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| StoreError::S3(format!("delete failed for {key}: {e}")))?;
        Ok(())
    }

    fn is_write_supported(&self, _path: &str, size: u64) -> bool {
        size <= MAX_OBJECT_SIZE
    }

    async fn head(&self, path: &str) -> StoreResult<ObjectMeta> {
        let key = self.key_for(path);
        let resp = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| StoreError::S3(format!("head failed for {key}: {e}")))?;
        Ok(ObjectMeta {
            storage_class: resp.storage_class().map(|c| c.as_str().to_string()),
            restore: resp.restore().map(str::to_string),
        })
    }

    async fn restore(&self, path: &str) -> StoreResult<()> {
        let key = self.key_for(path);
        let job = GlacierJobParameters::builder()
            .tier(Tier::from(
                self.restore_spec.glacier_job_parameters.tier.as_str(),
            ))
            .build()
            .map_err(|e| StoreError::S3(format!("bad restore tier: {e}")))?;
        let request = RestoreRequest::builder()
            .days(self.restore_spec.days)
            .glacier_job_parameters(job)
            .build();
        self.client
            .restore_object()
            .bucket(&self.bucket)
            .key(&key)
            .restore_request(request)
            .send()
            .await
            .map_err(|e| StoreError::S3(format!("restore failed for {key}: {e}")))?;
        Ok(())
    }
}
