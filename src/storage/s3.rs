// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use futures_util::future::BoxFuture;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use super::ObjectStore;
use crate::archive::ArchiveFormat;
use crate::config::types::StorageConfig;
use crate::error::{Result, UploadError, bail_out};

/// Error codes meaning the credentials were refused.
const AUTH_CODES: &[&str] = &[
    "AccessDenied",
    "AllAccessDisabled",
    "ExpiredToken",
    "InvalidAccessKeyId",
    "InvalidToken",
    "SignatureDoesNotMatch",
];

/// Error codes meaning a size or rate limit was hit.
const QUOTA_CODES: &[&str] = &[
    "EntityTooLarge",
    "QuotaExceeded",
    "ServiceUnavailable",
    "SlowDown",
    "TooManyBuckets",
];

/// Archives larger than this are uploaded in parts.
pub const MULTIPART_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Preferred part size; grows for files that would exceed [`MAX_PARTS`].
pub const PART_SIZE: u64 = 64 * 1024 * 1024;

/// Most parts S3 accepts for one upload.
pub const MAX_PARTS: usize = 10_000;

#[must_use]
pub const fn uses_multipart(length: u64) -> bool {
    length > MULTIPART_THRESHOLD
}

/// `(part number, offset, length)` for every part of a `length`-byte file.
///
/// Part numbers start at 1; all parts but the last have the same size.
#[must_use]
pub fn part_ranges(length: u64) -> Vec<(i32, u64, u64)> {
    let part_size = PART_SIZE.max(length.div_ceil(MAX_PARTS as u64));
    (0..length.div_ceil(part_size))
        .zip(1..)
        .map(|(index, number)| {
            let offset = index * part_size;
            (number, offset, part_size.min(length - offset))
        })
        .collect()
}

/// Maps an S3 failure onto the upload taxonomy.
///
/// `transport` is true when no response was received (dispatch failure or
/// timeout). Error codes take precedence over HTTP status.
#[must_use]
pub fn classify_upload_failure(
    key: &str,
    code: Option<&str>,
    status: Option<u16>,
    transport: bool,
    message: String,
) -> UploadError {
    let key = key.to_string();
    if transport {
        return UploadError::Network { key, message };
    }
    match (code, status) {
        (Some(code), _) if AUTH_CODES.contains(&code) => UploadError::Auth { key, message },
        (Some(code), _) if QUOTA_CODES.contains(&code) => UploadError::Quota { key, message },
        (_, Some(401 | 403)) => UploadError::Auth { key, message },
        (_, Some(413 | 429 | 503)) => UploadError::Quota { key, message },
        _ => UploadError::Rejected { key, message },
    }
}

/// Amazon S3 or an S3-compatible store.
pub struct S3Store {
    client: S3Client,
    bucket: String,
}

impl S3Store {
    /// Builds a client from the storage section.
    ///
    /// Static credentials win over the default provider chain; a named
    /// profile selects the shared-config profile. A custom endpoint switches
    /// to path-style addressing.
    ///
    /// # Errors
    ///
    /// Returns an error if no bucket is configured.
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        if config.bucket.trim().is_empty() {
            return Err(bail_out("storage.bucket is required for the s3 backend").into());
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if !config.region.is_empty() {
            loader = loader.region(Region::new(config.region.clone()));
        }
        if !config.profile.is_empty() {
            loader = loader.profile_name(&config.profile);
        }
        if let Some((access_key_id, secret_access_key)) = config.static_credentials() {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "repo2s3-config",
            ));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if !config.endpoint_url.is_empty() {
            builder = builder
                .endpoint_url(&config.endpoint_url)
                .force_path_style(true);
        }

        info!(
            bucket = %config.bucket,
            region = ?shared.region().map(ToString::to_string),
            endpoint = %config.endpoint_url,
            "s3 store ready"
        );

        Ok(Self {
            client: S3Client::from_conf(builder.build()),
            bucket: config.bucket.trim().to_string(),
        })
    }

    async fn upload(&self, local: &Path, key: &str) -> std::result::Result<u64, UploadError> {
        let metadata = tokio::fs::metadata(local)
            .await
            .map_err(|_| UploadError::MissingFile(local.display().to_string()))?;
        let length = metadata.len();
        let content_type = ArchiveFormat::from_file_name(key)
            .map_or("application/octet-stream", ArchiveFormat::content_type);

        if uses_multipart(length) {
            self.upload_multipart(local, key, length, content_type)
                .await?;
            return Ok(length);
        }

        let body = ByteStream::from_path(local)
            .await
            .map_err(|e| rejected(key, &e))?;

        debug!(bucket = %self.bucket, key, bytes = length, "put object");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(i64::try_from(length).unwrap_or(i64::MAX))
            .body(body)
            .send()
            .await
            .map_err(|err| classify_sdk_error(key, &err))?;

        Ok(length)
    }

    /// Uploads in parts; an incomplete upload is aborted so no parts linger.
    async fn upload_multipart(
        &self,
        local: &Path,
        key: &str,
        length: u64,
        content_type: &str,
    ) -> std::result::Result<(), UploadError> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|err| classify_sdk_error(key, &err))?;
        let upload_id = created
            .upload_id()
            .ok_or_else(|| UploadError::Rejected {
                key: key.to_string(),
                message: "no upload id in CreateMultipartUpload response".to_string(),
            })?
            .to_string();

        debug!(bucket = %self.bucket, key, bytes = length, %upload_id, "multipart upload");
        let result = match self.upload_parts(local, key, length, &upload_id).await {
            Ok(parts) => self
                .client
                .complete_multipart_upload()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(&upload_id)
                .multipart_upload(
                    CompletedMultipartUpload::builder()
                        .set_parts(Some(parts))
                        .build(),
                )
                .send()
                .await
                .map(|_| ())
                .map_err(|err| classify_sdk_error(key, &err)),
            Err(err) => Err(err),
        };

        if result.is_err()
            && let Err(err) = self
                .client
                .abort_multipart_upload()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(&upload_id)
                .send()
                .await
        {
            warn!(
                key,
                %upload_id,
                error = %aws_sdk_s3::error::DisplayErrorContext(&err),
                "failed to abort multipart upload"
            );
        }
        result
    }

    async fn upload_parts(
        &self,
        local: &Path,
        key: &str,
        length: u64,
        upload_id: &str,
    ) -> std::result::Result<Vec<CompletedPart>, UploadError> {
        let mut file = tokio::fs::File::open(local)
            .await
            .map_err(|_| UploadError::MissingFile(local.display().to_string()))?;

        let ranges = part_ranges(length);
        let mut parts = Vec::with_capacity(ranges.len());
        for (number, offset, size) in ranges {
            let mut buffer = vec![0_u8; usize::try_from(size).map_err(|e| rejected(key, &e))?];
            file.read_exact(&mut buffer)
                .await
                .map_err(|e| rejected(key, &e))?;

            debug!(key, part = number, offset, bytes = size, "upload part");
            let uploaded = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(number)
                .content_length(i64::try_from(size).unwrap_or(i64::MAX))
                .body(ByteStream::from(buffer))
                .send()
                .await
                .map_err(|err| classify_sdk_error(key, &err))?;

            parts.push(
                CompletedPart::builder()
                    .part_number(number)
                    .set_e_tag(uploaded.e_tag().map(str::to_string))
                    .build(),
            );
        }
        Ok(parts)
    }
}

fn rejected(key: &str, err: &impl std::fmt::Display) -> UploadError {
    UploadError::Rejected {
        key: key.to_string(),
        message: err.to_string(),
    }
}

fn classify_sdk_error<E>(key: &str, err: &SdkError<E, HttpResponse>) -> UploadError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let transport = matches!(
        err,
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)
    );
    let status = err.raw_response().map(|r| r.status().as_u16());
    let message = err.message().map_or_else(
        || aws_sdk_s3::error::DisplayErrorContext(err).to_string(),
        str::to_string,
    );
    classify_upload_failure(key, err.code(), status, transport, message)
}

impl ObjectStore for S3Store {
    fn put_file<'a>(
        &'a self,
        local: &'a Path,
        key: &'a str,
    ) -> BoxFuture<'a, std::result::Result<u64, UploadError>> {
        Box::pin(self.upload(local, key))
    }

    fn location(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}
