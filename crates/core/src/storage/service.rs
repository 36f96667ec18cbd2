//! Storage service implementation using Apache OpenDAL.

use bytes::Bytes;
use opendal::{Operator, services};
use tracing::warn;
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Total write attempts: one initial try plus two retries on
/// transient failures.
const MAX_UPLOAD_ATTEMPTS: u32 = 3;

/// Storage service for uploaded media.
///
/// Accepts a binary blob plus a target namespace and returns the
/// permanent public URL of the stored object. A single terminal
/// success or failure is surfaced to callers regardless of internal
/// retries.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
        }
    }

    /// Validate an upload against config constraints.
    ///
    /// Runs before any bytes are transmitted: only declared image
    /// content types within the size cap are accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is too large or not an image.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }

        if !content_type.starts_with("image/") {
            return Err(StorageError::not_an_image(content_type));
        }

        Ok(())
    }

    /// Generate the object key for an upload.
    ///
    /// Format: `{namespace}/{uuid}/{sanitized_filename}`. The UUID
    /// segment keeps colliding filenames from overwriting each other.
    #[must_use]
    pub fn generate_object_key(namespace: &str, filename: &str) -> String {
        format!(
            "{}/{}/{}",
            namespace,
            Uuid::new_v4(),
            sanitize_filename(filename)
        )
    }

    /// Upload a blob and return its permanent public URL.
    ///
    /// Transient provider failures are retried up to two times before
    /// the terminal error is surfaced.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the write does not
    /// succeed within the retry budget.
    pub async fn upload(
        &self,
        blob: Bytes,
        namespace: &str,
        filename: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.validate_upload(content_type, blob.len() as u64)?;

        let key = Self::generate_object_key(namespace, filename);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .operator
                .write_with(&key, blob.clone())
                .content_type(content_type)
                .await
            {
                Ok(_) => return Ok(self.public_url(&key)),
                Err(e) if Self::should_retry(&e, attempt) => {
                    warn!(key = %key, attempt, error = %e, "transient storage failure, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Whether a failed write attempt is retried.
    ///
    /// Only transient provider errors are retried, and only while the
    /// attempt budget is not exhausted; permanent errors surface
    /// immediately.
    fn should_retry(err: &opendal::Error, attempt: u32) -> bool {
        err.is_temporary() && attempt < MAX_UPLOAD_ATTEMPTS
    }

    /// Public URL for a stored object key.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.config.public_base_url.trim_end_matches('/'),
            key
        )
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

/// Sanitize filename for storage key.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service(max_size: u64) -> StorageService {
        let config = StorageConfig::new(
            StorageProvider::local_fs("./test"),
            "https://media.example.com",
        )
        .with_max_file_size(max_size);
        StorageService::from_config(config).expect("should create service")
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("cover.png"), "cover.png");
        assert_eq!(sanitize_filename("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_filename("test@#$%.webp"), "test____.webp");
        assert_eq!(sanitize_filename("日本語.png"), "___.png");
    }

    #[test]
    fn test_generate_object_key() {
        let key = StorageService::generate_object_key("post_thumbnails", "cover.png");
        let parts: Vec<&str> = key.split('/').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "post_thumbnails");
        assert!(Uuid::parse_str(parts[1]).is_ok());
        assert_eq!(parts[2], "cover.png");
    }

    #[test]
    fn test_generate_object_key_unique_per_call() {
        let a = StorageService::generate_object_key("post_thumbnails", "cover.png");
        let b = StorageService::generate_object_key("post_thumbnails", "cover.png");
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_upload_size() {
        let service = test_service(1024);

        assert!(service.validate_upload("image/png", 512).is_ok());

        let err = service.validate_upload("image/png", 2048).unwrap_err();
        assert!(matches!(err, StorageError::FileTooLarge { .. }));
    }

    #[test]
    fn test_validate_upload_rejects_non_images() {
        let service = test_service(StorageConfig::DEFAULT_MAX_FILE_SIZE);

        assert!(service.validate_upload("image/png", 1024).is_ok());
        assert!(service.validate_upload("image/jpeg", 1024).is_ok());

        let err = service.validate_upload("application/pdf", 1024).unwrap_err();
        assert!(matches!(err, StorageError::NotAnImage { .. }));

        let err = service.validate_upload("text/html", 1024).unwrap_err();
        assert!(matches!(err, StorageError::NotAnImage { .. }));
    }

    #[test]
    fn test_public_url_joins_cleanly() {
        let config = StorageConfig::new(
            StorageProvider::local_fs("./test"),
            "https://media.example.com/",
        );
        let service = StorageService::from_config(config).expect("should create service");

        assert_eq!(
            service.public_url("post_thumbnails/abc/cover.png"),
            "https://media.example.com/post_thumbnails/abc/cover.png"
        );
    }

    #[tokio::test]
    async fn test_upload_writes_blob_and_returns_url() {
        let root = std::env::temp_dir().join(format!("inkpost-storage-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&root).expect("create temp root");

        let config = StorageConfig::new(
            StorageProvider::local_fs(&root),
            "https://media.example.com",
        );
        let service = StorageService::from_config(config).expect("should create service");

        let url = service
            .upload(
                Bytes::from_static(b"fake png bytes"),
                "post_thumbnails",
                "cover.png",
                "image/png",
            )
            .await
            .expect("upload should succeed");

        let key = url
            .strip_prefix("https://media.example.com/")
            .expect("url should carry the public base");
        let on_disk = root.join(key);
        assert!(on_disk.exists(), "blob should land under the fs root");

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_should_retry_transient_within_budget() {
        let transient =
            opendal::Error::new(opendal::ErrorKind::Unexpected, "connection reset").set_temporary();

        assert!(StorageService::should_retry(&transient, 1));
        assert!(StorageService::should_retry(&transient, 2));
        // Third attempt is the last one; its failure is terminal.
        assert!(!StorageService::should_retry(&transient, MAX_UPLOAD_ATTEMPTS));
    }

    #[test]
    fn test_should_retry_never_on_permanent_errors() {
        let permanent = opendal::Error::new(opendal::ErrorKind::NotFound, "bucket missing");

        assert!(!StorageService::should_retry(&permanent, 1));
        assert!(!StorageService::should_retry(&permanent, 2));
    }

    #[tokio::test]
    async fn test_upload_surfaces_terminal_provider_failure() {
        let root = std::env::temp_dir().join(format!("inkpost-storage-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&root).expect("create temp root");
        // A regular file where the namespace directory must go makes
        // every write under it fail permanently.
        std::fs::write(root.join("post_thumbnails"), b"in the way").expect("block namespace");

        let config = StorageConfig::new(
            StorageProvider::local_fs(&root),
            "https://media.example.com",
        );
        let service = StorageService::from_config(config).expect("should create service");

        let err = service
            .upload(
                Bytes::from_static(b"fake png bytes"),
                "post_thumbnails",
                "cover.png",
                "image/png",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Operation(_)));
        assert!(!err.is_validation());

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn test_upload_rejects_before_any_write() {
        let root = std::env::temp_dir().join(format!("inkpost-storage-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&root).expect("create temp root");

        let config = StorageConfig::new(
            StorageProvider::local_fs(&root),
            "https://media.example.com",
        );
        let service = StorageService::from_config(config).expect("should create service");

        let err = service
            .upload(
                Bytes::from_static(b"%PDF-1.4"),
                "post_thumbnails",
                "doc.pdf",
                "application/pdf",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotAnImage { .. }));

        // Nothing may reach the provider on validation failure.
        let entries: Vec<_> = std::fs::read_dir(&root).expect("read temp root").collect();
        assert!(entries.is_empty());

        std::fs::remove_dir_all(&root).ok();
    }
}
