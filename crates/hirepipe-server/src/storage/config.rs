use serde::{Deserialize, Serialize};
use std::env;

/// Bucket holding table backups unless `S3_BUCKET` says otherwise.
pub const DEFAULT_BACKUP_BUCKET: &str = "data-pipeline-backup-gb";

/// Bucket holding the CSV exports unless `MIGRATION_S3_BUCKET` says otherwise.
pub const DEFAULT_MIGRATION_BUCKET: &str = "data-pipeline-migration-gb";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    #[serde(skip_serializing)]
    pub secret_key: String,
    pub path_style: bool,
}

impl StorageConfig {
    /// Backup bucket settings from the environment
    pub fn from_env() -> anyhow::Result<Self> {
        let access_key = env::var("S3_ACCESS_KEY")
            .or_else(|_| env::var("AWS_ACCESS_KEY_ID"))
            .map_err(|_| anyhow::anyhow!("S3_ACCESS_KEY or AWS_ACCESS_KEY_ID must be set"))?;
        let secret_key = env::var("S3_SECRET_KEY")
            .or_else(|_| env::var("AWS_SECRET_ACCESS_KEY"))
            .map_err(|_| anyhow::anyhow!("S3_SECRET_KEY or AWS_SECRET_ACCESS_KEY must be set"))?;

        Ok(Self {
            endpoint: env::var("S3_ENDPOINT").ok(),
            region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .unwrap_or_else(|_| "us-east-1".to_string()),
            bucket: env::var("S3_BUCKET").unwrap_or_else(|_| DEFAULT_BACKUP_BUCKET.to_string()),
            access_key,
            secret_key,
            path_style: env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        })
    }

    /// Same credentials, pointed at the CSV migration bucket
    pub fn migration_from_env() -> anyhow::Result<Self> {
        let bucket = env::var("MIGRATION_S3_BUCKET")
            .unwrap_or_else(|_| DEFAULT_MIGRATION_BUCKET.to_string());
        Ok(Self::from_env()?.with_bucket(bucket))
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn for_minio(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            region: "us-east-1".to_string(),
            bucket: bucket.into(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            path_style: true,
        }
    }
}
