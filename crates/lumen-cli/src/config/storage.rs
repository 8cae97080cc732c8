//! Object storage connection configuration.

use clap::Args;
use lumen_object::providers::S3Credentials;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// S3 connection settings.
///
/// Credentials left unset fall back to the ambient AWS environment
/// (`AWS_ACCESS_KEY_ID`, instance profiles, ...).
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct StorageConfig {
    /// AWS region of the bucket.
    #[arg(long = "s3-region", env = "S3_REGION", default_value = "us-east-1")]
    pub s3_region: String,

    /// Endpoint of an S3-compatible service such as MinIO.
    #[arg(long = "s3-endpoint", env = "S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// Static access key ID.
    #[arg(long = "s3-access-key-id", env = "S3_ACCESS_KEY_ID")]
    pub s3_access_key_id: Option<String>,

    /// Static secret access key.
    #[arg(long = "s3-secret-access-key", env = "S3_SECRET_ACCESS_KEY", hide_env_values = true)]
    #[serde(skip_serializing)]
    pub s3_secret_access_key: Option<String>,

    /// Session token for temporary credentials.
    #[arg(long = "s3-session-token", env = "S3_SESSION_TOKEN", hide_env_values = true)]
    #[serde(skip_serializing)]
    pub s3_session_token: Option<String>,
}

impl StorageConfig {
    /// Builds provider credentials for `bucket`.
    pub fn credentials(&self, bucket: &str) -> S3Credentials {
        S3Credentials {
            region: self.s3_region.clone(),
            endpoint: self.s3_endpoint.clone(),
            access_key_id: self.s3_access_key_id.clone(),
            secret_access_key: self.s3_secret_access_key.clone(),
            session_token: self.s3_session_token.clone(),
            ..S3Credentials::new(bucket)
        }
    }

    /// Logs the storage configuration (no secrets).
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            region = %self.s3_region,
            endpoint = ?self.s3_endpoint,
            static_keys = self.s3_access_key_id.is_some(),
            "storage configuration"
        );
    }
}
