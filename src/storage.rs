use anyhow::Context;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::{config::Region, Client};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use tracing::debug;

use crate::config::MediaConfig;

/// Object store that keeps uploaded user media.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    /// Publicly reachable URL for an object key.
    fn public_url(&self, key: &str) -> String;
}

/// S3/MinIO bucket holding avatars and cover images.
#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
    base_url: String,
}

impl Storage {
    pub async fn connect(cfg: &MediaConfig) -> anyhow::Result<Self> {
        let client = media_client(cfg).await;
        debug!(endpoint = %cfg.endpoint, bucket = %cfg.bucket, "media bucket configured");
        Ok(Self {
            client,
            bucket: cfg.bucket.clone(),
            base_url: cfg.public_url.trim_end_matches('/').to_string(),
        })
    }
}

// MinIO needs path-style addressing and static keys.
async fn media_client(cfg: &MediaConfig) -> Client {
    let creds = Credentials::new(&cfg.access_key, &cfg.secret_key, None, None, "media-config");
    let sdk = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(cfg.region.clone()))
        .credentials_provider(creds)
        .load()
        .await;
    let s3 = aws_sdk_s3::config::Builder::from(&sdk)
        .endpoint_url(&cfg.endpoint)
        .force_path_style(true)
        .build();
    Client::from_conf(s3)
}

fn object_url(base: &str, key: &str) -> String {
    format!("{}/{}", base, key.trim_start_matches('/'))
}

#[async_trait]
impl StorageClient for Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        let len = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .with_context(|| format!("storing {key} in {}", self.bucket))?;
        debug!(key, len, "media stored");
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("deleting {key} from {}", self.bucket))?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        object_url(&self.base_url, key)
    }
}
