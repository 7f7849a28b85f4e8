use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::warn;
use url::Url;

use crate::app::error::{ServiceError, ServiceResult};
use crate::app::store::ImageStore;
use crate::config::AppConfig;

/// S3-compatible bucket holding post images. Objects are addressed
/// path-style under the public endpoint.
#[derive(Clone)]
pub struct ObjectStorage {
    client: Client,
    bucket: String,
    public_base: Url,
}

impl ObjectStorage {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let endpoint = config
            .s3_endpoint
            .clone()
            .ok_or_else(|| anyhow!("S3_ENDPOINT is required for object storage"))?;
        let bucket = config
            .s3_bucket
            .clone()
            .ok_or_else(|| anyhow!("S3_BUCKET is required for object storage"))?;

        let region_provider = RegionProviderChain::first_try(Region::new(config.s3_region.clone()));
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config)
            .region(shared_config.region().cloned())
            .endpoint_url(endpoint.clone())
            .force_path_style(true);
        if let Some(provider) = shared_config.credentials_provider() {
            s3_builder = s3_builder.credentials_provider(provider);
        }
        let client = Client::from_conf(s3_builder.build());

        let public_endpoint = config.s3_public_endpoint.as_deref().unwrap_or(&endpoint);
        let public_base = parse_endpoint(public_endpoint)?;

        Ok(Self {
            client,
            bucket,
            public_base,
        })
    }

    pub fn public_url(&self, key: &str) -> Result<String> {
        object_url(&self.public_base, &self.bucket, key)
    }
}

#[async_trait]
impl ImageStore for ObjectStorage {
    async fn put_image(
        &self,
        key: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> ServiceResult<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|err| {
                warn!(error = ?err, key, "failed to upload image");
                ServiceError::transient("object storage unavailable")
            })?;

        Ok(self.public_url(key)?)
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = if endpoint.contains("://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };
    Ok(url)
}

fn object_url(base: &Url, bucket: &str, key: &str) -> Result<String> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("object storage endpoint cannot be a base url"))?
        .pop_if_empty()
        .push(bucket)
        .extend(key.split('/'));
    Ok(url.to_string())
}
