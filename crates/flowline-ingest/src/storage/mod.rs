use anyhow::{anyhow, Context, Result};
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};
use tracing::{debug, info, instrument};

pub mod config;

/// Thin client over the pipeline's object store
///
/// Every method takes the bucket explicitly because events carry the
/// bucket name on the wire; the store itself holds only the connection.
#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
}

impl ObjectStore {
    pub async fn new(config: config::StorageConfig) -> Result<Self> {
        debug!("Initializing object store with config: {:?}", config);

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "flowline-storage",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!("Object store client initialized");

        Ok(Self { client })
    }

    #[instrument(skip(self, data))]
    pub async fn upload(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<UploadResult> {
        let checksum = calculate_sha256(&data);
        let size = data.len() as i64;

        debug!("Uploading {} bytes to s3://{}/{}", size, bucket, key);

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .context("Failed to upload object")?;

        info!("Successfully uploaded s3://{}/{}", bucket, key);

        Ok(UploadResult {
            key: key.to_string(),
            checksum,
            size,
        })
    }

    #[instrument(skip(self))]
    pub async fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        debug!("Downloading s3://{}/{}", bucket, key);

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .context(format!("Failed to download object: {}", key))?;

        let data = response
            .body
            .collect()
            .await
            .context("Failed to read object body")?
            .into_bytes()
            .to_vec();

        debug!("Downloaded {} bytes from s3://{}/{}", data.len(), bucket, key);

        Ok(data)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        debug!("Deleting s3://{}/{}", bucket, key);

        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .context(format!("Failed to delete object: {}", key))?;

        info!("Successfully deleted s3://{}/{}", bucket, key);

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn copy(&self, bucket: &str, source_key: &str, dest_key: &str) -> Result<()> {
        debug!(
            "Copying s3://{}/{} to s3://{}/{}",
            bucket, source_key, bucket, dest_key
        );

        let copy_source = format!("{}/{}", bucket, source_key);

        self.client
            .copy_object()
            .bucket(bucket)
            .copy_source(&copy_source)
            .key(dest_key)
            .send()
            .await
            .context("Failed to copy object")?;

        info!(
            "Successfully copied s3://{}/{} to s3://{}/{}",
            bucket, source_key, bucket, dest_key
        );

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.to_string().contains("NotFound") || e.to_string().contains("404") {
                    Ok(false)
                } else {
                    Err(anyhow!("Failed to check object existence: {}", e))
                }
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        debug!("Listing objects in s3://{}/{}", bucket, prefix);

        let response = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .send()
            .await
            .context("Failed to list objects")?;

        let keys = response
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(|k| k.to_string()))
            .collect();

        Ok(keys)
    }

    /// Create a zero-byte delimiter object so the prefix shows up as a
    /// directory in console listings.
    #[instrument(skip(self))]
    pub async fn create_prefix(&self, bucket: &str, prefix: &str) -> Result<()> {
        let key = format!("{}/", prefix.trim_end_matches('/'));
        self.upload(bucket, &key, Vec::new()).await?;
        Ok(())
    }

    /// Delete every object in the bucket. Used only by the provisioning
    /// teardown path.
    #[instrument(skip(self))]
    pub async fn purge(&self, bucket: &str) -> Result<usize> {
        let keys = self.list(bucket, "").await?;
        let count = keys.len();

        for key in &keys {
            self.delete(bucket, key).await?;
        }

        info!("Purged {} objects from s3://{}", count, bucket);

        Ok(count)
    }
}

/// Build the object key for a file under a location tag
pub fn object_key(location: &str, file_name: &str) -> String {
    format!("{}/{}", location.trim_end_matches('/'), file_name)
}

#[derive(Debug, Clone)]
pub struct UploadResult {
    pub key: String,
    pub checksum: String,
    pub size: i64,
}

fn calculate_sha256(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key() {
        assert_eq!(object_key("stage", "sales.csv"), "stage/sales.csv");
        assert_eq!(object_key("archive/", "sales.csv"), "archive/sales.csv");
    }

    #[test]
    fn test_calculate_sha256() {
        let checksum = calculate_sha256(b"Hello, Storage!");
        assert_eq!(checksum.len(), 64);
        assert!(checksum.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
