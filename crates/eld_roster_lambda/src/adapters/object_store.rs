use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;

/// Snapshot object storage: get/put by fixed name, uploads always overwrite.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn download(&self, name: &str) -> Result<Vec<u8>, StoreError>;
    async fn upload(&self, name: &str, body: &[u8]) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound { name: String },
    Io(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "object not found: {name}"),
            Self::Io(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for StoreError {}

/// S3-backed snapshot store. All run artifacts live in one flat bucket.
#[derive(Debug, Clone)]
pub struct S3SnapshotStore {
    bucket: String,
    s3_client: aws_sdk_s3::Client,
}

impl S3SnapshotStore {
    pub fn new(bucket: impl Into<String>, s3_client: aws_sdk_s3::Client) -> Self {
        Self {
            bucket: bucket.into(),
            s3_client,
        }
    }
}

#[async_trait]
impl SnapshotStore for S3SnapshotStore {
    async fn download(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let output = match self
            .s3_client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
        {
            Ok(output) => output,
            Err(error) => {
                let service_error = error.into_service_error();
                if service_error.is_no_such_key() {
                    return Err(StoreError::NotFound {
                        name: name.to_string(),
                    });
                }
                return Err(StoreError::Io(format!(
                    "failed to read object from s3: {service_error}"
                )));
            }
        };

        let data = output
            .body
            .collect()
            .await
            .map_err(|error| StoreError::Io(format!("failed to stream object body: {error}")))?;
        Ok(data.into_bytes().to_vec())
    }

    async fn upload(&self, name: &str, body: &[u8]) -> Result<(), StoreError> {
        self.s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .content_type("application/json")
            .body(ByteStream::from(body.to_vec()))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| StoreError::Io(format!("failed to write object to s3: {error}")))
    }
}
