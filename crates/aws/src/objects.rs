use std::sync::Arc;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tag_inventory_storage::{
    ObjectStore, ObjectStoreConnector, ObjectStoreError, PutObject, TemporaryCredentials,
};
use tracing::debug;
use urlencoding::encode;

use crate::classify::classify;

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        S3ObjectStore { client }
    }
}

/// `CopySource` is `bucket/key` with each key segment URL-encoded; `/` stays literal.
fn copy_source(bucket: &str, key: &str) -> String {
    let key = key
        .split('/')
        .map(encode)
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", bucket, key)
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, object: PutObject) -> Result<(), ObjectStoreError> {
        let size = object.body.len();
        self.client
            .put_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .body(ByteStream::from(object.body))
            .set_content_type(object.content_type)
            .set_checksum_sha256(object.checksum_sha256)
            .send()
            .await
            .map_err(|err| classify(&err).into_object_error(&object.bucket, &object.key))?;
        debug!(bucket = %object.bucket, key = %object.key, bytes = size, "object written");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify(&err).into_object_error(bucket, key))?;
        let body = output
            .body
            .collect()
            .await
            .map_err(|err| ObjectStoreError::Other(format!("reading s3://{}/{}: {}", bucket, key, err)))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn copy(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<(), ObjectStoreError> {
        self.client
            .copy_object()
            .copy_source(copy_source(src_bucket, src_key))
            .bucket(dst_bucket)
            .key(dst_key)
            .send()
            .await
            .map_err(|err| classify(&err).into_object_error(src_bucket, src_key))?;
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify(&err).into_object_error(bucket, key))?;
        Ok(())
    }

    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, ObjectStoreError> {
        let mut keys = Vec::new();
        let mut continuation = None;
        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(continuation)
                .send()
                .await
                .map_err(|err| classify(&err).into_object_error(bucket, prefix))?;
            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(str::to_string),
            );
            match output.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Builds S3 stores, optionally bound to assumed-role credentials.
#[derive(Clone)]
pub struct S3Connector {
    sdk: SdkConfig,
}

impl S3Connector {
    pub fn new(sdk: &SdkConfig) -> Self {
        S3Connector { sdk: sdk.clone() }
    }
}

#[async_trait]
impl ObjectStoreConnector for S3Connector {
    async fn connect(
        &self,
        credentials: Option<&TemporaryCredentials>,
    ) -> Result<Arc<dyn ObjectStore>, ObjectStoreError> {
        let mut builder = aws_sdk_s3::config::Builder::from(&self.sdk);
        if let Some(creds) = credentials {
            builder = builder.credentials_provider(Credentials::new(
                creds.access_key_id.clone(),
                creds.secret_access_key.clone(),
                Some(creds.session_token.clone()),
                creds.expiration,
                "tag-inventory-assumed-role",
            ));
        }
        Ok(Arc::new(S3ObjectStore::new(Client::from_conf(builder.build()))))
    }
}
