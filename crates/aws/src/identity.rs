use std::time::SystemTime;

use async_trait::async_trait;
use aws_sdk_sts::Client;
use tag_inventory_storage::{IdentityError, RoleAssumer, TemporaryCredentials};
use tracing::info;

use crate::classify::classify;

#[derive(Clone)]
pub struct StsRoleAssumer {
    client: Client,
}

impl StsRoleAssumer {
    pub fn new(client: Client) -> Self {
        StsRoleAssumer { client }
    }
}

#[async_trait]
impl RoleAssumer for StsRoleAssumer {
    async fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> Result<TemporaryCredentials, IdentityError> {
        let output = self
            .client
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(session_name)
            .send()
            .await
            .map_err(|err| classify(&err).into_identity_error(role_arn))?;
        let creds = output
            .credentials()
            .ok_or_else(|| IdentityError::Other(format!("no credentials returned for {}", role_arn)))?;
        info!(role = role_arn, session = session_name, "role assumed");
        Ok(TemporaryCredentials {
            access_key_id: creds.access_key_id().to_string(),
            secret_access_key: creds.secret_access_key().to_string(),
            session_token: creds.session_token().to_string(),
            expiration: SystemTime::try_from(*creds.expiration()).ok(),
        })
    }
}
