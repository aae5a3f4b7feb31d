//! tag-inventory-aws: the collaborator traits backed by the AWS SDK.
//!
//! | trait | service |
//! |---|---|
//! | `ResourceSearch`, `IndexAdmin` | Resource Explorer |
//! | `ObjectStore`, `ObjectStoreConnector` | S3 |
//! | `QueryEngine` | Athena |
//! | `RoleAssumer` | STS |
//! | `Notifier` | SNS |
//!
//! SDK errors are classified once, in [`classify`], into the storage crate's
//! error kinds. Nothing here retries; the SDK's own retry layer is left at its
//! defaults and anything that still fails is surfaced to the caller.

mod classify;
mod document;
mod identity;
mod index;
mod notify;
mod objects;
mod query;
mod regional;
mod search;

pub use document::{document_to_tags, region_of_arn};
pub use identity::StsRoleAssumer;
pub use index::ResourceExplorerAdmin;
pub use notify::SnsNotifier;
pub use objects::{S3Connector, S3ObjectStore};
pub use query::AthenaQueryEngine;
pub use search::ResourceExplorerSearch;

use aws_config::{BehaviorVersion, SdkConfig};

/// Every backend, built from one shared SDK configuration.
#[derive(Clone)]
pub struct AwsBackends {
    pub search: ResourceExplorerSearch,
    pub index: ResourceExplorerAdmin,
    pub objects: S3ObjectStore,
    pub connector: S3Connector,
    pub query: AthenaQueryEngine,
    pub roles: StsRoleAssumer,
    pub notifier: SnsNotifier,
}

impl AwsBackends {
    /// Load credentials and region from the environment's default chain.
    pub async fn load() -> Self {
        let sdk = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::from_config(&sdk)
    }

    pub fn from_config(sdk: &SdkConfig) -> Self {
        AwsBackends {
            search: ResourceExplorerSearch::new(sdk),
            index: ResourceExplorerAdmin::new(sdk),
            objects: S3ObjectStore::new(aws_sdk_s3::Client::new(sdk)),
            connector: S3Connector::new(sdk),
            query: AthenaQueryEngine::new(aws_sdk_athena::Client::new(sdk)),
            roles: StsRoleAssumer::new(aws_sdk_sts::Client::new(sdk)),
            notifier: SnsNotifier::new(aws_sdk_sns::Client::new(sdk)),
        }
    }
}
