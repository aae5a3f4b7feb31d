//! Deployment-time custom-resource requests.
//!
//! `Create` and `Update` run the bootstrap and answer with the view ARN as the
//! physical resource id. `Delete` leaves the index and view in place: other
//! stacks may depend on them.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use tag_inventory_storage::IndexAdmin;
use tracing::{error, info};

use crate::config::{parse_regions, BootstrapConfig};
use crate::workflow::IndexBootstrap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceRequest {
    pub request_type: RequestType,
    pub logical_resource_id: String,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub stack_id: Option<String>,
    pub resource_properties: ResourceProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceProperties {
    /// A list, or a comma-separated string.
    #[serde(rename = "ENABLED_REGIONS", deserialize_with = "region_list")]
    pub enabled_regions: Vec<String>,
    #[serde(rename = "AGGREGATOR_INDEX_REGION")]
    pub aggregator_index_region: String,
}

fn region_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Regions {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Regions::deserialize(deserializer)? {
        Regions::List(list) => parse_regions(&list.join(",")),
        Regions::Joined(joined) => parse_regions(&joined),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    pub logical_resource_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub data: BTreeMap<String, String>,
}

impl CustomResourceResponse {
    fn answering(request: &CustomResourceRequest, status: ResponseStatus) -> Self {
        CustomResourceResponse {
            status,
            physical_resource_id: request.physical_resource_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
            request_id: request.request_id.clone(),
            stack_id: request.stack_id.clone(),
            reason: None,
            data: BTreeMap::new(),
        }
    }
}

/// Answer one request. Never fails: a workflow error becomes a `FAILED`
/// response carrying the error as its reason.
///
/// `base` supplies view settings; regions come from the request.
pub async fn handle_request(
    admin: Arc<dyn IndexAdmin>,
    base: &BootstrapConfig,
    request: &CustomResourceRequest,
) -> CustomResourceResponse {
    info!(
        request_type = ?request.request_type,
        logical_id = %request.logical_resource_id,
        "custom resource request"
    );
    if request.request_type == RequestType::Delete {
        return CustomResourceResponse::answering(request, ResponseStatus::Success);
    }

    let config = BootstrapConfig {
        enabled_regions: request.resource_properties.enabled_regions.clone(),
        aggregator_region: request.resource_properties.aggregator_index_region.clone(),
        ..base.clone()
    };
    match IndexBootstrap::new(admin, config).run().await {
        Ok(outcome) => {
            let mut response = CustomResourceResponse::answering(request, ResponseStatus::Success);
            response.physical_resource_id = Some(outcome.view_arn.clone());
            response
                .data
                .insert("ViewArn".to_string(), outcome.view_arn);
            response
        }
        Err(err) => {
            error!(error = %err, "bootstrap failed");
            let mut response = CustomResourceResponse::answering(request, ResponseStatus::Failed);
            response.reason = Some(err.to_string());
            response
        }
    }
}
