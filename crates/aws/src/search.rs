use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_resourceexplorer2::config::Region;
use aws_sdk_resourceexplorer2::types::Resource;
use aws_sdk_resourceexplorer2::Client;
use aws_smithy_types::date_time::Format;
use tag_inventory_core::{PageResult, ResourceRecord, SearchCount};
use tag_inventory_storage::{ResourceSearch, SearchError, SearchRequest};
use tracing::debug;

use crate::classify::classify;
use crate::document::{document_to_tags, region_of_arn, TAGS_PROPERTY};
use crate::regional::RegionalClients;

/// Paginated search through a view. Each call goes to the view's own region.
#[derive(Clone)]
pub struct ResourceExplorerSearch {
    clients: RegionalClients<Client>,
}

pub(crate) fn regional_client(sdk: &SdkConfig, region: Option<&str>) -> Client {
    let mut builder = aws_sdk_resourceexplorer2::config::Builder::from(sdk);
    if let Some(region) = region {
        builder = builder.region(Region::new(region.to_string()));
    }
    Client::from_conf(builder.build())
}

impl ResourceExplorerSearch {
    pub fn new(sdk: &SdkConfig) -> Self {
        ResourceExplorerSearch {
            clients: RegionalClients::new(sdk, regional_client),
        }
    }
}

fn record(resource: &Resource) -> ResourceRecord {
    let tags = resource
        .properties()
        .iter()
        .filter(|p| p.name() == Some(TAGS_PROPERTY))
        .filter_map(|p| p.data())
        .flat_map(document_to_tags)
        .collect();
    ResourceRecord {
        arn: resource.arn().unwrap_or_default().to_string(),
        owning_account_id: resource.owning_account_id().unwrap_or_default().to_string(),
        region: resource.region().unwrap_or_default().to_string(),
        service: resource.service().unwrap_or_default().to_string(),
        resource_type: resource.resource_type().unwrap_or_default().to_string(),
        tags,
        last_reported_at: resource
            .last_reported_at()
            .and_then(|at| at.fmt(Format::DateTime).ok()),
    }
}

#[async_trait]
impl ResourceSearch for ResourceExplorerSearch {
    async fn search(&self, request: SearchRequest) -> Result<PageResult, SearchError> {
        let client = self.clients.get(region_of_arn(&request.view_arn));
        let output = client
            .search()
            .view_arn(&request.view_arn)
            .query_string(&request.query_string)
            .max_results(request.max_results)
            .set_next_token(request.next_token)
            .send()
            .await
            .map_err(|err| classify(&err).into_search_error())?;

        let resources: Vec<ResourceRecord> = output.resources().iter().map(record).collect();
        let count = output
            .count()
            .map(|c| SearchCount {
                complete: c.complete().unwrap_or(false),
                total_resources: c.total_resources().unwrap_or(0),
            })
            .unwrap_or_default();
        debug!(
            resources = resources.len(),
            has_more = output.next_token().is_some(),
            "search page received"
        );
        Ok(PageResult {
            resources,
            next_token: output.next_token().map(str::to_string),
            count,
        })
    }
}
