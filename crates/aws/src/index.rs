use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_resourceexplorer2::types::{IncludedProperty, IndexType as SdkIndexType};
use aws_sdk_resourceexplorer2::Client;
use tag_inventory_storage::{IndexAdmin, IndexError, IndexType, ViewPage};
use tracing::debug;

use crate::classify::classify;
use crate::regional::RegionalClients;
use crate::search::regional_client;

/// Index and view administration, one client per region.
#[derive(Clone)]
pub struct ResourceExplorerAdmin {
    clients: RegionalClients<Client>,
}

impl ResourceExplorerAdmin {
    pub fn new(sdk: &SdkConfig) -> Self {
        ResourceExplorerAdmin {
            clients: RegionalClients::new(sdk, regional_client),
        }
    }

    fn client(&self, region: &str) -> Client {
        self.clients.get(Some(region))
    }
}

fn missing(what: &str, region: &str) -> IndexError {
    IndexError::Other(format!("{} missing from response in {}", what, region))
}

#[async_trait]
impl IndexAdmin for ResourceExplorerAdmin {
    async fn create_index(&self, region: &str) -> Result<String, IndexError> {
        let output = self
            .client(region)
            .create_index()
            .send()
            .await
            .map_err(|err| classify(&err).into_index_error())?;
        output
            .arn()
            .map(str::to_string)
            .ok_or_else(|| missing("index ARN", region))
    }

    async fn get_index(&self, region: &str) -> Result<String, IndexError> {
        let output = self
            .client(region)
            .get_index()
            .send()
            .await
            .map_err(|err| classify(&err).into_index_error())?;
        output
            .arn()
            .map(str::to_string)
            .ok_or_else(|| missing("index ARN", region))
    }

    async fn update_index_type(
        &self,
        region: &str,
        index_arn: &str,
        index_type: IndexType,
    ) -> Result<(), IndexError> {
        let sdk_type = match index_type {
            IndexType::Local => SdkIndexType::Local,
            IndexType::Aggregator => SdkIndexType::Aggregator,
        };
        let output = self
            .client(region)
            .update_index_type()
            .arn(index_arn)
            .r#type(sdk_type)
            .send()
            .await
            .map_err(|err| classify(&err).into_index_error())?;
        debug!(region, index = ?output.arn(), state = ?output.state(), "index type updated");
        Ok(())
    }

    async fn create_view(
        &self,
        region: &str,
        name: &str,
        included_properties: &[String],
    ) -> Result<String, IndexError> {
        let mut request = self.client(region).create_view().view_name(name);
        for property in included_properties {
            let property = IncludedProperty::builder()
                .name(property)
                .build()
                .map_err(|err| IndexError::Other(err.to_string()))?;
            request = request.included_properties(property);
        }
        let output = request
            .send()
            .await
            .map_err(|err| classify(&err).into_index_error())?;
        output
            .view()
            .and_then(|view| view.view_arn())
            .map(str::to_string)
            .ok_or_else(|| missing("view ARN", region))
    }

    async fn list_views(
        &self,
        region: &str,
        next_token: Option<String>,
    ) -> Result<ViewPage, IndexError> {
        let output = self
            .client(region)
            .list_views()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|err| classify(&err).into_index_error())?;
        Ok(ViewPage {
            view_arns: output.views().to_vec(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn get_view(&self, region: &str, view_arn: &str) -> Result<String, IndexError> {
        let output = self
            .client(region)
            .get_view()
            .view_arn(view_arn)
            .send()
            .await
            .map_err(|err| classify(&err).into_index_error())?;
        output
            .view()
            .and_then(|view| view.view_arn())
            .map(str::to_string)
            .ok_or_else(|| missing("view ARN", region))
    }

    async fn get_default_view(&self, region: &str) -> Result<Option<String>, IndexError> {
        let output = self
            .client(region)
            .get_default_view()
            .send()
            .await
            .map_err(|err| classify(&err).into_index_error())?;
        Ok(output.view_arn().map(str::to_string))
    }

    async fn associate_default_view(
        &self,
        region: &str,
        view_arn: &str,
    ) -> Result<String, IndexError> {
        let output = self
            .client(region)
            .associate_default_view()
            .view_arn(view_arn)
            .send()
            .await
            .map_err(|err| classify(&err).into_index_error())?;
        Ok(output.view_arn().unwrap_or(view_arn).to_string())
    }
}
