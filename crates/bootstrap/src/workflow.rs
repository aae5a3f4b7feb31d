//! The bootstrap workflow.
//!
//! Every mutating call may answer "conflict" when a previous run already did
//! the work; each step turns that answer into the existing resource instead of
//! an error.

use std::sync::Arc;

use serde::Serialize;
use tag_inventory_storage::{IndexAdmin, IndexError, IndexType};
use tracing::{debug, info, warn};

use crate::config::BootstrapConfig;
use crate::error::BootstrapError;

/// What happened to the account default view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "view_arn", rename_all = "snake_case")]
pub enum DefaultView {
    /// Another view (or this one) was already the default.
    AlreadySet(String),
    /// This view was made the default.
    Associated(String),
    /// Association was attempted and failed; logged, not fatal.
    Failed(String),
    /// Disabled in configuration.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapOutcome {
    /// `(region, index ARN)` for every enabled region, in configured order.
    pub indexes: Vec<(String, String)>,
    pub aggregator_region: String,
    pub view_arn: String,
    pub default_view: DefaultView,
}

pub struct IndexBootstrap {
    admin: Arc<dyn IndexAdmin>,
    config: BootstrapConfig,
}

impl IndexBootstrap {
    pub fn new(admin: Arc<dyn IndexAdmin>, config: BootstrapConfig) -> Self {
        IndexBootstrap { admin, config }
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Turn the index on in `region`, or fetch the one already there.
    pub async fn turn_on_index(&self, region: &str) -> Result<String, BootstrapError> {
        let enable_error = |source| BootstrapError::EnableIndex {
            region: region.to_string(),
            source,
        };
        match self.admin.create_index(region).await {
            Ok(arn) => {
                info!(region, index = %arn, "index turned on");
                Ok(arn)
            }
            Err(IndexError::Conflict(message)) => {
                warn!(region, %message, "index already exists");
                let arn = self.admin.get_index(region).await.map_err(enable_error)?;
                debug!(region, index = %arn, "using existing index");
                Ok(arn)
            }
            Err(source) => Err(enable_error(source)),
        }
    }

    /// Turn on (or fetch) the index in `region` and make it the aggregator.
    pub async fn promote_aggregator(&self, region: &str) -> Result<String, BootstrapError> {
        let arn = self.turn_on_index(region).await?;
        match self
            .admin
            .update_index_type(region, &arn, IndexType::Aggregator)
            .await
        {
            Ok(()) => info!(region, index = %arn, "index promoted to aggregator"),
            Err(IndexError::Conflict(message)) => {
                warn!(region, %message, "index is already an aggregator");
            }
            Err(source) => {
                return Err(BootstrapError::PromoteAggregator {
                    region: region.to_string(),
                    source,
                })
            }
        }
        Ok(arn)
    }

    /// Create the configured view in `region`, or find the one created by an
    /// earlier run. Returns the view's canonical ARN.
    pub async fn ensure_view(&self, region: &str) -> Result<String, BootstrapError> {
        let name = &self.config.view_name;
        match self
            .admin
            .create_view(region, name, &self.config.included_properties)
            .await
        {
            Ok(arn) => info!(region, view = %arn, "view created"),
            Err(IndexError::Conflict(message)) => {
                warn!(region, view_name = %name, %message, "view already exists");
            }
            Err(source) => {
                return Err(BootstrapError::CreateView {
                    name: name.clone(),
                    source,
                })
            }
        }
        self.find_view(region, name).await
    }

    /// Page through the views in `region` for one whose ARN carries `name`
    /// (`arn:...:view/<name>/<id>`).
    pub async fn find_view(&self, region: &str, name: &str) -> Result<String, BootstrapError> {
        let find_error = |source| BootstrapError::FindView {
            name: name.to_string(),
            source,
        };
        let mut next_token = None;
        let found = loop {
            let page = self
                .admin
                .list_views(region, next_token)
                .await
                .map_err(find_error)?;
            if let Some(arn) = page
                .view_arns
                .into_iter()
                .find(|arn| arn.split('/').nth(1) == Some(name))
            {
                break arn;
            }
            match page.next_token {
                Some(token) => next_token = Some(token),
                None => return Err(BootstrapError::ViewNotFound(name.to_string())),
            }
        };
        let arn = self
            .admin
            .get_view(region, &found)
            .await
            .map_err(find_error)?;
        debug!(region, view = %arn, view_name = name, "found view");
        Ok(arn)
    }

    /// Make `view_arn` the default view when the account has none.
    ///
    /// Only reading the current default can fail the run; a failed
    /// association is logged and reported as [`DefaultView::Failed`].
    pub async fn ensure_default_view(
        &self,
        region: &str,
        view_arn: &str,
    ) -> Result<DefaultView, BootstrapError> {
        match self.admin.get_default_view(region).await {
            Ok(Some(current)) => {
                debug!(region, view = %current, "default view already set");
                return Ok(DefaultView::AlreadySet(current));
            }
            Ok(None) | Err(IndexError::NotFound(_)) => {}
            Err(source) => {
                return Err(BootstrapError::DefaultView {
                    region: region.to_string(),
                    source,
                })
            }
        }

        info!(region, view = %view_arn, "no default view, associating");
        match self.admin.associate_default_view(region, view_arn).await {
            Ok(arn) => Ok(DefaultView::Associated(arn)),
            Err(err) => {
                warn!(
                    region,
                    view = %view_arn,
                    error = %err,
                    "problem associating view as default view"
                );
                Ok(DefaultView::Failed(err.to_string()))
            }
        }
    }

    pub async fn run(&self) -> Result<BootstrapOutcome, BootstrapError> {
        if self.config.enabled_regions.is_empty() {
            return Err(BootstrapError::NoRegions);
        }

        let mut indexes = Vec::with_capacity(self.config.enabled_regions.len());
        for region in &self.config.enabled_regions {
            let arn = self.turn_on_index(region).await?;
            indexes.push((region.clone(), arn));
        }

        let aggregator = &self.config.aggregator_region;
        self.promote_aggregator(aggregator).await?;
        let view_arn = self.ensure_view(aggregator).await?;

        let default_view = if self.config.set_default_view {
            self.ensure_default_view(aggregator, &view_arn).await?
        } else {
            DefaultView::Skipped
        };

        info!(
            regions = indexes.len(),
            aggregator = %aggregator,
            view = %view_arn,
            "bootstrap complete"
        );
        Ok(BootstrapOutcome {
            indexes,
            aggregator_region: aggregator.clone(),
            view_arn,
            default_view,
        })
    }
}
