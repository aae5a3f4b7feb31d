use tag_inventory_storage::{ErrorKind, IndexError};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("no regions to enable")]
    NoRegions,

    #[error("problem enabling index in region {region}: {source}")]
    EnableIndex {
        region: String,
        #[source]
        source: IndexError,
    },

    #[error("problem promoting index in region {region} to aggregator: {source}")]
    PromoteAggregator {
        region: String,
        #[source]
        source: IndexError,
    },

    #[error("problem creating view '{name}': {source}")]
    CreateView {
        name: String,
        #[source]
        source: IndexError,
    },

    #[error("there was a problem finding view {name}: {source}")]
    FindView {
        name: String,
        #[source]
        source: IndexError,
    },

    #[error("could not find view with name '{0}'")]
    ViewNotFound(String),

    #[error("problem reading the default view in region {region}: {source}")]
    DefaultView {
        region: String,
        #[source]
        source: IndexError,
    },
}

impl BootstrapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BootstrapError::NoRegions => ErrorKind::Invalid,
            BootstrapError::ViewNotFound(_) => ErrorKind::NotFound,
            BootstrapError::EnableIndex { source, .. }
            | BootstrapError::PromoteAggregator { source, .. }
            | BootstrapError::CreateView { source, .. }
            | BootstrapError::FindView { source, .. }
            | BootstrapError::DefaultView { source, .. } => source.kind(),
        }
    }
}
