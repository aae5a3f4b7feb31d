//! tag-inventory-bootstrap: one-time setup of the resource index.
//!
//! Turns the index on in every enabled region, promotes one region's index to
//! aggregator, and creates (or finds) the named view the spoke runs search
//! through. Every call treats "already exists" as success, so the workflow can
//! be repeated safely. [`custom_resource`] answers deployment-time
//! create/update/delete requests by running it.

pub mod config;
pub mod custom_resource;
pub mod error;
pub mod workflow;

pub use config::{parse_regions, BootstrapConfig, DEFAULT_VIEW_NAME};
pub use custom_resource::{
    handle_request, CustomResourceRequest, CustomResourceResponse, RequestType, ResponseStatus,
};
pub use error::BootstrapError;
pub use workflow::{BootstrapOutcome, DefaultView, IndexBootstrap};
