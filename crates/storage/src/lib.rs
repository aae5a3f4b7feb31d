//! tag-inventory-storage: the external collaborators the pipelines drive.
//!
//! Every outside system (resource index, object storage, query engine,
//! identity, notifications, index administration) is reached through a trait
//! defined here. Backends resolve provider-specific failures once, at their
//! boundary, into the kind-tagged error enums of [`error`]; the pipelines only
//! ever match on those kinds.
//!
//! [`memory`] holds in-process backends used by tests and local dry runs, and
//! [`conformance`] is a backend-agnostic suite any [`ObjectStore`] can run.

pub mod conformance;
mod error;
pub mod memory;
mod record;
mod traits;

pub use error::{
    ErrorKind, IdentityError, IndexError, NotifyError, ObjectStoreError, QueryError, SearchError,
};
pub use record::{
    IndexType, JobState, JobStatus, PutObject, ResultRows, SearchRequest, TemporaryCredentials,
    ViewPage,
};
pub use traits::{
    IndexAdmin, Notifier, ObjectStore, ObjectStoreConnector, QueryEngine, ResourceSearch,
    RoleAssumer,
};
