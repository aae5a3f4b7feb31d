use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use aws_config::SdkConfig;

/// Lazily built SDK clients, one per region.
///
/// `None` is the configuration's own region.
#[derive(Clone)]
pub(crate) struct RegionalClients<C> {
    sdk: SdkConfig,
    build: fn(&SdkConfig, Option<&str>) -> C,
    clients: Arc<Mutex<BTreeMap<Option<String>, C>>>,
}

impl<C: Clone> RegionalClients<C> {
    pub fn new(sdk: &SdkConfig, build: fn(&SdkConfig, Option<&str>) -> C) -> Self {
        RegionalClients {
            sdk: sdk.clone(),
            build,
            clients: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn get(&self, region: Option<&str>) -> C {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        clients
            .entry(region.map(str::to_string))
            .or_insert_with(|| (self.build)(&self.sdk, region))
            .clone()
    }
}
