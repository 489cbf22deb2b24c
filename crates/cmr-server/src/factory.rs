//! Service assembly.
//!
//! [`ServiceFactory::assemble`] instantiates the raw services in dependency
//! order and puts every one of them behind its defaulting decorator. The
//! wrapped services are what protocol bindings should call.

use std::sync::Arc;

use tracing::info;

use cmr_store::StoreManager;

use crate::bootstrap::{BootstrapOutcome, RepositoryBootstrapper};
use crate::config::{BootstrapConfig, Parameters};
use crate::error::ServerResult;
use crate::services::{
    DiscoveryService, InMemoryDiscoveryService, InMemoryNavigationService,
    InMemoryObjectService, InMemoryRepositoryService, InMemoryVersioningService,
    NavigationService, ObjectService, RepositoryService, VersioningService,
};
use crate::wrapper::{
    DiscoveryServiceWrapper, NavigationServiceWrapper, ObjectServiceWrapper,
    RepositoryServiceWrapper, ServiceDefaults, VersioningServiceWrapper,
};

/// The assembled, decorated service set of one registry.
pub struct ServiceFactory {
    registry: Arc<dyn StoreManager>,
    raw_objects: Arc<InMemoryObjectService>,
    repository: Arc<dyn RepositoryService>,
    navigation: Arc<dyn NavigationService>,
    object: Arc<dyn ObjectService>,
    versioning: Arc<dyn VersioningService>,
    discovery: Arc<dyn DiscoveryService>,
}

impl ServiceFactory {
    /// Parse `params`, bootstrap the configured registry, and assemble.
    pub fn init(params: &Parameters) -> ServerResult<(Self, BootstrapOutcome)> {
        RepositoryBootstrapper::new(BootstrapConfig::from_parameters(params)).bootstrap()
    }

    /// Wire the services against `registry`.
    pub fn assemble(registry: Arc<dyn StoreManager>) -> Self {
        let repository = Arc::new(InMemoryRepositoryService::new(Arc::clone(&registry)));
        let navigation = Arc::new(InMemoryNavigationService::new(Arc::clone(&registry)));
        let raw_objects = Arc::new(InMemoryObjectService::new(Arc::clone(&registry)));
        let versioning = InMemoryVersioningService::new(Arc::clone(&raw_objects));
        let discovery = InMemoryDiscoveryService::new(
            Arc::clone(&registry),
            Arc::clone(&repository),
            Arc::clone(&navigation),
        );

        let factory = Self {
            repository: Arc::new(RepositoryServiceWrapper::new(repository, ServiceDefaults::TYPES)),
            navigation: Arc::new(NavigationServiceWrapper::new(
                navigation,
                ServiceDefaults::OBJECTS,
            )),
            object: Arc::new(ObjectServiceWrapper::new(
                raw_objects.clone(),
                ServiceDefaults::OBJECTS,
            )),
            versioning: Arc::new(VersioningServiceWrapper::new(Arc::new(versioning))),
            discovery: Arc::new(DiscoveryServiceWrapper::new(
                Arc::new(discovery),
                ServiceDefaults::OBJECTS,
            )),
            raw_objects,
            registry,
        };
        info!("services assembled");
        factory
    }

    pub fn registry(&self) -> &Arc<dyn StoreManager> {
        &self.registry
    }

    pub fn repository_service(&self) -> Arc<dyn RepositoryService> {
        Arc::clone(&self.repository)
    }

    pub fn navigation_service(&self) -> Arc<dyn NavigationService> {
        Arc::clone(&self.navigation)
    }

    pub fn object_service(&self) -> Arc<dyn ObjectService> {
        Arc::clone(&self.object)
    }

    pub fn versioning_service(&self) -> Arc<dyn VersioningService> {
        Arc::clone(&self.versioning)
    }

    pub fn discovery_service(&self) -> Arc<dyn DiscoveryService> {
        Arc::clone(&self.discovery)
    }

    /// The undecorated object service, for system-initiated creation.
    pub(crate) fn raw_object_service(&self) -> Arc<InMemoryObjectService> {
        Arc::clone(&self.raw_objects)
    }
}
