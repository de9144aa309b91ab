//! [`ServiceRegistry`]: the `(service, method) -> stub` table consulted on
//! every inbound request. Registration happens
//! once at startup, before a server starts accepting connections; lookups
//! happen on the hot path of every dispatch, hence `scc::HashMap` (lock-free
//! reads, fine-grained writes) over a single `Mutex<HashMap<_>>`.

use std::sync::Arc;

use error_stack::{Report, ResultExt as _};
use scc::HashMap as ConcurrentMap;

use crate::error::RegistryError;
use crate::stub::MethodStub;

#[derive(Default)]
pub struct ServiceRegistry {
    services: ConcurrentMap<String, ConcurrentMap<String, Arc<dyn MethodStub>>>,
}

impl ServiceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a single method under `service`, creating the service's
    /// method table on first use. Fails if the `(service, method)` pair is
    /// already registered: duplicate registration is a fatal configuration
    /// error, not a silent overwrite.
    pub fn register(
        &self,
        service: impl Into<String>,
        method: impl Into<String>,
        stub: Arc<dyn MethodStub>,
    ) -> Result<(), Report<RegistryError>> {
        let service = service.into();
        let method = method.into();

        let methods = match self.services.entry(service.clone()) {
            scc::hash_map::Entry::Occupied(entry) => entry.get().clone(),
            scc::hash_map::Entry::Vacant(entry) => {
                let methods = ConcurrentMap::new();
                entry.insert_entry(methods).get().clone()
            }
        };

        methods
            .insert(method.clone(), stub)
            .map_err(|_| Report::new(RegistryError::DuplicateMethod { service, method }))
            .attach_printable("method registration must happen once at startup")?;

        Ok(())
    }

    /// Registers every method of `service`, aborting (without partial
    /// registration of the remaining methods) on the first collision.
    pub fn register_service(
        &self,
        service: &dyn crate::service::Service,
    ) -> Result<(), Report<RegistryError>> {
        let name = service.name();
        for (method, stub) in service.methods() {
            self.register(name, method, stub)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn lookup(&self, service: &str, method: &str) -> Option<Arc<dyn MethodStub>> {
        let methods = self.services.get(service)?;
        methods.get(method).map(|entry| entry.get().clone())
    }

    #[must_use]
    pub fn contains_service(&self, service: &str) -> bool {
        self.services.contains(service)
    }
}
