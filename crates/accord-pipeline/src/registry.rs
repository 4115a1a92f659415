//! The operation registry.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::chain::{Chain, ErasedChain};

/// Registry construction errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two chains were registered for the same operation.
    #[error("operation `{operation_id}` already has a registered chain")]
    DuplicateOperation {
        /// The doubly-registered operation id.
        operation_id: String,
    },
}

/// Maps operation ids to their chains.
///
/// Exactly one chain per operation: duplicate registration is a
/// construction error, and dispatch executes exactly one chain per
/// request.
#[derive(Default)]
pub struct OperationRegistry {
    chains: HashMap<String, Box<dyn ErasedChain>>,
}

impl OperationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a chain under its operation id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateOperation`] if the operation
    /// already has a chain.
    pub fn register<Req, E, Res>(&mut self, chain: Chain<Req, E, Res>) -> Result<(), RegistryError>
    where
        Req: Send + 'static,
        E: Send + Sync + 'static,
        Res: Serialize + Send + 'static,
    {
        let operation_id = chain.operation_id().to_string();
        if self.chains.contains_key(&operation_id) {
            return Err(RegistryError::DuplicateOperation { operation_id });
        }
        self.chains.insert(operation_id, Box::new(chain));
        Ok(())
    }

    /// Looks up the chain for an operation.
    pub(crate) fn get(&self, operation_id: &str) -> Option<&dyn ErasedChain> {
        self.chains.get(operation_id).map(AsRef::as_ref)
    }

    /// Returns `true` when the operation has a registered chain.
    #[must_use]
    pub fn contains(&self, operation_id: &str) -> bool {
        self.chains.contains_key(operation_id)
    }

    /// The registered operation ids, in no particular order.
    pub fn operation_ids(&self) -> impl Iterator<Item = &str> {
        self.chains.keys().map(String::as_str)
    }

    /// Number of registered chains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("operations", &self.chains.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use accord_core::{AccordError, IdentityContext, RequestContext};
    use serde_json::json;

    use super::*;
    use crate::request::RawRequest;
    use crate::service::{Service, ServiceFuture, ServiceOutput};

    struct NoopService;

    impl Service<(), ()> for NoopService {
        fn execute<'a>(
            &'a self,
            _ctx: &'a RequestContext,
            _identity: &'a IdentityContext,
            _req: (),
        ) -> ServiceFuture<'a, ServiceOutput<()>> {
            Box::pin(async move { Ok(ServiceOutput::Deleted) })
        }
    }

    fn chain(operation_id: &str) -> Chain<(), (), serde_json::Value> {
        Chain::new(
            operation_id,
            |_: &RawRequest| Ok::<(), AccordError>(()),
            NoopService,
            |_: &()| json!(null),
        )
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = OperationRegistry::new();
        registry.register(chain("getNote")).unwrap();
        assert!(registry.contains("getNote"));
        assert!(!registry.contains("deleteNote"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = OperationRegistry::new();
        registry.register(chain("getNote")).unwrap();
        let err = registry.register(chain("getNote")).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateOperation { ref operation_id } if operation_id == "getNote"
        ));
        assert_eq!(registry.len(), 1);
    }
}
