//! The business-rule seam.

use std::future::Future;
use std::pin::Pin;

use accord_core::{AccordError, IdentityContext, RequestContext};

/// A boxed future returned by [`Service::execute`].
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AccordError>> + Send + 'a>>;

/// What a service produced, determining the response status.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceOutput<E> {
    /// A single entity; renders as 200.
    One(E),
    /// A freshly created entity; renders as 201.
    Created(E),
    /// A page of entities with pagination metadata; renders as 200.
    Many {
        /// The entities on this page.
        items: Vec<E>,
        /// 1-based page number.
        page: u64,
        /// Maximum items per page.
        limit: u64,
        /// Total entities across all pages.
        total: u64,
    },
    /// The resource is gone; renders as 204 with an empty body.
    Deleted,
}

impl<E> ServiceOutput<E> {
    /// The HTTP status this output renders as.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::One(_) | Self::Many { .. } => 200,
            Self::Created(_) => 201,
            Self::Deleted => 204,
        }
    }
}

/// Owns every business rule for one operation.
///
/// Services decide authorization over resources (ownership checks live
/// here, not in handlers), treat lookups as idempotent, and return typed
/// entities; they never build wire envelopes and never swallow errors.
pub trait Service<Req, E>: Send + Sync + 'static {
    /// Executes the operation for a decoded request.
    fn execute<'a>(
        &'a self,
        ctx: &'a RequestContext,
        identity: &'a IdentityContext,
        req: Req,
    ) -> ServiceFuture<'a, ServiceOutput<E>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_per_output() {
        assert_eq!(ServiceOutput::One(1).status(), 200);
        assert_eq!(ServiceOutput::Created(1).status(), 201);
        assert_eq!(
            ServiceOutput::Many { items: vec![1], page: 1, limit: 10, total: 1 }.status(),
            200
        );
        assert_eq!(ServiceOutput::<i32>::Deleted.status(), 204);
    }
}
