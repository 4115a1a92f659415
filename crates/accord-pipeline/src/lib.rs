//! The Accord request pipeline.
//!
//! Every operation is served by exactly one [`Chain`]: a [`Handler`] that
//! validates and decodes the inbound shape, a [`Service`] that owns the
//! business rules, and a [`Mapper`] that renders the entity for the wire.
//! Chains register in an [`OperationRegistry`], and the [`Dispatcher`]
//! turns any outcome, success or failure, into an envelope-shaped
//! [`DispatchResult`].
//!
//! The layering is strict: handlers never branch on business state,
//! services never build wire shapes, mappers never fail and never do I/O.

#![doc(html_root_url = "https://docs.rs/accord-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod chain;
mod dispatcher;
mod handler;
mod mapper;
mod registry;
mod request;
mod service;

pub use chain::Chain;
pub use dispatcher::{DispatchResult, Dispatcher};
pub use handler::{Handler, SchemaHandler};
pub use mapper::{IdentityMapper, Mapper};
pub use registry::{OperationRegistry, RegistryError};
pub use request::RawRequest;
pub use service::{Service, ServiceFuture, ServiceOutput};
