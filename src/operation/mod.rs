//! Operation Registry (spec §4.1, component B): mapping from operation
//! name to a single [`handler::OperationHandler`].

pub mod handler;
pub mod registry;

pub use handler::{HandlerError, OperationHandler};
pub use registry::{HandlerFactory, OperationRegistry};
