//! # `hstp-node` — Hypermedia Spatial Transport Protocol node
//!
//! An HSTP node multiplexes DID-addressed messages across pluggable wire
//! transports, dispatches them to registered operation handlers, and
//! schedules declarative activities against pluggable executors validated
//! by a SHACL-subset validator framework.
//!
//! ## Architecture
//!
//! - [`did`] / [`message`] — the identity and message model (spec
//!   components A).
//! - [`operation`] / [`builtin_ops`] — the operation registry and the
//!   built-in `ping`/`pong` handlers (components B, G).
//! - [`transport`] — the transport binding contract, provider registry, and
//!   transport manager (components C, D, E).
//! - [`engine`] — the HSTP engine: de-dup, enrich, authenticate, dispatch,
//!   reply (component F).
//! - [`activity`] — the activity model, manager, and validator framework
//!   (components H, I).
//! - [`node`] — the lifecycle/config binding that owns both the engine and
//!   the transport manager and exposes `start`/`shutdown` (component K).
//! - [`config`] / [`cli`] / [`observability`] / [`rest_api`] — the ambient
//!   operational surface: configuration loading, command-line parsing,
//!   structured logging, and the management HTTP API.

pub mod activity;
pub mod builtin_ops;
pub mod cli;
pub mod config;
pub mod context;
pub mod did;
pub mod domain_types;
pub mod engine;
pub mod error;
pub mod message;
pub mod node;
pub mod observability;
pub mod operation;
pub mod resolver;
pub mod rest_api;
pub mod time_provider;
pub mod transport;

pub use crate::error::NodeError;
pub use crate::node::{Node, NodeBuilder, NodeStartError};
