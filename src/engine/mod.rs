//! The HSTP Engine (spec §4.6, component F) and its correlation table.

pub mod correlation;
pub mod engine;

pub use correlation::{CorrelationTable, CorrelationTimeout};
pub use engine::{CredentialExtractor, EngineError, HstpEngine, NoCredentials};
