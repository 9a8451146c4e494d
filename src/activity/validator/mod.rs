//! The Validator Framework (spec §4.9 component I): a pluggable
//! `ActivityValidator` contract, the default SHACL-subset implementation,
//! and a composite that chains several validators under one face.

pub mod composite;
pub mod shacl;
pub mod traits;

pub use composite::{CompositeStrategy, CompositeValidator, PrioritizedValidator};
pub use shacl::ShaclValidator;
pub use traits::{
    ActivityValidator, ValidationContext, ValidationIssue, ValidationOptions, ValidationPhase, ValidationResult,
};
