//! Core contracts for modelscore.
//!
//! This crate defines the in-memory table model consumed by the evaluators
//! and the grouped apply-then-flatten executor they all run through.

pub mod error;
pub mod group;
pub mod naming;
pub mod table;
pub mod value;

pub use error::{Error, Result};
pub use group::{Group, Partition, apply_per_group};
pub use naming::{avoid_conflict, disambiguate};
pub use table::{Field, FieldKind, Table};
pub use value::Value;
