//! Domain models for typology conversion.
//!
//! This module contains the core domain types: issue records, the hierarchy
//! they are assembled into, and configuration.

mod config;
pub use config::Config;

pub mod record;
pub use record::IssueRecord;

pub mod hierarchy;
pub use hierarchy::{Duplicate, Hierarchy, HierarchyError, IssueNode, Step, Walk};
