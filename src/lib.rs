//! MQM Typology Conversion
//!
//! Issue-type typologies are maintained as spreadsheets: one row per issue
//! type, with a parent column linking each row to the issue it refines. This
//! crate turns such a worksheet into a nested XML document and validates the
//! result against an XML Schema.

pub mod domain;
pub use domain::{Config, Hierarchy, IssueRecord};

pub mod storage;
pub use storage::{Schema, Workbook};

pub mod convert;
pub use convert::{Conversion, ConvertError, Outcome, convert};
