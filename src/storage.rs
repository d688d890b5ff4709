//! Reading worksheets, writing XML and validating it against a schema.

mod workbook;
pub use workbook::{Grid, MemorySource, SourceError, TabularSource, Table, Workbook};

pub mod header;
pub use header::{HeaderNotFound, column_header_row, locate};

mod columns;
pub use columns::{ColumnMap, ExtractError, extract_records};

pub mod dom;
pub use dom::{DomError, Element};

pub mod xml;
pub use xml::WriteError;

pub mod schema;
pub use schema::{Schema, SchemaError, Verdict, Violation};
