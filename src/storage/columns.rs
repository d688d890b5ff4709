//! Mapping worksheet columns onto issue-record fields

use non_empty_string::NonEmptyString;

use crate::{domain::IssueRecord, storage::Table};

/// Header keywords, in the order a header cell is tested against them.
///
/// A cell claims the first field whose keyword it contains
/// (case-insensitive); each field takes the first cell that claims it.
const KEYWORDS: [(Field, &str); 7] = [
    (Field::Name, "name"),
    (Field::Id, "type id"),
    (Field::Parent, "parent"),
    (Field::Description, "description"),
    (Field::Examples, "examples"),
    (Field::Notes, "notes"),
    (Field::ProcessId, "type pid"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Id,
    Parent,
    Description,
    Examples,
    Notes,
    ProcessId,
}

/// Errors raised while turning worksheet rows into records.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ExtractError {
    /// One or more required columns are absent from the header row.
    #[error(
        "The necessary columns were not found. Expected Name, Description, Examples, and Notes."
    )]
    MissingColumns {
        /// The keywords that matched no header cell.
        missing: Vec<&'static str>,
    },

    /// A data row has no name.
    #[error("An error cannot have a blank name. Row: {row}")]
    BlankName {
        /// 1-based sheet row number.
        row: usize,
    },

    /// A data row has a name but no identifier.
    #[error("An error cannot have a blank id. Error name: {name}, Row: {row}")]
    BlankId {
        /// The name found on the row.
        name: String,
        /// 1-based sheet row number.
        row: usize,
    },
}

/// Column positions of the record fields.
///
/// Name, description, examples and notes are required. The identifier,
/// parent and process-identifier columns may be absent, in which case those
/// fields read as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    name: usize,
    id: Option<usize>,
    parent: Option<usize>,
    description: usize,
    examples: usize,
    notes: usize,
    process_id: Option<usize>,
}

impl ColumnMap {
    /// Maps header labels to fields.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::MissingColumns`] if a required column is not
    /// found.
    pub fn map<S: AsRef<str>>(header: &[S]) -> Result<Self, ExtractError> {
        let mut found = [None; KEYWORDS.len()];

        for (index, cell) in header.iter().enumerate() {
            let label = cell.as_ref().to_lowercase();
            if let Some(field) = KEYWORDS
                .iter()
                .position(|(_, keyword)| label.contains(keyword))
            {
                if found[field].is_none() {
                    found[field] = Some(index);
                }
            }
        }

        let column = |field: Field| {
            KEYWORDS
                .iter()
                .position(|(f, _)| *f == field)
                .and_then(|slot| found[slot])
        };

        let required = [
            Field::Name,
            Field::Description,
            Field::Examples,
            Field::Notes,
        ];
        let missing: Vec<&'static str> = KEYWORDS
            .iter()
            .filter(|(field, _)| required.contains(field) && column(*field).is_none())
            .map(|(_, keyword)| *keyword)
            .collect();

        match (
            column(Field::Name),
            column(Field::Description),
            column(Field::Examples),
            column(Field::Notes),
        ) {
            (Some(name), Some(description), Some(examples), Some(notes)) => Ok(Self {
                name,
                id: column(Field::Id),
                parent: column(Field::Parent),
                description,
                examples,
                notes,
                process_id: column(Field::ProcessId),
            }),
            _ => Err(ExtractError::MissingColumns { missing }),
        }
    }

    /// Builds a record from one data row.
    ///
    /// `row_number` is the 1-based sheet row, used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::BlankName`] or [`ExtractError::BlankId`] if the
    /// row lacks a name or identifier.
    pub fn extract<S: AsRef<str>>(
        &self,
        row: &[S],
        row_number: usize,
    ) -> Result<IssueRecord, ExtractError> {
        let cell = |column: Option<usize>| {
            column
                .and_then(|index| row.get(index))
                .map_or("", |value| value.as_ref())
        };

        let name = NonEmptyString::new(cell(Some(self.name)).trim().to_string())
            .map_err(|_| ExtractError::BlankName { row: row_number })?;

        let id = NonEmptyString::new(cell(self.id).trim().to_string()).map_err(|_| {
            ExtractError::BlankId {
                name: name.to_string(),
                row: row_number,
            }
        })?;

        Ok(IssueRecord::new(id, name)
            .with_parent(cell(self.parent).trim())
            .with_process_id(cell(self.process_id).trim())
            .with_description(cell(Some(self.description)))
            .with_examples(cell(Some(self.examples)))
            .with_notes(cell(Some(self.notes))))
    }
}

/// Extracts a record from every data row of `table`, in sheet order.
///
/// Extraction stops at the first row that fails. With `skip_blank_rows`,
/// rows whose cells are all empty are passed over instead of failing.
///
/// # Errors
///
/// Returns the first [`ExtractError`] encountered.
#[tracing::instrument(level = "debug", skip(table), fields(rows = table.len()))]
pub fn extract_records(
    table: &Table,
    skip_blank_rows: bool,
) -> Result<Vec<IssueRecord>, ExtractError> {
    let columns = ColumnMap::map(table.header())?;
    tracing::debug!(?columns, "mapped header columns");

    let mut records = Vec::with_capacity(table.len());
    for (row_number, row) in table.rows() {
        if skip_blank_rows && row.iter().all(|cell| cell.trim().is_empty()) {
            tracing::debug!(row = row_number, "skipping blank row");
            continue;
        }
        records.push(columns.extract(row, row_number)?);
    }

    Ok(records)
}
