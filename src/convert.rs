//! The conversion pipeline
//!
//! A conversion reads one worksheet, locates the typology table, extracts the
//! issue records, arranges them into a hierarchy, writes the XML document and
//! validates what was written. Every stage failure is reported through
//! [`Outcome::Failed`]; nothing escapes [`convert`].

use std::{
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
};

use tracing::instrument;

use crate::{
    domain::{Config, Duplicate, Hierarchy, HierarchyError},
    storage::{
        self, DomError, ExtractError, HeaderNotFound, Schema, SchemaError, SourceError,
        TabularSource, Verdict, Violation, Workbook, WriteError,
    },
};

/// File name used when the schema is exported into a directory.
pub const SCHEMA_FILE_NAME: &str = "mqmTypology.xsd";

/// What is wrong with a source or destination path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PathProblem {
    /// No path was given.
    #[error("path cannot be empty")]
    Empty,

    /// The path does not exist or has the wrong extension.
    #[error("must be a valid path to {0} file")]
    WrongKind(&'static str),
}

/// Errors that can end a conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The source or destination path was rejected before anything was read.
    #[error("{role} {problem}")]
    InvalidPath {
        /// Which path was rejected (`source` or `destination`).
        role: &'static str,
        /// Why it was rejected.
        problem: PathProblem,
    },

    /// The workbook or worksheet could not be read.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The worksheet has no row containing the marker.
    #[error(transparent)]
    Header(#[from] HeaderNotFound),

    /// The rows could not be turned into records.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The records do not form a hierarchy.
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    /// The document could not be written.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// The schema could not be loaded.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The written document could not be read back.
    #[error(transparent)]
    Document(#[from] DomError),

    /// The document was written but does not conform to the schema.
    ///
    /// This is the only failure that leaves a file at the destination.
    #[error("File was written, but failed validation")]
    Validation {
        /// The written document.
        path: PathBuf,
        /// Every schema violation found.
        violations: Vec<Violation>,
    },
}

/// A summary of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// The worksheet that was converted.
    pub sheet: String,
    /// Where the document was written.
    pub destination: PathBuf,
    /// The number of records extracted.
    pub records: usize,
    /// The number of root-level issue types.
    pub roots: usize,
    /// The deepest level written.
    pub max_depth: usize,
    /// Records whose identifier repeated an earlier one.
    pub duplicates: Vec<Duplicate>,
    /// Keys of records that were not written because no chain of parents
    /// connects them to the root.
    pub orphans: Vec<String>,
}

/// The result of a conversion request.
#[derive(Debug)]
pub enum Outcome {
    /// The user declined to pick a worksheet; nothing ran.
    Aborted,
    /// The document was written and is valid.
    Succeeded(Conversion),
    /// The conversion ran and failed.
    Failed(ConvertError),
}

impl Outcome {
    /// `None` if the request was aborted, otherwise whether it succeeded.
    #[must_use]
    pub const fn success(&self) -> Option<bool> {
        match self {
            Self::Aborted => None,
            Self::Succeeded(_) => Some(true),
            Self::Failed(_) => Some(false),
        }
    }

    /// A one-line message describing the outcome.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Aborted => "Conversion cancelled".to_string(),
            Self::Succeeded(_) => "Conversion complete and validation successful!".to_string(),
            Self::Failed(error) => format!("Conversion failed: {error}"),
        }
    }
}

impl From<Result<Conversion, ConvertError>> for Outcome {
    fn from(result: Result<Conversion, ConvertError>) -> Self {
        match result {
            Ok(conversion) => Self::Succeeded(conversion),
            Err(error) => Self::Failed(error),
        }
    }
}

fn check_path(path: &Path, extension: &'static str, must_exist: bool) -> Result<(), PathProblem> {
    if path.as_os_str().is_empty() {
        return Err(PathProblem::Empty);
    }

    let has_extension = path
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
    if !has_extension || (must_exist && !path.exists()) {
        return Err(PathProblem::WrongKind(match extension {
            "xlsx" => ".XLSX",
            _ => ".XML",
        }));
    }
    Ok(())
}

/// Checks that `path` names an existing `.xlsx` file.
///
/// # Errors
///
/// Returns the problem with the path, if any.
pub fn check_source(path: &Path) -> Result<(), PathProblem> {
    check_path(path, "xlsx", true)
}

/// Checks that `path` names an `.xml` file.
///
/// # Errors
///
/// Returns the problem with the path, if any.
pub fn check_destination(path: &Path) -> Result<(), PathProblem> {
    check_path(path, "xml", false)
}

fn open_source(source: &Path) -> Result<Workbook, ConvertError> {
    check_source(source).map_err(|problem| ConvertError::InvalidPath {
        role: "source",
        problem,
    })?;
    Ok(Workbook::open(source)?)
}

/// Lists the worksheets of the workbook at `source`, in file order.
///
/// # Errors
///
/// Returns an error if the path is not an existing `.xlsx` file or the
/// workbook cannot be opened.
pub fn sheet_names(source: &Path) -> Result<Vec<String>, ConvertError> {
    Ok(open_source(source)?.sheet_names())
}

/// Converts one worksheet of the workbook at `source` into an XML document at
/// `destination`.
#[must_use]
pub fn convert(source: &Path, sheet: &str, destination: &Path, config: &Config) -> Outcome {
    let outcome = Outcome::from(convert_file(source, sheet, destination, config));

    if let Outcome::Failed(error) = &outcome {
        tracing::error!("{error}");
    }
    outcome
}

fn convert_file(
    source: &Path,
    sheet: &str,
    destination: &Path,
    config: &Config,
) -> Result<Conversion, ConvertError> {
    check_source(source).map_err(|problem| ConvertError::InvalidPath {
        role: "source",
        problem,
    })?;
    check_destination(destination).map_err(|problem| ConvertError::InvalidPath {
        role: "destination",
        problem,
    })?;

    let mut workbook = Workbook::open(source)?;
    convert_from(&mut workbook, sheet, destination, config)
}

/// Runs the pipeline over any tabular source.
///
/// # Errors
///
/// Returns the error of the first stage that fails.
#[instrument(level = "debug", skip(source, config))]
pub fn convert_from(
    source: &mut impl TabularSource,
    sheet: &str,
    destination: &Path,
    config: &Config,
) -> Result<Conversion, ConvertError> {
    let grid = source.read_grid(sheet)?;

    let marker_row = storage::locate(&grid, config.marker())?;
    let header_row = storage::column_header_row(&grid, marker_row);
    tracing::debug!(marker_row, header_row, "located typology table");

    let table = grid.into_table(header_row);
    let records = storage::extract_records(&table, config.skip_blank_rows)?;
    tracing::info!("Extracted {} issue types from '{sheet}'", records.len());

    let mut hierarchy = Hierarchy::with_capacity(records.len());
    for record in records {
        hierarchy.ingest(record);
    }
    let walk = hierarchy.walk()?;
    for orphan in &walk.orphans {
        tracing::warn!(key = orphan, "issue type is not connected to the root and was skipped");
    }

    // Load the schema before writing so a broken schema leaves nothing behind.
    let schema = load_schema(config)?;
    storage::xml::save(&walk, config.edition(), destination)?;

    let verdict = validate_with(&schema, destination)?;
    if !verdict.is_valid() {
        for violation in verdict.violations() {
            tracing::warn!("{violation}");
        }
        return Err(ConvertError::Validation {
            path: destination.to_path_buf(),
            violations: verdict.violations().to_vec(),
        });
    }

    Ok(Conversion {
        sheet: sheet.to_string(),
        destination: destination.to_path_buf(),
        records: hierarchy.len(),
        roots: hierarchy.children("").len(),
        max_depth: walk.max_depth,
        duplicates: hierarchy.duplicates().to_vec(),
        orphans: walk.orphans.iter().map(ToString::to_string).collect(),
    })
}

/// Loads the configured schema, or the bundled one if none is configured.
///
/// # Errors
///
/// Returns an error if the configured schema cannot be read or compiled.
pub fn load_schema(config: &Config) -> Result<Schema, SchemaError> {
    config
        .schema()
        .map_or_else(Schema::bundled, Schema::load)
}

fn validate_with(schema: &Schema, document: &Path) -> Result<Verdict, ConvertError> {
    let verdict = schema.validate_file(document)?;
    tracing::debug!(
        violations = verdict.violations().len(),
        "validated {}",
        document.display()
    );
    Ok(verdict)
}

/// Validates the document at `path` against the configured schema.
///
/// # Errors
///
/// Returns an error if the schema cannot be loaded or the document cannot be
/// read. Schema violations are reported in the [`Verdict`].
pub fn validate(path: &Path, config: &Config) -> Result<Verdict, ConvertError> {
    validate_with(&load_schema(config)?, path)
}

/// Writes the schema in effect to `destination`.
///
/// A directory destination receives a file named [`SCHEMA_FILE_NAME`].
/// Returns the path that was written.
///
/// # Errors
///
/// Returns an error if the configured schema cannot be read or the
/// destination cannot be written.
pub fn export_schema(config: &Config, destination: &Path) -> io::Result<PathBuf> {
    let target = if destination.is_dir() {
        destination.join(SCHEMA_FILE_NAME)
    } else {
        destination.to_path_buf()
    };

    match config.schema() {
        Some(schema) => {
            std::fs::copy(schema, &target)?;
        }
        None => std::fs::write(&target, storage::schema::BUNDLED_SCHEMA)?,
    }

    tracing::info!("Exported schema to {}", target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use rust_xlsxwriter::Workbook as XlsxWriter;
    use tempfile::TempDir;

    use super::*;
    use crate::storage::{Element, Grid, MemorySource};

    const HEADER: [&str; 7] = [
        "Name",
        "Type ID",
        "Parent",
        "Description",
        "Examples",
        "Notes",
        "Type PID",
    ];

    fn memory(rows: &[&[&str]]) -> MemorySource {
        let mut grid = vec![vec!["MQM Error Types"], HEADER.to_vec()];
        grid.extend(rows.iter().map(|row| row.to_vec()));
        MemorySource::new().with_sheet("Typology", Grid::from_rows(grid))
    }

    fn write_workbook(path: &Path, rows: &[&[&str]]) {
        let mut writer = XlsxWriter::new();
        writer.add_worksheet().set_name("Cover").unwrap();
        let sheet = writer.add_worksheet();
        sheet.set_name("Typology").unwrap();
        sheet.write_string(0, 0, "MQM Error Types").unwrap();
        for (col, label) in (0..).zip(HEADER) {
            sheet.write_string(1, col, label).unwrap();
        }
        for (row, cells) in (2..).zip(rows) {
            for (col, value) in (0..).zip(cells.iter()) {
                if !value.is_empty() {
                    sheet.write_string(row, col, *value).unwrap();
                }
            }
        }
        writer.save(path).unwrap();
    }

    const TWO_ROWS: [&[&str]; 2] = [
        &["Accuracy", "ACC", "", "Accuracy issues", "e.g. X", "note1", "1"],
        &["Mistranslation", "ACC-MT", "ACC", "Sub-issue", "e.g. Y", "note2", "1.1"],
    ];

    #[test]
    fn converts_workbook_end_to_end() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("typology.xlsx");
        let destination = dir.path().join("typology.xml");
        write_workbook(&source, &TWO_ROWS);

        let outcome = convert(&source, "Typology", &destination, &Config::default());

        assert_eq!(outcome.success(), Some(true), "{}", outcome.message());
        assert_eq!(
            outcome.message(),
            "Conversion complete and validation successful!"
        );
        let Outcome::Succeeded(conversion) = outcome else {
            unreachable!()
        };
        assert_eq!(conversion.records, 2);
        assert_eq!(conversion.roots, 1);
        assert_eq!(conversion.max_depth, 1);

        let root = Element::load(&destination).unwrap();
        assert_eq!(root.attribute("edition"), Some("MQM2021"));
        let acc = &root.children[0];
        assert_eq!(acc.attribute("id"), Some("ACC"));
        assert_eq!(acc.attribute("level"), Some("0"));
        let mt = acc.children_named("errorType").next().unwrap();
        assert_eq!(mt.attribute("id"), Some("ACC-MT"));
        assert_eq!(mt.attribute("PID"), Some("1.1"));
        assert_eq!(mt.attribute("level"), Some("1"));
    }

    #[test]
    fn lists_sheets_in_file_order() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("typology.xlsx");
        write_workbook(&source, &TWO_ROWS);

        assert_eq!(sheet_names(&source).unwrap(), ["Cover", "Typology"]);
    }

    #[test]
    fn three_levels_in_source_order() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out.xml");
        let mut source = memory(&[
            &["Fluency", "FLU", "", "", "", "", ""],
            &["Accuracy", "ACC", "", "", "", "", ""],
            &["Mistranslation", "ACC-MT", "ACC", "", "", "", ""],
            &["Technical", "ACC-MT-T", "ACC-MT", "", "", "", ""],
        ]);

        let conversion =
            convert_from(&mut source, "Typology", &destination, &Config::default()).unwrap();

        assert_eq!(conversion.roots, 2);
        assert_eq!(conversion.max_depth, 2);

        let root = Element::load(&destination).unwrap();
        let ids: Vec<_> = root
            .children
            .iter()
            .filter_map(|child| child.attribute("id"))
            .collect();
        assert_eq!(ids, ["FLU", "ACC"]);
        let deepest = root.children[1].children_named("errorType").next().unwrap();
        let deepest = deepest.children_named("errorType").next().unwrap();
        assert_eq!(deepest.attribute("level"), Some("2"));
    }

    #[test]
    fn blank_id_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out.xml");
        let mut source = memory(&[&["Accuracy", "", "", "", "", "", ""]]);

        let error =
            convert_from(&mut source, "Typology", &destination, &Config::default()).unwrap_err();

        assert_eq!(
            error.to_string(),
            "An error cannot have a blank id. Error name: Accuracy, Row: 3"
        );
        assert!(!destination.exists());
    }

    #[test]
    fn blank_separator_rows_are_skipped() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out.xml");
        let mut source = memory(&[
            TWO_ROWS[0],
            &["", "", "", "", "", "", ""],
            TWO_ROWS[1],
            &[""],
        ]);

        let conversion =
            convert_from(&mut source, "Typology", &destination, &Config::default()).unwrap();

        assert_eq!(conversion.records, 2);
        assert_eq!(conversion.max_depth, 1);
    }

    #[test]
    fn blank_row_under_title_is_skipped() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out.xml");
        let grid = Grid::from_rows([
            vec!["MQM Error Types"],
            vec![""],
            HEADER.to_vec(),
            TWO_ROWS[0].to_vec(),
            TWO_ROWS[1].to_vec(),
        ]);
        let mut source = MemorySource::new().with_sheet("Typology", grid);

        let conversion =
            convert_from(&mut source, "Typology", &destination, &Config::default()).unwrap();

        assert_eq!(conversion.records, 2);
    }

    #[test]
    fn blank_rows_fail_when_not_skipped() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out.xml");
        let mut source = memory(&[TWO_ROWS[0], &["", "", "", "", "", "", ""], TWO_ROWS[1]]);
        let mut config = Config::default();
        config.skip_blank_rows = false;

        let error = convert_from(&mut source, "Typology", &destination, &config).unwrap_err();

        assert_eq!(error.to_string(), "An error cannot have a blank name. Row: 4");
        assert!(!destination.exists());
    }

    #[test]
    fn deep_chain_converts_and_validates() {
        const DEPTH: usize = 3_000;

        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out.xml");
        let rows: Vec<Vec<String>> = (0..DEPTH)
            .map(|level| {
                let parent = level.checked_sub(1).map(|p| format!("E{p}")).unwrap_or_default();
                vec![
                    format!("Issue {level}"),
                    format!("E{level}"),
                    parent,
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                ]
            })
            .collect();
        let mut grid = vec![
            vec!["MQM Error Types".to_string()],
            HEADER.iter().map(ToString::to_string).collect(),
        ];
        grid.extend(rows);
        let mut source = MemorySource::new().with_sheet("Typology", Grid::from_rows(grid));

        let conversion =
            convert_from(&mut source, "Typology", &destination, &Config::default()).unwrap();

        assert_eq!(conversion.records, DEPTH);
        assert_eq!(conversion.max_depth, DEPTH - 1);
    }

    #[test]
    fn missing_description_column_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out.xml");
        let grid = Grid::from_rows([
            vec!["MQM"],
            vec!["Name", "Type ID", "Examples", "Notes"],
            vec!["Accuracy", "ACC", "", ""],
        ]);
        let mut source = MemorySource::new().with_sheet("Typology", grid);

        let error =
            convert_from(&mut source, "Typology", &destination, &Config::default()).unwrap_err();

        assert!(matches!(
            error,
            ConvertError::Extract(ExtractError::MissingColumns { .. })
        ));
        assert!(!destination.exists());
    }

    #[test]
    fn missing_marker() {
        let dir = TempDir::new().unwrap();
        let grid = Grid::from_rows([HEADER.to_vec()]);
        let mut source = MemorySource::new().with_sheet("Typology", grid);

        let error = convert_from(
            &mut source,
            "Typology",
            &dir.path().join("out.xml"),
            &Config::default(),
        )
        .unwrap_err();

        assert_eq!(error.to_string(), "MQM not found in any row");
    }

    #[test]
    fn custom_marker() {
        let dir = TempDir::new().unwrap();
        let grid = Grid::from_rows([
            vec!["Acme issue catalogue"],
            HEADER.to_vec(),
            vec!["Accuracy", "ACC", "", "", "", "", ""],
        ]);
        let mut source = MemorySource::new().with_sheet("Typology", grid);
        let mut config = Config::default();
        config.set_marker("Acme");
        config.set_edition("ACME1");
        let destination = dir.path().join("out.xml");

        convert_from(&mut source, "Typology", &destination, &config).unwrap();

        let root = Element::load(&destination).unwrap();
        assert_eq!(root.attribute("edition"), Some("ACME1"));
    }

    #[test]
    fn duplicate_ids_are_both_written() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out.xml");
        let mut source = memory(&[
            &["First", "X", "", "", "", "", ""],
            &["Second", "X", "", "", "", "", ""],
        ]);

        let conversion =
            convert_from(&mut source, "Typology", &destination, &Config::default()).unwrap();

        assert_eq!(
            conversion.duplicates,
            [Duplicate {
                id: "X".to_string(),
                key: "X#2".to_string()
            }]
        );
        let root = Element::load(&destination).unwrap();
        assert_eq!(root.children.len(), 2);
        assert!(root
            .children
            .iter()
            .all(|child| child.attribute("id") == Some("X")));
    }

    #[test]
    fn orphans_are_reported_and_skipped() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out.xml");
        let mut source = memory(&[
            &["Accuracy", "ACC", "", "", "", "", ""],
            &["Stray", "STR", "NOPE", "", "", "", ""],
        ]);

        let conversion =
            convert_from(&mut source, "Typology", &destination, &Config::default()).unwrap();

        assert_eq!(conversion.orphans, ["STR"]);
        assert_eq!(Element::load(&destination).unwrap().children.len(), 1);
    }

    #[test]
    fn validation_failure_keeps_the_file() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out.xml");
        let strict = dir.path().join("strict.xsd");
        std::fs::write(
            &strict,
            storage::schema::BUNDLED_SCHEMA.replace("xs:nonNegativeInteger", "xs:positiveInteger"),
        )
        .unwrap();
        let mut config = Config::default();
        config.set_schema(Some(strict));
        let mut source = memory(&TWO_ROWS);

        let error = convert_from(&mut source, "Typology", &destination, &config).unwrap_err();

        assert_eq!(error.to_string(), "File was written, but failed validation");
        let ConvertError::Validation { violations, .. } = error else {
            unreachable!()
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "/typology/errorType[1]");
        assert!(destination.exists());
    }

    #[test]
    fn broken_schema_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out.xml");
        let mut config = Config::default();
        config.set_schema(Some(dir.path().join("missing.xsd")));
        let mut source = memory(&TWO_ROWS);

        let error = convert_from(&mut source, "Typology", &destination, &config).unwrap_err();

        assert!(matches!(error, ConvertError::Schema(SchemaError::Io { .. })));
        assert!(!destination.exists());
    }

    #[test]
    fn unknown_sheet_fails() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("typology.xlsx");
        write_workbook(&source, &TWO_ROWS);

        let outcome = convert(
            &source,
            "Missing",
            &dir.path().join("out.xml"),
            &Config::default(),
        );

        assert_eq!(outcome.success(), Some(false));
        assert_eq!(
            outcome.message(),
            "Conversion failed: Couldn't identify a worksheet to open"
        );
    }

    #[test]
    fn aborted_outcome() {
        assert_eq!(Outcome::Aborted.success(), None);
    }

    #[test]
    fn rejects_bad_paths_before_reading() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("typology.xlsx");
        write_workbook(&existing, &TWO_ROWS);
        let config = Config::default();

        let message = |source: &Path, destination: &Path| {
            convert(source, "Typology", destination, &config).message()
        };

        assert_eq!(
            message(Path::new(""), &dir.path().join("out.xml")),
            "Conversion failed: source path cannot be empty"
        );
        assert_eq!(
            message(&dir.path().join("absent.xlsx"), &dir.path().join("out.xml")),
            "Conversion failed: source must be a valid path to .XLSX file"
        );
        assert_eq!(
            message(&existing, Path::new("")),
            "Conversion failed: destination path cannot be empty"
        );
        assert_eq!(
            message(&existing, &dir.path().join("out.txt")),
            "Conversion failed: destination must be a valid path to .XML file"
        );
    }

    #[test]
    fn extension_check_ignores_case() {
        assert_eq!(check_destination(Path::new("OUT.XML")), Ok(()));
        assert_eq!(
            check_destination(Path::new("out")),
            Err(PathProblem::WrongKind(".XML"))
        );
    }

    #[test]
    fn validates_existing_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.xml");
        std::fs::write(&path, r#"<typology><errorType/></typology>"#).unwrap();

        let verdict = validate(&path, &Config::default()).unwrap();

        assert!(!verdict.is_valid());
        assert!(verdict
            .violations()
            .iter()
            .any(|v| v.message == "missing required attribute 'edition'"));
    }

    #[test]
    fn exports_bundled_schema_into_directory() {
        let dir = TempDir::new().unwrap();

        let written = export_schema(&Config::default(), dir.path()).unwrap();

        assert_eq!(written, dir.path().join(SCHEMA_FILE_NAME));
        assert_eq!(
            std::fs::read_to_string(written).unwrap(),
            storage::schema::BUNDLED_SCHEMA
        );
    }

    #[test]
    fn exports_configured_schema_to_file() {
        let dir = TempDir::new().unwrap();
        let custom = dir.path().join("custom.xsd");
        std::fs::write(&custom, "<xs:schema/>").unwrap();
        let mut config = Config::default();
        config.set_schema(Some(custom));
        let target = dir.path().join("copy.xsd");

        assert_eq!(export_schema(&config, &target).unwrap(), target);
        assert_eq!(std::fs::read_to_string(target).unwrap(), "<xs:schema/>");
    }
}
