//! Spreadsheet access
//!
//! A [`TabularSource`] lists its worksheets and materializes one of them as a
//! [`Grid`] of cell text. [`Workbook`] reads `.xlsx` files; [`MemorySource`]
//! serves grids that are already in memory.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use calamine::{Data, Range, Reader, Xlsx, XlsxError, open_workbook};

/// Errors that can occur when reading a tabular source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The workbook could not be opened or is not a spreadsheet.
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        /// The workbook location.
        path: PathBuf,
        /// The underlying reader error.
        source: XlsxError,
    },

    /// The requested worksheet does not exist.
    #[error("Couldn't identify a worksheet to open")]
    UnknownSheet(String),

    /// The worksheet exists but its cells could not be read.
    #[error("failed to read worksheet '{sheet}': {source}")]
    Sheet {
        /// The worksheet name.
        sheet: String,
        /// The underlying reader error.
        source: XlsxError,
    },
}

/// Anything that can supply worksheets as grids of text.
pub trait TabularSource {
    /// Worksheet names, in file order.
    fn sheet_names(&self) -> Vec<String>;

    /// Reads every row of a worksheet as raw cell text.
    ///
    /// Rows and columns are positioned by absolute sheet coordinates, so
    /// `grid.row(0)` is always the first row of the sheet.
    ///
    /// # Errors
    ///
    /// Returns an error if the sheet does not exist or cannot be read.
    fn read_grid(&mut self, sheet: &str) -> Result<Grid, SourceError>;

    /// Reads a worksheet using `header_row` as the row of column labels.
    ///
    /// Earlier rows are discarded and every row is padded to a common width.
    ///
    /// # Errors
    ///
    /// Returns an error if the sheet does not exist or cannot be read.
    fn read_table(&mut self, sheet: &str, header_row: usize) -> Result<Table, SourceError> {
        Ok(self.read_grid(sheet)?.into_table(header_row))
    }
}

/// The raw cell text of a worksheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    /// Builds a grid from rows of cell values.
    pub fn from_rows<I, R, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    fn from_range(range: &Range<Data>) -> Self {
        let (first_row, first_col) = range
            .start()
            .map_or((0, 0), |(row, col)| (row as usize, col as usize));

        let mut rows = vec![Vec::new(); first_row];
        rows.extend(range.rows().map(|cells| {
            let mut row = vec![String::new(); first_col];
            row.extend(cells.iter().map(cell_text));
            row
        }));

        Self { rows }
    }

    /// Iterates over the rows.
    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Returns a single row, if it exists.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// The number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the grid has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Splits the grid into a header row and the data rows below it.
    #[must_use]
    pub fn into_table(self, header_row: usize) -> Table {
        let mut rows = self.rows.into_iter().skip(header_row);
        let mut header = rows.next().unwrap_or_default();
        let mut rows: Vec<Vec<String>> = rows.collect();

        let width = rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or_default();
        header.resize(width, String::new());
        for row in &mut rows {
            row.resize(width, String::new());
        }

        Table {
            header_row,
            header,
            rows,
        }
    }
}

/// A worksheet split into column labels and data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    header_row: usize,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// The column labels.
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows paired with their 1-based row number in the sheet.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &[String])> {
        let first = self.first_data_row();
        self.rows
            .iter()
            .enumerate()
            .map(move |(index, row)| (first + index, row.as_slice()))
    }

    /// The 1-based sheet row number of the first data row.
    #[must_use]
    pub const fn first_data_row(&self) -> usize {
        self.header_row + 2
    }

    /// The number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// An `.xlsx` workbook on disk.
///
/// The file stays open for as long as the value lives.
pub struct Workbook {
    path: PathBuf,
    inner: Xlsx<BufReader<File>>,
}

impl std::fmt::Debug for Workbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbook")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Workbook {
    /// Opens the workbook at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not an `.xlsx`
    /// workbook.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let inner = open_workbook::<Xlsx<_>, _>(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Opened workbook {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    /// The location the workbook was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TabularSource for Workbook {
    fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names()
    }

    fn read_grid(&mut self, sheet: &str) -> Result<Grid, SourceError> {
        if !self.inner.sheet_names().iter().any(|name| name == sheet) {
            return Err(SourceError::UnknownSheet(sheet.to_string()));
        }

        let range = self
            .inner
            .worksheet_range(sheet)
            .map_err(|source| SourceError::Sheet {
                sheet: sheet.to_string(),
                source,
            })?;

        Ok(Grid::from_range(&range))
    }
}

/// Worksheets held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sheets: Vec<(String, Grid)>,
}

impl MemorySource {
    /// Creates a source with no worksheets.
    #[must_use]
    pub const fn new() -> Self {
        Self { sheets: Vec::new() }
    }

    /// Adds a worksheet, after any existing ones.
    #[must_use]
    pub fn with_sheet(mut self, name: impl Into<String>, grid: Grid) -> Self {
        self.sheets.push((name.into(), grid));
        self
    }
}

impl TabularSource for MemorySource {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_grid(&mut self, sheet: &str) -> Result<Grid, SourceError> {
        self.sheets
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, grid)| grid.clone())
            .ok_or_else(|| SourceError::UnknownSheet(sheet.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use rust_xlsxwriter::Workbook as XlsxWriter;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn into_table_pads_rows_to_common_width() {
        let grid = Grid::from_rows([vec!["title"], vec!["a", "b"], vec!["1"], vec!["2", "3", "4"]]);

        let table = grid.into_table(1);

        assert_eq!(table.header(), ["a", "b", ""]);
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows[0], (3, &["1".to_string(), String::new(), String::new()][..]));
        assert_eq!(rows[1].0, 4);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn into_table_past_the_end_is_empty() {
        let table = Grid::from_rows([vec!["only"]]).into_table(5);
        assert!(table.header().is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn memory_source_lists_and_reads_sheets() {
        let mut source = MemorySource::new()
            .with_sheet("Intro", Grid::default())
            .with_sheet("Typology", Grid::from_rows([["MQM"]]));

        assert_eq!(source.sheet_names(), ["Intro", "Typology"]);
        assert_eq!(source.read_grid("Typology").unwrap().len(), 1);
        assert!(matches!(
            source.read_grid("Missing"),
            Err(SourceError::UnknownSheet(name)) if name == "Missing"
        ));
    }

    #[test]
    fn workbook_reads_cells_at_absolute_positions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("typology.xlsx");

        let mut writer = XlsxWriter::new();
        writer.add_worksheet().set_name("Notes").unwrap();
        let sheet = writer.add_worksheet();
        sheet.set_name("Typology").unwrap();
        sheet.write_string(2, 1, "MQM Error Types").unwrap();
        sheet.write_number(3, 1, 1.0).unwrap();
        sheet.write_number(3, 2, 1.5).unwrap();
        sheet.write_boolean(3, 3, true).unwrap();
        writer.save(&path).unwrap();

        let mut workbook = Workbook::open(&path).unwrap();
        assert_eq!(workbook.path(), path);
        assert_eq!(workbook.sheet_names(), ["Notes", "Typology"]);

        let grid = workbook.read_grid("Typology").unwrap();
        assert_eq!(grid.len(), 4);
        assert!(grid.row(0).unwrap().is_empty());
        assert_eq!(grid.row(2).unwrap(), ["", "MQM Error Types", "", ""]);
        assert_eq!(grid.row(3).unwrap(), ["", "1", "1.5", "true"]);
    }

    #[test]
    fn workbook_rejects_unknown_sheet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("typology.xlsx");
        let mut writer = XlsxWriter::new();
        writer.add_worksheet();
        writer.save(&path).unwrap();

        let mut workbook = Workbook::open(&path).unwrap();
        let error = workbook.read_grid("Missing").unwrap_err();

        assert_eq!(error.to_string(), "Couldn't identify a worksheet to open");
    }

    #[test]
    fn open_fails_for_non_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, "not a zip archive").unwrap();

        assert!(matches!(
            Workbook::open(&path),
            Err(SourceError::Open { .. })
        ));
    }
}
