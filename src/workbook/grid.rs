/// Untyped cell grid read from the uploaded workbook
///
/// The block parser addresses cells by absolute sheet position, so the grid
/// always starts at cell A1 even when the sheet's used range starts later.
use calamine::{open_workbook, open_workbook_from_rs, Data, Reader, Xlsx, XlsxError};
use std::fmt;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum WorkbookReadError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Failed to read sheet {sheet}: {msg}")]
    SheetRead { sheet: String, msg: String },
}

/// A single spreadsheet cell with no schema attached
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Date-formatted cell, kept as its Excel serial
    Date(f64),
}

static EMPTY_CELL: Cell = Cell::Empty;

/// Leftmost columns kept from a sheet: year, three metrics and two spare
/// columns for layout inspection. Cells further right are never read.
pub const GRID_COLUMNS: usize = 6;

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text content, if this is a text cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the cell as a calendar year in 1900..=2100
    ///
    /// Whole numbers and integer text (surrounding whitespace allowed) qualify.
    /// Fractional numbers, "2018.0" style text and booleans do not.
    pub fn as_year(&self) -> Option<i32> {
        let year = match self {
            Cell::Number(f) if f.is_finite() && f.fract() == 0.0 => *f as i64,
            Cell::Text(s) => s.trim().parse::<i64>().ok()?,
            _ => return None,
        };

        if (1900..=2100).contains(&year) {
            Some(year as i32)
        } else {
            None
        }
    }

    /// Coerce the cell to a finite number, anything else is missing
    pub fn as_metric(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(f) => *f,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Empty | Cell::Bool(_) | Cell::Date(_) => return None,
        };

        value.is_finite().then_some(value)
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Bool(*b),
            // A date is neither a year nor a metric, even when its serial looks like one
            Data::DateTime(dt) => Cell::Date(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(e.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => write!(f, ""),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Date(serial) => write!(f, "date:{serial}"),
        }
    }
}

/// Rows of cells, positions significant, ragged rows allowed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    rows: Vec<Vec<Cell>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Number of rows in the grid
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at (row, col); anything outside the grid reads as empty
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Build a grid from `(row, col, cell)` triples at absolute sheet positions
    pub fn from_cells(cells: impl IntoIterator<Item = (usize, usize, Cell)>) -> Self {
        let mut grid = Self::default();
        for (row, col, cell) in cells {
            grid.place(row, col, cell);
        }
        grid
    }

    /// Put a cell at its sheet position, growing only the row it lands in
    ///
    /// Cells right of [`GRID_COLUMNS`] and empty cells are dropped, so a
    /// stray cell far from the data cannot inflate the grid.
    fn place(&mut self, row: usize, col: usize, cell: Cell) {
        if col >= GRID_COLUMNS || cell.is_empty() {
            return;
        }

        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, Cell::Empty);
        }
        cells[col] = cell;
    }
}

/// Read the named sheet from an in-memory .xlsx upload
pub fn read_grid_from_bytes(bytes: &[u8], sheet_name: &str) -> Result<RawGrid, WorkbookReadError> {
    let mut workbook: Xlsx<Cursor<&[u8]>> = match open_workbook_from_rs(Cursor::new(bytes)) {
        Ok(wb) => wb,
        Err(e) => return Err(WorkbookReadError::WorkbookOpen(e.to_string())),
    };

    read_sheet(&mut workbook, sheet_name)
}

/// Read the named sheet from an .xlsx file on disk
pub fn read_grid_from_path(
    path: impl AsRef<Path>,
    sheet_name: &str,
) -> Result<RawGrid, WorkbookReadError> {
    let mut workbook: Xlsx<_> = match open_workbook(path.as_ref()) {
        Ok(wb) => wb,
        Err(e) => return Err(WorkbookReadError::WorkbookOpen(e.to_string())),
    };

    read_sheet(&mut workbook, sheet_name)
}

fn read_sheet<RS: Read + Seek>(
    workbook: &mut Xlsx<RS>,
    sheet_name: &str,
) -> Result<RawGrid, WorkbookReadError> {
    let sheet_names = workbook.sheet_names();
    debug!("Workbook sheets: {:?}", sheet_names);

    if !sheet_names.iter().any(|name| name == sheet_name) {
        return Err(WorkbookReadError::SheetNotFound(sheet_name.to_string()));
    }

    let read_error = |e: XlsxError| WorkbookReadError::SheetRead {
        sheet: sheet_name.to_string(),
        msg: e.to_string(),
    };

    // Stream cells instead of loading the dense used range, whose size is set
    // by the farthest cell rather than by the data
    let mut reader = workbook
        .worksheet_cells_reader(sheet_name)
        .map_err(read_error)?;
    let mut grid = RawGrid::default();
    while let Some(cell) = reader.next_cell().map_err(read_error)? {
        let (row, col) = cell.get_position();
        if col as usize >= GRID_COLUMNS {
            continue;
        }
        let data = Data::from(cell.get_value().clone());
        grid.place(row as usize, col as usize, Cell::from(&data));
    }

    info!("Read {} rows from sheet {}", grid.height(), sheet_name);

    Ok(grid)
}
