// Workbook module
//
// This module turns an uploaded province workbook into a tidy table.
// The "Gabung" sheet holds one labeled block per province:
// - a province name row, followed by a "Tahun" header row
// - one row per year: year | SST anomaly | rainfall anomaly | productivity anomaly
// - an optional trailing annotation row ("Anomali SST ...") and a gap row

pub mod block_parser;
pub mod grid;
pub mod tidy;

pub use block_parser::{parse, parse_with_report, BlockEnd, ParseReport};
pub use grid::{
    read_grid_from_bytes, read_grid_from_path, Cell, RawGrid, WorkbookReadError, GRID_COLUMNS,
};
pub use tidy::{normalize_province_name, Observation, TidyTable};
