/// Province block parser for the "Gabung" sheet
///
/// The sheet has no schema markers beyond a province name row followed by a
/// "Tahun" header row. Everything else is positional:
/// ```text
/// Row i:     <province name>
/// Row i+1:   Tahun | <labels ...>
/// Row i+2..: <year> | <SST anomaly> | <rainfall anomaly> | <productivity anomaly>
/// Row j:     blank, "Anomali SST ..." annotation, or anything that is not a year
/// Row j+1:   next header search starts here
/// ```
///
/// Row j is consumed as the block terminator and never considered as a
/// province name, even when it holds one.
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::workbook::grid::{Cell, RawGrid};
use crate::workbook::tidy::{normalize_province_name, Observation, TidyTable};

const HEADER_LABEL: &str = "tahun";
const ANNOTATION_MARKER: &str = "anomali sst";

/// Why a province block stopped collecting rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockEnd {
    BlankCell,
    AnnotationRow,
    NotAYear,
    EndOfSheet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSummary {
    pub province: String,
    pub header_row: usize,
    pub rows: usize,
    pub end: BlockEnd,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseReport {
    pub blocks: Vec<BlockSummary>,
    pub rows_extracted: usize,
    /// Rows removed during normalization (exact duplicates, blank names)
    pub rows_dropped: usize,
}

/// Extract the tidy table from a raw grid
///
/// Never fails: unrecognized rows are skipped, and a grid with no province
/// blocks gives an empty table.
pub fn parse(grid: &RawGrid) -> TidyTable {
    parse_with_report(grid).0
}

/// Same as [`parse`], also returning what was recognized where
pub fn parse_with_report(grid: &RawGrid) -> (TidyTable, ParseReport) {
    let height = grid.height();
    let mut records = Vec::new();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < height {
        let Some(province) = block_header(grid, i) else {
            i += 1;
            continue;
        };

        let mut j = i + 2;
        let mut rows = 0;
        let end = loop {
            if j >= height {
                break BlockEnd::EndOfSheet;
            }

            let first = grid.cell(j, 0);
            if first.is_empty() {
                break BlockEnd::BlankCell;
            }
            if is_annotation(first) {
                break BlockEnd::AnnotationRow;
            }
            let Some(year) = first.as_year() else {
                break BlockEnd::NotAYear;
            };

            records.push(Observation {
                province: province.clone(),
                year,
                sst_anomaly: grid.cell(j, 1).as_metric(),
                rainfall_anomaly: grid.cell(j, 2).as_metric(),
                productivity_anomaly: grid.cell(j, 3).as_metric(),
            });
            rows += 1;
            j += 1;
        };

        debug!(
            "Block '{}' at row {}: {} year rows, ended by {:?} at row {}",
            province, i, rows, end, j
        );
        blocks.push(BlockSummary {
            province,
            header_row: i,
            rows,
            end,
        });

        // The terminating row is never a header candidate, whatever it holds
        i = j + 1;
    }

    let rows_extracted = records.len();
    let table = TidyTable::from_records(records);
    let report = ParseReport {
        blocks,
        rows_extracted,
        rows_dropped: rows_extracted - table.len(),
    };

    if report.blocks.is_empty() {
        warn!("No province blocks recognized in {} rows", height);
    } else {
        info!(
            "Parsed {} province blocks, {} observations ({} dropped)",
            report.blocks.len(),
            table.len(),
            report.rows_dropped
        );
    }

    (table, report)
}

/// Province name if row `row` starts a block
fn block_header(grid: &RawGrid, row: usize) -> Option<String> {
    let name = grid.cell(row, 0).as_text()?;
    if name.trim().is_empty() {
        return None;
    }

    let label = grid.cell(row + 1, 0).as_text()?;
    if label.trim().to_lowercase() != HEADER_LABEL {
        return None;
    }

    Some(normalize_province_name(name))
}

fn is_annotation(cell: &Cell) -> bool {
    cell.as_text()
        .is_some_and(|s| s.to_lowercase().contains(ANNOTATION_MARKER))
}
