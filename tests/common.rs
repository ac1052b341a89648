#![allow(dead_code)]

use anomaly_correlation_service::workbook::{Cell, RawGrid};
use rust_xlsxwriter::{Workbook, XlsxError};

pub const SHEET: &str = "Gabung";

pub fn text(value: &str) -> Cell {
    Cell::text(value)
}

/// Province name row, "Tahun" header row, then one row per (year, sst, rain, prod)
pub fn province_block(name: &str, rows: &[(i32, f64, f64, f64)]) -> Vec<Vec<Cell>> {
    let mut block = vec![
        vec![text(name)],
        vec![
            text("Tahun"),
            text("Anomali SST"),
            text("Anomali Curah Hujan"),
            text("Anomali Produktivitas"),
        ],
    ];
    block.extend(rows.iter().map(|&(year, sst, rain, prod)| {
        vec![
            Cell::Number(f64::from(year)),
            Cell::Number(sst),
            Cell::Number(rain),
            Cell::Number(prod),
        ]
    }));
    block
}

/// Two mapped provinces and one unknown one, separated by gap rows
pub fn sample_rows() -> Vec<Vec<Cell>> {
    let mut rows = vec![vec![text("Data anomali per provinsi")], vec![]];
    rows.extend(province_block(
        "Aceh",
        &[
            (2018, 1.0, 2.0, 3.0),
            (2019, 2.0, 4.0, 6.0),
            (2020, 3.0, 6.0, 9.0),
        ],
    ));
    rows.push(vec![]);
    rows.push(vec![]);
    rows.extend(province_block(
        "  Jawa   Barat ",
        &[
            (2018, 0.5, -1.0, -0.2),
            (2019, -0.3, 0.4, 0.1),
            (2020, 0.8, -0.9, -0.4),
            (2021, 0.1, 0.2, 0.3),
        ],
    ));
    rows.push(vec![text("Anomali SST rata-rata per tahun")]);
    rows.push(vec![]);
    rows.extend(province_block(
        "Atlantis",
        &[
            (2018, 0.1, 0.2, 0.3),
            (2019, 0.2, 0.1, 0.5),
            (2020, 0.4, 0.3, 0.2),
        ],
    ));
    rows
}

pub fn sample_grid() -> RawGrid {
    RawGrid::new(sample_rows())
}

/// Serialize rows into an in-memory .xlsx with a single sheet
pub fn xlsx_bytes(sheet: &str, rows: &[Vec<Cell>]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet)?;

    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = (r as u32, c as u16);
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    worksheet.write_string(r, c, s)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(r, c, *n)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(r, c, *b)?;
                }
                Cell::Date(serial) => {
                    worksheet.write_number(r, c, *serial)?;
                }
            }
        }
    }

    workbook.save_to_buffer()
}

pub fn sample_xlsx() -> Vec<u8> {
    xlsx_bytes(SHEET, &sample_rows()).expect("Failed to build sample workbook")
}
