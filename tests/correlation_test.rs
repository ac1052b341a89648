// Correlation engine properties and the coordinate join

mod common;

use anomaly_correlation_service::analysis::{
    compute, compute_with_coordinates, pearson, CoordinateLookup, MetricPair,
};
use anomaly_correlation_service::workbook::parse;
use common::sample_grid;

const XS: [f64; 6] = [0.4, -1.2, 0.9, 2.5, -0.3, 1.1];
const YS: [f64; 6] = [1.0, -0.5, 0.2, 1.8, 0.1, -0.7];

#[test]
fn test_pearson_is_symmetric() {
    assert_eq!(pearson(&XS, &YS), pearson(&YS, &XS));
}

#[test]
fn test_pearson_stays_within_bounds() {
    let r = pearson(&XS, &YS).expect("Expected a defined coefficient");
    assert!((-1.0..=1.0).contains(&r));

    let self_r = pearson(&XS, &XS).expect("Expected a defined coefficient");
    assert!(self_r <= 1.0);
    assert!((self_r - 1.0).abs() < 1e-12);
}

#[test]
fn test_pearson_affine_invariance() {
    let r = pearson(&XS, &YS).expect("Expected a defined coefficient");

    let scaled: Vec<f64> = XS.iter().map(|x| 3.5 * x + 10.0).collect();
    let scaled_r = pearson(&scaled, &YS).expect("Expected a defined coefficient");
    assert!((scaled_r - r).abs() < 1e-9);

    let flipped: Vec<f64> = XS.iter().map(|x| -2.0 * x + 1.0).collect();
    let flipped_r = pearson(&flipped, &YS).expect("Expected a defined coefficient");
    assert!((flipped_r + r).abs() < 1e-9);
}

#[test]
fn test_pearson_undefined_inputs() {
    assert_eq!(pearson(&[1.0, 2.0], &[2.0, 4.0]), None);
    assert_eq!(pearson(&[], &[]), None);
    assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
    assert_eq!(pearson(&[1.0, 2.0, 3.0], &[0.5, 0.5, 0.5]), None);
}

#[test]
fn test_one_row_per_province_in_table_order() {
    let table = parse(&sample_grid());
    let rows = compute(&table);

    let provinces: Vec<&str> = rows.iter().map(|row| row.province.as_str()).collect();
    assert_eq!(provinces, table.provinces());
    assert!(rows.iter().all(|row| row.coordinate().is_none()));
}

#[test]
fn test_unknown_province_keeps_coefficients_without_coordinate() {
    let table = parse(&sample_grid());
    let rows = compute_with_coordinates(&table, &CoordinateLookup::builtin());

    let atlantis = rows
        .iter()
        .find(|row| row.province == "Atlantis")
        .expect("Atlantis row missing");
    assert_eq!(atlantis.longitude, None);
    assert_eq!(atlantis.latitude, None);
    assert!(atlantis.sst_productivity.is_some());

    let jawa_barat = rows
        .iter()
        .find(|row| row.province == "Jawa Barat")
        .expect("Jawa Barat row missing");
    assert!(jawa_barat.coordinate().is_some());
}

#[test]
fn test_coefficient_accessor_matches_fields() {
    let rows = compute(&parse(&sample_grid()));
    for row in &rows {
        assert_eq!(row.coefficient(MetricPair::SstProductivity), row.sst_productivity);
        assert_eq!(row.coefficient(MetricPair::SstRainfall), row.sst_rainfall);
        assert_eq!(
            row.coefficient(MetricPair::RainfallProductivity),
            row.rainfall_productivity
        );
    }
}

#[test]
fn test_custom_coordinate_table() {
    let lookup = CoordinateLookup::from_json_str(r#"{ "Atlantis": [120.0, -2.0] }"#)
        .expect("Failed to parse coordinate table");
    let rows = compute_with_coordinates(&parse(&sample_grid()), &lookup);

    let mapped: Vec<&str> = rows
        .iter()
        .filter(|row| row.coordinate().is_some())
        .map(|row| row.province.as_str())
        .collect();
    assert_eq!(mapped, vec!["Atlantis"]);
}
