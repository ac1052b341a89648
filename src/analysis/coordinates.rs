/// Static province coordinate table used to place map markers
///
/// Coordinates are approximate province centroids. The table can be replaced
/// at startup with a JSON file of the form `{ "Aceh": [95.3, 5.5], ... }`
/// (longitude first).
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;
use utoipa::ToSchema;

use crate::workbook::normalize_province_name;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum CoordinateError {
    #[error("Failed to read coordinate table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid coordinate table JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Coordinate for {province} out of range: lon {longitude}, lat {latitude}")]
    OutOfRange {
        province: String,
        longitude: f64,
        latitude: f64,
    },
}

// (province, longitude, latitude)
const BUILTIN_COORDINATES: &[(&str, f64, f64)] = &[
    // Sumatera
    ("Aceh", 95.3, 5.5),
    ("Sumatera Utara", 99.1, 2.5),
    ("Sumatera Barat", 100.5, -0.5),
    ("Riau", 101.8, 0.5),
    ("Jambi", 103.6, -1.6),
    ("Sumatera Selatan", 104.7, -3.2),
    ("Bengkulu", 102.3, -3.8),
    ("Lampung", 105.3, -5.2),
    ("Kepulauan Bangka Belitung", 106.0, -2.3),
    // Jawa-Bali
    ("Banten", 106.1, -6.2),
    ("DKI Jakarta", 106.8, -6.2),
    ("Jawa Barat", 107.5, -6.8),
    ("Jawa Tengah", 110.0, -7.0),
    ("DI Yogyakarta", 110.4, -7.8),
    ("Jawa Timur", 112.0, -7.5),
    ("Bali", 115.2, -8.4),
    // Nusa Tenggara
    ("NTB", 117.0, -8.6),
    ("Nusa Tenggara Barat", 117.0, -8.6),
    ("NTT", 121.1, -8.6),
    ("Nusa Tenggara Timur", 121.1, -8.6),
    // Kalimantan
    ("Kalimantan Barat", 110.0, 0.0),
    ("Kalimantan Tengah", 113.9, -1.6),
    ("Kalimantan Selatan", 114.9, -3.0),
    ("Kalimantan Timur", 117.1, 0.0),
    ("Kalimantan Utara", 116.8, 2.8),
    // Sulawesi
    ("Sulawesi Utara", 124.8, 1.3),
    ("Gorontalo", 123.1, 0.6),
    ("Sulawesi Tengah", 121.3, -1.0),
    ("Sulawesi Barat", 119.3, -2.7),
    ("Sulawesi Selatan", 120.5, -4.5),
    ("Sulawesi Tenggara", 122.2, -4.1),
    // Maluku-Papua
    ("Maluku", 129.0, -3.2),
    ("Maluku Utara", 127.8, 1.3),
    ("Papua Barat", 133.5, -1.3),
    ("Papua Barat Daya", 132.3, -0.9),
    ("Papua", 138.5, -4.3),
    ("Papua Tengah", 136.5, -3.8),
    ("Papua Pegunungan", 139.4, -4.2),
    ("Papua Selatan", 140.1, -7.1),
];

#[derive(Debug, Clone)]
pub struct CoordinateLookup {
    entries: HashMap<String, Coordinate>,
}

impl Default for CoordinateLookup {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CoordinateLookup {
    /// The built-in Indonesian province table
    pub fn builtin() -> Self {
        let entries = BUILTIN_COORDINATES
            .iter()
            .map(|&(name, longitude, latitude)| {
                (name.to_string(), Coordinate { longitude, latitude })
            })
            .collect();
        Self { entries }
    }

    /// Parse a replacement table from JSON `{ "Name": [lon, lat] }`
    pub fn from_json_str(json: &str) -> Result<Self, CoordinateError> {
        let raw: HashMap<String, (f64, f64)> = serde_json::from_str(json)?;

        let mut entries = HashMap::with_capacity(raw.len());
        for (name, (longitude, latitude)) in raw {
            if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
                return Err(CoordinateError::OutOfRange {
                    province: name,
                    longitude,
                    latitude,
                });
            }
            entries.insert(
                normalize_province_name(&name),
                Coordinate { longitude, latitude },
            );
        }

        Ok(Self { entries })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CoordinateError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CoordinateError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let lookup = Self::from_json_str(&json)?;
        info!(
            "Loaded {} province coordinates from {}",
            lookup.len(),
            path.display()
        );
        Ok(lookup)
    }

    /// Coordinate for a province; the name is normalized before lookup
    pub fn get(&self, province: &str) -> Option<Coordinate> {
        self.entries
            .get(&normalize_province_name(province))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
