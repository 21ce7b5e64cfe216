//! Raw file rows

use serde::{Deserialize, Serialize};

use super::RowSnapshot;

/// Columns the importer understands
///
/// `ALL` is also the positional order of spreadsheet columns 1-9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowField {
    Year,
    Age,
    Classification,
    Neighborhood,
    Latitude,
    Longitude,
    Address,
    City,
    Notes,
}

impl RowField {
    pub const ALL: [RowField; 9] = [
        RowField::Year,
        RowField::Age,
        RowField::Classification,
        RowField::Neighborhood,
        RowField::Latitude,
        RowField::Longitude,
        RowField::Address,
        RowField::City,
        RowField::Notes,
    ];

    /// Match a CSV header cell (English or Spanish, any case, accents optional)
    pub fn from_header(header: &str) -> Option<Self> {
        let field = match normalize_header(header).as_str() {
            "year" | "ano" | "anio" => RowField::Year,
            "age" | "edad" => RowField::Age,
            "classification" | "clasificacion" | "clasificacion_dengue" => {
                RowField::Classification
            }
            "neighborhood" | "neighbourhood" | "barrio" => RowField::Neighborhood,
            "latitude" | "latitud" | "lat" => RowField::Latitude,
            "longitude" | "longitud" | "lon" | "lng" | "long" => RowField::Longitude,
            "address" | "direccion" => RowField::Address,
            "city" | "ciudad" | "municipio" => RowField::City,
            "notes" | "observaciones" | "observations" => RowField::Notes,
            _ => return None,
        };
        Some(field)
    }
}

fn normalize_header(header: &str) -> String {
    header
        .trim_matches(|c: char| c == '\u{feff}' || c.is_whitespace())
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            ' ' | '-' => '_',
            other => other,
        })
        .collect()
}

/// One row as read from the file
///
/// All values are text; absent columns are blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    pub year: String,
    pub age: String,
    pub classification: String,
    pub neighborhood: String,
    pub latitude: String,
    pub longitude: String,
    pub address: String,
    pub city: String,
    pub notes: String,
}

impl ImportRow {
    /// Build a row from positional values (spreadsheet columns 1-9)
    ///
    /// Missing trailing values stay blank; extra values are ignored.
    pub fn from_positional<S: AsRef<str>>(values: &[S]) -> Self {
        let mut row = Self::default();
        for (field, value) in RowField::ALL.iter().zip(values) {
            row.set(*field, value.as_ref());
        }
        row
    }

    pub fn set(&mut self, field: RowField, value: &str) {
        let value = value.trim().to_string();
        match field {
            RowField::Year => self.year = value,
            RowField::Age => self.age = value,
            RowField::Classification => self.classification = value,
            RowField::Neighborhood => self.neighborhood = value,
            RowField::Latitude => self.latitude = value,
            RowField::Longitude => self.longitude = value,
            RowField::Address => self.address = value,
            RowField::City => self.city = value,
            RowField::Notes => self.notes = value,
        }
    }

    pub fn get(&self, field: RowField) -> &str {
        match field {
            RowField::Year => &self.year,
            RowField::Age => &self.age,
            RowField::Classification => &self.classification,
            RowField::Neighborhood => &self.neighborhood,
            RowField::Latitude => &self.latitude,
            RowField::Longitude => &self.longitude,
            RowField::Address => &self.address,
            RowField::City => &self.city,
            RowField::Notes => &self.notes,
        }
    }

    /// True when every field is blank (e.g. trailing spreadsheet rows)
    pub fn is_blank(&self) -> bool {
        RowField::ALL
            .iter()
            .all(|field| self.get(*field).trim().is_empty())
    }

    /// Key fields kept in error reports
    pub fn snapshot(&self) -> RowSnapshot {
        RowSnapshot {
            year: self.year.clone(),
            age: self.age.clone(),
            classification: self.classification.clone(),
            neighborhood: self.neighborhood.clone(),
            latitude: self.latitude.clone(),
            longitude: self.longitude.clone(),
        }
    }
}
