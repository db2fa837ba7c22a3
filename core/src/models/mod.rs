//! Domain models for the aggregation pipeline.
//!
//! This module contains the data shared read-only by every builder:
//!
//! - [`CategoricalField`] / [`NumericField`] - The fixed field vocabulary
//! - [`Observation`] - One penguin observation
//! - [`RecordStore`] - The loaded collection of observations
//!
//! The two field enums are disjoint by construction, so a name can never be
//! both a categorical and a numeric field.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::SelectionError;

// =============================================================================
// Categorical Fields
// =============================================================================

/// Categorical column of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    Island,
    Species,
    Diet,
    Sex,
    LifeStage,
    Year,
}

impl CategoricalField {
    /// Every categorical field, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Island,
        Self::Species,
        Self::Diet,
        Self::Sex,
        Self::LifeStage,
        Self::Year,
    ];

    /// Column name in the source CSV.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Island => "island",
            Self::Species => "species",
            Self::Diet => "diet",
            Self::Sex => "sex",
            Self::LifeStage => "life_stage",
            Self::Year => "year",
        }
    }

    /// Look up a field by its column name.
    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == name)
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for CategoricalField {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_column(s.trim()).ok_or_else(|| SelectionError::UnknownField(s.to_string()))
    }
}

// =============================================================================
// Numeric Fields
// =============================================================================

/// Continuous measurement column of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    BodyMassG,
    FlipperLengthMm,
    BillLengthMm,
    BillDepthMm,
}

impl NumericField {
    /// Every numeric field, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::BodyMassG,
        Self::FlipperLengthMm,
        Self::BillLengthMm,
        Self::BillDepthMm,
    ];

    /// Column name in the source CSV.
    pub fn column(&self) -> &'static str {
        match self {
            Self::BodyMassG => "body_mass_g",
            Self::FlipperLengthMm => "flipper_length_mm",
            Self::BillLengthMm => "bill_length_mm",
            Self::BillDepthMm => "bill_depth_mm",
        }
    }

    /// Look up a field by its column name.
    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == name)
    }

    /// Position in the vocabulary, used to keep selections in declaration order.
    pub fn ordinal(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for NumericField {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_column(s.trim()).ok_or_else(|| SelectionError::UnknownField(s.to_string()))
    }
}

// =============================================================================
// Observation
// =============================================================================

/// One observation record.
///
/// Every declared field is present as a slot; `None` is the missing marker.
/// Records are built once by the loader and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub island: Option<String>,
    pub species: Option<String>,
    pub diet: Option<String>,
    pub sex: Option<String>,
    pub life_stage: Option<String>,
    pub year: Option<i32>,
    pub body_mass_g: Option<f64>,
    pub flipper_length_mm: Option<f64>,
    pub bill_length_mm: Option<f64>,
    pub bill_depth_mm: Option<f64>,
}

impl Observation {
    /// Categorical value of `field`, with the year rendered as its string form.
    ///
    /// Empty strings are reported as missing.
    pub fn categorical(&self, field: CategoricalField) -> Option<Cow<'_, str>> {
        let text = match field {
            CategoricalField::Island => self.island.as_deref(),
            CategoricalField::Species => self.species.as_deref(),
            CategoricalField::Diet => self.diet.as_deref(),
            CategoricalField::Sex => self.sex.as_deref(),
            CategoricalField::LifeStage => self.life_stage.as_deref(),
            CategoricalField::Year => return self.year.map(|y| Cow::Owned(y.to_string())),
        };
        text.filter(|s| !s.is_empty()).map(Cow::Borrowed)
    }

    /// Numeric value of `field`; NaN counts as missing.
    pub fn numeric(&self, field: NumericField) -> Option<f64> {
        let value = match field {
            NumericField::BodyMassG => self.body_mass_g,
            NumericField::FlipperLengthMm => self.flipper_length_mm,
            NumericField::BillLengthMm => self.bill_length_mm,
            NumericField::BillDepthMm => self.bill_depth_mm,
        };
        value.filter(|v| !v.is_nan())
    }

    /// Set a categorical slot. The year slot only accepts integer text.
    pub fn with_categorical(mut self, field: CategoricalField, value: impl Into<String>) -> Self {
        let value = value.into();
        match field {
            CategoricalField::Island => self.island = Some(value),
            CategoricalField::Species => self.species = Some(value),
            CategoricalField::Diet => self.diet = Some(value),
            CategoricalField::Sex => self.sex = Some(value),
            CategoricalField::LifeStage => self.life_stage = Some(value),
            CategoricalField::Year => self.year = value.trim().parse().ok(),
        }
        self
    }

    /// Set a numeric slot.
    pub fn with_numeric(mut self, field: NumericField, value: f64) -> Self {
        let slot = match field {
            NumericField::BodyMassG => &mut self.body_mass_g,
            NumericField::FlipperLengthMm => &mut self.flipper_length_mm,
            NumericField::BillLengthMm => &mut self.bill_length_mm,
            NumericField::BillDepthMm => &mut self.bill_depth_mm,
        };
        *slot = Some(value);
        self
    }
}

// =============================================================================
// Record Store
// =============================================================================

/// In-memory collection of observations, in load order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecordStore {
    records: Vec<Observation>,
}

impl RecordStore {
    pub fn new(records: Vec<Observation>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Observation] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct present values of `field`, in first-occurrence order.
    pub fn distinct_values(&self, field: CategoricalField) -> Vec<String> {
        distinct_values(&self.records, field)
    }
}

impl From<Vec<Observation>> for RecordStore {
    fn from(records: Vec<Observation>) -> Self {
        Self::new(records)
    }
}

/// Distinct present values of `field` across `records`, in first-occurrence order.
pub fn distinct_values(records: &[Observation], field: CategoricalField) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    records
        .iter()
        .filter_map(|r| r.categorical(field))
        .filter(|v| seen.insert(v.to_string()))
        .map(Cow::into_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_round_trip() {
        for field in CategoricalField::ALL {
            assert_eq!(field.column().parse::<CategoricalField>().unwrap(), field);
        }
        for field in NumericField::ALL {
            assert_eq!(field.column().parse::<NumericField>().unwrap(), field);
        }
    }

    #[test]
    fn test_vocabularies_are_disjoint() {
        for field in CategoricalField::ALL {
            assert!(NumericField::from_column(field.column()).is_none());
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = "beak_colour".parse::<NumericField>().unwrap_err();
        assert!(err.to_string().contains("beak_colour"));
    }

    #[test]
    fn test_serde_names_match_columns() {
        let json = serde_json::to_string(&NumericField::FlipperLengthMm).unwrap();
        assert_eq!(json, "\"flipper_length_mm\"");
        let json = serde_json::to_string(&CategoricalField::LifeStage).unwrap();
        assert_eq!(json, "\"life_stage\"");
    }

    #[test]
    fn test_year_reads_as_string() {
        let obs = Observation::default().with_categorical(CategoricalField::Year, "2009");
        assert_eq!(obs.year, Some(2009));
        assert_eq!(obs.categorical(CategoricalField::Year).as_deref(), Some("2009"));
    }

    #[test]
    fn test_empty_and_nan_are_missing() {
        let obs = Observation::default()
            .with_categorical(CategoricalField::Sex, "")
            .with_numeric(NumericField::BodyMassG, f64::NAN);
        assert!(obs.categorical(CategoricalField::Sex).is_none());
        assert!(obs.numeric(NumericField::BodyMassG).is_none());
    }

    #[test]
    fn test_distinct_values_first_occurrence() {
        let store = RecordStore::new(vec![
            Observation::default().with_categorical(CategoricalField::Species, "Gentoo"),
            Observation::default(),
            Observation::default().with_categorical(CategoricalField::Species, "Adelie"),
            Observation::default().with_categorical(CategoricalField::Species, "Gentoo"),
        ]);
        assert_eq!(store.distinct_values(CategoricalField::Species), vec!["Gentoo", "Adelie"]);
    }
}
