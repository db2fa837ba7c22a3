//! Selection snapshot passed into every builder call.
//!
//! The control layer builds a fresh [`SelectionState`] on every interaction;
//! builders only ever read it. Snapshots serialize to JSON so a selection can
//! be handed to the CLI as a file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::SelectionResult;
use crate::models::{CategoricalField, NumericField, Observation, RecordStore};

/// Flow dimensions pre-selected when the dashboard opens.
pub const DEFAULT_FLOW_DIMENSIONS: [CategoricalField; 3] = [
    CategoricalField::Island,
    CategoricalField::Species,
    CategoricalField::Diet,
];

/// Fields that carry a value filter.
pub const FILTER_FIELDS: [CategoricalField; 3] = [
    CategoricalField::Species,
    CategoricalField::Sex,
    CategoricalField::Year,
];

/// Allowed values per filter field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalFilters {
    #[serde(default)]
    pub species: BTreeSet<String>,
    #[serde(default)]
    pub sex: BTreeSet<String>,
    #[serde(default)]
    pub year: BTreeSet<String>,
}

impl CategoricalFilters {
    /// Filters that let every value present in `store` through.
    pub fn allow_all(store: &RecordStore) -> Self {
        let mut filters = Self::default();
        for field in FILTER_FIELDS {
            if let Some(set) = filters.allowed_mut(field) {
                set.extend(store.distinct_values(field));
            }
        }
        filters
    }

    /// Allowed set for a filter field, `None` for fields without a filter.
    pub fn allowed(&self, field: CategoricalField) -> Option<&BTreeSet<String>> {
        match field {
            CategoricalField::Species => Some(&self.species),
            CategoricalField::Sex => Some(&self.sex),
            CategoricalField::Year => Some(&self.year),
            _ => None,
        }
    }

    fn allowed_mut(&mut self, field: CategoricalField) -> Option<&mut BTreeSet<String>> {
        match field {
            CategoricalField::Species => Some(&mut self.species),
            CategoricalField::Sex => Some(&mut self.sex),
            CategoricalField::Year => Some(&mut self.year),
            _ => None,
        }
    }

    /// Replace the allowed set of a filter field. Non-filter fields are ignored.
    pub fn with_allowed<I, S>(mut self, field: CategoricalField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(set) = self.allowed_mut(field) {
            *set = values.into_iter().map(Into::into).collect();
        }
        self
    }

    /// A record passes when its value for every filter field is allowed.
    /// A missing value is never allowed.
    pub fn passes(&self, record: &Observation) -> bool {
        FILTER_FIELDS.into_iter().all(|field| {
            match (self.allowed(field), record.categorical(field)) {
                (Some(set), Some(value)) => set.contains(value.as_ref()),
                _ => false,
            }
        })
    }

    /// Records of `records` passing every filter, in order.
    pub fn apply<'a>(&self, records: &'a [Observation]) -> Vec<&'a Observation> {
        records.iter().filter(|r| self.passes(r)).collect()
    }
}

/// Current dashboard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    /// Measurements shown in the grouped-mean matrix, in vocabulary order.
    pub active_numeric_fields: Vec<NumericField>,
    /// Ordered flow diagram dimensions; only 2 or 3 produce a graph.
    pub flow_dimensions: Vec<CategoricalField>,
    /// Value filters applied to the flow diagram.
    pub categorical_filters: CategoricalFilters,
    /// Row dimension of the matrix and pivot of the cross-tab.
    pub grouping_field: CategoricalField,
}

/// On-disk form of a selection. Filters may be left out, in which case every
/// value present in the data is checked, as when the dashboard opens.
#[derive(Deserialize)]
struct SelectionSnapshot {
    active_numeric_fields: Vec<NumericField>,
    flow_dimensions: Vec<CategoricalField>,
    #[serde(default)]
    categorical_filters: Option<CategoricalFilters>,
    grouping_field: CategoricalField,
}

impl SelectionState {
    /// The selection the dashboard opens with: every measurement, the default
    /// flow dimensions, every filter value checked, grouped by species.
    pub fn defaults_for(store: &RecordStore) -> Self {
        Self {
            active_numeric_fields: NumericField::ALL.to_vec(),
            flow_dimensions: DEFAULT_FLOW_DIMENSIONS.to_vec(),
            categorical_filters: CategoricalFilters::allow_all(store),
            grouping_field: CategoricalField::Species,
        }
    }

    /// Replace the active measurements, keeping vocabulary order and dropping repeats.
    pub fn with_numeric_fields(mut self, fields: impl IntoIterator<Item = NumericField>) -> Self {
        let chosen: BTreeSet<NumericField> = fields.into_iter().collect();
        self.active_numeric_fields = NumericField::ALL
            .into_iter()
            .filter(|f| chosen.contains(f))
            .collect();
        self
    }

    /// Replace the flow dimensions, keeping the given order.
    pub fn with_flow_dimensions(mut self, dims: impl IntoIterator<Item = CategoricalField>) -> Self {
        self.flow_dimensions = dims.into_iter().collect();
        self
    }

    pub fn with_filters(mut self, filters: CategoricalFilters) -> Self {
        self.categorical_filters = filters;
        self
    }

    pub fn with_grouping_field(mut self, field: CategoricalField) -> Self {
        self.grouping_field = field;
        self
    }

    /// Parse a snapshot from JSON string, checking every filter value of
    /// `store` when the snapshot carries no filters.
    pub fn from_json(json: &str, store: &RecordStore) -> SelectionResult<Self> {
        let snapshot: SelectionSnapshot = serde_json::from_str(json)?;
        let categorical_filters = snapshot
            .categorical_filters
            .unwrap_or_else(|| CategoricalFilters::allow_all(store));

        Ok(Self {
            active_numeric_fields: Vec::new(),
            flow_dimensions: snapshot.flow_dimensions,
            categorical_filters,
            grouping_field: snapshot.grouping_field,
        }
        .with_numeric_fields(snapshot.active_numeric_fields))
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> SelectionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a snapshot file
    pub fn load(path: impl AsRef<Path>, store: &RecordStore) -> SelectionResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content, store)
    }
}
