//! Cross-tab reshaping for the grouped bar chart.
//!
//! The source is a precomputed proportion table (fraction of each species
//! eating each diet). Reshaping only chooses which dimension forms the outer
//! bar groups; the twelve values never change.

use serde::{Deserialize, Serialize};

use crate::error::{CrossTabError, CrossTabResult};
use crate::models::CategoricalField;

/// Species in the table's natural order.
pub const SPECIES: [&str; 3] = ["Adelie", "Gentoo", "Chinstrap"];

/// Diet categories in the table's natural order.
pub const DIETS: [&str; 4] = ["Fish", "Krill", "Parental", "Squid"];

/// Fraction of each species observed on each diet, species-major.
const SPECIES_DIET_PROPORTIONS: [f64; 12] = [
    0.24615384615384617,
    0.43141025641025643,
    0.26794871794871794,
    0.05448717948717949,
    0.3825180433039294,
    0.32558139534883723,
    0.23416198877305533,
    0.057738572574178026,
    0.15569823434991975,
    0.5457463884430177,
    0.24077046548956663,
    0.05778491171749599,
];

/// Primary × secondary table of proportions, stored primary-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProportionTable {
    pub primary_field: CategoricalField,
    pub secondary_field: CategoricalField,
    pub primary_labels: Vec<String>,
    pub secondary_labels: Vec<String>,
    values: Vec<f64>,
}

impl ProportionTable {
    /// Build a table from primary-major `values`.
    pub fn new(
        primary_field: CategoricalField,
        secondary_field: CategoricalField,
        primary_labels: Vec<String>,
        secondary_labels: Vec<String>,
        values: Vec<f64>,
    ) -> CrossTabResult<Self> {
        let expected = primary_labels.len() * secondary_labels.len();
        if values.len() != expected {
            return Err(CrossTabError::ShapeMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            primary_field,
            secondary_field,
            primary_labels,
            secondary_labels,
            values,
        })
    }

    /// The species × diet table shown on the dashboard.
    pub fn species_diet() -> Self {
        Self {
            primary_field: CategoricalField::Species,
            secondary_field: CategoricalField::Diet,
            primary_labels: SPECIES.iter().map(|s| s.to_string()).collect(),
            secondary_labels: DIETS.iter().map(|s| s.to_string()).collect(),
            values: SPECIES_DIET_PROPORTIONS.to_vec(),
        }
    }

    /// Value at (primary, secondary) label positions.
    fn at(&self, p: usize, s: usize) -> f64 {
        self.values[p * self.secondary_labels.len() + s]
    }

    /// Value for a (primary, secondary) label pair.
    pub fn value(&self, primary: &str, secondary: &str) -> Option<f64> {
        let p = self.primary_labels.iter().position(|l| l == primary)?;
        let s = self.secondary_labels.iter().position(|l| l == secondary)?;
        Some(self.at(p, s))
    }

    /// Sum of each primary row, in primary order.
    pub fn row_sums(&self) -> Vec<(String, f64)> {
        self.primary_labels
            .iter()
            .enumerate()
            .map(|(p, label)| {
                let sum = (0..self.secondary_labels.len()).map(|s| self.at(p, s)).sum();
                (label.clone(), sum)
            })
            .collect()
    }
}

/// One bar: `value` of `inner` within the `outer` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTabEntry {
    pub outer: String,
    pub inner: String,
    pub value: f64,
}

/// Bars grouped by the pivot dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTabSeries {
    pub pivot: CategoricalField,
    /// Outer group labels.
    pub groups: Vec<String>,
    /// Inner bar labels within each group.
    pub sub_groups: Vec<String>,
    /// Outer-major, inner-minor.
    pub entries: Vec<CrossTabEntry>,
    /// Largest value, the top of the y-axis domain.
    pub max_value: f64,
}

impl CrossTabSeries {
    /// Entries of one outer group, in inner order.
    pub fn group(&self, outer: &str) -> impl Iterator<Item = &CrossTabEntry> {
        let outer = outer.to_string();
        self.entries.iter().filter(move |e| e.outer == outer)
    }
}

/// Regroup `table` with `pivot` as the outer dimension.
///
/// Both dimensions keep the table's natural label order.
pub fn reshape(table: &ProportionTable, pivot: CategoricalField) -> CrossTabResult<CrossTabSeries> {
    let primary_outer = if pivot == table.primary_field {
        true
    } else if pivot == table.secondary_field {
        false
    } else {
        return Err(CrossTabError::UnsupportedPivot {
            pivot,
            primary: table.primary_field,
            secondary: table.secondary_field,
        });
    };

    let (groups, sub_groups) = if primary_outer {
        (&table.primary_labels, &table.secondary_labels)
    } else {
        (&table.secondary_labels, &table.primary_labels)
    };

    let mut entries = Vec::with_capacity(table.values.len());
    for (o, outer) in groups.iter().enumerate() {
        for (i, inner) in sub_groups.iter().enumerate() {
            let value = if primary_outer { table.at(o, i) } else { table.at(i, o) };
            entries.push(CrossTabEntry {
                outer: outer.clone(),
                inner: inner.clone(),
                value,
            });
        }
    }

    let max_value = entries.iter().map(|e| e.value).fold(0.0, f64::max);

    Ok(CrossTabSeries {
        pivot,
        groups: groups.clone(),
        sub_groups: sub_groups.clone(),
        entries,
        max_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn triples(series: &CrossTabSeries) -> Vec<(String, String, f64)> {
        let mut out: Vec<(String, String, f64)> = series
            .entries
            .iter()
            .map(|e| {
                if series.pivot == CategoricalField::Species {
                    (e.outer.clone(), e.inner.clone(), e.value)
                } else {
                    (e.inner.clone(), e.outer.clone(), e.value)
                }
            })
            .collect();
        out.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        out
    }

    #[test]
    fn test_species_pivot_order() {
        let series = reshape(&ProportionTable::species_diet(), CategoricalField::Species).unwrap();

        assert_eq!(series.groups, SPECIES.to_vec());
        assert_eq!(series.sub_groups, DIETS.to_vec());
        assert_eq!(series.entries.len(), 12);
        assert_eq!(series.entries[0].outer, "Adelie");
        assert_eq!(series.entries[0].inner, "Fish");
        assert_eq!(series.entries[4].outer, "Gentoo");
    }

    #[test]
    fn test_diet_pivot_order() {
        let series = reshape(&ProportionTable::species_diet(), CategoricalField::Diet).unwrap();

        assert_eq!(series.groups, DIETS.to_vec());
        let krill: Vec<&str> = series.group("Krill").map(|e| e.inner.as_str()).collect();
        assert_eq!(krill, SPECIES.to_vec());
        assert_eq!(series.entries[3].outer, "Krill");
        assert_eq!(series.entries[3].inner, "Adelie");
        assert_eq!(series.entries[3].value, 0.43141025641025643);
    }

    #[test]
    fn test_reshape_symmetry() {
        let table = ProportionTable::species_diet();
        let by_species = reshape(&table, CategoricalField::Species).unwrap();
        let by_diet = reshape(&table, CategoricalField::Diet).unwrap();

        assert_eq!(triples(&by_species), triples(&by_diet));
        assert_eq!(by_species.max_value, by_diet.max_value);

        for series in [&by_species, &by_diet] {
            let mut sums: HashMap<String, f64> = HashMap::new();
            for (species, _, value) in triples(series) {
                *sums.entry(species).or_default() += value;
            }
            assert_eq!(sums.len(), 3);
            for (species, sum) in sums {
                assert!((sum - 1.0).abs() < 1e-9, "{species} sums to {sum}");
            }
        }
    }

    #[test]
    fn test_row_sums() {
        for (_, sum) in ProportionTable::species_diet().row_sums() {
            assert!((sum - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unsupported_pivot() {
        let err = reshape(&ProportionTable::species_diet(), CategoricalField::Island).unwrap_err();
        assert!(matches!(err, CrossTabError::UnsupportedPivot { pivot: CategoricalField::Island, .. }));
    }

    #[test]
    fn test_shape_mismatch() {
        let err = ProportionTable::new(
            CategoricalField::Species,
            CategoricalField::Sex,
            vec!["Adelie".into()],
            vec!["male".into(), "female".into()],
            vec![0.5],
        )
        .unwrap_err();
        assert_eq!(err, CrossTabError::ShapeMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn test_value_lookup() {
        let table = ProportionTable::species_diet();
        assert_eq!(table.value("Chinstrap", "Squid"), Some(0.05778491171749599));
        assert_eq!(table.value("Emperor", "Squid"), None);
    }
}
