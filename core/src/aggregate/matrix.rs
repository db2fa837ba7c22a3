//! Grouped-mean matrix behind the heatmap.
//!
//! One cell per (measurement, group) pair, field-major. The matrix always
//! covers the whole dataset; the flow diagram's value filters do not apply.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use super::rollup::{rollup, KeyFn};
use crate::models::{distinct_values, CategoricalField, NumericField, Observation};

/// Mean of one measurement within one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixCell {
    pub group: String,
    pub field: NumericField,
    /// `None` when no record of the group has a value for the field.
    pub mean: Option<f64>,
}

/// Spread of a field's group means, for colour-scale calibration.
///
/// `min == max` when every group has the same mean; the renderer has to
/// handle that zero-width domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldRange {
    pub field: NumericField,
    pub min: f64,
    pub max: f64,
}

impl FieldRange {
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }
}

/// Chart-ready grouped means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMatrix {
    pub grouping_field: CategoricalField,
    /// Row labels, in first-occurrence order.
    pub groups: Vec<String>,
    /// Column fields, in selection order.
    pub fields: Vec<NumericField>,
    pub cells: Vec<MatrixCell>,
    /// One entry per field with at least one defined mean.
    pub ranges: Vec<FieldRange>,
}

impl AggregateMatrix {
    /// A matrix with nothing to draw.
    pub fn empty(grouping_field: CategoricalField) -> Self {
        Self {
            grouping_field,
            groups: Vec::new(),
            fields: Vec::new(),
            cells: Vec::new(),
            ranges: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Mean for `group` and `field`; `None` if the pair is absent or undefined.
    pub fn mean(&self, group: &str, field: NumericField) -> Option<f64> {
        self.cells
            .iter()
            .find(|c| c.group == group && c.field == field)
            .and_then(|c| c.mean)
    }

    pub fn range(&self, field: NumericField) -> Option<&FieldRange> {
        self.ranges.iter().find(|r| r.field == field)
    }

    /// Cells whose mean is undefined.
    pub fn undefined_cells(&self) -> impl Iterator<Item = &MatrixCell> {
        self.cells.iter().filter(|c| c.mean.is_none())
    }
}

/// Arithmetic mean, `None` for an empty sequence.
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Build the grouped-mean matrix over every record.
///
/// Missing measurements are left out of both the sum and the count. An empty
/// field list gives an empty matrix.
pub fn build_aggregate_matrix(
    records: &[Observation],
    fields: &[NumericField],
    grouping_field: CategoricalField,
) -> AggregateMatrix {
    if fields.is_empty() {
        return AggregateMatrix::empty(grouping_field);
    }

    let group_key = |r: &Observation| r.categorical(grouping_field).map(Cow::into_owned);
    let keys: [KeyFn<'_, Observation>; 1] = [&group_key];
    let means = rollup(records, &keys, |members| {
        fields
            .iter()
            .map(|&f| mean(members.iter().filter_map(|r| r.numeric(f))))
            .collect::<Vec<_>>()
    });

    let groups = distinct_values(records, grouping_field);
    let mut cells = Vec::with_capacity(fields.len() * groups.len());
    let mut ranges = Vec::new();

    for (i, &field) in fields.iter().enumerate() {
        let mut range: Option<FieldRange> = None;
        for group in &groups {
            let value = means
                .child(group)
                .and_then(|leaf| leaf.value())
                .and_then(|row| row[i]);
            if let Some(v) = value {
                let r = range.get_or_insert(FieldRange { field, min: v, max: v });
                r.min = r.min.min(v);
                r.max = r.max.max(v);
            }
            cells.push(MatrixCell {
                group: group.clone(),
                field,
                mean: value,
            });
        }
        ranges.extend(range);
    }

    AggregateMatrix {
        grouping_field,
        groups,
        fields: fields.to_vec(),
        cells,
        ranges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V: NumericField = NumericField::BodyMassG;
    const G: CategoricalField = CategoricalField::Species;

    fn obs(group: &str, value: Option<f64>) -> Observation {
        let o = Observation::default().with_categorical(G, group);
        match value {
            Some(v) => o.with_numeric(V, v),
            None => o,
        }
    }

    fn synthetic() -> Vec<Observation> {
        vec![obs("A", Some(10.0)), obs("A", Some(20.0)), obs("B", Some(5.0))]
    }

    #[test]
    fn test_mean_correctness() {
        let matrix = build_aggregate_matrix(&synthetic(), &[V], G);

        assert_eq!(matrix.groups, vec!["A", "B"]);
        assert_eq!(matrix.mean("A", V), Some(15.0));
        assert_eq!(matrix.mean("B", V), Some(5.0));
    }

    #[test]
    fn test_missing_values_excluded() {
        let mut records = synthetic();
        records.push(obs("A", None));

        let matrix = build_aggregate_matrix(&records, &[V], G);
        assert_eq!(matrix.mean("A", V), Some(15.0));
    }

    #[test]
    fn test_range_over_group_means() {
        let matrix = build_aggregate_matrix(&synthetic(), &[V], G);
        let range = matrix.range(V).unwrap();
        assert_eq!((range.min, range.max), (5.0, 15.0));
        assert!(!range.is_degenerate());
    }

    #[test]
    fn test_equal_means_give_degenerate_range() {
        let records = vec![obs("A", Some(7.0)), obs("B", Some(7.0))];
        let matrix = build_aggregate_matrix(&records, &[V], G);
        assert!(matrix.range(V).unwrap().is_degenerate());
    }

    #[test]
    fn test_undefined_aggregate_is_explicit() {
        let records = vec![obs("A", Some(1.0)), obs("B", None)];
        let matrix = build_aggregate_matrix(&records, &[V], G);

        let undefined: Vec<&MatrixCell> = matrix.undefined_cells().collect();
        assert_eq!(undefined.len(), 1);
        assert_eq!(undefined[0].group, "B");
        assert_eq!(matrix.cells.len(), 2);
        assert_eq!(matrix.range(V).map(|r| (r.min, r.max)), Some((1.0, 1.0)));
    }

    #[test]
    fn test_field_with_no_values_has_no_range() {
        let matrix = build_aggregate_matrix(&synthetic(), &[V, NumericField::BillDepthMm], G);
        assert!(matrix.range(NumericField::BillDepthMm).is_none());
        assert_eq!(matrix.undefined_cells().count(), 2);
    }

    #[test]
    fn test_cells_are_field_major() {
        let records = vec![
            obs("A", Some(1.0)).with_numeric(NumericField::BillDepthMm, 2.0),
            obs("B", Some(3.0)).with_numeric(NumericField::BillDepthMm, 4.0),
        ];
        let matrix = build_aggregate_matrix(&records, &[V, NumericField::BillDepthMm], G);
        let order: Vec<(&str, NumericField)> =
            matrix.cells.iter().map(|c| (c.group.as_str(), c.field)).collect();
        assert_eq!(
            order,
            vec![
                ("A", V),
                ("B", V),
                ("A", NumericField::BillDepthMm),
                ("B", NumericField::BillDepthMm),
            ]
        );
    }

    #[test]
    fn test_empty_selection_gives_empty_matrix() {
        let matrix = build_aggregate_matrix(&synthetic(), &[], G);
        assert!(matrix.is_empty());
        assert!(matrix.ranges.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let records = synthetic();
        assert_eq!(
            build_aggregate_matrix(&records, &[V], G),
            build_aggregate_matrix(&records, &[V], G)
        );
    }
}
