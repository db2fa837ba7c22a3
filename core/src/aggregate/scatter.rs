//! Pairwise scatter-plot matrix over the measurements.
//!
//! Every ordered pair of distinct fields gets a panel; the diagonal is left
//! to the renderer for labels. Points are coloured by species, so the species
//! list doubles as the colour domain.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::models::{distinct_values, CategoricalField, NumericField, Observation};

/// Axis extent of one field over every present value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldExtent {
    pub field: NumericField,
    /// `None` when no record has a value for the field.
    pub extent: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub species: Option<String>,
}

/// One off-diagonal cell of the matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPanel {
    pub x_field: NumericField,
    pub y_field: NumericField,
    pub points: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterMatrix {
    pub fields: Vec<NumericField>,
    pub extents: Vec<FieldExtent>,
    /// Distinct species, in first-occurrence order.
    pub species: Vec<String>,
    /// Row-major over (y, x), skipping the diagonal.
    pub panels: Vec<ScatterPanel>,
}

impl ScatterMatrix {
    pub fn extent(&self, field: NumericField) -> Option<(f64, f64)> {
        self.extents
            .iter()
            .find(|e| e.field == field)
            .and_then(|e| e.extent)
    }

    pub fn panel(&self, x_field: NumericField, y_field: NumericField) -> Option<&ScatterPanel> {
        self.panels
            .iter()
            .find(|p| p.x_field == x_field && p.y_field == y_field)
    }
}

/// Min and max of the present values of `field`.
pub fn extent(records: &[Observation], field: NumericField) -> Option<(f64, f64)> {
    records
        .iter()
        .filter_map(|r| r.numeric(field))
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })
}

/// Build the scatter matrix for `fields` over every record.
pub fn build_scatter_matrix(records: &[Observation], fields: &[NumericField]) -> ScatterMatrix {
    let extents = fields
        .iter()
        .map(|&field| FieldExtent {
            field,
            extent: extent(records, field),
        })
        .collect();

    let mut panels = Vec::new();
    for &y_field in fields {
        for &x_field in fields {
            if x_field == y_field {
                continue;
            }
            let points = records
                .iter()
                .filter_map(|r| {
                    Some(ScatterPoint {
                        x: r.numeric(x_field)?,
                        y: r.numeric(y_field)?,
                        species: r.categorical(CategoricalField::Species).map(Cow::into_owned),
                    })
                })
                .collect();
            panels.push(ScatterPanel { x_field, y_field, points });
        }
    }

    ScatterMatrix {
        fields: fields.to_vec(),
        extents,
        species: distinct_values(records, CategoricalField::Species),
        panels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use NumericField::*;

    fn penguin(species: &str, mass: Option<f64>, flipper: Option<f64>) -> Observation {
        let mut o = Observation::default().with_categorical(CategoricalField::Species, species);
        if let Some(m) = mass {
            o = o.with_numeric(BodyMassG, m);
        }
        if let Some(f) = flipper {
            o = o.with_numeric(FlipperLengthMm, f);
        }
        o
    }

    fn records() -> Vec<Observation> {
        vec![
            penguin("Gentoo", Some(5000.0), Some(220.0)),
            penguin("Adelie", Some(3500.0), None),
            penguin("Adelie", None, Some(185.0)),
            penguin("Chinstrap", Some(3700.0), Some(195.0)),
        ]
    }

    #[test]
    fn test_extent_ignores_missing() {
        let matrix = build_scatter_matrix(&records(), &[BodyMassG, FlipperLengthMm]);
        assert_eq!(matrix.extent(BodyMassG), Some((3500.0, 5000.0)));
        assert_eq!(matrix.extent(FlipperLengthMm), Some((185.0, 220.0)));
    }

    #[test]
    fn test_field_without_values_has_no_extent() {
        let matrix = build_scatter_matrix(&records(), &[BodyMassG, BillDepthMm]);
        assert_eq!(matrix.extent(BillDepthMm), None);
        assert!(matrix.panel(BodyMassG, BillDepthMm).unwrap().points.is_empty());
    }

    #[test]
    fn test_panels_skip_diagonal() {
        let matrix = build_scatter_matrix(&records(), &NumericField::ALL);
        assert_eq!(matrix.panels.len(), 12);
        assert!(matrix.panel(BodyMassG, BodyMassG).is_none());
    }

    #[test]
    fn test_points_need_both_values() {
        let matrix = build_scatter_matrix(&records(), &[BodyMassG, FlipperLengthMm]);
        let panel = matrix.panel(BodyMassG, FlipperLengthMm).unwrap();

        assert_eq!(panel.points.len(), 2);
        assert_eq!(panel.points[0].species.as_deref(), Some("Gentoo"));
        assert_eq!((panel.points[1].x, panel.points[1].y), (3700.0, 195.0));
    }

    #[test]
    fn test_species_colour_domain() {
        let matrix = build_scatter_matrix(&records(), &[BodyMassG]);
        assert_eq!(matrix.species, vec!["Gentoo", "Adelie", "Chinstrap"]);
        assert!(matrix.panels.is_empty());
    }
}
