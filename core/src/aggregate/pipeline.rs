//! High-level dashboard API: one selection snapshot in, every chart out.
//!
//! # Example
//!
//! ```rust,ignore
//! use penguinboard::{parse_csv_file_auto, render_dashboard, SelectionState};
//!
//! let loaded = parse_csv_file_auto("data/palmerpenguins_extended.csv")?;
//! let selection = SelectionState::defaults_for(&loaded.records);
//! let view = render_dashboard(&loaded.records, &selection)?;
//! println!("{}", serde_json::to_string_pretty(&view)?);
//! ```

use serde::Serialize;

use super::crosstab::{reshape, CrossTabSeries, ProportionTable};
use super::flow::{build_flow_graph_for, FlowGraph, DIMENSION_COUNT_NOTICE};
use super::matrix::{build_aggregate_matrix, AggregateMatrix};
use super::scatter::{build_scatter_matrix, ScatterMatrix};
use crate::error::{DashboardResult, FlowError};
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::models::{CategoricalField, NumericField, RecordStore};
use crate::selection::SelectionState;

/// What the flow diagram slot shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FlowPanel {
    /// A graph to lay out.
    Graph(FlowGraph),
    /// A message to show instead of the diagram.
    Notice { message: String },
}

impl FlowPanel {
    pub fn graph(&self) -> Option<&FlowGraph> {
        match self {
            FlowPanel::Graph(g) => Some(g),
            FlowPanel::Notice { .. } => None,
        }
    }
}

/// Every chart structure for one selection snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub record_count: usize,
    pub flow: FlowPanel,
    /// Empty when no measurement is selected.
    pub matrix: AggregateMatrix,
    pub crosstab: CrossTabSeries,
    pub scatter: ScatterMatrix,
}

/// Flow panel for `selection`, turning dimension errors into a notice.
pub fn flow_panel(store: &RecordStore, selection: &SelectionState) -> FlowPanel {
    match build_flow_graph_for(store.records(), selection) {
        Ok(graph) => {
            log_success(format!(
                "Flow graph: {} nodes, {} links",
                graph.nodes.len(),
                graph.links.len()
            ));
            FlowPanel::Graph(graph)
        }
        Err(FlowError::InvalidDimensionCount { count }) => {
            log_warning(format!("{} flow dimension(s) selected, skipping flow diagram", count));
            FlowPanel::Notice {
                message: DIMENSION_COUNT_NOTICE.to_string(),
            }
        }
        Err(err @ FlowError::DuplicateDimension(_)) => {
            log_warning(err.to_string());
            FlowPanel::Notice {
                message: err.to_string(),
            }
        }
    }
}

/// Cross-tab pivoted on the grouping field, or on species when the grouping
/// field is not one of the table's dimensions.
pub fn crosstab_for(grouping_field: CategoricalField) -> DashboardResult<CrossTabSeries> {
    let table = ProportionTable::species_diet();
    match reshape(&table, grouping_field) {
        Ok(series) => Ok(series),
        Err(err) => {
            log_warning(format!("{}; grouping bars by {}", err, table.primary_field));
            Ok(reshape(&table, table.primary_field)?)
        }
    }
}

/// Recompute every chart for `selection`.
///
/// Holds no state between calls: the same inputs always give the same view.
/// An empty store gives a view where every chart is empty.
pub fn render_dashboard(store: &RecordStore, selection: &SelectionState) -> DashboardResult<DashboardView> {
    if store.is_empty() {
        log_warning("No records loaded, every chart is empty");
    }

    log_info(format!("Rendering dashboard over {} records", store.len()));
    log_info_indent(
        format!(
            "flow: [{}], grouping: {}",
            selection
                .flow_dimensions
                .iter()
                .map(|d| d.column())
                .collect::<Vec<_>>()
                .join(", "),
            selection.grouping_field
        ),
        1,
    );

    let flow = flow_panel(store, selection);

    let matrix = build_aggregate_matrix(
        store.records(),
        &selection.active_numeric_fields,
        selection.grouping_field,
    );
    if matrix.is_empty() {
        log_warning("No measurement selected, skipping heatmap");
    } else {
        let undefined = matrix.undefined_cells().count();
        if undefined > 0 {
            log_warning(format!("{} heatmap cell(s) have no values", undefined));
        }
        log_success(format!(
            "Heatmap: {} groups × {} fields",
            matrix.groups.len(),
            matrix.fields.len()
        ));
    }

    let crosstab = crosstab_for(selection.grouping_field)?;
    log_success(format!("Bar chart grouped by {}", crosstab.pivot));

    let scatter = build_scatter_matrix(store.records(), &NumericField::ALL);
    log_success(format!("Scatter matrix: {} panels", scatter.panels.len()));

    Ok(DashboardView {
        record_count: store.len(),
        flow,
        matrix,
        crosstab,
        scatter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::DASHBOARD_LOG;
    use crate::models::Observation;

    fn store() -> RecordStore {
        let penguin = |island: &str, species: &str, diet: &str, sex: &str, mass: f64| {
            Observation::default()
                .with_categorical(CategoricalField::Island, island)
                .with_categorical(CategoricalField::Species, species)
                .with_categorical(CategoricalField::Diet, diet)
                .with_categorical(CategoricalField::Sex, sex)
                .with_categorical(CategoricalField::Year, "2021")
                .with_numeric(NumericField::BodyMassG, mass)
        };
        RecordStore::new(vec![
            penguin("Biscoe", "Gentoo", "fish", "male", 5200.0),
            penguin("Dream", "Adelie", "krill", "female", 3400.0),
            penguin("Dream", "Chinstrap", "squid", "male", 3900.0),
        ])
    }

    #[test]
    fn test_default_view() {
        let store = store();
        let view = render_dashboard(&store, &SelectionState::defaults_for(&store)).unwrap();

        assert_eq!(view.record_count, 3);
        assert_eq!(view.flow.graph().map(FlowGraph::total_weight), Some(6));
        assert_eq!(view.matrix.mean("Gentoo", NumericField::BodyMassG), Some(5200.0));
        assert_eq!(view.crosstab.pivot, CategoricalField::Species);
        assert_eq!(view.scatter.panels.len(), 12);
    }

    #[test]
    fn test_wrong_dimension_count_becomes_notice() {
        let store = store();
        let selection = SelectionState::defaults_for(&store)
            .with_flow_dimensions([CategoricalField::Species]);
        let view = render_dashboard(&store, &selection).unwrap();

        assert_eq!(
            view.flow,
            FlowPanel::Notice {
                message: DIMENSION_COUNT_NOTICE.to_string()
            }
        );
    }

    #[test]
    fn test_no_measurements_gives_empty_matrix() {
        let store = store();
        let selection = SelectionState::defaults_for(&store).with_numeric_fields(Vec::<NumericField>::new());
        let view = render_dashboard(&store, &selection).unwrap();
        assert!(view.matrix.is_empty());
    }

    #[test]
    fn test_crosstab_follows_diet_grouping() {
        let store = store();
        let selection = SelectionState::defaults_for(&store).with_grouping_field(CategoricalField::Diet);
        let view = render_dashboard(&store, &selection).unwrap();
        assert_eq!(view.crosstab.pivot, CategoricalField::Diet);
        assert_eq!(view.matrix.grouping_field, CategoricalField::Diet);
    }

    #[test]
    fn test_crosstab_falls_back_to_species() {
        let series = crosstab_for(CategoricalField::Island).unwrap();
        assert_eq!(series.pivot, CategoricalField::Species);
    }

    #[test]
    fn test_empty_store_gives_empty_view() {
        let store = RecordStore::default();
        let selection = SelectionState::defaults_for(&store);
        let view = render_dashboard(&store, &selection).unwrap();

        assert_eq!(view.record_count, 0);
        assert!(view.flow.graph().is_some_and(FlowGraph::is_empty));
        assert!(view.matrix.is_empty());
        assert!(view.scatter.panels.iter().all(|p| p.points.is_empty()));
        assert!(view.scatter.species.is_empty());
        assert_eq!(view.crosstab.entries.len(), 12);
    }

    #[test]
    fn test_notices_reach_collector() {
        let mut collector = DASHBOARD_LOG.collector();
        let store = store();
        let selection = SelectionState::defaults_for(&store)
            .with_flow_dimensions([CategoricalField::Species]);
        render_dashboard(&store, &selection).unwrap();

        let notices = collector.drain();
        assert!(notices.iter().any(|n| n.contains("1 flow dimension(s) selected")));
    }

    #[test]
    fn test_idempotent() {
        let store = store();
        let selection = SelectionState::defaults_for(&store);
        let first = render_dashboard(&store, &selection).unwrap();
        let second = render_dashboard(&store, &selection).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_view_serializes_flow_status() {
        let store = store();
        let view = render_dashboard(&store, &SelectionState::defaults_for(&store)).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["flow"]["status"], "graph");
        assert!(json["flow"]["nodes"].is_array());
    }
}
