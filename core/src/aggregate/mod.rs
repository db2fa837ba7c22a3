//! Aggregation module.
//!
//! Pure transformations from records plus a selection snapshot into the
//! structures each chart draws:
//! - Rollup: multi-key grouping shared by the builders
//! - Flow: node/link graph for the flow diagram
//! - Matrix: grouped means for the heatmap
//! - Crosstab: pivoted proportions for the grouped bar chart
//! - Scatter: pairwise measurement panels
//! - Pipeline: every chart for one snapshot

pub mod crosstab;
pub mod flow;
pub mod matrix;
pub mod pipeline;
pub mod rollup;
pub mod scatter;

pub use crosstab::{reshape, CrossTabEntry, CrossTabSeries, ProportionTable};
pub use flow::{build_flow_graph, build_flow_graph_for, FlowGraph, FlowLink, FlowNode};
pub use matrix::{build_aggregate_matrix, AggregateMatrix, FieldRange, MatrixCell};
pub use pipeline::{render_dashboard, DashboardView, FlowPanel};
pub use rollup::{rollup, KeyFn, Rollup};
pub use scatter::{build_scatter_matrix, ScatterMatrix, ScatterPanel, ScatterPoint};
