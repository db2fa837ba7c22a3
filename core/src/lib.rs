//! # Penguinboard - aggregation pipeline for the penguin observation dashboard
//!
//! Penguinboard turns a flat table of penguin observations plus the user's
//! current selection into the structures each dashboard chart draws.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Aggregate  │────▶│  Chart JSON  │
//! │ (header row)│     │ (auto-enc)  │     │ (+Selection)│     │ (flow, heat, │
//! └─────────────┘     └─────────────┘     └─────────────┘     │  bars, SPLOM)│
//!                                                             └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use penguinboard::{parse_csv_file_auto, render_dashboard, SelectionState};
//!
//! let loaded = parse_csv_file_auto("data/palmerpenguins_extended.csv").unwrap();
//! let selection = SelectionState::defaults_for(&loaded.records);
//! let view = render_dashboard(&loaded.records, &selection).unwrap();
//! println!("{} flow links", view.flow.graph().map_or(0, |g| g.links.len()));
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per concern
//! - [`models`] - Field vocabulary, observations, record store
//! - [`parser`] - CSV loading with auto-detection
//! - [`selection`] - Selection snapshot and value filters
//! - [`aggregate`] - Rollup and the chart builders
//! - [`config`] - Environment and CLI configuration
//! - [`logs`] - Broadcast log stream

// Core modules
pub mod error;
pub mod models;

// Loading
pub mod parser;

// Selection
pub mod selection;

// Aggregation
pub mod aggregate;

// Configuration
pub mod config;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    CrossTabError,
    CsvError,
    DashboardError,
    FlowError,
    SelectionError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CategoricalField,
    NumericField,
    Observation,
    RecordStore,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    parse_bytes,
    parse_bytes_auto,
    parse_csv_file,
    parse_csv_file_auto,
    parse_str,
    ParseResult,
};

// =============================================================================
// Re-exports - Selection
// =============================================================================

pub use selection::{CategoricalFilters, SelectionState};

// =============================================================================
// Re-exports - Aggregation
// =============================================================================

pub use aggregate::{
    build_aggregate_matrix,
    build_flow_graph,
    build_flow_graph_for,
    build_scatter_matrix,
    render_dashboard,
    reshape,
    rollup,
    AggregateMatrix,
    CrossTabEntry,
    CrossTabSeries,
    DashboardView,
    FieldRange,
    FlowGraph,
    FlowLink,
    FlowNode,
    FlowPanel,
    MatrixCell,
    ProportionTable,
    Rollup,
    ScatterMatrix,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::DashboardConfig;
