//! Error types for the penguinboard aggregation pipeline.
//!
//! This module defines one error type per concern:
//!
//! - [`CsvError`] - Loading and coercing the observation CSV
//! - [`SelectionError`] - Unknown field names and unreadable selection snapshots
//! - [`FlowError`] - Invalid flow-diagram dimension choices
//! - [`CrossTabError`] - Unsupported cross-tab pivots
//! - [`ConfigError`] - Environment and configuration file problems
//! - [`DashboardError`] - Top-level orchestration errors
//!
//! None of these are fatal to the dashboard: every builder failure is a
//! "nothing to draw" signal for the control layer. Conversions into
//! [`DashboardError`] are automatic so `?` works across boundaries.

use thiserror::Error;

use crate::models::CategoricalField;

// =============================================================================
// CSV Loading Errors
// =============================================================================

/// Errors while loading observations from delimited text.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode the raw bytes.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// The underlying CSV reader rejected the input.
    #[error("Invalid CSV format: {0}")]
    Parse(#[from] csv::Error),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// A declared field has no column in the header row.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A cell could not be coerced to its field type.
    #[error("Line {line}, column '{column}' (value '{value}'): {message}")]
    InvalidValue {
        line: usize,
        column: String,
        value: String,
        message: String,
    },
}

// =============================================================================
// Selection Errors
// =============================================================================

/// Errors building a selection snapshot.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// Name does not belong to the field vocabulary.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Snapshot file could not be read.
    #[error("Failed to read selection: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot is not valid JSON for a selection.
    #[error("Invalid selection JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Flow Graph Errors
// =============================================================================

/// Errors from the flow graph builder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// The flow diagram needs two or three dimensions.
    #[error("Expected 2 or 3 flow dimensions, got {count}")]
    InvalidDimensionCount { count: usize },

    /// The same dimension was chosen twice.
    #[error("Flow dimension '{0}' selected more than once")]
    DuplicateDimension(CategoricalField),
}

// =============================================================================
// Cross-Tab Errors
// =============================================================================

/// Errors from the cross-tab builder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CrossTabError {
    /// Pivot is neither of the table's two dimensions.
    #[error("Cannot pivot a {primary} x {secondary} table on '{pivot}'")]
    UnsupportedPivot {
        pivot: CategoricalField,
        primary: CategoricalField,
        secondary: CategoricalField,
    },

    /// Table values do not match its label lists.
    #[error("Proportion table expects {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors reading dashboard configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable has an unusable value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Selection snapshot referenced by the configuration is unusable.
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),
}

// =============================================================================
// Dashboard Errors (top-level)
// =============================================================================

/// Top-level errors returned by the dashboard pipeline and the CLI helpers.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// CSV loading error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Selection error.
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    /// Flow graph error.
    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    /// Cross-tab error.
    #[error("Cross-tab error: {0}")]
    CrossTab(#[from] CrossTabError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for selection operations.
pub type SelectionResult<T> = Result<T, SelectionError>;

/// Result type for flow graph operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// Result type for cross-tab operations.
pub type CrossTabResult<T> = Result<T, CrossTabError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for dashboard operations.
pub type DashboardResult<T> = Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let csv_err = CsvError::EmptyFile;
        let dashboard_err: DashboardError = csv_err.into();
        assert!(dashboard_err.to_string().contains("empty"));

        let flow_err = FlowError::InvalidDimensionCount { count: 4 };
        let dashboard_err: DashboardError = flow_err.into();
        assert!(dashboard_err.to_string().contains("got 4"));
    }

    #[test]
    fn test_invalid_value_format() {
        let err = CsvError::InvalidValue {
            line: 5,
            column: "body_mass_g".into(),
            value: "heavy".into(),
            message: "expected a number".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Line 5"));
        assert!(msg.contains("column 'body_mass_g'"));
        assert!(msg.contains("value 'heavy'"));
    }

    #[test]
    fn test_unsupported_pivot_names_both_dimensions() {
        let err = CrossTabError::UnsupportedPivot {
            pivot: CategoricalField::Island,
            primary: CategoricalField::Species,
            secondary: CategoricalField::Diet,
        };
        assert_eq!(
            err.to_string(),
            "Cannot pivot a species x diet table on 'island'"
        );
    }
}
