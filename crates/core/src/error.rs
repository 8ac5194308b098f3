// crates/core/src/error.rs
//! Error types for layout operations

use crate::widget::WidgetType;
use thiserror::Error;

/// Result type for layout operations
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Errors that can occur while editing a layout
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A widget of this type already exists in the target arrangement
    #[error("Widget of type '{0}' already exists in this arrangement")]
    DuplicateType(WidgetType),

    /// No widget with this identifier exists
    #[error("Widget not found: {0}")]
    WidgetNotFound(String),

    /// Stored layout schema is newer than this build understands
    #[error("Layout schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u32, supported: u32 },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_type_display() {
        let err = LayoutError::DuplicateType(WidgetType::EquityChart);
        assert!(err.to_string().contains("equity-chart"));
    }

    #[test]
    fn test_widget_not_found_display() {
        let err = LayoutError::WidgetNotFound("widget-1".to_string());
        assert!(err.to_string().contains("widget-1"));
    }
}
