// crates/sync-engine/src/validator.rs
//! Structural and semantic layout validation
//!
//! Runs before every persistence attempt. Hard violations abort the
//! save and are never retried or queued; unknown widget types are only
//! flagged, since deprecated widgets must survive as placeholders
//! rather than vanish from a user's dashboard.

use std::collections::HashSet;
use tradedeck_core::{
    widget_grid, Arrangement, Widget, WidgetRegistry, DESKTOP_COLUMNS, MOBILE_COLUMNS,
};

/// Severity of a single validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Blocks the save
    Error,
    /// Tolerated, surfaced for diagnostics
    Warning,
}

/// A single validation finding
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub widget_id: String,
    pub field: &'static str,
    pub message: String,
    pub severity: Severity,
}

/// Outcome of validating one arrangement
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    /// True when no finding blocks the save; warnings are fine
    pub fn valid(&self) -> bool {
        self.errors.iter().all(|e| e.severity != Severity::Error)
    }

    /// Joins blocking findings into a single display string
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .map(|e| format!("{} ({})", e.message, e.widget_id))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Validates widget arrangements before persistence
#[derive(Debug, Clone, Default)]
pub struct LayoutValidator;

impl LayoutValidator {
    pub fn new() -> Self {
        Self
    }

    /// Checks one arrangement for duplicate ids, registry membership,
    /// grid bounds, and size-table drift.
    pub fn validate_layout(&self, widgets: &[Widget], which: Arrangement) -> ValidationReport {
        let mut errors = Vec::new();
        let columns = match which {
            Arrangement::Desktop => DESKTOP_COLUMNS,
            Arrangement::Mobile => MOBILE_COLUMNS,
        };

        let mut seen = HashSet::new();
        for widget in widgets {
            if !seen.insert(widget.i.as_str()) {
                errors.push(ValidationError {
                    widget_id: widget.i.clone(),
                    field: "i",
                    message: "duplicate widget identifier".to_string(),
                    severity: Severity::Error,
                });
            }

            if widget.widget_type.is_unknown() {
                errors.push(ValidationError {
                    widget_id: widget.i.clone(),
                    field: "type",
                    message: format!("unknown widget type '{}'", widget.widget_type),
                    severity: Severity::Warning,
                });
            } else if !WidgetRegistry::is_allowed(&widget.widget_type, widget.size) {
                errors.push(ValidationError {
                    widget_id: widget.i.clone(),
                    field: "size",
                    message: format!(
                        "size '{:?}' is not allowed for type '{}'",
                        widget.size, widget.widget_type
                    ),
                    severity: Severity::Error,
                });
            }

            if widget.w == 0 || widget.h == 0 {
                errors.push(ValidationError {
                    widget_id: widget.i.clone(),
                    field: "w",
                    message: "widget has zero extent".to_string(),
                    severity: Severity::Error,
                });
            }

            // checked_add: stored coordinates are untrusted and may
            // be large enough to wrap
            let in_bounds = widget
                .x
                .checked_add(widget.w)
                .is_some_and(|end| end <= columns);
            if !in_bounds {
                errors.push(ValidationError {
                    widget_id: widget.i.clone(),
                    field: "x",
                    message: format!(
                        "widget spans past column {} (x={}, w={})",
                        columns, widget.x, widget.w
                    ),
                    severity: Severity::Error,
                });
            }

            // Persisted w/h must match the size table; drift causes a
            // redundant re-layout on every reload
            if !widget.widget_type.is_unknown() {
                let expected = widget_grid(&widget.widget_type, widget.size, which.is_mobile());
                if (widget.w, widget.h) != (expected.w, expected.h) {
                    errors.push(ValidationError {
                        widget_id: widget.i.clone(),
                        field: "w",
                        message: format!(
                            "grid extent {}x{} drifts from the size table ({}x{})",
                            widget.w, widget.h, expected.w, expected.h
                        ),
                        severity: Severity::Error,
                    });
                }
            }
        }

        ValidationReport { errors }
    }
}
