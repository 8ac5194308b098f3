// crates/core/src/migration.rs
//! Layout schema versioning and migration
//!
//! Stored layouts carry the schema version they were written with.
//! When a layout loads under a newer build, migrations are applied in
//! order until the current version is reached. The walk stops
//! gracefully when no migration exists for a step; partial data beats
//! no data for a dashboard layout.

use crate::error::{LayoutError, LayoutResult};
use crate::grid::widget_grid;
use crate::layout::Layout;
use crate::widget::{WidgetSize, WidgetType};
use serde_json::Value;

/// Schema version this build reads and writes
pub const DASHBOARD_LAYOUT_VERSION: u32 = 2;

type Migration = fn(Value) -> Value;

/// Migration for step `index + 1` → `index + 2`
const MIGRATIONS: [Migration; 1] = [migrate_v1_to_v2];

/// v1 stored sizes in camelCase, had no `updated_at` on widgets, and
/// predates the current size table, so `w`/`h` are re-derived
fn migrate_v1_to_v2(mut value: Value) -> Value {
    for (arrangement, is_mobile) in [("desktop", false), ("mobile", true)] {
        if let Some(widgets) = value
            .get_mut(arrangement)
            .and_then(Value::as_array_mut)
        {
            for widget in widgets {
                if let Some(size) = widget.get("size").and_then(Value::as_str) {
                    let renamed = match size {
                        "smallLong" => Some("small-long"),
                        "extraLarge" => Some("extra-large"),
                        _ => None,
                    };
                    if let Some(renamed) = renamed {
                        widget["size"] = Value::from(renamed);
                    }
                }

                // Extents drifted under older tables would be rejected
                // by the validator; normalize them for known types.
                // Unknown types keep their stored extents untouched.
                let widget_type = widget
                    .get("type")
                    .and_then(Value::as_str)
                    .map(|s| WidgetType::from(s.to_string()));
                let size = widget
                    .get("size")
                    .cloned()
                    .and_then(|v| serde_json::from_value::<WidgetSize>(v).ok());
                if let (Some(widget_type), Some(size)) = (widget_type, size) {
                    if !widget_type.is_unknown() {
                        let cell = widget_grid(&widget_type, size, is_mobile);
                        widget["w"] = Value::from(cell.w);
                        widget["h"] = Value::from(cell.h);
                    }
                }

                if widget.get("updated_at").is_none() {
                    widget["updated_at"] = Value::from(chrono::Utc::now().to_rfc3339());
                }
            }
        }
    }
    value
}

/// Migrates a raw stored layout from `from_version` to the current
/// schema and deserializes it.
pub fn migrate_layout(raw: Value, from_version: u32) -> LayoutResult<Layout> {
    if from_version > DASHBOARD_LAYOUT_VERSION {
        return Err(LayoutError::SchemaTooNew {
            found: from_version,
            supported: DASHBOARD_LAYOUT_VERSION,
        });
    }

    let mut current = raw;
    let mut version = from_version;
    while version < DASHBOARD_LAYOUT_VERSION {
        let Some(migration) = MIGRATIONS.get((version as usize).saturating_sub(1)) else {
            break;
        };
        current = migration(current);
        version += 1;
    }

    Ok(serde_json::from_value(current)?)
}
