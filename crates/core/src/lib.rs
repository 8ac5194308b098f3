// crates/core/src/lib.rs
//! Core domain model for the TradeDeck dashboard
//!
//! This crate defines the widget layout data structures shared by the
//! storage and sync layers:
//! - Widget types, sizes, and the size-to-grid mapping table
//! - The versioned [`Layout`] with desktop/mobile arrangements and its
//!   edit operations
//! - Layout schema versioning and migrations

mod error;
mod grid;
mod layout;
mod migration;
mod widget;

pub use error::{LayoutError, LayoutResult};
pub use grid::{
    effective_size, size_to_grid, widget_grid, GridCell, WidgetRegistry, DESKTOP_COLUMNS,
    MOBILE_COLUMNS,
};
pub use layout::{Arrangement, Layout};
pub use migration::{migrate_layout, DASHBOARD_LAYOUT_VERSION};
pub use widget::{LayoutItem, Widget, WidgetSize, WidgetType};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let _: Layout = Layout::new();
        let _: GridCell = size_to_grid(WidgetSize::Medium, false);
        let _: WidgetType = WidgetType::from("equity-chart".to_string());
    }
}
