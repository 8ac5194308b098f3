// crates/core/src/grid.rs
//! Size-to-grid mapping and the widget registry

use crate::widget::{WidgetSize, WidgetType};

/// Columns in the desktop grid
pub const DESKTOP_COLUMNS: u32 = 12;
/// Columns in the mobile grid; widgets are pinned full-width
pub const MOBILE_COLUMNS: u32 = 12;

/// Grid extent of a widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub w: u32,
    pub h: u32,
}

/// Maps a widget size to grid cells.
///
/// Clients must not persist `w`/`h` values that contradict this table;
/// drift causes redundant re-layout on reload and is rejected by the
/// validator.
pub fn size_to_grid(size: WidgetSize, is_mobile: bool) -> GridCell {
    if is_mobile {
        let h = match size {
            WidgetSize::Tiny => 1,
            WidgetSize::Small | WidgetSize::SmallLong => 2,
            WidgetSize::Medium => 4,
            WidgetSize::Large | WidgetSize::ExtraLarge => 6,
        };
        return GridCell {
            w: MOBILE_COLUMNS,
            h,
        };
    }
    match size {
        WidgetSize::Tiny => GridCell { w: 3, h: 1 },
        WidgetSize::Small => GridCell { w: 3, h: 4 },
        WidgetSize::SmallLong => GridCell { w: 6, h: 2 },
        WidgetSize::Medium => GridCell { w: 6, h: 4 },
        WidgetSize::Large => GridCell { w: 6, h: 8 },
        WidgetSize::ExtraLarge => GridCell { w: 12, h: 8 },
    }
}

/// Grid extent for a `(type, size)` pair, honoring per-type constraints
pub fn widget_grid(widget_type: &WidgetType, size: WidgetSize, is_mobile: bool) -> GridCell {
    size_to_grid(effective_size(widget_type, size), is_mobile)
}

/// Coerces sizes a type cannot render at to its nearest allowed size
pub fn effective_size(widget_type: &WidgetType, size: WidgetSize) -> WidgetSize {
    if widget_type.is_chart() && matches!(size, WidgetSize::Tiny) {
        WidgetSize::Medium
    } else {
        size
    }
}

/// Registry of known widget kinds and the sizes each may take
pub struct WidgetRegistry;

impl WidgetRegistry {
    /// Allowed sizes for a type, or `None` when the type is unknown.
    ///
    /// Unknown types are tolerated downstream (rendered as a
    /// deprecated placeholder), never silently discarded.
    pub fn allowed_sizes(widget_type: &WidgetType) -> Option<&'static [WidgetSize]> {
        const CHART_SIZES: [WidgetSize; 3] = [
            WidgetSize::Medium,
            WidgetSize::Large,
            WidgetSize::ExtraLarge,
        ];
        const STAT_SIZES: [WidgetSize; 3] =
            [WidgetSize::Tiny, WidgetSize::Small, WidgetSize::SmallLong];
        const TABLE_SIZES: [WidgetSize; 4] = [
            WidgetSize::Small,
            WidgetSize::Medium,
            WidgetSize::Large,
            WidgetSize::ExtraLarge,
        ];

        match widget_type {
            WidgetType::EquityChart
            | WidgetType::CumulativePnl
            | WidgetType::TradeDistribution => Some(&CHART_SIZES),
            WidgetType::WinRate
            | WidgetType::ProfitFactor
            | WidgetType::LongShortRatio
            | WidgetType::AveragePnl
            | WidgetType::AccountBalance => Some(&STAT_SIZES),
            WidgetType::PnlCalendar | WidgetType::RecentTrades => Some(&TABLE_SIZES),
            WidgetType::Unknown(_) => None,
        }
    }

    /// Returns true if the `(type, size)` pair is registered
    pub fn is_allowed(widget_type: &WidgetType, size: WidgetSize) -> bool {
        Self::allowed_sizes(widget_type)
            .map(|sizes| sizes.contains(&size))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medium_desktop_mapping() {
        let cell = size_to_grid(WidgetSize::Medium, false);
        assert_eq!(cell, GridCell { w: 6, h: 4 });
    }

    #[test]
    fn test_mobile_always_full_width() {
        for size in WidgetSize::ALL {
            assert_eq!(size_to_grid(size, true).w, MOBILE_COLUMNS);
        }
    }

    #[test]
    fn test_chart_rejects_tiny() {
        assert_eq!(
            effective_size(&WidgetType::EquityChart, WidgetSize::Tiny),
            WidgetSize::Medium
        );
        assert_eq!(
            effective_size(&WidgetType::WinRate, WidgetSize::Tiny),
            WidgetSize::Tiny
        );
    }

    #[test]
    fn test_registry_known_types() {
        assert!(WidgetRegistry::is_allowed(
            &WidgetType::EquityChart,
            WidgetSize::Medium
        ));
        assert!(!WidgetRegistry::is_allowed(
            &WidgetType::EquityChart,
            WidgetSize::Tiny
        ));
    }

    #[test]
    fn test_registry_unknown_type() {
        let unknown = WidgetType::Unknown("moon-phase".to_string());
        assert!(WidgetRegistry::allowed_sizes(&unknown).is_none());
        assert!(!WidgetRegistry::is_allowed(&unknown, WidgetSize::Medium));
    }

    #[test]
    fn test_every_known_type_has_sizes() {
        for t in WidgetType::KNOWN {
            let sizes = WidgetRegistry::allowed_sizes(&t).expect("known type missing from registry");
            assert!(!sizes.is_empty());
        }
    }
}
