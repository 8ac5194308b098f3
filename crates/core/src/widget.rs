// crates/core/src/widget.rs
//! Widget model: types, sizes, and placed grid items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display size of a widget, mapped to grid cells via the size table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetSize {
    /// Single-row strip (e.g. a statistic)
    Tiny,
    /// Quarter-width card
    Small,
    /// Half-width strip
    SmallLong,
    /// Half-width card, the default
    Medium,
    /// Half-width, double height
    Large,
    /// Full-width panel
    ExtraLarge,
}

impl WidgetSize {
    /// All sizes, in ascending visual order
    pub const ALL: [WidgetSize; 6] = [
        WidgetSize::Tiny,
        WidgetSize::Small,
        WidgetSize::SmallLong,
        WidgetSize::Medium,
        WidgetSize::Large,
        WidgetSize::ExtraLarge,
    ];
}

/// Kind of dashboard widget.
///
/// Serialized as kebab-case strings. Strings that no longer map to a
/// known kind deserialize into [`WidgetType::Unknown`] so deprecated
/// widgets survive round-trips instead of being dropped; the validator
/// flags them and the UI renders a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WidgetType {
    EquityChart,
    PnlCalendar,
    RecentTrades,
    WinRate,
    ProfitFactor,
    TradeDistribution,
    CumulativePnl,
    LongShortRatio,
    AveragePnl,
    AccountBalance,
    Unknown(String),
}

impl WidgetType {
    /// Known widget kinds, i.e. everything except [`WidgetType::Unknown`]
    pub const KNOWN: [WidgetType; 10] = [
        WidgetType::EquityChart,
        WidgetType::PnlCalendar,
        WidgetType::RecentTrades,
        WidgetType::WinRate,
        WidgetType::ProfitFactor,
        WidgetType::TradeDistribution,
        WidgetType::CumulativePnl,
        WidgetType::LongShortRatio,
        WidgetType::AveragePnl,
        WidgetType::AccountBalance,
    ];

    /// Returns the serialized name of this type
    pub fn as_str(&self) -> &str {
        match self {
            WidgetType::EquityChart => "equity-chart",
            WidgetType::PnlCalendar => "pnl-calendar",
            WidgetType::RecentTrades => "recent-trades",
            WidgetType::WinRate => "win-rate",
            WidgetType::ProfitFactor => "profit-factor",
            WidgetType::TradeDistribution => "trade-distribution",
            WidgetType::CumulativePnl => "cumulative-pnl",
            WidgetType::LongShortRatio => "long-short-ratio",
            WidgetType::AveragePnl => "average-pnl",
            WidgetType::AccountBalance => "account-balance",
            WidgetType::Unknown(name) => name,
        }
    }

    /// Returns true if this type is not in the known registry
    pub fn is_unknown(&self) -> bool {
        matches!(self, WidgetType::Unknown(_))
    }

    /// Chart-style widgets need room for axes and legends
    pub fn is_chart(&self) -> bool {
        matches!(
            self,
            WidgetType::EquityChart | WidgetType::CumulativePnl | WidgetType::TradeDistribution
        )
    }
}

impl From<String> for WidgetType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "equity-chart" => WidgetType::EquityChart,
            "pnl-calendar" => WidgetType::PnlCalendar,
            "recent-trades" => WidgetType::RecentTrades,
            "win-rate" => WidgetType::WinRate,
            "profit-factor" => WidgetType::ProfitFactor,
            "trade-distribution" => WidgetType::TradeDistribution,
            "cumulative-pnl" => WidgetType::CumulativePnl,
            "long-short-ratio" => WidgetType::LongShortRatio,
            "average-pnl" => WidgetType::AveragePnl,
            "account-balance" => WidgetType::AccountBalance,
            _ => WidgetType::Unknown(s),
        }
    }
}

impl From<WidgetType> for String {
    fn from(t: WidgetType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for WidgetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single placed grid item within an arrangement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    /// Stable identifier, generated at creation time, never reused
    pub i: String,
    /// Widget kind
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    /// Display size
    pub size: WidgetSize,
    /// Grid column of the top-left corner
    pub x: u32,
    /// Grid row of the top-left corner
    pub y: u32,
    /// Width in grid columns, derived from `(type, size, mode)`
    pub w: u32,
    /// Height in grid rows, derived from `(type, size, mode)`
    pub h: u32,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Widget {
    /// Creates a widget with a fresh identifier at the given position
    pub fn new(widget_type: WidgetType, size: WidgetSize, x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            i: format!("widget-{}", Uuid::new_v4()),
            widget_type,
            size,
            x,
            y,
            w,
            h,
            updated_at: Utc::now(),
        }
    }

    /// Grid row just below this widget
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
}

/// A position update produced by the grid UI after a drag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutItem {
    pub i: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_type_roundtrip() {
        let json = serde_json::to_string(&WidgetType::EquityChart).unwrap();
        assert_eq!(json, "\"equity-chart\"");
        let back: WidgetType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, WidgetType::EquityChart);
    }

    #[test]
    fn test_unknown_type_preserved() {
        let back: WidgetType = serde_json::from_str("\"moon-phase\"").unwrap();
        assert!(back.is_unknown());
        assert_eq!(serde_json::to_string(&back).unwrap(), "\"moon-phase\"");
    }

    #[test]
    fn test_widget_size_serialization() {
        assert_eq!(
            serde_json::to_string(&WidgetSize::SmallLong).unwrap(),
            "\"small-long\""
        );
        assert_eq!(
            serde_json::to_string(&WidgetSize::ExtraLarge).unwrap(),
            "\"extra-large\""
        );
    }

    #[test]
    fn test_widget_ids_unique() {
        let a = Widget::new(WidgetType::WinRate, WidgetSize::Tiny, 0, 0, 3, 1);
        let b = Widget::new(WidgetType::WinRate, WidgetSize::Tiny, 0, 0, 3, 1);
        assert_ne!(a.i, b.i);
    }

    #[test]
    fn test_widget_bottom() {
        let w = Widget::new(WidgetType::EquityChart, WidgetSize::Medium, 0, 4, 6, 4);
        assert_eq!(w.bottom(), 8);
    }
}
