// crates/core/src/layout.rs
//! The versioned widget layout and its edit operations

use crate::error::{LayoutError, LayoutResult};
use crate::grid::{effective_size, size_to_grid, MOBILE_COLUMNS};
use crate::widget::{LayoutItem, Widget, WidgetSize, WidgetType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which arrangement of a layout is being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arrangement {
    Desktop,
    Mobile,
}

impl Arrangement {
    /// Returns true for the mobile arrangement
    pub fn is_mobile(self) -> bool {
        matches!(self, Arrangement::Mobile)
    }
}

/// A user's full widget arrangement: the unit of synchronization.
///
/// `desktop` and `mobile` hold independent placements of the same
/// logical widget set. `version` increases on every confirmed remote
/// save; it never moves on local-only edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub desktop: Vec<Widget>,
    pub mobile: Vec<Widget>,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl Layout {
    /// Creates an empty layout at version 1
    pub fn new() -> Self {
        Self {
            desktop: Vec::new(),
            mobile: Vec::new(),
            version: 1,
            updated_at: Utc::now(),
        }
    }

    /// The default starter layout new accounts receive
    pub fn default_layout() -> Self {
        let mut layout = Self::new();
        for (widget_type, size) in [
            (WidgetType::EquityChart, WidgetSize::Medium),
            (WidgetType::WinRate, WidgetSize::Tiny),
            (WidgetType::RecentTrades, WidgetSize::Medium),
        ] {
            // Starter widgets cannot collide by construction
            let _ = layout.add_widget(Arrangement::Desktop, widget_type.clone(), size);
            let _ = layout.add_widget(Arrangement::Mobile, widget_type, size);
        }
        layout
    }

    /// Widgets of one arrangement
    pub fn arrangement(&self, which: Arrangement) -> &[Widget] {
        match which {
            Arrangement::Desktop => &self.desktop,
            Arrangement::Mobile => &self.mobile,
        }
    }

    fn arrangement_mut(&mut self, which: Arrangement) -> &mut Vec<Widget> {
        match which {
            Arrangement::Desktop => &mut self.desktop,
            Arrangement::Mobile => &mut self.mobile,
        }
    }

    /// Adds a widget below the lowest occupied row.
    ///
    /// Rejects a second widget of the same type within one arrangement.
    /// The new widget appears only in the target arrangement; the same
    /// identifier may later be placed in the other one.
    pub fn add_widget(
        &mut self,
        which: Arrangement,
        widget_type: WidgetType,
        size: WidgetSize,
    ) -> LayoutResult<Widget> {
        let is_mobile = which.is_mobile();
        let widgets = self.arrangement_mut(which);

        if widgets.iter().any(|w| w.widget_type == widget_type) {
            return Err(LayoutError::DuplicateType(widget_type));
        }

        let size = effective_size(&widget_type, size);
        let cell = size_to_grid(size, is_mobile);
        let lowest = widgets.iter().map(Widget::bottom).max().unwrap_or(0);

        let widget = Widget::new(widget_type, size, 0, lowest, cell.w, cell.h);
        widgets.push(widget.clone());
        self.touch();
        Ok(widget)
    }

    /// Removes a widget from one arrangement.
    ///
    /// The widget is destroyed once removed from both arrangements.
    pub fn remove_widget(&mut self, which: Arrangement, id: &str) -> LayoutResult<()> {
        let widgets = self.arrangement_mut(which);
        let before = widgets.len();
        widgets.retain(|w| w.i != id);
        if widgets.len() == before {
            return Err(LayoutError::WidgetNotFound(id.to_string()));
        }
        self.touch();
        Ok(())
    }

    /// Changes a widget's size, re-deriving `w`/`h` from the size table
    pub fn change_widget_size(
        &mut self,
        which: Arrangement,
        id: &str,
        new_size: WidgetSize,
    ) -> LayoutResult<()> {
        let is_mobile = which.is_mobile();
        let widget = self
            .arrangement_mut(which)
            .iter_mut()
            .find(|w| w.i == id)
            .ok_or_else(|| LayoutError::WidgetNotFound(id.to_string()))?;

        let size = effective_size(&widget.widget_type, new_size);
        let cell = size_to_grid(size, is_mobile);
        widget.size = size;
        widget.w = cell.w;
        widget.h = cell.h;
        widget.updated_at = Utc::now();
        self.touch();
        Ok(())
    }

    /// Swaps a widget's type in place, keeping its position and size
    pub fn change_widget_type(
        &mut self,
        which: Arrangement,
        id: &str,
        new_type: WidgetType,
    ) -> LayoutResult<()> {
        let widget = self
            .arrangement_mut(which)
            .iter_mut()
            .find(|w| w.i == id)
            .ok_or_else(|| LayoutError::WidgetNotFound(id.to_string()))?;
        widget.widget_type = new_type;
        widget.updated_at = Utc::now();
        self.touch();
        Ok(())
    }

    /// Applies drag results from the grid UI.
    ///
    /// Items without a matching widget are skipped. Mobile placements
    /// are pinned to column 0 at full width regardless of what the UI
    /// reports.
    pub fn apply_positions(&mut self, which: Arrangement, items: &[LayoutItem]) {
        let is_mobile = which.is_mobile();
        let widgets = self.arrangement_mut(which);
        for item in items {
            if let Some(widget) = widgets.iter_mut().find(|w| w.i == item.i) {
                widget.x = if is_mobile { 0 } else { item.x };
                widget.y = item.y;
                widget.w = if is_mobile { MOBILE_COLUMNS } else { item.w };
                widget.h = item.h;
                widget.updated_at = Utc::now();
            }
        }
        self.touch();
    }

    /// Removes every widget from both arrangements
    pub fn remove_all(&mut self) {
        self.desktop.clear();
        self.mobile.clear();
        self.touch();
    }

    /// Replaces both arrangements with the starter layout
    pub fn restore_defaults(&mut self) {
        let defaults = Layout::default_layout();
        self.desktop = defaults.desktop;
        self.mobile = defaults.mobile;
        self.touch();
    }

    /// Looks a widget up by identifier in one arrangement
    pub fn find_widget(&self, which: Arrangement, id: &str) -> Option<&Widget> {
        self.arrangement(which).iter().find(|w| w.i == id)
    }

    /// True when neither arrangement holds any widget
    pub fn is_empty(&self) -> bool {
        self.desktop.is_empty() && self.mobile.is_empty()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}
