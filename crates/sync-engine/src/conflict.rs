// crates/sync-engine/src/conflict.rs
//! Concurrent-edit detection and resolution
//!
//! A conflict exists when the remote copy advanced past the version we
//! last loaded AND its content differs from our baseline. The default
//! resolution merges by widget identity with the remote side winning,
//! except for widgets the user is actively editing on this device.

use crate::version::VersionService;
use std::collections::HashSet;
use tradedeck_core::{Layout, Widget};

/// How to resolve a detected conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionStrategy {
    /// Union by widget id; remote wins per widget unless it is in the
    /// in-flight edit set
    #[default]
    MergePreferRemote,
    /// Discard the remote changes entirely
    KeepLocal,
    /// Discard the local changes entirely
    KeepRemote,
}

/// Outcome of resolving a conflict
#[derive(Debug, Clone)]
pub struct Resolution {
    pub layout: Layout,
    pub strategy: ResolutionStrategy,
}

/// Detects and resolves concurrent layout edits
#[derive(Debug, Clone, Default)]
pub struct ConflictResolver {
    strategy: ResolutionStrategy,
}

impl ConflictResolver {
    pub fn new(strategy: ResolutionStrategy) -> Self {
        Self { strategy }
    }

    /// True when the remote copy has advanced with different content.
    ///
    /// `baseline_checksum` is the fingerprint of the layout as last
    /// loaded from the server; a remote copy that merely bumped its
    /// version without content drift is not a conflict.
    pub fn detect_conflict(
        &self,
        local: &Layout,
        remote: &Layout,
        baseline_checksum: &str,
    ) -> bool {
        if remote.version <= local.version {
            return false;
        }
        VersionService::generate_checksum(remote) != baseline_checksum
    }

    /// Picks a strategy for a detected conflict. One-sided layouts
    /// need no merge; everything else gets the default merge.
    pub fn suggest_resolution(&self, local: &Layout, remote: &Layout) -> ResolutionStrategy {
        if local.is_empty() && !remote.is_empty() {
            return ResolutionStrategy::KeepRemote;
        }
        if remote.is_empty() && !local.is_empty() {
            return ResolutionStrategy::KeepLocal;
        }
        self.strategy
    }

    /// Resolves a conflict with this resolver's configured strategy.
    ///
    /// `in_flight` names widget ids the user is mid-edit on locally;
    /// those keep the local state even under the remote-preferring
    /// merge. The result carries `max(local, remote) + 1` as its
    /// version so the subsequent save supersedes both sides.
    pub fn resolve(
        &self,
        local: &Layout,
        remote: &Layout,
        in_flight: &HashSet<String>,
    ) -> Resolution {
        self.resolve_with(self.strategy, local, remote, in_flight)
    }

    /// Resolves a conflict with an explicit strategy
    pub fn resolve_with(
        &self,
        strategy: ResolutionStrategy,
        local: &Layout,
        remote: &Layout,
        in_flight: &HashSet<String>,
    ) -> Resolution {
        let mut layout = match strategy {
            ResolutionStrategy::KeepLocal => local.clone(),
            ResolutionStrategy::KeepRemote => remote.clone(),
            ResolutionStrategy::MergePreferRemote => Layout {
                desktop: Self::merge_widgets(&local.desktop, &remote.desktop, in_flight),
                mobile: Self::merge_widgets(&local.mobile, &remote.mobile, in_flight),
                version: 0,
                updated_at: chrono::Utc::now(),
            },
        };

        layout.version = local.version.max(remote.version) + 1;
        layout.updated_at = chrono::Utc::now();

        log::info!(
            "Resolved layout conflict via {:?} (local v{}, remote v{} -> v{})",
            strategy,
            local.version,
            remote.version,
            layout.version
        );

        Resolution { layout, strategy }
    }

    /// Union by widget id. Widgets on both sides take the remote state
    /// unless in-flight; one-sided widgets survive from either side.
    fn merge_widgets(
        local: &[Widget],
        remote: &[Widget],
        in_flight: &HashSet<String>,
    ) -> Vec<Widget> {
        let mut merged: Vec<Widget> = Vec::with_capacity(local.len().max(remote.len()));

        for widget in local {
            match remote.iter().find(|r| r.i == widget.i) {
                Some(remote_widget) if !in_flight.contains(&widget.i) => {
                    merged.push(remote_widget.clone());
                }
                _ => merged.push(widget.clone()),
            }
        }

        // Remote-only widgets (added on another device)
        for widget in remote {
            if !merged.iter().any(|m| m.i == widget.i) {
                merged.push(widget.clone());
            }
        }

        merged
    }
}
