// crates/storage/src/remote.rs
//! Remote store abstraction
//!
//! The relational backend is an external collaborator. The sync layer
//! only ever talks to it through this trait, so tests inject scripted
//! fakes and the application injects its real database client.

use crate::error::StoreError;
use async_trait::async_trait;
use tradedeck_core::Layout;

/// Persists layouts to the remote database
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Upserts the layout for a user
    async fn save_layout(&self, user_id: &str, layout: &Layout) -> Result<(), StoreError>;

    /// Fetches the current remote layout, or `None` if the user has
    /// never saved one
    async fn load_layout(&self, user_id: &str) -> Result<Option<Layout>, StoreError>;
}
