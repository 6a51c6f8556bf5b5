//! Persistence for posts.
//!
//! Every operation is a single round trip to the store. Concurrent writes to the
//! same post are last-write-wins.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use std::sync::Arc;

use uuid::Uuid;

use crate::model::{Post, PostSummary, UpdatePost};

#[cfg(test)]
pub use memory::MemoryPostStore;
pub use postgres::PgPostStore;

/// Shared handle to the post store.
pub type Posts = Arc<dyn PostStore>;

/// The default title of a post created without one.
pub const DEFAULT_TITLE: &str = "Untitled";

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
}

#[axum::async_trait]
pub trait PostStore: Send + Sync {
	/// Inserts a new draft with an empty body.
	async fn create(&self, title: String) -> Result<Post, Error>;

	/// Returns every post, most recently updated first.
	async fn list(&self) -> Result<Vec<PostSummary>, Error>;

	async fn get(&self, id: Uuid) -> Result<Option<Post>, Error>;

	/// Writes the fields present in `patch` and refreshes `updated_at`.
	///
	/// The caller must reject an empty patch.
	async fn update(&self, id: Uuid, patch: UpdatePost) -> Result<Option<Post>, Error>;

	/// Marks the post as published and refreshes `updated_at`, whatever its current status.
	async fn publish(&self, id: Uuid) -> Result<Option<Post>, Error>;
}
