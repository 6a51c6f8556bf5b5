use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use super::{Error, PostStore};
use crate::model::{Post, PostStatus, PostSummary, UpdatePost};

/// Post store kept in process memory, used to drive the routes in tests.
#[derive(Default)]
pub struct MemoryPostStore {
	posts: RwLock<HashMap<Uuid, Post>>,
}

impl MemoryPostStore {
	fn modify(&self, id: Uuid, change: impl FnOnce(&mut Post)) -> Option<Post> {
		let mut posts = self.posts.write();
		let post = posts.get_mut(&id)?;

		change(post);
		post.updated_at = chrono::Utc::now().max(post.updated_at);

		Some(post.clone())
	}
}

#[axum::async_trait]
impl PostStore for MemoryPostStore {
	async fn create(&self, title: String) -> Result<Post, Error> {
		let now = chrono::Utc::now();
		let post = Post {
			id: Uuid::new_v4(),
			title,
			lexical_state: None,
			plain_text: String::new(),
			status: PostStatus::Draft,
			created_at: now,
			updated_at: now,
		};

		self.posts.write().insert(post.id, post.clone());

		Ok(post)
	}

	async fn list(&self) -> Result<Vec<PostSummary>, Error> {
		let mut posts = self
			.posts
			.read()
			.values()
			.map(PostSummary::from)
			.collect::<Vec<_>>();

		posts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

		Ok(posts)
	}

	async fn get(&self, id: Uuid) -> Result<Option<Post>, Error> {
		Ok(self.posts.read().get(&id).cloned())
	}

	async fn update(&self, id: Uuid, patch: UpdatePost) -> Result<Option<Post>, Error> {
		Ok(self.modify(id, |post| {
			if let Some(title) = patch.title.into_option() {
				post.title = title;
			}

			if let Some(lexical_state) = patch.lexical_state.into_option() {
				post.lexical_state = lexical_state;
			}

			if let Some(plain_text) = patch.plain_text.into_option() {
				post.plain_text = plain_text;
			}
		}))
	}

	async fn publish(&self, id: Uuid) -> Result<Option<Post>, Error> {
		Ok(self.modify(id, |post| post.status = PostStatus::Published))
	}
}
