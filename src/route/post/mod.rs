use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid post id {0:?}")]
	InvalidId(String),
	#[error("unknown post {0}")]
	UnknownPost(Uuid),
	#[error("no fields to update")]
	NothingToUpdate,
}

pub type RouteError = error::RouteError<Error>;

impl From<Error> for RouteError {
	fn from(error: Error) -> Self {
		Self::Route(error)
	}
}

/// Parses a post id from the path.
pub fn parse_id(id: &str) -> Result<Uuid, Error> {
	Uuid::parse_str(id).map_err(|_| Error::InvalidId(id.to_owned()))
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(list_posts, list_posts_docs).post_with(create_post, create_post_docs),
		)
		.api_route(
			"/:id",
			get_with(get_post, get_post_docs).patch_with(update_post, update_post_docs),
		)
		.api_route("/:id/publish", post_with(publish_post, publish_post_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidId(..) | Self::NothingToUpdate => StatusCode::BAD_REQUEST,
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::InvalidId(id) => error::Message::new("Invalid post ID")
				.field("id")
				.detail("id", id.as_str())
				.into_vec(),
			Self::UnknownPost(post) => error::Message::new("Post not found")
				.detail("post", post.to_string())
				.into_vec(),
			Self::NothingToUpdate => error::Message::new("No fields to update").into_vec(),
		}
	}
}
