use axum::{
	extract::{Path, State},
	http::StatusCode,
};
use macros::route;

use crate::{extract::Json, openapi::tag, store::Posts};

use super::{model, parse_id, Error, RouteError};

/// List posts
/// Returns every post, most recently updated first, without the document state.
#[route(tag = tag::POST)]
pub async fn list_posts(
	State(posts): State<Posts>,
) -> Result<Json<Vec<model::PostSummary>>, RouteError> {
	Ok(Json(posts.list().await?))
}

/// Create post
/// Creates a new, empty draft.
#[route(tag = tag::POST, response(status = 201, description = "The created post.", shape = "Json<model::Post>"))]
pub async fn create_post(
	State(posts): State<Posts>,
	Json(input): Json<model::CreatePostInput>,
) -> Result<(StatusCode, Json<model::Post>), RouteError> {
	let post = posts.create(input.into_title()).await?;

	tracing::info!(post = %post.id, "created post");

	Ok((StatusCode::CREATED, Json(post)))
}

/// Get single post
/// Returns a single post by its unique id, including the document state.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(posts): State<Posts>,
	Path(post_id): Path<String>,
) -> Result<Json<model::Post>, RouteError> {
	let post_id = parse_id(&post_id)?;
	let post = posts.get(post_id).await?;

	Ok(Json(post.ok_or(Error::UnknownPost(post_id))?))
}

/// Update post
/// Updates the fields present in the body, leaving the others untouched.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(posts): State<Posts>,
	Path(post_id): Path<String>,
	Json(input): Json<model::UpdatePost>,
) -> Result<Json<model::Post>, RouteError> {
	let post_id = parse_id(&post_id)?;

	if input.is_empty() {
		return Err(Error::NothingToUpdate.into());
	}

	let post = posts.update(post_id, input).await?;

	Ok(Json(post.ok_or(Error::UnknownPost(post_id))?))
}

/// Publish post
/// Marks a post as published. Publishing an already published post only refreshes its update time.
#[route(tag = tag::POST)]
pub async fn publish_post(
	State(posts): State<Posts>,
	Path(post_id): Path<String>,
) -> Result<Json<model::Post>, RouteError> {
	let post_id = parse_id(&post_id)?;
	let post = posts
		.publish(post_id)
		.await?
		.ok_or(Error::UnknownPost(post_id))?;

	tracing::info!(post = %post.id, "published post");

	Ok(Json(post))
}
