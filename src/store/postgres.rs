use std::str::FromStr;

use sqlx::{postgres::PgConnectOptions, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{Error, PostStore};
use crate::{
	model::{Post, PostSummary, UpdatePost},
	route::model::Patch,
	Database,
};

/// Post store backed by a shared Postgres pool.
#[derive(Clone)]
pub struct PgPostStore {
	database: Database,
}

impl PgPostStore {
	pub fn new(database: Database) -> Self {
		Self { database }
	}

	/// Connects to the database and applies pending migrations.
	///
	/// `database_name`, if given, replaces the database named in `url`.
	pub async fn connect(url: &str, database_name: Option<&str>) -> Result<Self, Error> {
		let mut options = PgConnectOptions::from_str(url)?;

		if let Some(name) = database_name {
			options = options.database(name);
		}

		let database = Database::connect_with(options).await?;

		sqlx::migrate!().run(&database).await?;

		Ok(Self::new(database))
	}
}

#[axum::async_trait]
impl PostStore for PgPostStore {
	async fn create(&self, title: String) -> Result<Post, Error> {
		let now = chrono::Utc::now();

		let post = sqlx::query_as::<_, Post>(
			r#"
				INSERT INTO post (title, created_at, updated_at)
				VALUES ($1, $2, $2)
				RETURNING *
			"#,
		)
		.bind(title)
		.bind(now)
		.fetch_one(&self.database)
		.await?;

		Ok(post)
	}

	async fn list(&self) -> Result<Vec<PostSummary>, Error> {
		let posts = sqlx::query_as::<_, PostSummary>(
			r#"
				SELECT id, title, status, updated_at FROM post
				ORDER BY updated_at DESC
			"#,
		)
		.fetch_all(&self.database)
		.await?;

		Ok(posts)
	}

	async fn get(&self, id: Uuid) -> Result<Option<Post>, Error> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				SELECT * FROM post
				WHERE id = $1
			"#,
		)
		.bind(id)
		.fetch_optional(&self.database)
		.await?;

		Ok(post)
	}

	async fn update(&self, id: Uuid, patch: UpdatePost) -> Result<Option<Post>, Error> {
		// updated_at never moves backwards, even when the clock lags the stored time
		let mut query = QueryBuilder::<Postgres>::new("UPDATE post SET updated_at = GREATEST(");
		query.push_bind(chrono::Utc::now()).push(", updated_at)");

		if let Patch::Set(title) = patch.title {
			query.push(", title = ").push_bind(title);
		}

		if let Patch::Set(lexical_state) = patch.lexical_state {
			query.push(", lexical_state = ").push_bind(lexical_state);
		}

		if let Patch::Set(plain_text) = patch.plain_text {
			query.push(", plain_text = ").push_bind(plain_text);
		}

		query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

		let post = query
			.build_query_as::<Post>()
			.fetch_optional(&self.database)
			.await?;

		Ok(post)
	}

	async fn publish(&self, id: Uuid) -> Result<Option<Post>, Error> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				UPDATE post
				SET status = 'published', updated_at = GREATEST($1, updated_at)
				WHERE id = $2
				RETURNING *
			"#,
		)
		.bind(chrono::Utc::now())
		.bind(id)
		.fetch_optional(&self.database)
		.await?;

		Ok(post)
	}
}
