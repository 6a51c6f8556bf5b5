use std::net::{IpAddr, Ipv4Addr};

use tracing::Level;

use crate::relay::Endpoint;

/// Origins of the editor's dev server, always allowed.
const DEFAULT_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://127.0.0.1:5173"];

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{name} must be {expected}, got {value:?}")]
	Invalid {
		name: &'static str,
		expected: &'static str,
		value: String,
	},
}

/// Process configuration, read from the environment at startup.
///
/// The upstream API key is not part of it, since the relay reads that on every call.
#[derive(Debug, Clone)]
pub struct Config {
	pub host: IpAddr,
	pub port: u16,
	pub database_url: String,
	/// Overrides the database named in `database_url`.
	pub database_name: Option<String>,
	pub cors_origins: Vec<String>,
	pub llm: Endpoint,
	pub log_level: Level,
	pub otlp_endpoint: Option<String>,
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Builds the configuration from `lookup`, which returns the value of a variable if it is set.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
		let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

		let host = match var("HOST") {
			Some(value) => value.parse().map_err(|_| Error::Invalid {
				name: "HOST",
				expected: "an IP address",
				value,
			})?,
			None => IpAddr::V4(Ipv4Addr::LOCALHOST),
		};

		let port = match var("PORT") {
			Some(value) => value.parse().map_err(|_| Error::Invalid {
				name: "PORT",
				expected: "a port number",
				value,
			})?,
			None => 8000,
		};

		let log_level = match var("LOG_LEVEL") {
			Some(value) => value.parse().map_err(|_| Error::Invalid {
				name: "LOG_LEVEL",
				expected: "one of trace, debug, info, warn, error",
				value,
			})?,
			None => Level::INFO,
		};

		let cors_origins = DEFAULT_ORIGINS
			.iter()
			.map(|origin| (*origin).to_owned())
			.chain(
				var("CORS_ORIGINS")
					.unwrap_or_default()
					.split(',')
					.map(str::trim)
					.filter(|origin| !origin.is_empty())
					.map(str::to_owned),
			)
			.collect();

		let defaults = Endpoint::default();

		Ok(Self {
			host,
			port,
			database_url: var("DATABASE_URL")
				.unwrap_or_else(|| "postgres://localhost:5432/smart_blog_editor".into()),
			database_name: var("DATABASE_NAME"),
			cors_origins,
			llm: Endpoint {
				base_url: var("LLM_BASE_URL").unwrap_or(defaults.base_url),
				model: var("LLM_MODEL").unwrap_or(defaults.model),
			},
			log_level,
			otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
		})
	}
}
