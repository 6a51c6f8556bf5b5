//! Relays editing actions to an upstream language model and streams the
//! generated text back as it is produced.

pub mod client;

use std::{str::FromStr, sync::Arc};

use futures::{stream::BoxStream, StreamExt};
use parking_lot::RwLock;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};

pub use client::ChatClient;

/// The environment variable the API key is read from.
pub const API_KEY_VAR: &str = "DEEPSEEK_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("text cannot be empty")]
	EmptyText,
	#[error("unknown action {0:?}")]
	UnknownAction(String),
	#[error("{} is not set", API_KEY_VAR)]
	MissingCredential,
	#[error("Authentication failed. Check your {}. Details: {0}", API_KEY_VAR)]
	Authentication(String),
	#[error("API error: {message}")]
	Api { status: StatusCode, message: String },
	#[error("{0}")]
	Transport(#[from] reqwest::Error),
	#[error("malformed stream chunk: {0}")]
	Decode(#[from] serde_json::Error),
}

/// An editing action the model can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
	Summarize,
	FixGrammar,
}

impl Action {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Summarize => "summarize",
			Self::FixGrammar => "fix_grammar",
		}
	}

	/// Builds the prompt for this action. The text is inserted as-is.
	pub fn prompt(self, text: &str) -> String {
		match self {
			Self::Summarize => {
				format!("Summarize the following blog post concisely in 2-3 sentences:\n\n{text}")
			}
			Self::FixGrammar => format!(
				"Fix grammar and improve clarity of the following text. \
				 Return only the corrected text, no explanations:\n\n{text}"
			),
		}
	}
}

impl FromStr for Action {
	type Err = Error;

	fn from_str(action: &str) -> Result<Self, Self::Err> {
		match action {
			"summarize" => Ok(Self::Summarize),
			"fix_grammar" => Ok(Self::FixGrammar),
			_ => Err(Error::UnknownAction(action.to_owned())),
		}
	}
}

/// One piece of a relayed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
	/// Text generated by the model. Never empty.
	Content(String),
	/// The upstream call failed. Always the last fragment of a stream.
	Error(String),
}

impl Fragment {
	/// Renders the fragment as it is written to the client.
	pub fn into_text(self) -> String {
		match self {
			Self::Content(content) => content,
			Self::Error(message) => format!("[Error: {message}]"),
		}
	}
}

pub type FragmentStream = BoxStream<'static, Fragment>;

/// The upstream model service.
#[derive(Debug, Clone)]
pub struct Endpoint {
	pub base_url: String,
	pub model: String,
}

impl Default for Endpoint {
	fn default() -> Self {
		Self {
			base_url: "https://api.deepseek.com".into(),
			model: "deepseek-chat".into(),
		}
	}
}

/// Where the API key comes from.
pub enum KeySource {
	/// Read from the process environment on every call.
	Env(&'static str),
	Static(Option<SecretString>),
}

impl KeySource {
	fn current(&self) -> Option<SecretString> {
		match self {
			Self::Env(var) => std::env::var(var)
				.ok()
				.filter(|key| !key.is_empty())
				.map(|key| SecretString::new(key.into())),
			Self::Static(key) => key
				.as_ref()
				.map(|key| SecretString::new(key.expose_secret().into())),
		}
	}
}

/// Turns text and an action into a stream of generated fragments.
///
/// The upstream client is built on first use and kept until the API key
/// changes, at which point a new one replaces it.
pub struct Relay {
	keys: KeySource,
	endpoint: Endpoint,
	client: RwLock<Option<Arc<ChatClient>>>,
}

impl Relay {
	pub fn new(keys: KeySource, endpoint: Endpoint) -> Self {
		Self {
			keys,
			endpoint,
			client: RwLock::new(None),
		}
	}

	/// Returns the client for the current API key, rebuilding it if the key changed.
	pub fn client(&self) -> Result<Arc<ChatClient>, Error> {
		let key = self.keys.current().ok_or(Error::MissingCredential)?;

		if let Some(client) = self.client.read().as_ref().filter(|c| c.uses_key(&key)) {
			return Ok(Arc::clone(client));
		}

		let mut cached = self.client.write();

		// another request may have rebuilt it while we waited for the lock
		if let Some(client) = cached.as_ref().filter(|c| c.uses_key(&key)) {
			return Ok(Arc::clone(client));
		}

		tracing::info!(model = %self.endpoint.model, "building upstream model client");

		let client = Arc::new(ChatClient::new(key, self.endpoint.clone()));
		*cached = Some(Arc::clone(&client));

		Ok(client)
	}

	/// Starts generating text for `action` over `text`.
	///
	/// Input and credential problems are returned before anything is sent
	/// upstream. Once the stream is handed out, upstream failures end it with
	/// a single [`Fragment::Error`] instead.
	pub fn generate(&self, text: &str, action: Action) -> Result<FragmentStream, Error> {
		if text.trim().is_empty() {
			return Err(Error::EmptyText);
		}

		let client = self.client()?;
		let prompt = action.prompt(text);

		let fragments = async_stream::stream! {
			let mut guard = StreamGuard { action, finished: false };

			match client.stream(&prompt).await {
				Ok(deltas) => {
					futures::pin_mut!(deltas);

					while let Some(delta) = deltas.next().await {
						match delta {
							Ok(content) => yield Fragment::Content(content),
							Err(error) => {
								tracing::warn!(%error, action = action.as_str(), "upstream stream failed");
								yield Fragment::Error(error.to_string());
								break;
							}
						}
					}
				}
				Err(error) => {
					tracing::warn!(%error, action = action.as_str(), "upstream request failed");
					yield Fragment::Error(error.to_string());
				}
			}

			guard.finished = true;
		};

		Ok(fragments.boxed())
	}
}

/// Notes when a stream is dropped before it finished, which happens when the
/// client disconnects. Dropping the stream also drops the upstream response.
struct StreamGuard {
	action: Action,
	finished: bool,
}

impl Drop for StreamGuard {
	fn drop(&mut self) {
		if !self.finished {
			tracing::debug!(action = self.action.as_str(), "relay stream dropped before completion");
		}
	}
}

#[cfg(test)]
mod test {
	use wiremock::{
		matchers::{method, path},
		Mock, MockServer, ResponseTemplate,
	};

	use super::*;

	fn relay(key: Option<&str>, base_url: String) -> Relay {
		Relay::new(
			KeySource::Static(key.map(|key| SecretString::new(key.into()))),
			Endpoint {
				base_url,
				model: "test-model".into(),
			},
		)
	}

	#[test]
	fn test_action_parse() {
		assert_eq!("summarize".parse::<Action>().unwrap(), Action::Summarize);
		assert_eq!("fix_grammar".parse::<Action>().unwrap(), Action::FixGrammar);
		assert!(matches!(
			"translate".parse::<Action>(),
			Err(Error::UnknownAction(ref action)) if action == "translate"
		));
		assert!("Summarize".parse::<Action>().is_err());
	}

	#[test]
	fn test_prompt_keeps_text_verbatim() {
		let text = "  {weird} <b>input</b>\n";

		assert!(Action::Summarize.prompt(text).ends_with(&format!("\n\n{text}")));
		assert!(Action::FixGrammar
			.prompt(text)
			.starts_with("Fix grammar and improve clarity of the following text."));
	}

	#[test]
	fn test_error_fragment_text() {
		assert_eq!(Fragment::Content("hi".into()).into_text(), "hi");
		assert_eq!(Fragment::Error("boom".into()).into_text(), "[Error: boom]");
	}

	#[test]
	fn test_client_cached_per_key() {
		let relay = Relay::new(
			KeySource::Static(Some(SecretString::new("one".into()))),
			Endpoint::default(),
		);

		let first = relay.client().unwrap();
		let second = relay.client().unwrap();

		assert!(Arc::ptr_eq(&first, &second));
	}

	#[test]
	fn test_client_rebuilt_when_key_changes() {
		let relay = relay(Some("one"), "http://localhost".into());
		let first = relay.client().unwrap();

		let relay = Relay {
			keys: KeySource::Static(Some(SecretString::new("two".into()))),
			..relay
		};
		let second = relay.client().unwrap();

		assert!(!Arc::ptr_eq(&first, &second));
		assert!(second.uses_key(&SecretString::new("two".into())));
		assert!(Arc::ptr_eq(&second, &relay.client().unwrap()));
	}

	#[test]
	fn test_missing_credential() {
		let relay = relay(None, "http://localhost".into());

		assert!(matches!(
			relay.generate("text", Action::Summarize),
			Err(Error::MissingCredential)
		));
	}

	#[test]
	fn test_env_key_read_on_every_call() {
		const VAR: &str = "BLOG_EDITOR_RELAY_TEST_KEY";

		let relay = Relay::new(KeySource::Env(VAR), Endpoint::default());

		std::env::remove_var(VAR);
		assert!(matches!(relay.client(), Err(Error::MissingCredential)));

		std::env::set_var(VAR, "");
		assert!(matches!(relay.client(), Err(Error::MissingCredential)));

		std::env::set_var(VAR, "first");
		let first = relay.client().unwrap();

		assert!(Arc::ptr_eq(&first, &relay.client().unwrap()));

		std::env::set_var(VAR, "second");
		let second = relay.client().unwrap();

		assert!(!Arc::ptr_eq(&first, &second));
		assert!(second.uses_key(&SecretString::new("second".into())));

		std::env::remove_var(VAR);
		assert!(matches!(
			relay.generate("text", Action::Summarize),
			Err(Error::MissingCredential)
		));
	}

	#[tokio::test]
	async fn test_empty_text_is_rejected_before_upstream() {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200))
			.expect(0)
			.mount(&server)
			.await;

		let relay = relay(Some("key"), server.uri());

		assert!(matches!(
			relay.generate(" \n\t", Action::FixGrammar),
			Err(Error::EmptyText)
		));
	}

	#[tokio::test]
	async fn test_generate_streams_fragments() {
		let server = MockServer::start().await;
		let body = [
			"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
			"data: {\"choices\":[{\"delta\":{\"content\":\"A fox\"}}]}\n\n",
			"data: {\"choices\":[{\"delta\":{\"content\":\" jumps.\"}}]}\n\n",
			"data: [DONE]\n\n",
		]
		.concat();

		Mock::given(method("POST"))
			.and(path("/chat/completions"))
			.respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
			.expect(1)
			.mount(&server)
			.await;

		let relay = relay(Some("key"), server.uri());
		let fragments = relay
			.generate("The quick brown fox jumps over the lazy dog.", Action::Summarize)
			.unwrap()
			.collect::<Vec<_>>()
			.await;

		assert_eq!(
			fragments,
			vec![
				Fragment::Content("A fox".into()),
				Fragment::Content(" jumps.".into())
			]
		);
	}

	#[tokio::test]
	async fn test_generate_reports_upstream_failure_in_band() {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.and(path("/chat/completions"))
			.respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
				"error": { "message": "invalid api key" }
			})))
			.mount(&server)
			.await;

		let relay = relay(Some("key"), server.uri());
		let fragments = relay
			.generate("Some text", Action::FixGrammar)
			.unwrap()
			.collect::<Vec<_>>()
			.await;

		assert_eq!(fragments.len(), 1);
		assert_eq!(
			fragments[0],
			Fragment::Error(format!(
				"Authentication failed. Check your {API_KEY_VAR}. Details: invalid api key"
			))
		);
	}
}
