//! OpenAI-compatible chat completion client.

use futures::{Stream, StreamExt};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{Endpoint, Error};

/// A streaming chat completion client bound to one API key.
pub struct ChatClient {
	http: Client,
	api_key: SecretString,
	endpoint: Endpoint,
}

impl ChatClient {
	pub fn new(api_key: SecretString, endpoint: Endpoint) -> Self {
		Self {
			http: Client::new(),
			api_key,
			endpoint,
		}
	}

	/// Whether this client was built for `api_key`.
	pub fn uses_key(&self, api_key: &SecretString) -> bool {
		self.api_key.expose_secret() == api_key.expose_secret()
	}

	/// Sends `prompt` as a single user message and returns the non-empty
	/// content deltas as they arrive.
	pub async fn stream(
		&self,
		prompt: &str,
	) -> Result<impl Stream<Item = Result<String, Error>> + Send + 'static, Error> {
		let request = ChatCompletionRequest {
			model: &self.endpoint.model,
			messages: vec![ChatMessage {
				role: "user",
				content: prompt,
			}],
			stream: true,
		};

		let url = format!("{}/chat/completions", self.endpoint.base_url.trim_end_matches('/'));

		let response = self
			.http
			.post(&url)
			.bearer_auth(self.api_key.expose_secret())
			.json(&request)
			.send()
			.await?;

		let status = response.status();

		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			let message = error_message(&body);

			return Err(if status == StatusCode::UNAUTHORIZED {
				Error::Authentication(message)
			} else {
				Error::Api { status, message }
			});
		}

		Ok(content_deltas(response.bytes_stream()))
	}
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
	model: &'a str,
	messages: Vec<ChatMessage<'a>>,
	stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
	role: &'a str,
	content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionChunk {
	#[serde(default)]
	choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
	#[serde(default)]
	delta: Delta,
}

#[derive(Default, Deserialize)]
struct Delta {
	content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
	error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
	message: String,
}

/// Pulls the message out of an OpenAI-style error body, falling back to the raw body.
fn error_message(body: &str) -> String {
	serde_json::from_str::<ErrorBody>(body)
		.map(|body| body.error.message)
		.unwrap_or_else(|_| body.trim().to_owned())
}

/// A single line of an event stream.
#[derive(Debug, PartialEq)]
enum Line {
	Content(String),
	Done,
	Skip,
}

fn parse_line(line: &str) -> Result<Line, Error> {
	let Some(data) = line.strip_prefix("data:") else {
		// comments, event names, ids and blank separators
		return Ok(Line::Skip);
	};

	let data = data.trim();

	if data == "[DONE]" {
		return Ok(Line::Done);
	}

	if data.is_empty() {
		return Ok(Line::Skip);
	}

	let chunk = serde_json::from_str::<ChatCompletionChunk>(data)?;

	Ok(chunk
		.choices
		.into_iter()
		.next()
		.and_then(|choice| choice.delta.content)
		.filter(|content| !content.is_empty())
		.map_or(Line::Skip, Line::Content))
}

/// Turns a raw event stream body into its content deltas.
///
/// Lines are split on raw bytes so a multi-byte character spread over two
/// network chunks is decoded whole. The stream ends at `[DONE]`, at the end of
/// the body, or after yielding the first error.
fn content_deltas<S, B, E>(body: S) -> impl Stream<Item = Result<String, Error>> + Send + 'static
where
	S: Stream<Item = Result<B, E>> + Send + 'static,
	B: AsRef<[u8]> + Send + 'static,
	E: Into<Error> + Send + 'static,
{
	async_stream::stream! {
		futures::pin_mut!(body);

		let mut buffer = Vec::new();

		'read: while let Some(chunk) = body.next().await {
			let chunk = match chunk {
				Ok(chunk) => chunk,
				Err(error) => {
					yield Err(error.into());
					break 'read;
				}
			};

			buffer.extend_from_slice(chunk.as_ref());

			while let Some(end) = buffer.iter().position(|byte| *byte == b'\n') {
				let line = buffer.drain(..=end).collect::<Vec<_>>();
				let line = String::from_utf8_lossy(&line);

				match parse_line(line.trim_end()) {
					Ok(Line::Content(content)) => yield Ok(content),
					Ok(Line::Done) => break 'read,
					Ok(Line::Skip) => {}
					Err(error) => {
						yield Err(error);
						break 'read;
					}
				}
			}
		}
	}
}
