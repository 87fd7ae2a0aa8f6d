//! Scripted transport shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::{BTreeMap, VecDeque},
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	sync::Arc,
};
// crates.io
use parking_lot::Mutex;
// self
use oauth2_client_credentials::{
	http::{HeaderValue, HttpFuture, HttpRequest, HttpResponse, StatusCode, TokenHttpClient, header},
	oauth::{NetworkErrorMapper, TokenRetriever},
	url::form_urlencoded,
};

pub const TOKEN_URL: &str = "https://auth.example.com/oauth/token";
pub const CLIENT_ID: &str = "svc-reporting";
pub const CLIENT_SECRET: &str = "s3cr3t:value";

pub type ScriptedRetriever = TokenRetriever<ScriptedHttpClient, NetworkErrorMapper>;

/// Failure injected by [`ScriptedHttpClient::fail`].
#[derive(Clone, Debug)]
pub struct ScriptedError(pub String);
impl Display for ScriptedError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Scripted transport failure: {}.", self.0)
	}
}
impl StdError for ScriptedError {}

/// Snapshot of a request seen by [`ScriptedHttpClient`].
#[derive(Clone, Debug)]
pub struct RecordedRequest {
	pub method: String,
	pub uri: String,
	pub authorization: Option<String>,
	pub content_type: Option<String>,
	pub accept: Option<String>,
	pub body: String,
}
impl RecordedRequest {
	pub fn form(&self) -> BTreeMap<String, Vec<String>> {
		let mut fields = BTreeMap::<String, Vec<String>>::new();

		for (key, value) in form_urlencoded::parse(self.body.as_bytes()) {
			fields.entry(key.into_owned()).or_default().push(value.into_owned());
		}

		fields
	}

	pub fn field(&self, key: &str) -> Option<String> {
		self.form().get(key).and_then(|values| values.first()).cloned()
	}
}

/// Transport that replays queued responses in order and records every request.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
	script: Mutex<VecDeque<Result<HttpResponse, ScriptedError>>>,
	requests: Mutex<Vec<RecordedRequest>>,
}
impl ScriptedHttpClient {
	pub fn respond(self, status: u16, content_type: &str, body: &str) -> Self {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() =
			StatusCode::from_u16(status).expect("Scripted status should be valid.");
		response.headers_mut().insert(
			header::CONTENT_TYPE,
			HeaderValue::from_str(content_type).expect("Scripted content type should be valid."),
		);
		self.script.lock().push_back(Ok(response));

		self
	}

	pub fn respond_json(self, status: u16, body: &str) -> Self {
		self.respond(status, "application/json", body)
	}

	pub fn fail(self, message: &str) -> Self {
		self.script.lock().push_back(Err(ScriptedError(message.into())));

		self
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.requests.lock().clone()
	}
}
impl TokenHttpClient for ScriptedHttpClient {
	type TransportError = ScriptedError;

	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		let header_text = |name: header::HeaderName| {
			request.headers().get(name).and_then(|value| value.to_str().ok()).map(str::to_owned)
		};
		let recorded = RecordedRequest {
			method: request.method().to_string(),
			uri: request.uri().to_string(),
			authorization: header_text(header::AUTHORIZATION),
			content_type: header_text(header::CONTENT_TYPE),
			accept: header_text(header::ACCEPT),
			body: String::from_utf8_lossy(request.body()).into_owned(),
		};

		self.requests.lock().push(recorded);

		let next = self
			.script
			.lock()
			.pop_front()
			.unwrap_or_else(|| Err(ScriptedError("script exhausted".into())));

		Box::pin(async move { next })
	}
}

pub fn scripted_retriever(client: ScriptedHttpClient) -> (ScriptedRetriever, Arc<ScriptedHttpClient>) {
	let client = Arc::new(client);
	let retriever = TokenRetriever::with_http_client(client.clone(), NetworkErrorMapper);

	(retriever, client)
}
