//! Crate-level error types shared by the parameter builder, retriever, and token sources.
//!
//! Every error is [`Clone`] so a single-flight refresh can hand the same failure to each
//! waiting caller. Underlying sources are therefore held behind [`Arc`].

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Local configuration or request-construction problem; raised before any network call.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token endpoint answered and rejected the request.
	#[error(transparent)]
	Retrieve(#[from] RetrieveError),
	/// Transport failure or an unusable response body.
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl Error {
	/// Returns the protocol-level rejection, if this error carries one.
	pub fn as_retrieve(&self) -> Option<&RetrieveError> {
		match self {
			Self::Retrieve(err) => Some(err),
			_ => None,
		}
	}
}

/// Configuration and request-construction failures.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// An endpoint parameter would silently replace a parameter set from structured fields.
	#[error("Cannot overwrite the `{parameter}` token request parameter.")]
	ParameterCollision {
		/// Name of the offending parameter.
		parameter: String,
	},
	/// Token endpoint URL cannot be parsed.
	#[error("Token endpoint URL is invalid.")]
	InvalidTokenUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP request construction failed.
	#[error("Token request could not be constructed.")]
	HttpRequest {
		/// Underlying `http` builder failure.
		#[source]
		source: Arc<oauth2::http::Error>,
	},
	/// HTTP client could not be constructed or rejected the request before sending it.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// Access token cannot be carried in an `Authorization` header.
	#[error("Access token contains characters that are not valid in an Authorization header.")]
	InvalidAuthorizationHeader,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
impl From<oauth2::http::Error> for ConfigError {
	fn from(e: oauth2::http::Error) -> Self {
		Self::HttpRequest { source: Arc::new(e) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Protocol-level rejection returned by the token endpoint.
///
/// The shape is stable regardless of the transport that produced it: the OAuth `error`,
/// `error_description`, and `error_uri` fields plus the HTTP status and a capped copy of the
/// response body for diagnostics.
#[derive(Clone, PartialEq, Eq)]
pub struct RetrieveError {
	/// OAuth `error` code, or [`RetrieveError::UNKNOWN_CODE`] when the body did not carry one.
	pub code: String,
	/// OAuth `error_description` field.
	pub description: Option<String>,
	/// OAuth `error_uri` field.
	pub uri: Option<String>,
	/// HTTP status of the rejecting response.
	pub status: u16,
	/// Response body (lossy UTF-8, capped).
	pub body: String,
}
impl RetrieveError {
	/// Code reported when the server did not supply a machine-readable `error` field.
	pub const UNKNOWN_CODE: &'static str = "unknown";

	const BODY_PREVIEW_LIMIT: usize = 1024;

	/// Creates a rejection from raw response parts.
	pub fn new(code: Option<String>, status: u16, body: &[u8]) -> Self {
		let code = code.filter(|value| !value.is_empty());

		Self {
			code: code.unwrap_or_else(|| Self::UNKNOWN_CODE.into()),
			description: None,
			uri: None,
			status,
			body: preview(body, Self::BODY_PREVIEW_LIMIT),
		}
	}

	/// Adds the `error_description` field.
	pub fn with_description(mut self, description: Option<String>) -> Self {
		self.description = description.filter(|value| !value.is_empty());

		self
	}

	/// Adds the `error_uri` field.
	pub fn with_uri(mut self, uri: Option<String>) -> Self {
		self.uri = uri.filter(|value| !value.is_empty());

		self
	}

	/// Classifies the `error` code into the RFC 6749 §5.2 categories.
	pub fn kind(&self) -> RetrieveErrorKind {
		RetrieveErrorKind::from_code(&self.code)
	}
}
impl Debug for RetrieveError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RetrieveError")
			.field("code", &self.code)
			.field("description", &self.description)
			.field("uri", &self.uri)
			.field("status", &self.status)
			.field("body_len", &self.body.len())
			.finish()
	}
}
impl Display for RetrieveError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		if self.code == Self::UNKNOWN_CODE {
			return write!(f, "Token endpoint rejected the request with HTTP {}.", self.status);
		}

		write!(f, "Token endpoint returned an OAuth error: {}", self.code)?;

		if let Some(description) = &self.description {
			write!(f, " ({description})")?;
		}
		if let Some(uri) = &self.uri {
			write!(f, ", see {uri}")?;
		}

		f.write_str(".")
	}
}
impl StdError for RetrieveError {}

/// RFC 6749 §5.2 error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RetrieveErrorKind {
	/// `invalid_request`.
	InvalidRequest,
	/// `invalid_client` or `unauthorized_client`.
	InvalidClient,
	/// `invalid_grant` or `unsupported_grant_type`.
	InvalidGrant,
	/// `invalid_scope`.
	InvalidScope,
	/// `server_error` or `temporarily_unavailable`.
	Unavailable,
	/// Anything else, including a missing code.
	Other,
}
impl RetrieveErrorKind {
	fn from_code(code: &str) -> Self {
		if code.eq_ignore_ascii_case("invalid_request") {
			Self::InvalidRequest
		} else if code.eq_ignore_ascii_case("invalid_client")
			|| code.eq_ignore_ascii_case("unauthorized_client")
		{
			Self::InvalidClient
		} else if code.eq_ignore_ascii_case("invalid_grant")
			|| code.eq_ignore_ascii_case("unsupported_grant_type")
		{
			Self::InvalidGrant
		} else if code.eq_ignore_ascii_case("invalid_scope") {
			Self::InvalidScope
		} else if code.eq_ignore_ascii_case("server_error")
			|| code.eq_ignore_ascii_case("temporarily_unavailable")
		{
			Self::Unavailable
		} else {
			Self::Other
		}
	}
}

/// Transport-level failures and unusable response bodies.
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io {
		/// IO failure.
		#[source]
		source: Arc<std::io::Error>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON (HTTP {status}).")]
	TokenResponseParse {
		/// Structured parsing failure including the offending field path.
		#[source]
		source: Arc<serde_path_to_error::Error<serde_json::Error>>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Token endpoint responded successfully but omitted `access_token`.
	#[error("Token endpoint response is missing access_token (HTTP {status}).")]
	MissingAccessToken {
		/// HTTP status code of the response.
		status: u16,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Arc::new(src) }
	}
}
impl From<std::io::Error> for TransportError {
	fn from(e: std::io::Error) -> Self {
		Self::Io { source: Arc::new(e) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

fn preview(body: &[u8], limit: usize) -> String {
	let text = String::from_utf8_lossy(body);

	if text.chars().count() <= limit {
		return text.into_owned();
	}

	let mut buf = text.chars().take(limit).collect::<String>();

	buf.push('…');

	buf
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn retrieve_error_defaults_to_unknown_code() {
		let err = RetrieveError::new(None, 500, b"upstream exploded");

		assert_eq!(err.code, RetrieveError::UNKNOWN_CODE);
		assert_eq!(err.body, "upstream exploded");
		assert_eq!(err.kind(), RetrieveErrorKind::Other);
		assert_eq!(err.to_string(), "Token endpoint rejected the request with HTTP 500.");

		let blank = RetrieveError::new(Some(String::new()), 400, b"");

		assert_eq!(blank.code, RetrieveError::UNKNOWN_CODE);
	}

	#[test]
	fn retrieve_error_display_includes_description_and_uri() {
		let err = RetrieveError::new(Some("invalid_scope".into()), 400, b"{}")
			.with_description(Some("scope `admin` is not allowed".into()))
			.with_uri(Some("https://example.com/errors/scope".into()));

		assert_eq!(err.kind(), RetrieveErrorKind::InvalidScope);
		assert_eq!(
			err.to_string(),
			"Token endpoint returned an OAuth error: invalid_scope (scope `admin` is not allowed), \
			 see https://example.com/errors/scope."
		);
	}

	#[test]
	fn retrieve_error_kind_covers_standard_codes() {
		let kind = |code: &str| RetrieveError::new(Some(code.into()), 400, b"").kind();

		assert_eq!(kind("invalid_request"), RetrieveErrorKind::InvalidRequest);
		assert_eq!(kind("INVALID_CLIENT"), RetrieveErrorKind::InvalidClient);
		assert_eq!(kind("unauthorized_client"), RetrieveErrorKind::InvalidClient);
		assert_eq!(kind("unsupported_grant_type"), RetrieveErrorKind::InvalidGrant);
		assert_eq!(kind("temporarily_unavailable"), RetrieveErrorKind::Unavailable);
		assert_eq!(kind("slow_down"), RetrieveErrorKind::Other);
	}

	#[test]
	fn retrieve_error_body_is_capped() {
		let body = "x".repeat(RetrieveError::BODY_PREVIEW_LIMIT + 10);
		let err = RetrieveError::new(None, 502, body.as_bytes());

		assert_eq!(err.body.chars().count(), RetrieveError::BODY_PREVIEW_LIMIT + 1);
		assert!(err.body.ends_with('…'));
	}

	#[test]
	fn errors_clone_with_sources() {
		let io = std::io::Error::other("socket closed");
		let err: Error = TransportError::from(io).into();
		let cloned = err.clone();
		let source = StdError::source(&cloned).expect("Transport error should expose its source.");

		assert_eq!(source.to_string(), "socket closed");
		assert_eq!(err.to_string(), cloned.to_string());
	}

	#[test]
	fn collision_error_names_parameter() {
		let err: Error = ConfigError::ParameterCollision { parameter: "scope".into() }.into();

		assert!(err.to_string().contains("`scope`"));
		assert!(err.as_retrieve().is_none());
	}
}
