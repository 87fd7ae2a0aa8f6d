//! Canonical token representation handed to callers.

// self
use crate::{_prelude::*, auth::Secret};

/// Access token issued by the token endpoint.
///
/// Tokens are immutable: a refresh always produces a brand-new instance. Every field of the
/// server response, including non-standard ones such as `id_token`, stays reachable through
/// [`Token::extra`].
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
	/// Access token secret; callers must avoid logging it.
	pub access_token: Secret,
	/// Token type exactly as the server returned it (for example `bearer`).
	pub token_type: String,
	/// Refresh token, when the server issued one. Client credentials servers normally do not.
	pub refresh_token: Option<Secret>,
	/// Absolute expiry instant; `None` means the server did not bound the lifetime.
	pub expiry: Option<OffsetDateTime>,
	/// Raw response fields keyed by name.
	pub extra: JsonMap<String, JsonValue>,
}
impl Token {
	/// Creates a token without expiry or extra fields.
	pub fn new(access_token: impl Into<String>, token_type: impl Into<String>) -> Self {
		Self {
			access_token: Secret::new(access_token),
			token_type: token_type.into(),
			refresh_token: None,
			expiry: None,
			extra: JsonMap::new(),
		}
	}

	/// Sets the absolute expiry instant.
	pub fn with_expiry(mut self, expiry: OffsetDateTime) -> Self {
		self.expiry = Some(expiry);

		self
	}

	/// Sets the refresh token.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
		self.refresh_token = Some(Secret::new(refresh_token));

		self
	}

	/// Replaces the raw response fields.
	pub fn with_extra(mut self, extra: JsonMap<String, JsonValue>) -> Self {
		self.extra = extra;

		self
	}

	/// Looks up a raw response field by name.
	pub fn extra(&self, key: &str) -> Option<&JsonValue> {
		self.extra.get(key)
	}

	/// Authorization scheme used when presenting the token.
	///
	/// An empty token type means `Bearer`; `bearer`, `mac`, and `basic` are canonicalized
	/// case-insensitively, anything else is returned unchanged.
	pub fn authorization_scheme(&self) -> &str {
		let raw = self.token_type.as_str();

		if raw.is_empty() || raw.eq_ignore_ascii_case("bearer") {
			"Bearer"
		} else if raw.eq_ignore_ascii_case("mac") {
			"MAC"
		} else if raw.eq_ignore_ascii_case("basic") {
			"Basic"
		} else {
			raw
		}
	}

	/// Value for an `Authorization` header carrying this token.
	pub fn authorization_header(&self) -> String {
		format!("{} {}", self.authorization_scheme(), self.access_token.expose())
	}

	/// Returns `true` when the expiry has passed at `instant`, treating the token as expiring
	/// `skew` earlier than advertised.
	pub fn is_expired_at(&self, instant: OffsetDateTime, skew: Duration) -> bool {
		match self.expiry {
			Some(expiry) => instant >= expiry - skew,
			None => false,
		}
	}

	/// Returns `true` if the token carries an access token and has not expired at `instant`.
	pub fn is_valid_at(&self, instant: OffsetDateTime, skew: Duration) -> bool {
		!self.access_token.is_empty() && !self.is_expired_at(instant, skew)
	}

	/// Convenience helper that checks validity against the current UTC clock without skew.
	pub fn is_valid(&self) -> bool {
		self.is_valid_at(OffsetDateTime::now_utc(), Duration::ZERO)
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expiry", &self.expiry)
			.field("extra_keys", &self.extra.keys().collect::<Vec<_>>())
			.finish()
	}
}
