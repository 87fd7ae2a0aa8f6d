//! Client credential transmission styles and the per-endpoint auto-detection cache.

// self
use crate::_prelude::*;

/// How the client identifier and secret reach the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStyle {
	/// Let the retriever probe the endpoint: try [`AuthStyle::InHeader`] first and fall back to
	/// [`AuthStyle::InParams`] when the server rejects it.
	#[default]
	AutoDetect,
	/// HTTP Basic `Authorization` header (`client_secret_basic`).
	InHeader,
	/// `client_id`/`client_secret` form body parameters (`client_secret_post`).
	InParams,
}
impl AuthStyle {
	/// Returns a stable label suitable for span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthStyle::AutoDetect => "auto_detect",
			AuthStyle::InHeader => "in_header",
			AuthStyle::InParams => "in_params",
		}
	}
}
impl Display for AuthStyle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Remembers which concrete [`AuthStyle`] each token endpoint accepted during auto-detection.
///
/// The cache lives inside a retriever instead of process-global state, so independent
/// retrievers never observe each other's probes.
#[derive(Debug, Default)]
pub struct AuthStyleCache(RwLock<HashMap<String, AuthStyle>>);
impl AuthStyleCache {
	/// Returns the remembered style for `token_url`, if a probe already succeeded.
	pub fn lookup(&self, token_url: &str) -> Option<AuthStyle> {
		self.0.read().get(token_url).copied()
	}

	/// Records the style that worked for `token_url`. [`AuthStyle::AutoDetect`] is ignored.
	pub fn remember(&self, token_url: &str, style: AuthStyle) {
		if matches!(style, AuthStyle::AutoDetect) {
			return;
		}

		self.0.write().insert(token_url.to_owned(), style);
	}
}
