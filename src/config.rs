//! Client credentials configuration.
//!
//! [`Config`] is a plain value object: constructing it performs no validation and no I/O.
//! The token URL is parsed and the endpoint parameters are checked for collisions only when a
//! token request is assembled, so a bad configuration surfaces as [`crate::error::ConfigError`]
//! on the first token call instead of at construction time.

// self
use crate::{
	_prelude::*,
	auth::{AuthStyle, Secret},
	error::ConfigError,
};

/// Describes a two-legged OAuth 2.0 flow: who the client is and where its token endpoint lives.
///
/// The entry points [`Config::token`], [`Config::token_source`], and `Config::client` live in
/// [`crate::flows`] and [`crate::client`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret.
	pub client_secret: Secret,
	/// Absolute URL of the authorization server's token endpoint.
	pub token_url: String,
	/// Requested scopes, joined with a single space in the `scope` parameter.
	#[serde(default)]
	pub scopes: Vec<String>,
	/// Additional token endpoint parameters.
	#[serde(default)]
	pub endpoint_params: EndpointParams,
	/// How the client credentials are transmitted.
	#[serde(default)]
	pub auth_style: AuthStyle,
}
impl Config {
	/// Creates a configuration with no scopes, no extra parameters, and auto-detected auth style.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<Secret>,
		token_url: impl Into<String>,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			token_url: token_url.into(),
			scopes: Vec::new(),
			endpoint_params: EndpointParams::default(),
			auth_style: AuthStyle::default(),
		}
	}

	/// Replaces the requested scopes.
	pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Appends a single requested scope.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scopes.push(scope.into());

		self
	}

	/// Appends one value to an extra endpoint parameter.
	pub fn with_endpoint_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.endpoint_params.append(key, value);

		self
	}

	/// Replaces the extra endpoint parameters.
	pub fn with_endpoint_params(mut self, params: EndpointParams) -> Self {
		self.endpoint_params = params;

		self
	}

	/// Overrides the credential transmission style.
	pub fn with_auth_style(mut self, style: AuthStyle) -> Self {
		self.auth_style = style;

		self
	}

	/// Parses [`Config::token_url`].
	pub fn parsed_token_url(&self) -> Result<Url, ConfigError> {
		Url::parse(&self.token_url).map_err(|source| ConfigError::InvalidTokenUrl { source })
	}
}

/// Extra token endpoint parameters: each key maps to an ordered list of values.
///
/// Keys are unique by construction; adding to an existing key appends to its value list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointParams(BTreeMap<String, Vec<String>>);
impl EndpointParams {
	/// Appends `value` to the list stored under `key`.
	pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.0.entry(key.into()).or_default().push(value.into());
	}

	/// Replaces every value stored under `key`.
	pub fn set<I, S>(&mut self, key: impl Into<String>, values: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.0.insert(key.into(), values.into_iter().map(Into::into).collect());
	}

	/// Returns the values stored under `key`.
	pub fn get(&self, key: &str) -> Option<&[String]> {
		self.0.get(key).map(Vec::as_slice)
	}

	/// Iterates over keys and their value lists.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.0.iter().map(|(key, values)| (key.as_str(), values.as_slice()))
	}

	/// Number of distinct keys.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no parameters are configured.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl<K, V> FromIterator<(K, V)> for EndpointParams
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		let mut params = Self::default();

		for (key, value) in iter {
			params.append(key, value);
		}

		params
	}
}
