//! Token request parameter assembly.

// crates.io
use url::form_urlencoded;
// self
use crate::{_prelude::*, config::Config, error::ConfigError};

/// Form parameters sent to the token endpoint.
///
/// Keys are kept in lexicographic order and each key's values in insertion order, so the encoded
/// body is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenParams(BTreeMap<String, Vec<String>>);
impl TokenParams {
	/// Grant type issued by [`TokenParams::client_credentials`].
	pub const GRANT_TYPE: &'static str = "client_credentials";

	/// Builds the parameter set for a client credentials request.
	///
	/// `grant_type` starts as `client_credentials`, and `scope` holds the configured scopes joined
	/// by a single space when any are set. Endpoint parameters are merged afterwards: a key that
	/// already exists fails with [`ConfigError::ParameterCollision`], except `grant_type`, which
	/// may be overridden for servers that expect a custom value.
	pub fn client_credentials(config: &Config) -> Result<Self, ConfigError> {
		let mut params = Self::default();

		params.set("grant_type", Self::GRANT_TYPE);

		if !config.scopes.is_empty() {
			params.set("scope", config.scopes.join(" "));
		}

		for (key, values) in config.endpoint_params.iter() {
			if key != "grant_type" && params.0.contains_key(key) {
				return Err(ConfigError::ParameterCollision { parameter: key.to_owned() });
			}

			params.0.insert(key.to_owned(), values.to_vec());
		}

		Ok(params)
	}

	/// Replaces every value under `key` with a single `value`.
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.0.insert(key.into(), vec![value.into()]);
	}

	/// Returns the values stored under `key`.
	pub fn get(&self, key: &str) -> Option<&[String]> {
		self.0.get(key).map(Vec::as_slice)
	}

	/// Returns the first value stored under `key`.
	pub fn first(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(|values| values.first()).map(String::as_str)
	}

	/// Iterates over keys and their value lists in key order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.0.iter().map(|(key, values)| (key.as_str(), values.as_slice()))
	}

	/// Encodes the parameters as an `application/x-www-form-urlencoded` body.
	pub fn encode(&self) -> String {
		let mut serializer = form_urlencoded::Serializer::new(String::new());

		for (key, values) in &self.0 {
			for value in values {
				serializer.append_pair(key, value);
			}
		}

		serializer.finish()
	}
}
