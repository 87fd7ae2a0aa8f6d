//! Request signing contracts that attach issued tokens to arbitrary HTTP clients.

// self
use crate::{
	auth::Token,
	error::ConfigError,
	http::{HeaderValue, header},
};

/// Describes how to attach a [`Token`] to an outbound request without constraining the HTTP
/// client type.
pub trait RequestSignerExt<Request, Error>
where
	Self: Send + Sync,
{
	/// Consumes the provided request and injects authorization state derived from `token`.
	fn attach_token(&self, request: Request, token: &Token) -> Result<Request, Error>;
}

/// Signer that sets `Authorization: <scheme> <access token>`, replacing any existing value.
#[derive(Clone, Copy, Debug, Default)]
pub struct AuthorizationSigner;
impl<B> RequestSignerExt<oauth2::http::Request<B>, ConfigError> for AuthorizationSigner {
	fn attach_token(
		&self,
		mut request: oauth2::http::Request<B>,
		token: &Token,
	) -> Result<oauth2::http::Request<B>, ConfigError> {
		request.headers_mut().insert(header::AUTHORIZATION, authorization_value(token)?);

		Ok(request)
	}
}
#[cfg(feature = "reqwest")]
impl RequestSignerExt<reqwest::Request, ConfigError> for AuthorizationSigner {
	fn attach_token(
		&self,
		mut request: reqwest::Request,
		token: &Token,
	) -> Result<reqwest::Request, ConfigError> {
		request.headers_mut().insert(header::AUTHORIZATION, authorization_value(token)?);

		Ok(request)
	}
}

/// Builds the `Authorization` header value for `token`, marked sensitive so it is never logged.
pub fn authorization_value(token: &Token) -> Result<HeaderValue, ConfigError> {
	let mut value = HeaderValue::from_str(&token.authorization_header())
		.map_err(|_| ConfigError::InvalidAuthorizationHeader)?;

	value.set_sensitive(true);

	Ok(value)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn signer_replaces_authorization_header() {
		let request = oauth2::http::Request::builder()
			.uri("https://api.example.com/items")
			.header(header::AUTHORIZATION, "Basic stale")
			.body(())
			.expect("Request fixture should build.");
		let signed = AuthorizationSigner
			.attach_token(request, &Token::new("abc", "bearer"))
			.expect("Valid token should sign the request.");
		let values = signed.headers().get_all(header::AUTHORIZATION).iter().collect::<Vec<_>>();

		assert_eq!(values.len(), 1);
		assert_eq!(values[0], "Bearer abc");
		assert!(values[0].is_sensitive());
	}

	#[test]
	fn control_characters_are_rejected() {
		let request = oauth2::http::Request::new(());
		let err = AuthorizationSigner
			.attach_token(request, &Token::new("abc\ndef", "Bearer"))
			.expect_err("Newlines cannot be sent in a header.");

		assert!(matches!(err, ConfigError::InvalidAuthorizationHeader));
	}
}
