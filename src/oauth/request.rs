//! Token request construction.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{AuthStyle, Secret},
	flows::TokenParams,
	http::{HeaderValue, HttpRequest, Method, header},
};

const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
const CONTENT_TYPE_JSON: &str = "application/json";

/// Builds the `POST` request for `params`, attaching credentials per `style`.
///
/// [`AuthStyle::AutoDetect`] is resolved by the caller; it is treated as
/// [`AuthStyle::InHeader`] here.
pub(super) fn token_request(
	client_id: &str,
	client_secret: &Secret,
	token_url: &Url,
	params: &TokenParams,
	style: AuthStyle,
) -> Result<HttpRequest, oauth2::http::Error> {
	let mut builder = oauth2::http::Request::builder()
		.method(Method::POST)
		.uri(token_url.as_str())
		.header(header::ACCEPT, HeaderValue::from_static(CONTENT_TYPE_JSON))
		.header(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_FORM));
	let body = match style {
		AuthStyle::InParams => {
			let mut params = params.clone();

			if !client_id.is_empty() {
				params.set("client_id", client_id);
			}
			if !client_secret.is_empty() {
				params.set("client_secret", client_secret.expose());
			}

			params.encode()
		},
		AuthStyle::InHeader | AuthStyle::AutoDetect => {
			builder = builder.header(header::AUTHORIZATION, basic_credentials(client_id, client_secret));

			params.encode()
		},
	};

	builder.body(body.into_bytes())
}

/// RFC 6749 §2.3.1 asks for the id and secret to be form-encoded before Basic encoding.
fn basic_credentials(client_id: &str, client_secret: &Secret) -> String {
	let id = form_urlencoded::byte_serialize(client_id.as_bytes()).collect::<String>();
	let secret = form_urlencoded::byte_serialize(client_secret.expose().as_bytes()).collect::<String>();

	format!("Basic {}", STANDARD.encode(format!("{id}:{secret}")))
}
