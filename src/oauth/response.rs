//! Token endpoint response parsing.

// crates.io
use serde::de::Error as _;
use url::form_urlencoded;
// self
use super::RetrieveFailure;
use crate::{
	_prelude::*,
	http::{HttpResponse, header},
};

/// Responses larger than this are truncated before parsing.
pub(crate) const MAX_RESPONSE_BYTES: usize = 1 << 20;

/// Successful token response before it is normalized into a [`crate::auth::Token`].
#[derive(Clone, Debug)]
pub(crate) struct RawToken {
	pub(crate) access_token: String,
	pub(crate) token_type: String,
	pub(crate) refresh_token: Option<String>,
	pub(crate) expiry: Option<OffsetDateTime>,
	pub(crate) raw: RawFields,
}

/// Every field of the response body, in the encoding the server used.
#[derive(Clone, Debug)]
pub(crate) enum RawFields {
	Json(JsonMap<String, JsonValue>),
	Form(BTreeMap<String, Vec<String>>),
}

/// Token endpoint rejection before it is mapped into [`crate::error::RetrieveError`].
#[derive(Clone, Debug)]
pub(crate) struct Rejection {
	pub(crate) status: u16,
	pub(crate) body: Vec<u8>,
	pub(crate) code: Option<String>,
	pub(crate) description: Option<String>,
	pub(crate) uri: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenFields {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	token_type: Option<String>,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default, deserialize_with = "deserialize_expires_in")]
	expires_in: Option<i64>,
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	error_description: Option<String>,
	#[serde(default)]
	error_uri: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
	Number(serde_json::Number),
	Text(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BodyFormat {
	Json,
	Form,
}

/// Interprets a token endpoint response received at `now`.
pub(crate) fn parse_token_response<E>(
	response: HttpResponse,
	now: OffsetDateTime,
) -> Result<RawToken, RetrieveFailure<E>> {
	let status = response.status();
	let format = body_format(&response);
	let body = response.body();
	let body = &body[..body.len().min(MAX_RESPONSE_BYTES)];

	if !status.is_success() {
		return Err(RetrieveFailure::Rejected(rejection(status.as_u16(), body, format)));
	}

	let status = status.as_u16();

	match format {
		BodyFormat::Form => parse_form(status, body, now),
		BodyFormat::Json => parse_json(status, body, now),
	}
}

fn parse_form<E>(
	status: u16,
	body: &[u8],
	now: OffsetDateTime,
) -> Result<RawToken, RetrieveFailure<E>> {
	let fields = form_fields(body);
	let first = |key: &str| {
		fields.get(key).and_then(|values| values.first()).filter(|value| !value.is_empty()).cloned()
	};

	if let Some(code) = first("error") {
		return Err(RetrieveFailure::Rejected(Rejection {
			status,
			body: body.to_vec(),
			code: Some(code),
			description: first("error_description"),
			uri: first("error_uri"),
		}));
	}

	let Some(access_token) = first("access_token") else {
		return Err(RetrieveFailure::MissingAccessToken { status });
	};
	// Unparseable lifetimes in form bodies are ignored rather than rejected.
	let expires_in = first("expires_in").and_then(|value| value.trim().parse::<i64>().ok());

	Ok(RawToken {
		access_token,
		token_type: first("token_type").unwrap_or_default(),
		refresh_token: first("refresh_token"),
		expiry: expiry_from(now, expires_in),
		raw: RawFields::Form(fields),
	})
}

fn parse_json<E>(
	status: u16,
	body: &[u8],
	now: OffsetDateTime,
) -> Result<RawToken, RetrieveFailure<E>> {
	let parse_failure = |source| RetrieveFailure::<E>::Parse { source, status };
	let mut de = serde_json::Deserializer::from_slice(body);
	let raw: JsonMap<String, JsonValue> =
		serde_path_to_error::deserialize(&mut de).map_err(parse_failure)?;
	let fields: TokenFields = serde_path_to_error::deserialize(JsonValue::Object(raw.clone()))
		.map_err(parse_failure)?;

	if let Some(code) = fields.error.filter(|code| !code.is_empty()) {
		return Err(RetrieveFailure::Rejected(Rejection {
			status,
			body: body.to_vec(),
			code: Some(code),
			description: fields.error_description,
			uri: fields.error_uri,
		}));
	}

	let Some(access_token) = fields.access_token.filter(|token| !token.is_empty()) else {
		return Err(RetrieveFailure::MissingAccessToken { status });
	};

	Ok(RawToken {
		access_token,
		token_type: fields.token_type.unwrap_or_default(),
		refresh_token: fields.refresh_token.filter(|token| !token.is_empty()),
		expiry: expiry_from(now, fields.expires_in),
		raw: RawFields::Json(raw),
	})
}

/// Best-effort extraction of the OAuth error fields from a non-2xx body.
fn rejection(status: u16, body: &[u8], format: BodyFormat) -> Rejection {
	let mut rejection =
		Rejection { status, body: body.to_vec(), code: None, description: None, uri: None };

	match format {
		BodyFormat::Form => {
			let fields = form_fields(body);
			let first = |key: &str| fields.get(key).and_then(|values| values.first()).cloned();

			rejection.code = first("error");
			rejection.description = first("error_description");
			rejection.uri = first("error_uri");
		},
		BodyFormat::Json =>
			if let Ok(JsonValue::Object(map)) = serde_json::from_slice::<JsonValue>(body) {
				let text = |key: &str| map.get(key).and_then(JsonValue::as_str).map(str::to_owned);

				rejection.code = text("error");
				rejection.description = text("error_description");
				rejection.uri = text("error_uri");
			},
	}

	rejection
}

fn body_format(response: &HttpResponse) -> BodyFormat {
	let media_type = response
		.headers()
		.get(header::CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.split(';').next())
		.map(|value| value.trim().to_ascii_lowercase());

	match media_type.as_deref() {
		Some("application/x-www-form-urlencoded" | "text/plain") => BodyFormat::Form,
		_ => BodyFormat::Json,
	}
}

fn form_fields(body: &[u8]) -> BTreeMap<String, Vec<String>> {
	let mut fields = BTreeMap::<String, Vec<String>>::new();

	for (key, value) in form_urlencoded::parse(body) {
		fields.entry(key.into_owned()).or_default().push(value.into_owned());
	}

	fields
}

/// Lifetimes are capped at `i32::MAX` seconds; non-positive values leave the expiry unset.
fn expiry_from(now: OffsetDateTime, expires_in: Option<i64>) -> Option<OffsetDateTime> {
	let seconds = expires_in?.min(i64::from(i32::MAX));

	if seconds <= 0 {
		return None;
	}

	now.checked_add(Duration::seconds(seconds))
}

fn deserialize_expires_in<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	let Some(value) = Option::<ExpiresIn>::deserialize(deserializer)? else {
		return Ok(None);
	};
	let seconds = match value {
		ExpiresIn::Number(number) => number
			.as_i64()
			.or_else(|| number.as_u64().map(|_| i64::MAX))
			.ok_or_else(|| D::Error::custom(format!("expires_in `{number}` is not an integer")))?,
		ExpiresIn::Text(text) => text
			.trim()
			.parse::<i64>()
			.map_err(|_| D::Error::custom(format!("expires_in `{text}` is not an integer")))?,
	};

	Ok(Some(seconds))
}
