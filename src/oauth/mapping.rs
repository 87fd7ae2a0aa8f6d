//! Conversion from retriever results into the public token and error types.

// self
use super::{
	RetrieveFailure, TransportErrorMapper,
	response::{RawFields, RawToken, Rejection},
};
use crate::{
	_prelude::*,
	auth::{Secret, Token},
	error::{ConfigError, RetrieveError, TransportError},
};

/// Converts a successful raw response into a [`Token`].
///
/// Every response field is kept in [`Token::extra`]. Form-encoded fields with a single value
/// become JSON strings; repeated fields become arrays of strings.
pub(crate) fn normalize_token(raw: RawToken) -> Token {
	let extra = match raw.raw {
		RawFields::Json(map) => map,
		RawFields::Form(fields) => fields
			.into_iter()
			.map(|(key, mut values)| {
				let value = if values.len() == 1 {
					JsonValue::String(values.remove(0))
				} else {
					JsonValue::Array(values.into_iter().map(JsonValue::String).collect())
				};

				(key, value)
			})
			.collect(),
	};

	Token {
		access_token: Secret::new(raw.access_token),
		token_type: raw.token_type,
		refresh_token: raw.refresh_token.map(Secret::new),
		expiry: raw.expiry,
		extra,
	}
}

/// Maps a retriever failure into the crate's error taxonomy.
pub(crate) fn map_retrieve_failure<E, M>(failure: RetrieveFailure<E>, mapper: &M) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	match failure {
		RetrieveFailure::Rejected(rejection) => map_rejection(rejection).into(),
		RetrieveFailure::Transport(error) => mapper.map_transport_error(error),
		RetrieveFailure::Request(error) => ConfigError::from(error).into(),
		RetrieveFailure::Parse { source, status } =>
			TransportError::TokenResponseParse { source: Arc::new(source), status }.into(),
		RetrieveFailure::MissingAccessToken { status } =>
			TransportError::MissingAccessToken { status }.into(),
	}
}

fn map_rejection(rejection: Rejection) -> RetrieveError {
	RetrieveError::new(rejection.code, rejection.status, &rejection.body)
		.with_description(rejection.description)
		.with_uri(rejection.uri)
}

#[cfg(test)]
mod tests {
	// std
	use std::io;
	// self
	use super::*;
	use crate::{error::RetrieveErrorKind, oauth::NetworkErrorMapper};

	fn raw(fields: RawFields) -> RawToken {
		RawToken {
			access_token: "abc".into(),
			token_type: "bearer".into(),
			refresh_token: None,
			expiry: None,
			raw: fields,
		}
	}

	#[test]
	fn form_fields_become_strings_or_arrays() {
		let mut fields = BTreeMap::new();

		fields.insert("access_token".to_owned(), vec!["abc".to_owned()]);
		fields.insert("aud".to_owned(), vec!["a".to_owned(), "b".to_owned()]);

		let token = normalize_token(raw(RawFields::Form(fields)));

		assert_eq!(token.access_token.expose(), "abc");
		assert_eq!(token.extra("access_token"), Some(&JsonValue::String("abc".into())));
		assert_eq!(
			token.extra("aud"),
			Some(&JsonValue::Array(vec![JsonValue::String("a".into()), JsonValue::String("b".into())]))
		);
	}

	#[test]
	fn json_fields_are_kept_verbatim() {
		let mut map = JsonMap::new();

		map.insert("scope".into(), JsonValue::String("read".into()));
		map.insert("expires_in".into(), JsonValue::from(60));

		let token = normalize_token(raw(RawFields::Json(map.clone())));

		assert_eq!(token.extra, map);
		assert_eq!(token.token_type, "bearer");
	}

	#[test]
	fn rejections_map_to_retrieve_errors() {
		let failure = RetrieveFailure::<io::Error>::Rejected(Rejection {
			status: 400,
			body: br#"{"error":"invalid_grant"}"#.to_vec(),
			code: Some("invalid_grant".into()),
			description: Some("expired".into()),
			uri: None,
		});
		let err = map_retrieve_failure(failure, &NetworkErrorMapper);
		let retrieve = err.as_retrieve().expect("Rejection should map to a retrieve error.");

		assert_eq!(retrieve.status, 400);
		assert_eq!(retrieve.kind(), RetrieveErrorKind::InvalidGrant);
		assert_eq!(retrieve.description.as_deref(), Some("expired"));
		assert_eq!(retrieve.body, r#"{"error":"invalid_grant"}"#);
	}

	#[test]
	fn transport_and_body_failures_map_to_transport_errors() {
		let err = map_retrieve_failure(
			RetrieveFailure::Transport(io::Error::other("reset")),
			&NetworkErrorMapper,
		);

		assert!(matches!(err, Error::Transport(TransportError::Network { .. })));

		let err = map_retrieve_failure(
			RetrieveFailure::<io::Error>::MissingAccessToken { status: 200 },
			&NetworkErrorMapper,
		);

		assert!(matches!(err, Error::Transport(TransportError::MissingAccessToken { status: 200 })));
	}
}
