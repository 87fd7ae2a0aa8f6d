//! Token retriever: performs the network exchange with the token endpoint.
//!
//! [`TokenRetriever`] owns the HTTP transport, the transport error mapper, and the auth-style
//! cache used by [`AuthStyle::AutoDetect`]. It is the execution context callers pass to the
//! [`Config`](crate::config::Config) entry points, so the HTTP client is always explicit and
//! the reqwest default is only created where [`TokenRetriever::new`] is called.
//!
//! The retriever speaks in collaborator-shaped results ([`RetrieveFailure`]); the `mapping`
//! submodule turns them into the crate's public [`Token`](crate::auth::Token) and
//! [`Error`] types.

mod mapping;
mod request;
mod response;

pub(crate) use mapping::*;
use response::RawToken;

// self
use crate::{
	_prelude::*,
	auth::{AuthStyle, AuthStyleCache, Secret},
	error::{ConfigError, TransportError},
	flows::TokenParams,
	http::TokenHttpClient,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Retriever specialized for the crate's default reqwest transport stack.
#[cfg(feature = "reqwest")]
pub type ReqwestRetriever = TokenRetriever<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Maps transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an error emitted by the transport into a crate error.
	fn map_transport_error(&self, error: E) -> Error;
}

/// Default mapper for reqwest-backed transports.
///
/// Builder failures (the request never left the process) become [`ConfigError`]; everything
/// else is a [`TransportError::Network`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, error: ReqwestError) -> Error {
		if error.is_builder() {
			return ConfigError::from(error).into();
		}

		TransportError::from(error).into()
	}
}

/// Mapper that reports every transport failure as [`TransportError::Network`].
#[derive(Clone, Debug, Default)]
pub struct NetworkErrorMapper;
impl<E> TransportErrorMapper<E> for NetworkErrorMapper
where
	E: 'static + Send + Sync + StdError,
{
	fn map_transport_error(&self, error: E) -> Error {
		TransportError::network(error).into()
	}
}

/// Failure reported by [`TokenRetriever`] before it is mapped into the public taxonomy.
#[derive(Debug)]
pub(crate) enum RetrieveFailure<E> {
	/// The endpoint answered and rejected the request.
	Rejected(response::Rejection),
	/// The transport failed.
	Transport(E),
	/// The HTTP request could not be assembled.
	Request(oauth2::http::Error),
	/// The response body was not valid JSON of the expected shape.
	Parse { source: serde_path_to_error::Error<serde_json::Error>, status: u16 },
	/// The response was successful but carried no access token.
	MissingAccessToken { status: u16 },
}

/// Performs token endpoint exchanges through a pluggable [`TokenHttpClient`].
pub struct TokenRetriever<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound token request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	auth_styles: Arc<AuthStyleCache>,
}
impl<C, M> TokenRetriever<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a retriever that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(http_client: impl Into<Arc<C>>, mapper: impl Into<Arc<M>>) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			auth_styles: Default::default(),
		}
	}

	/// Styles learned by [`AuthStyle::AutoDetect`] probes, keyed by token URL.
	pub fn auth_styles(&self) -> &AuthStyleCache {
		&self.auth_styles
	}

	/// Exchanges `params` at `token_url`, transmitting credentials according to `style`.
	///
	/// With [`AuthStyle::AutoDetect`] and no remembered style for the URL, the request is first
	/// sent with Basic credentials and, if the endpoint rejects it, sent once more with body
	/// credentials. Transport failures never trigger the second attempt. The style that
	/// succeeded is remembered for later calls.
	pub(crate) async fn retrieve(
		&self,
		client_id: &str,
		client_secret: &Secret,
		token_url: &Url,
		params: &TokenParams,
		style: AuthStyle,
	) -> Result<RawToken, RetrieveFailure<C::TransportError>> {
		let (style, probe) = match style {
			AuthStyle::AutoDetect => match self.auth_styles.lookup(token_url.as_str()) {
				Some(known) => (known, false),
				None => (AuthStyle::InHeader, true),
			},
			concrete => (concrete, false),
		};
		let mut used = style;
		let mut result = self.round_trip(client_id, client_secret, token_url, params, used).await;

		if probe && matches!(result, Err(RetrieveFailure::Rejected(_))) {
			used = AuthStyle::InParams;
			result = self.round_trip(client_id, client_secret, token_url, params, used).await;
		}
		if probe && result.is_ok() {
			self.auth_styles.remember(token_url.as_str(), used);
		}

		result
	}

	async fn round_trip(
		&self,
		client_id: &str,
		client_secret: &Secret,
		token_url: &Url,
		params: &TokenParams,
		style: AuthStyle,
	) -> Result<RawToken, RetrieveFailure<C::TransportError>> {
		let request = request::token_request(client_id, client_secret, token_url, params, style)
			.map_err(RetrieveFailure::Request)?;
		let response =
			self.http_client.execute(request).await.map_err(RetrieveFailure::Transport)?;

		response::parse_token_response(response, OffsetDateTime::now_utc())
	}
}
#[cfg(feature = "reqwest")]
impl TokenRetriever<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a retriever backed by a fresh reqwest client that never follows redirects.
	pub fn new() -> Result<Self> {
		Ok(Self::with_http_client(ReqwestHttpClient::new()?, ReqwestTransportErrorMapper))
	}
}
impl<C, M> Clone for TokenRetriever<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			auth_styles: self.auth_styles.clone(),
		}
	}
}
impl<C, M> Debug for TokenRetriever<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRetriever").field("auth_styles", &self.auth_styles).finish()
	}
}
