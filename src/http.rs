//! Transport primitives for token endpoint exchanges.
//!
//! [`TokenHttpClient`] is the crate's only dependency on an HTTP stack. Requests and responses
//! use the plain [`HttpRequest`]/[`HttpResponse`] types re-exported from `oauth2`, so custom
//! transports (test doubles, service meshes, bespoke SDKs) never need reqwest.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::_prelude::*;

pub use oauth2::{
	HttpRequest, HttpResponse,
	http::{HeaderValue, Method, StatusCode, header},
};

/// Boxed future returned by [`TokenHttpClient::execute`].
pub type HttpFuture<'a, E> = Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing a token endpoint request.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by many
/// retrievers and token sources, and the returned future must be `Send` so token sources can
/// box it. A transport reports every failure through its own [`TokenHttpClient::TransportError`];
/// the paired [`crate::oauth::TransportErrorMapper`] decides how that error surfaces publicly.
/// Non-2xx responses are not failures at this layer: return them as regular responses.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and resolves with the complete response.
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token endpoints answer directly instead of delegating to another URI, so following redirects
/// only widens the SSRF surface. [`ReqwestHttpClient::new`] disables redirects; configure any
/// client passed to [`ReqwestHttpClient::with_client`] the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a reqwest client that never follows redirects.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		Box::pin(send_reqwest(self.0.clone(), request))
	}
}

#[cfg(feature = "reqwest")]
async fn send_reqwest(
	client: ReqwestClient,
	request: HttpRequest,
) -> Result<HttpResponse, ReqwestError> {
	let response = client.execute(request.try_into()?).await?;
	let status = response.status();
	let headers = response.headers().to_owned();
	let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

	*response_new.status_mut() = status;
	*response_new.headers_mut() = headers;

	Ok(response_new)
}
