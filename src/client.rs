//! HTTP client that authorizes every request with a token from a [`TokenSource`].

// self
use crate::{
	_prelude::*,
	config::Config,
	error::{ConfigError, TransportError},
	ext::{AuthorizationSigner, RequestSignerExt},
	flows::{ClientCredentialsSource, ReuseTokenSource, TokenSource},
	http::ReqwestHttpClient,
	oauth::{ReqwestRetriever, ReqwestTransportErrorMapper},
};

/// Cached client credentials source used by [`Config::client`].
pub type ReqwestTokenSource =
	ReuseTokenSource<ClientCredentialsSource<ReqwestHttpClient, ReqwestTransportErrorMapper>>;

impl Config {
	/// Returns an HTTP client that attaches a valid token to every outgoing request.
	///
	/// Requests reuse the retriever's reqwest client; tokens come from a cached source built by
	/// [`Config::token_source`].
	pub fn client(&self, retriever: ReqwestRetriever) -> AuthorizedClient<ReqwestTokenSource> {
		let http = retriever.http_client.0.clone();

		AuthorizedClient::new(http, self.token_source(retriever))
	}
}

/// reqwest wrapper that signs each request with the current token.
#[derive(Debug)]
pub struct AuthorizedClient<S> {
	http: ReqwestClient,
	source: Arc<S>,
}
impl<S> AuthorizedClient<S>
where
	S: TokenSource,
{
	/// Pairs a reqwest client with a token source.
	pub fn new(http: ReqwestClient, source: S) -> Self {
		Self::with_shared_source(http, Arc::new(source))
	}

	/// Pairs a reqwest client with a token source that is also used elsewhere.
	pub fn with_shared_source(http: ReqwestClient, source: Arc<S>) -> Self {
		Self { http, source }
	}

	/// Token source backing this client.
	pub fn token_source(&self) -> &Arc<S> {
		&self.source
	}

	/// Underlying reqwest client, for building requests.
	pub fn http(&self) -> &ReqwestClient {
		&self.http
	}

	/// Starts a request builder on the underlying client.
	pub fn request(
		&self,
		method: reqwest::Method,
		url: impl reqwest::IntoUrl,
	) -> reqwest::RequestBuilder {
		self.http.request(method, url)
	}

	/// Signs and executes `request`.
	///
	/// A token is obtained first; a failure there is returned without sending anything.
	pub async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response> {
		let token = self.source.token().await?;
		let request = AuthorizationSigner.attach_token(request, &token)?;
		let response = self.http.execute(request).await.map_err(TransportError::from)?;

		Ok(response)
	}

	/// Builds, signs, and executes the request described by `builder`.
	pub async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
		let request = builder.build().map_err(ConfigError::from)?;

		self.execute(request).await
	}
}
impl<S> Clone for AuthorizedClient<S> {
	fn clone(&self) -> Self {
		Self { http: self.http.clone(), source: self.source.clone() }
	}
}
