//! Client Credentials flow orchestration.
//!
//! [`Config::token`] performs one uncached exchange: build the parameter set, let the retriever
//! talk to the token endpoint, then normalize the response or map the failure. Configuration
//! problems (parameter collisions, an unparsable token URL) surface before any network call.
//! [`Config::token_source`] wraps the same exchange in a [`ReuseTokenSource`].

// self
use crate::{
	_prelude::*,
	auth::Token,
	config::Config,
	flows::{ReuseTokenSource, TokenFuture, TokenParams, TokenSource},
	http::TokenHttpClient,
	oauth::{self, TokenRetriever, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl Config {
	/// Retrieves a fresh token without caching.
	pub async fn token<C, M>(&self, retriever: &TokenRetriever<C, M>) -> Result<Token>
	where
		C: ?Sized + TokenHttpClient,
		M: ?Sized + TransportErrorMapper<C::TransportError>,
	{
		fetch_token(self, retriever).await
	}

	/// Returns a caching token source that retrieves through `retriever` on every cache miss.
	///
	/// The configuration is copied into the source; later edits to `self` do not affect it.
	pub fn token_source<C, M>(
		&self,
		retriever: TokenRetriever<C, M>,
	) -> ReuseTokenSource<ClientCredentialsSource<C, M>>
	where
		C: ?Sized + TokenHttpClient,
		M: ?Sized + TransportErrorMapper<C::TransportError>,
	{
		ReuseTokenSource::new(ClientCredentialsSource::new(self.clone(), retriever))
	}
}

/// Uncached [`TokenSource`] that performs a client credentials exchange on every call.
pub struct ClientCredentialsSource<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	config: Arc<Config>,
	retriever: TokenRetriever<C, M>,
}
impl<C, M> ClientCredentialsSource<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a source for `config` backed by `retriever`.
	pub fn new(config: impl Into<Arc<Config>>, retriever: TokenRetriever<C, M>) -> Self {
		Self { config: config.into(), retriever }
	}

	/// Configuration used for every exchange.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Retriever used for every exchange.
	pub fn retriever(&self) -> &TokenRetriever<C, M> {
		&self.retriever
	}
}
impl<C, M> TokenSource for ClientCredentialsSource<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn token(&self) -> TokenFuture<'_> {
		Box::pin(fetch_token(&self.config, &self.retriever))
	}
}
impl<C, M> Debug for ClientCredentialsSource<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentialsSource")
			.field("config", &self.config)
			.field("retriever", &self.retriever)
			.finish()
	}
}

async fn fetch_token<C, M>(config: &Config, retriever: &TokenRetriever<C, M>) -> Result<Token>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	const KIND: FlowKind = FlowKind::ClientCredentials;

	let span = FlowSpan::for_endpoint(KIND, "token", &config.token_url);

	obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

	let result = span.instrument(exchange(config, retriever)).await;

	obs::record_flow_result(KIND, &result);
	span.record_outcome(if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure });

	result
}

async fn exchange<C, M>(config: &Config, retriever: &TokenRetriever<C, M>) -> Result<Token>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let params = TokenParams::client_credentials(config)?;
	let token_url = config.parsed_token_url()?;
	let raw = retriever
		.retrieve(
			&config.client_id,
			&config.client_secret,
			&token_url,
			&params,
			config.auth_style,
		)
		.await
		.map_err(|failure| oauth::map_retrieve_failure(failure, retriever.transport_mapper.as_ref()))?;

	Ok(oauth::normalize_token(raw))
}
