//! Token sources: the uncached client credentials exchange and the single-flight cache over it.
//!
//! Every source implements [`TokenSource`]. [`crate::config::Config::token`] performs one
//! uncached exchange, while [`crate::config::Config::token_source`] wraps a
//! [`ClientCredentialsSource`] in a [`ReuseTokenSource`] so concurrent callers share one
//! retrieval per cache miss.

pub mod params;
pub mod reuse;

mod client_credentials;

pub use client_credentials::*;
pub use params::*;
pub use reuse::*;

// self
use crate::{_prelude::*, auth::Token};

/// Boxed future returned by [`TokenSource::token`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<Token>> + 'a + Send>>;

/// Anything that can hand out an access token on demand.
pub trait TokenSource
where
	Self: Send + Sync,
{
	/// Returns a token, retrieving a new one when the source decides it must.
	fn token(&self) -> TokenFuture<'_>;
}
impl<S> TokenSource for Arc<S>
where
	S: ?Sized + TokenSource,
{
	fn token(&self) -> TokenFuture<'_> {
		(**self).token()
	}
}
