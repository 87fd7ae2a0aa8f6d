//! Auth-domain models: redacted secrets, credential transmission styles, and tokens.

pub mod secret;
pub mod style;
pub mod token;

pub use secret::*;
pub use style::*;
pub use token::*;
