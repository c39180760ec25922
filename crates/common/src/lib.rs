//! Shared types for the movie catalog client workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
