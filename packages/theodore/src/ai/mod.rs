//! Reference provider implementations.
//!
//! Applications can use these directly or implement the traits themselves.

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use openai::OpenAiProvider;
