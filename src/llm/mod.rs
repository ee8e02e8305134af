//! Language model backend.

pub mod gemini;

use async_trait::async_trait;

use crate::error::GenerationError;

pub use gemini::{DEFAULT_BASE_URL, GeminiClient};

/// Text generation from a prompt.
///
/// This abstraction allows mocking the model in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send `prompt` to the model and return its raw text response.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
