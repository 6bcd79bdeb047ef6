//! Optional low-latency inference binding.

use async_trait::async_trait;

use crate::error::InferenceError;

/// Low-latency inference capability, injected when the runtime provides one.
///
/// Absence is a normal configuration, not an error: holders keep an
/// `Option<Arc<dyn LocalInference>>` and fall back to the HTTP backend when
/// it is `None` or when a call fails.
#[async_trait]
pub trait LocalInference: Send + Sync {
    /// Run one prompt against the named model and return the raw text.
    async fn run(
        &self,
        model_id: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, InferenceError>;
}
