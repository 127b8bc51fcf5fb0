use async_trait::async_trait;

use crate::error::Result;

/// A language model that turns a prompt into text. May be slow and may fail.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
    fn model_name(&self) -> &str;
}
