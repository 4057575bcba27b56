//! Provider adapters for the LLM facade.

pub mod claude;
pub mod gemini;
pub mod mock;
pub mod openai;

pub use claude::ClaudeProvider;
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use openai::OpenAiCompatProvider;
