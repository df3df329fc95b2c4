pub mod client;
pub mod openai;

pub use client::{
    FinishReason, LLMClient, LLMClientBuilder, LLMError, LLMInput, LLMOutput, ToolChoice, Usage,
};
pub use openai::{GROQ_BASE_URL, OpenAIClient};
