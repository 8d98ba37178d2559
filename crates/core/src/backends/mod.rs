pub mod openai;

pub use openai::{OpenAiEmbedder, OpenAiGenerator};
