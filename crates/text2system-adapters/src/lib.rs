//! HTTP adapters for text2system.
//!
//! - [`HfInferenceClient`] and its pipeline handles implement the model
//!   traits of `text2system-nlp` over the Hugging Face Inference API.
//! - [`HfPipelineFactory`] plugs those handles into the engine's registry.
//! - [`WitClient`] implements the conversational [`NluService`] over Wit.ai.
//!
//! [`NluService`]: text2system_nlp::NluService

pub mod error;
pub mod factory;
pub mod huggingface;
pub mod wit;

pub use error::{AdapterError, Result};
pub use factory::HfPipelineFactory;
pub use huggingface::{
    HfEmbedder, HfInferenceClient, HfQuestionAnswerer, HfSentiment, HfTagger, HfZeroShot,
};
pub use wit::WitClient;
