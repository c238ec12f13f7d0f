//! [`PipelineFactory`] backed by the Hugging Face Inference API.

use std::sync::Arc;

use tracing::info;

use text2system_nlp::{
    EngineConfig, ModelSection, Pipeline, PipelineFactory, PipelineKind, PipelineOptions,
};

use crate::huggingface::HfInferenceClient;

/// Builds every pipeline kind as a handle on one shared [`HfInferenceClient`].
#[derive(Debug, Clone)]
pub struct HfPipelineFactory {
    client: HfInferenceClient,
    models: ModelSection,
}

impl HfPipelineFactory {
    pub fn new(client: HfInferenceClient, models: ModelSection) -> Self {
        Self { client, models }
    }

    /// Client and default models from the `[engine]` and `[models]` sections.
    pub fn from_config(config: &EngineConfig) -> crate::Result<Self> {
        let client = HfInferenceClient::new(
            &config.engine.hf_base_url,
            config.engine.hf_api_token.clone(),
        )?;
        Ok(Self::new(client, config.models.clone()))
    }

    pub fn client(&self) -> &HfInferenceClient {
        &self.client
    }
}

impl PipelineFactory for HfPipelineFactory {
    fn create(
        &self,
        kind: PipelineKind,
        options: &PipelineOptions,
    ) -> text2system_nlp::Result<Pipeline> {
        let model = options
            .model
            .clone()
            .unwrap_or_else(|| self.models.for_kind(kind).to_string());
        info!(pipeline = %kind, model = %model, "creating inference pipeline");

        Ok(match kind {
            PipelineKind::TokenClassification => Pipeline::Tagger(Arc::new(self.client.tagger(model))),
            PipelineKind::ZeroShotClassification => {
                Pipeline::ZeroShot(Arc::new(self.client.zero_shot(model)))
            }
            PipelineKind::QuestionAnswering => {
                Pipeline::QuestionAnswering(Arc::new(self.client.question_answerer(model)))
            }
            PipelineKind::SentimentAnalysis => {
                Pipeline::Sentiment(Arc::new(self.client.sentiment(model)))
            }
            PipelineKind::TextSimilarity => Pipeline::Embedding(Arc::new(self.client.embedder(model))),
        })
    }
}
