//! Section writers for both waves.
//!
//! A writer owns nothing mutable: it takes a copy of one section plus shared read-only
//! context, makes one model call and returns the filled copy.

use crate::error::ApiError;
use crate::provider::{enhance_model_error, ChatMessage, CompletionOptions, SharedModelClient};
use crate::story::prompts::{body_writer_messages, framing_writer_messages};
use crate::story::section::Section;
use tracing::{debug, info, instrument};

#[derive(Clone)]
pub struct SectionWriter {
    client: SharedModelClient,
    options: CompletionOptions,
}

impl SectionWriter {
    pub fn new(client: SharedModelClient, options: CompletionOptions) -> Self {
        Self { client, options }
    }

    /// Write a main-body chapter from the source notes and reference material.
    #[instrument(skip_all, fields(section = %section.name, wave = "body"))]
    pub async fn write_body_section(
        &self,
        section: Section,
        notes: &str,
        references: &str,
    ) -> Result<Section, ApiError> {
        let messages = body_writer_messages(&section, notes, references);
        let content = self.generate(&section.name, messages).await?;
        let written = section.fill(content)?;
        info!(chars = written.content.len(), "Chapter written");
        Ok(written)
    }

    /// Write a prologue/epilogue from the aggregated body context.
    #[instrument(skip_all, fields(section = %section.name, wave = "framing"))]
    pub async fn write_framing_section(
        &self,
        section: Section,
        body_context: &str,
        references: &str,
    ) -> Result<Section, ApiError> {
        let messages = framing_writer_messages(&section, body_context, references);
        let content = self.generate(&section.name, messages).await?;
        let written = section.fill(content)?;
        info!(chars = written.content.len(), "Framing section written");
        Ok(written)
    }

    async fn generate(&self, section: &str, messages: Vec<ChatMessage>) -> Result<String, ApiError> {
        debug!(messages = messages.len(), "Invoking model");
        match self.client.complete(messages, self.options.clone()).await {
            Ok(response) => Ok(response.content),
            Err(err) => {
                let err = enhance_model_error(err, self.client.as_ref()).await;
                Err(ApiError::generation(section, err))
            }
        }
    }
}
