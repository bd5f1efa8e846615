//! Note generation: prompt, one LLM call, canned fallback on any failure.

use std::time::Instant;

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use super::{
    chat_api::{ChatApiClient, ChatApiError},
    prompt::{
        NoteParams,
        builder::{PromptBuilder, system_prompt},
        theme,
    },
    response_times::ResponseTimes,
};

pub const FALLBACK_MODEL: &str = "local-fallback";

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct NoteMetadata {
    pub model: String,
    pub theme: String,
    pub mood: String,
    pub savage_mode: bool,
    pub generation_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct GeneratedNote {
    pub content: String,
    pub timestamp: String,
    pub metadata: NoteMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ServiceStatus {
    pub status: String,
    pub model: String,
    pub timestamp: String,
}

fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[derive(Debug, Clone)]
pub struct NoteGenerator {
    client: ChatApiClient,
    builder: PromptBuilder,
    response_times: ResponseTimes,
}

impl NoteGenerator {
    pub fn new(client: ChatApiClient, builder: PromptBuilder) -> Self {
        Self {
            client,
            builder,
            response_times: ResponseTimes::new(),
        }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            status: "ok".to_string(),
            model: self.model().to_string(),
            timestamp: iso_now(),
        }
    }

    /// Milliseconds the client should expect to wait for `model`
    /// (the configured model when `None`).
    pub fn estimated_time(&self, model: Option<&str>) -> u64 {
        let model = model.filter(|m| !m.is_empty()).unwrap_or(self.model());
        self.response_times.estimate(model)
    }

    /// Always yields content. LLM failures fall back to a canned template
    /// and are reported in `metadata.error`.
    pub async fn generate(&self, params: &NoteParams) -> GeneratedNote {
        let started = Instant::now();
        info!(
            theme = params.theme_label(),
            savage_mode = params.savage_mode,
            zodiac = params.zodiac.as_deref().unwrap_or_default(),
            mbti = params.mbti.as_deref().unwrap_or_default(),
            enable_fortune = params.enable_fortune,
            model = self.model(),
            "Generating note"
        );

        let prompt = self.builder.build(params, Local::now()).await;
        tracing::debug!(prompt_len = prompt.len(), "Prompt built");

        let api_started = Instant::now();
        let outcome = match self.client.ask(system_prompt(params.savage_mode), &prompt).await {
            Ok(content) if content.is_empty() => Err(ChatApiError::EmptyResponse),
            other => other,
        };

        let (content, model, error) = match outcome {
            Ok(content) => {
                let elapsed = api_started.elapsed().as_millis() as u64;
                self.response_times.record(self.model(), elapsed);
                info!(elapsed_ms = elapsed, content_len = content.len(), "Model call succeeded");
                (content, self.model().to_string(), None)
            }
            Err(e) => {
                warn!(error = %e, model = self.model(), "Model call failed, using local fallback");
                let content = theme::local_content(
                    params.theme(),
                    params.savage_mode,
                    params.bilingual(),
                    &mut rand::thread_rng(),
                );
                (content, FALLBACK_MODEL.to_string(), Some(e.to_string()))
            }
        };

        GeneratedNote {
            content,
            timestamp: iso_now(),
            metadata: NoteMetadata {
                model,
                theme: params.theme_label().to_string(),
                mood: params.mood_label(),
                savage_mode: params.savage_mode,
                generation_time: started.elapsed().as_millis() as u64,
                error,
            },
        }
    }
}
