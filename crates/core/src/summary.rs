use crate::prompts::summary_prompt;
use aarogya_common::{ConversationEntry, EntryKind, FinalSummary};
use aarogya_providers::llm::{complete_json, LanguageModel};
use std::sync::Arc;
use tracing::{info, warn};

/// Derives the one-time FinalSummary from a completed conversation. Never
/// fails: if the model is unusable, the summary degrades to a plain digest
/// of the patient's own answers.
pub struct SummaryGenerator {
    llm: Arc<dyn LanguageModel>,
}

impl SummaryGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn generate(&self, history: &[ConversationEntry]) -> FinalSummary {
        let prompt = summary_prompt(history);
        match complete_json(self.llm.as_ref(), &prompt).await {
            Ok(value) => match serde_json::from_value::<FinalSummary>(value) {
                Ok(summary) if !summary.summary.trim().is_empty() => {
                    info!("final summary generated");
                    summary
                }
                Ok(_) => {
                    warn!("summary had no body, using history digest");
                    fallback_summary(history)
                }
                Err(e) => {
                    warn!("summary JSON did not match schema ({}), using history digest", e);
                    fallback_summary(history)
                }
            },
            Err(e) => {
                warn!("summary generation failed ({}), using history digest", e);
                fallback_summary(history)
            }
        }
    }
}

fn fallback_summary(history: &[ConversationEntry]) -> FinalSummary {
    let digest = history
        .iter()
        .filter(|e| e.kind == EntryKind::UserAnswer)
        .map(|e| e.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    FinalSummary {
        summary: if digest.is_empty() {
            "No information was collected.".to_string()
        } else {
            format!("Patient reported: {digest}")
        },
        ..Default::default()
    }
}
