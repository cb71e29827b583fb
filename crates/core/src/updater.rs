use crate::prompts::template_update_prompt;
use aarogya_common::{ConversationEntry, IntakeError, IntakeTemplate, Result};
use aarogya_providers::llm::{complete_json, LanguageModel};
use std::sync::Arc;
use tracing::{debug, info};

/// Runs the template-update LLM call for one answer. A failure here is
/// fatal for the turn; the caller keeps its previous state for retry.
pub struct TemplateUpdater {
    llm: Arc<dyn LanguageModel>,
}

impl TemplateUpdater {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn update(
        &self,
        template: &IntakeTemplate,
        user_answer: &str,
        history: &[ConversationEntry],
    ) -> Result<IntakeTemplate> {
        let prompt = template_update_prompt(template, user_answer, history);
        debug!("running template update for answer: '{}'", user_answer);

        let value = complete_json(self.llm.as_ref(), &prompt).await?;
        if !value.is_object() {
            return Err(IntakeError::Adapter(
                "template update returned non-object JSON".to_string(),
            ));
        }

        let mut updated = IntakeTemplate(value);
        // The model sometimes returns a partial object; keys never shrink.
        updated.restore_missing_keys(template);

        info!("template updated");
        Ok(updated)
    }
}
