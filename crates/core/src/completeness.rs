use crate::prompts::completeness_prompt;
use aarogya_common::{ConversationEntry, IntakeTemplate};
use aarogya_providers::llm::{complete_json, LanguageModel};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Completion message used when the question budget forces the decision.
pub const BUDGET_EXHAUSTED_MESSAGE: &str = "Thank you for providing your information. We have collected the necessary details. A healthcare professional will review your case.";

/// Question used when the model's verdict is unusable. Degrading beats
/// failing: the conversation must never stall on a bad completion check.
pub const SAFE_DEFAULT_QUESTION: &str = "Could you provide more details about your symptoms?";

#[derive(Debug, Clone, PartialEq)]
pub enum CompletionDecision {
    Complete { message: String },
    AskNext { question: String },
}

impl CompletionDecision {
    pub fn is_complete(&self) -> bool {
        matches!(self, CompletionDecision::Complete { .. })
    }

    pub fn budget_exhausted() -> Self {
        CompletionDecision::Complete {
            message: BUDGET_EXHAUSTED_MESSAGE.to_string(),
        }
    }

    fn safe_default() -> Self {
        CompletionDecision::AskNext {
            question: SAFE_DEFAULT_QUESTION.to_string(),
        }
    }
}

pub struct CompletenessChecker {
    llm: Arc<dyn LanguageModel>,
}

impl CompletenessChecker {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Decides whether to stop or what to ask next. Never fails: provider
    /// errors and malformed verdicts degrade to the safe default question,
    /// and the question budget overrides the model in both directions.
    pub async fn check(
        &self,
        template: &IntakeTemplate,
        history: &[ConversationEntry],
        questions_asked: usize,
        max_questions: usize,
    ) -> CompletionDecision {
        if questions_asked >= max_questions {
            info!("question budget exhausted ({questions_asked}/{max_questions}), forcing completion");
            return CompletionDecision::budget_exhausted();
        }

        let prompt = completeness_prompt(template, history, questions_asked, max_questions);
        let verdict = match complete_json(self.llm.as_ref(), &prompt).await {
            Ok(value) => value,
            Err(e) => {
                warn!("completeness check failed, degrading to default question: {}", e);
                return CompletionDecision::safe_default();
            }
        };

        let decision = match parse_verdict(&verdict) {
            Some(decision) => decision,
            None => {
                warn!("completeness verdict unusable, degrading to default question");
                return CompletionDecision::safe_default();
            }
        };

        // Asking one more question must not blow the budget.
        if !decision.is_complete() && questions_asked + 1 > max_questions {
            info!("next question would exceed the budget, overriding to complete");
            return CompletionDecision::budget_exhausted();
        }

        decision
    }
}

fn parse_verdict(verdict: &Value) -> Option<CompletionDecision> {
    match verdict.get("complete").and_then(Value::as_bool)? {
        true => {
            let message = verdict
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or(BUDGET_EXHAUSTED_MESSAGE)
                .to_string();
            Some(CompletionDecision::Complete { message })
        }
        false => {
            let question = verdict.get("question").and_then(Value::as_str)?;
            if question.trim().is_empty() {
                return None;
            }
            Some(CompletionDecision::AskNext {
                question: question.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_verdict_shapes() {
        let complete = parse_verdict(&json!({"complete": true, "message": "done"})).unwrap();
        assert_eq!(
            complete,
            CompletionDecision::Complete {
                message: "done".to_string()
            }
        );

        let ask = parse_verdict(&json!({"complete": false, "question": "Any allergies?"})).unwrap();
        assert_eq!(
            ask,
            CompletionDecision::AskNext {
                question: "Any allergies?".to_string()
            }
        );
    }

    #[test]
    fn test_parse_verdict_rejects_malformed() {
        assert!(parse_verdict(&json!({})).is_none());
        assert!(parse_verdict(&json!({"complete": "yes"})).is_none());
        assert!(parse_verdict(&json!({"complete": false})).is_none());
        assert!(parse_verdict(&json!({"complete": false, "question": "  "})).is_none());
    }
}
