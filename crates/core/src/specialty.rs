use crate::prompts::specialty_prompt;
use aarogya_providers::llm::LanguageModel;
use std::sync::Arc;
use tracing::{info, warn};

pub const FALLBACK_SPECIALTY: &str = "general physician";

const KNOWN_SPECIALTIES: &[&str] = &[
    "dermatologist",
    "cardiologist",
    "orthopedist",
    "pediatrician",
    "ophthalmologist",
    "gastroenterologist",
    "neurologist",
    "nephrologist",
    "urologist",
    "pulmonologist",
    "endocrinologist",
    "oncologist",
    "psychiatrist",
    "ent specialist",
    "otolaryngologist",
    "rheumatologist",
    "allergist/immunologist",
    "general physician",
];

/// Picks the medical specialty a completed intake should be routed to.
pub struct SpecialtyRouter {
    llm: Arc<dyn LanguageModel>,
}

impl SpecialtyRouter {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Never fails: anything the model returns that is not a recognized
    /// specialty falls back to the general physician.
    pub async fn route(&self, symptoms_description: &str) -> String {
        let prompt = specialty_prompt(symptoms_description);
        let raw = match self.llm.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("specialty triage failed ({}), using fallback", e);
                return FALLBACK_SPECIALTY.to_string();
            }
        };

        let specialty = normalize_specialty(&raw);
        info!("routed to specialty: {}", specialty);
        specialty
    }
}

fn normalize_specialty(raw: &str) -> String {
    let cleaned = raw
        .trim()
        .to_ascii_lowercase()
        .replace(['"', '\'', '.'], "");

    if KNOWN_SPECIALTIES.contains(&cleaned.as_str()) {
        cleaned
    } else {
        FALLBACK_SPECIALTY.to_string()
    }
}
