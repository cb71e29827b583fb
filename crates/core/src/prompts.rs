//! Prompt builders for the three LLM calls the intake flow makes, plus the
//! specialty triage used after completion. Kept in one place so the wording
//! and the context-window sizes are easy to audit.

use aarogya_common::{ConversationEntry, EntryKind, IntakeTemplate};

/// How much history each prompt carries. The update step needs only recent
/// turns; the completeness check reads further back to avoid repeating
/// questions.
const UPDATE_CONTEXT_ENTRIES: usize = 10;
const COMPLETENESS_CONTEXT_ENTRIES: usize = 15;

fn history_context(entries: &[ConversationEntry], limit: usize) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let start = entries.len().saturating_sub(limit);
    let mut context = String::from("\n\nConversation History:\n");
    for entry in &entries[start..] {
        let line = match entry.kind {
            EntryKind::SystemQuestion => format!("Assistant asked: {}\n", entry.content),
            EntryKind::UserAnswer => format!("User answered: {}\n", entry.content),
            EntryKind::SystemMessage => format!("Assistant: {}\n", entry.content),
        };
        context.push_str(&line);
    }
    context
}

pub fn template_update_prompt(
    template: &IntakeTemplate,
    user_answer: &str,
    history: &[ConversationEntry],
) -> String {
    let template_json = serde_json::to_string_pretty(&template.0).unwrap_or_default();
    let context = history_context(history, UPDATE_CONTEXT_ENTRIES);
    format!(
        r#"You are a helpful and empathetic medical assistant helping to collect patient information. Your goal is to be understanding, conversational, supportive, and thorough while filling out a patient information template.

IMPORTANT GUIDELINES:
1. Be helpful and considerate - patients may be worried or in discomfort
2. Extract ALL relevant information from the user's answer carefully
3. Use conversation history to maintain context and avoid repetitive questions
4. Be intelligent about interpreting medical terms and symptoms
5. If information is ambiguous, make reasonable medical interpretations
6. DO NOT hallucinate or make up information not provided by the user

Current template:
{template_json}

User's current answer: {user_answer}
{context}
Instructions:
1. Extract relevant information from the user's answer and conversation history
2. Update the template fields with the extracted information intelligently
3. Replace "string"/"unknown" placeholders with actual values when information is provided
4. Keep existing values if the user's answer doesn't relate to those fields
5. For arrays, add new items or replace placeholder items appropriately
6. If the patient is unsure about a field or doesn't provide information, mark as 'N/A' or 'unknown'
7. Use medical knowledge to categorize symptoms appropriately
8. Consider the conversation flow - don't lose previously provided information

Return ONLY the updated template as valid JSON, no additional text or explanations:"#
    )
}

pub fn completeness_prompt(
    template: &IntakeTemplate,
    history: &[ConversationEntry],
    questions_asked: usize,
    max_questions: usize,
) -> String {
    let template_json = serde_json::to_string_pretty(&template.0).unwrap_or_default();
    let context = history_context(history, COMPLETENESS_CONTEXT_ENTRIES);
    format!(
        r#"You are a helpful and empathetic medical assistant reviewing a patient information template for completeness. You should be considerate of the patient's situation while ensuring you collect necessary medical information.

Current template:
{template_json}
{context}
Number of questions already asked by the assistant: {questions_asked}
Maximum allowed questions for this conversation: {max_questions}

IMPORTANT GUIDELINES:
1. Be helpful, empathetic, and understanding.
2. Review conversation history to avoid asking duplicate questions.
3. Ask intelligent follow-up questions based on previous answers.
4. Prioritize the most important missing information.
5. If the number of questions asked ({questions_asked}) has reached or exceeded the maximum ({max_questions}), you MUST indicate the process is complete.

Instructions:
1. Evaluate if the template has sufficient information for a basic medical consultation.
2. If {questions_asked} >= {max_questions}:
   Respond with: {{"complete": true, "message": "Thank you! Your information has been collected successfully. A healthcare professional will review your case."}}
3. Else if the template is sufficiently complete OR if all critical information has been gathered even if slightly under {max_questions}:
   Respond with: {{"complete": true, "message": "Thank you! Your information has been collected successfully. A healthcare professional will review your case."}}
4. Else (template is incomplete and more questions can be asked):
   Respond with: {{"complete": false, "question": "Ask ONE specific, helpful, and empathetic question about the most important missing information. Ensure this question has not been effectively answered before by reviewing the conversation history."}}
5. Do not ask too many questions. If the previous question was about symptoms, consider asking about medical history next, or vice versa, if appropriate and information is missing.

Important fields to prioritize (if not yet filled and questions remaining < {max_questions}):
- Patient name and basic info (age)
- Primary symptom with clear description
- Symptom onset, duration, and severity
- Relevant medical history (conditions, allergies)

Respond with ONLY valid JSON, no additional text or explanations:"#
    )
}

pub fn summary_prompt(history: &[ConversationEntry]) -> String {
    // The summary reads the whole conversation, not a window.
    let context = history_context(history, usize::MAX);
    format!(
        r#"You are a medical assistant preparing a handover document from a completed patient intake conversation.
{context}
Produce a JSON object with exactly these fields:
- "name": the patient's full name, or null if never given
- "dob": date of birth as "YYYY-MM-DD", or null
- "gender": or null
- "blood_group": or null
- "summary": a concise free-text clinical summary of the symptoms, their onset and severity, and anything the patient emphasized
- "conditions": known pre-existing conditions as free text, or null
- "allergies": known allergies as free text, or null
- "medications": current medications as free text, or null

Use only information the patient actually provided. Respond with ONLY valid JSON, no additional text or explanations:"#
    )
}

pub fn specialty_prompt(symptoms_description: &str) -> String {
    format!(
        r#"You are an expert medical system. Based on the following patient symptoms, please identify the most appropriate medical specialty.
Return ONLY the name of the specialty in lowercase (e.g., "dermatologist", "cardiologist", "general physician"). Do not add any other text or punctuation.

Patient Symptoms: {symptoms_description}

Consider these common specialties:
- dermatologist
- cardiologist
- orthopedist
- pediatrician
- ophthalmologist
- gastroenterologist
- neurologist
- nephrologist
- urologist
- pulmonologist
- endocrinologist
- oncologist
- psychiatrist
- ENT specialist (otolaryngologist)
- rheumatologist
- allergist/immunologist
- general physician

If the symptoms are very general, or if you are unsure, suggest "general physician".

Specialty:"#
    )
}
