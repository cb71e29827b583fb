use crate::completeness::{CompletenessChecker, CompletionDecision};
use crate::summary::SummaryGenerator;
use crate::updater::TemplateUpdater;
use aarogya_common::{
    ConversationEntry, ConversationState, EntryKind, FinalSummary, IntakeError, Result,
};
use aarogya_providers::asr::SpeechToText;
use aarogya_providers::llm::LanguageModel;
use aarogya_providers::translate::{translate_or_original, Translator};
use aarogya_providers::tts::TextToSpeech;
use aarogya_rpc::RecordsStore;
use std::sync::Arc;
use tracing::{error, info};

pub const DEFAULT_MAX_QUESTIONS: usize = 10;

const FIRST_QUESTION: &str = "Hello! I'm here to help collect your medical information. I understand this might be concerning, but I'm here to help. Could you please start by telling me your name?";

/// Outcome of one conversational turn. The caller threads `state` into the
/// next request; the server keeps nothing.
#[derive(Debug)]
pub struct TurnOutcome {
    pub state: ConversationState,
    pub complete: bool,
    /// The next question while collecting, the completion message once done.
    pub reply: String,
    pub final_summary: Option<FinalSummary>,
}

#[derive(Debug)]
pub struct VoiceTurnOutcome {
    pub audio: Vec<u8>,
    pub transcribed: String,
    pub turn: TurnOutcome,
}

/// The intake state machine: one turn updates the template, decides whether
/// to keep asking, and finalizes at most once.
pub struct IntakeOrchestrator {
    updater: TemplateUpdater,
    checker: CompletenessChecker,
    summarizer: SummaryGenerator,
    translator: Arc<dyn Translator>,
    asr: Arc<dyn SpeechToText>,
    tts: Arc<dyn TextToSpeech>,
    records: Arc<dyn RecordsStore>,
    max_questions: usize,
}

impl IntakeOrchestrator {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        translator: Arc<dyn Translator>,
        asr: Arc<dyn SpeechToText>,
        tts: Arc<dyn TextToSpeech>,
        records: Arc<dyn RecordsStore>,
    ) -> Self {
        Self {
            updater: TemplateUpdater::new(llm.clone()),
            checker: CompletenessChecker::new(llm.clone()),
            summarizer: SummaryGenerator::new(llm),
            translator,
            asr,
            tts,
            records,
            max_questions: DEFAULT_MAX_QUESTIONS,
        }
    }

    pub fn with_max_questions(mut self, max_questions: usize) -> Self {
        self.max_questions = max_questions;
        self
    }

    /// Opens a conversation: fresh template, one greeting question in the
    /// patient's language.
    pub async fn start(&self, language: &str) -> TurnOutcome {
        let question =
            translate_or_original(self.translator.as_ref(), FIRST_QUESTION, language).await;
        let mut state = ConversationState::new();
        state.history.push(ConversationEntry::question(&question));

        info!("conversation started in {}", language);
        TurnOutcome {
            state,
            complete: false,
            reply: question,
            final_summary: None,
        }
    }

    /// Runs one text turn. On error the caller's state is untouched (it
    /// owns the canonical copy), so the turn can simply be retried.
    pub async fn text_turn(
        &self,
        state: ConversationState,
        answer: &str,
        language: &str,
    ) -> Result<TurnOutcome> {
        let outcome = self.advance(state, answer, language).await?;
        self.commit(&outcome);
        Ok(outcome)
    }

    /// Voice variant: same state machine, utterance sourced from the
    /// transcriber, reply additionally synthesized. The text form rides
    /// along so clients keep a transcript without re-transcribing.
    ///
    /// Persistence commits only after synthesis succeeds: a turn the
    /// client never receives must stay retryable without writing a
    /// second patient record.
    pub async fn voice_turn(
        &self,
        state: ConversationState,
        audio: &[u8],
        language: &str,
    ) -> Result<VoiceTurnOutcome> {
        let transcribed = self.asr.transcribe(audio, language).await?;
        let turn = self.advance(state, &transcribed, language).await?;
        let audio = self.tts.synthesize(&turn.reply, language).await?;
        self.commit(&turn);

        Ok(VoiceTurnOutcome {
            audio,
            transcribed,
            turn,
        })
    }

    async fn advance(
        &self,
        mut state: ConversationState,
        answer: &str,
        language: &str,
    ) -> Result<TurnOutcome> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(IntakeError::ClientInput("answer must not be empty".to_string()));
        }

        // A finished conversation stays finished; re-submissions get the
        // closing message back but no new summary and no more questions.
        if let Some(closing) = self.closing_message(&state) {
            return Ok(TurnOutcome {
                state,
                complete: true,
                reply: closing,
                final_summary: None,
            });
        }

        state.push_answer(answer);

        let updated = self
            .updater
            .update(&state.template, answer, &state.history)
            .await?;
        state.template = updated;

        let questions_asked = state.questions_asked();
        let decision = self
            .checker
            .check(&state.template, &state.history, questions_asked, self.max_questions)
            .await;

        match decision {
            CompletionDecision::Complete { message } => {
                let spoken =
                    translate_or_original(self.translator.as_ref(), &message, language).await;
                state.history.push(ConversationEntry::message(&spoken));

                let summary = self.summarizer.generate(&state.history).await;

                info!("conversation complete after {} questions", questions_asked);
                Ok(TurnOutcome {
                    state,
                    complete: true,
                    reply: spoken,
                    final_summary: Some(summary),
                })
            }
            CompletionDecision::AskNext { question } => {
                let spoken =
                    translate_or_original(self.translator.as_ref(), &question, language).await;
                state.history.push(ConversationEntry::question(&spoken));

                Ok(TurnOutcome {
                    state,
                    complete: false,
                    reply: spoken,
                    final_summary: None,
                })
            }
        }
    }

    fn closing_message(&self, state: &ConversationState) -> Option<String> {
        state
            .history
            .last()
            .filter(|e| e.kind == EntryKind::SystemMessage)
            .map(|e| e.content.clone())
    }

    fn commit(&self, outcome: &TurnOutcome) {
        if let Some(summary) = &outcome.final_summary {
            self.persist_in_background(summary.clone());
        }
    }

    /// Persistence is fire-and-forget: the conversational result is final
    /// whether or not the records backend accepts it.
    fn persist_in_background(&self, summary: FinalSummary) {
        let records = self.records.clone();
        tokio::spawn(async move {
            if let Err(e) = records.persist_summary(&summary).await {
                error!("failed to persist final summary: {}", e);
            }
        });
    }
}
