use aarogya_common::{IntakeError, Result};
use std::io::Cursor;
use tracing::{debug, warn};

/// Below this the recording cannot possibly hold a second of speech.
pub const MIN_AUDIO_BYTES: usize = 1024;

/// Minimum recorded duration the transcription provider copes with.
pub const MIN_AUDIO_SECONDS: f64 = 1.0;

/// Non-WAV payloads we cannot decode locally; anything at least this
/// large is assumed to carry real audio content.
const FALLBACK_MIN_BYTES: usize = 10_000;

/// Pre-flight validation of an uploaded recording, done locally before
/// spending a provider round trip on clearly-invalid input.
pub fn validate_recording(audio: &[u8]) -> Result<()> {
    if audio.is_empty() {
        return Err(IntakeError::ClientInput("audio data is empty".to_string()));
    }
    if audio.len() < MIN_AUDIO_BYTES {
        return Err(IntakeError::ClientInput(
            "audio file too small; please record at least 2-3 seconds".to_string(),
        ));
    }

    match hound::WavReader::new(Cursor::new(audio)) {
        Ok(reader) => {
            let spec = reader.spec();
            let frames = reader.duration();
            let duration = frames as f64 / spec.sample_rate as f64;
            if duration < MIN_AUDIO_SECONDS {
                return Err(IntakeError::ClientInput(format!(
                    "audio too short ({duration:.1}s); please record at least 2-3 seconds"
                )));
            }
            debug!(duration_secs = duration, bytes = audio.len(), "audio validation passed");
            Ok(())
        }
        Err(e) => {
            // Not WAV (or a mangled header). Fall back to a size check so
            // compressed uploads still pass pre-flight.
            warn!("WAV validation failed ({e}); using size-based fallback");
            if audio.len() >= FALLBACK_MIN_BYTES {
                Ok(())
            } else {
                Err(IntakeError::ClientInput(
                    "audio file appears invalid or too short".to_string(),
                ))
            }
        }
    }
}
