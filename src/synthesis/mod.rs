use async_trait::async_trait;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

mod invoker;
mod piper;
pub use invoker::{ScratchWav, Synthesizer};
pub use piper::PiperEngine;


/// Outcome of one engine run: exit disposition plus captured stderr.
/// Implementations capture stdout as well, but nothing interprets it.
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    pub success: bool,
    pub stderr: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The engine exited non-zero; `stderr` is its diagnostic
    #[error("TTS failed: {stderr}")]
    Engine { stderr: String },

    #[error("failed to run synthesis engine: {0}")]
    Launch(#[source] std::io::Error),

    /// The engine exited zero but the output file could not be read back
    #[error("failed to read synthesized audio: {0}")]
    ScratchRead(#[source] std::io::Error),

    #[error("synthesis engine timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// One synthesis pass of the external engine: `text` goes to stdin, the
/// model selects the voice, and a WAV file is expected at `output_path`.
#[async_trait]
pub trait SynthesisEngine: Send + Sync {
    async fn run(
        &self,
        text: &str,
        model_path: &Path,
        output_path: &Path,
        speaker: u32,
    ) -> std::io::Result<EngineOutput>;
}

/// Best-effort probe of a WAV container, for logging. Returns sample rate
/// and duration in seconds when the bytes parse.
pub(crate) fn wav_info(data: &[u8]) -> Option<(u32, f64)> {
    let reader = hound::WavReader::new(Cursor::new(data)).ok()?;
    let spec = reader.spec();
    Some((
        spec.sample_rate,
        reader.duration() as f64 / spec.sample_rate as f64,
    ))
}
