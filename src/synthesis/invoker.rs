use super::{EngineOutput, SynthesisEngine, SynthesisError};
use crate::config::SynthesisConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Uniquely named output location for one engine run. Removal is tied to
/// drop so the file cannot outlive its request, whichever way the
/// invocation exits.
pub struct ScratchWav {
    path: PathBuf,
}

impl ScratchWav {
    pub fn allocate(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("tts-{}.wav", Uuid::new_v4())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchWav {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(_) => debug!("removed scratch file {}", self.path.display()),
            // the engine may have failed before producing anything
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove scratch file {}: {}", self.path.display(), e),
        }
    }
}

/// Owns the lifecycle of one synthesis invocation: scratch allocation,
/// model resolution, the engine run, and reading the waveform back.
pub struct Synthesizer {
    engine: Arc<dyn SynthesisEngine>,
    models_dir: PathBuf,
    scratch_dir: PathBuf,
    default_voice: String,
    timeout_secs: Option<u64>,
}

impl Synthesizer {
    pub fn new(engine: Arc<dyn SynthesisEngine>, config: &SynthesisConfig) -> Self {
        Self {
            engine,
            models_dir: PathBuf::from(&config.models_dir),
            scratch_dir: config.scratch_dir(),
            default_voice: config.default_voice.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    pub fn default_voice(&self) -> &str {
        &self.default_voice
    }

    /// Model lookup is by convention only. A missing file surfaces as an
    /// engine failure; the engine is the authority on what it can load.
    fn model_path(&self, voice: &str) -> PathBuf {
        self.models_dir.join(format!("{}.onnx", voice))
    }

    pub async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        speaker: u32,
    ) -> Result<Vec<u8>, SynthesisError> {
        let scratch = ScratchWav::allocate(&self.scratch_dir);
        let model = self.model_path(voice);
        debug!(
            voice,
            model = %model.display(),
            scratch = %scratch.path().display(),
            "starting synthesis"
        );

        let output = self.run_engine(text, &model, scratch.path(), speaker).await?;
        if !output.success {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(SynthesisError::Engine { stderr });
        }

        let audio = tokio::fs::read(scratch.path())
            .await
            .map_err(SynthesisError::ScratchRead)?;
        match super::wav_info(&audio) {
            Some((sample_rate, secs)) => info!(
                voice,
                sample_rate,
                duration_secs = format!("{:.2}", secs),
                "synthesized {} bytes",
                audio.len()
            ),
            None => warn!(
                voice,
                "engine produced {} bytes that do not parse as WAV",
                audio.len()
            ),
        }
        Ok(audio)
    }

    async fn run_engine(
        &self,
        text: &str,
        model: &Path,
        out: &Path,
        speaker: u32,
    ) -> Result<EngineOutput, SynthesisError> {
        let run = self.engine.run(text, model, out, speaker);
        match self.timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), run)
                .await
                .map_err(|_| SynthesisError::Timeout { secs })?
                .map_err(SynthesisError::Launch),
            None => run.await.map_err(SynthesisError::Launch),
        }
    }
}
