use anyhow::Error;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "rustvox - text-to-speech synthesis server")]
pub struct Cli {
    /// Path to a TOML configuration file; defaults are used when omitted
    #[clap(long)]
    pub conf: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub http_addr: String,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    pub synthesis: Option<SynthesisConfig>,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct SynthesisConfig {
    /// Engine executable, looked up on PATH when not an absolute path
    pub command: String,
    /// Directory holding one `<voice>.onnx` file per voice
    pub models_dir: String,
    /// Where scratch output files are placed; system temp dir when unset
    pub scratch_dir: Option<String>,
    pub default_voice: String,
    /// Bound on one engine run, in seconds; unset means wait indefinitely
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".to_string(),
            log_level: Some("info".to_string()),
            log_file: None,
            synthesis: Some(SynthesisConfig::default()),
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            command: "piper".to_string(),
            #[cfg(target_os = "windows")]
            models_dir: "./models".to_string(),
            #[cfg(not(target_os = "windows"))]
            models_dir: "/app/models".to_string(),
            scratch_dir: None,
            default_voice: "en_US-amy-medium".to_string(),
            timeout_secs: None,
        }
    }
}

impl SynthesisConfig {
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Error> {
        let config = toml::from_str(
            &std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("{}: {}", e, path))?,
        )?;
        Ok(config)
    }
}
