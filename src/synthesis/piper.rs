use super::{EngineOutput, SynthesisEngine};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Runs the piper CLI: model and output file as arguments, text on stdin,
/// diagnostics on stderr.
#[derive(Debug, Clone)]
pub struct PiperEngine {
    command: String,
}

impl PiperEngine {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl SynthesisEngine for PiperEngine {
    async fn run(
        &self,
        text: &str,
        model_path: &Path,
        output_path: &Path,
        speaker: u32,
    ) -> std::io::Result<EngineOutput> {
        let mut cmd = Command::new(&self.command);
        cmd.arg("--model")
            .arg(model_path)
            .arg("--output_file")
            .arg(output_path);
        if speaker > 0 {
            cmd.arg("--speaker").arg(speaker.to_string());
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        debug!("running {:?}", cmd.as_std());

        let mut child = cmd.spawn()?;
        let stdin = child.stdin.take();

        // Feed stdin while draining the output pipes; an engine that exits
        // before consuming all of its input must not wedge the writer.
        let write_task = async {
            if let Some(mut stdin) = stdin {
                match stdin.write_all(text.as_bytes()).await {
                    Ok(_) => {
                        let _ = stdin.shutdown().await;
                        Ok(())
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                    Err(e) => Err(e),
                }
            } else {
                Ok(())
            }
        };
        let (write_result, output) = tokio::join!(write_task, child.wait_with_output());
        let output = output?;

        if output.status.success() {
            write_result?;
        }
        Ok(EngineOutput {
            success: output.status.success(),
            stderr: output.stderr,
        })
    }
}
