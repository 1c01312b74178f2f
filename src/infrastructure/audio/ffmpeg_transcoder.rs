use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::application::ports::{AudioTranscoder, TranscoderError};

/// Runs the external `ffmpeg` binary to produce mono PCM WAV.
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

#[async_trait]
impl AudioTranscoder for FfmpegTranscoder {
    async fn to_wav(&self, input: &[u8], sample_rate_hz: u32) -> Result<Vec<u8>, TranscoderError> {
        // Removed with its contents when dropped.
        let workdir = tempfile::tempdir()?;
        let input_path = workdir.path().join("input");
        let output_path = workdir.path().join("output.wav");

        tokio::fs::write(&input_path, input).await?;
        let sample_rate = sample_rate_hz.to_string();

        let output = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .arg("-i")
            .arg(&input_path)
            .args(["-ar", sample_rate.as_str(), "-ac", "1", "-f", "wav"])
            .arg(&output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TranscoderError::SpawnFailed(format!("{}: {}", self.ffmpeg_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(5)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            return Err(TranscoderError::Failed {
                status: output.status.to_string(),
                stderr: tail,
            });
        }

        Ok(tokio::fs::read(&output_path).await?)
    }
}
