//! Still-frame extraction for uploaded videos.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Target box for an extracted frame. The frame is scaled to fit and
/// letterboxed with black bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
    /// ffmpeg `-q:v` value, 2 (best) to 31 (worst).
    pub quality: u8,
}

impl FrameSize {
    pub const PREVIEW: FrameSize = FrameSize {
        width: 1280,
        height: 720,
        quality: 2,
    };

    pub const THUMBNAIL: FrameSize = FrameSize {
        width: 320,
        height: 180,
        quality: 8,
    };

    fn fit_filter(&self) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:black",
            w = self.width,
            h = self.height
        )
    }

    fn plain_filter(&self) -> String {
        format!("scale={}:{}", self.width, self.height)
    }
}

/// Writes a single JPEG frame of a video to disk.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    async fn extract_frame(
        &self,
        video_path: &Path,
        timestamp: &str,
        output_path: &Path,
        size: FrameSize,
    ) -> Result<()>;
}

/// [`FrameExtractor`] backed by the ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    ffmpeg_path: String,
}

impl FfmpegFrameExtractor {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    async fn run(
        &self,
        video_path: &Path,
        timestamp: &str,
        output_path: &Path,
        filter: &str,
        quality: Option<u8>,
    ) -> Result<()> {
        let mut command = Command::new(&self.ffmpeg_path);
        command
            .arg("-y")
            .arg("-i")
            .arg(video_path)
            .args(["-vframes", "1", "-ss", timestamp]);
        if let Some(quality) = quality {
            command.args(["-q:v", &quality.to_string()]);
        }
        command.args(["-vf", filter]).arg(output_path);

        let output = command
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.ffmpeg_path))?;

        if !output.status.success() {
            return Err(anyhow!(
                "ffmpeg failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn extract_frame(
        &self,
        video_path: &Path,
        timestamp: &str,
        output_path: &Path,
        size: FrameSize,
    ) -> Result<()> {
        let fitted = self
            .run(
                video_path,
                timestamp,
                output_path,
                &size.fit_filter(),
                Some(size.quality),
            )
            .await;

        match fitted {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    video = %video_path.display(),
                    "Letterboxed frame extraction failed, retrying with plain scaling"
                );
                let filter = size.plain_filter();
                self.run(video_path, timestamp, output_path, &filter, None)
                    .await
                    .context("Frame extraction failed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_filter_letterboxes_to_720p() {
        assert_eq!(
            FrameSize::PREVIEW.fit_filter(),
            "scale=1280:720:force_original_aspect_ratio=decrease,\
             pad=1280:720:(ow-iw)/2:(oh-ih)/2:black"
        );
        assert_eq!(FrameSize::THUMBNAIL.plain_filter(), "scale=320:180");
    }

    #[tokio::test]
    async fn missing_binary_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = FfmpegFrameExtractor::new("/nonexistent/ffmpeg-binary");
        let result = extractor
            .extract_frame(
                &dir.path().join("in.mp4"),
                "00:00:01",
                &dir.path().join("out.jpg"),
                FrameSize::THUMBNAIL,
            )
            .await;
        assert!(result.is_err());
    }
}
