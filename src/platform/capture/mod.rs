// Camera frame sources
// The session only sees the FrameSource trait; real webcams plug in behind it.

use crate::models::capture::{CaptureError, CaptureResult, VideoFrame};
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use std::time::Duration;

/// A stream of video frames
#[async_trait]
pub trait FrameSource: Send {
    /// Acquire the device. Called once per session.
    async fn start(&mut self) -> CaptureResult<()>;

    /// Wait for the next frame. `Ok(None)` means the stream has ended.
    async fn next_frame(&mut self) -> CaptureResult<Option<VideoFrame>>;

    /// Frame dimensions once started
    fn dimensions(&self) -> (u32, u32);
}

/// Produces plain frames at a fixed rate, optionally for a limited count
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    interval: Duration,
    remaining: Option<u64>,
    started: bool,
    deny_access: bool,
}

impl SyntheticCamera {
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self {
            width,
            height,
            interval: Duration::from_secs(1) / fps.max(1),
            remaining: None,
            started: false,
            deny_access: false,
        }
    }

    /// Stop after `frames` frames.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }

    /// Make `start` fail the way a denied webcam permission does.
    pub fn denying_access(mut self) -> Self {
        self.deny_access = true;
        self
    }
}

#[async_trait]
impl FrameSource for SyntheticCamera {
    async fn start(&mut self) -> CaptureResult<()> {
        if self.deny_access {
            return Err(CaptureError::PermissionDenied(
                "camera access was refused".to_string(),
            ));
        }
        self.started = true;
        Ok(())
    }

    async fn next_frame(&mut self) -> CaptureResult<Option<VideoFrame>> {
        if !self.started {
            return Err(CaptureError::NotCapturing);
        }

        if self.remaining == Some(0) {
            return Ok(None);
        }

        tokio::time::sleep(self.interval).await;

        // A call cancelled during the wait does not consume a frame.
        if let Some(n) = self.remaining.as_mut() {
            *n -= 1;
        }

        Ok(Some(VideoFrame {
            timestamp: chrono::Utc::now().timestamp_millis(),
            image: RgbImage::from_pixel(self.width, self.height, Rgb([16, 16, 16])),
        }))
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
