// Data structures for camera capture

use image::RgbImage;

/// A captured video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub timestamp: i64, // Milliseconds since the Unix epoch
    pub image: RgbImage,
}

impl VideoFrame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Error types for camera capture operations
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not currently capturing")]
    NotCapturing,
}

pub type CaptureResult<T> = Result<T, CaptureError>;
