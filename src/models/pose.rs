// Data models for body-pose estimation results

use serde::{Deserialize, Serialize};

/// Number of landmarks in a full MediaPipe Pose result
pub const POSE_LANDMARK_COUNT: usize = 33;

// ==============================================================================
// Pose Frame
// ==============================================================================

/// Pose estimation result for a single video frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseFrame {
    pub timestamp: i64,
    pub landmarks: Option<LandmarkSet>, // None when no body was detected
    pub processing_time_ms: u64,
}

impl PoseFrame {
    pub fn new(timestamp: i64, landmarks: Option<LandmarkSet>) -> Self {
        Self {
            timestamp,
            landmarks,
            processing_time_ms: 0,
        }
    }
}

// ==============================================================================
// Landmarks
// ==============================================================================

/// MediaPipe Pose landmark indices (33 total).
///
/// This is the output layout of the external pose model. Placement rules
/// address landmarks only through this table, so a model change that moves
/// indices is a one-place edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BodyLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl BodyLandmark {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A single normalized 2D landmark
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,          // Normalized [0, 1], left to right
    pub y: f32,          // Normalized [0, 1], top to bottom
    pub visibility: f32, // Model confidence [0, 1]
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            visibility: 1.0,
        }
    }

    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility >= threshold
    }

    pub fn midpoint(&self, other: &Landmark) -> Landmark {
        Landmark {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            visibility: self.visibility.min(other.visibility),
        }
    }
}

/// Landmarks detected in one frame, index-addressed by [`BodyLandmark`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// A full-length set with every point at the image centre.
    pub fn centered() -> Self {
        Self::new(vec![Landmark::new(0.5, 0.5); POSE_LANDMARK_COUNT])
    }

    /// Returns a copy with one landmark replaced, growing the set if needed.
    pub fn with(mut self, landmark: BodyLandmark, point: Landmark) -> Self {
        let index = landmark.index();
        if self.points.len() <= index {
            self.points.resize(index + 1, Landmark::new(0.5, 0.5));
        }
        self.points[index] = point;
        self
    }

    pub fn get(&self, landmark: BodyLandmark) -> Option<&Landmark> {
        self.points.get(landmark.index())
    }

    /// True when every listed landmark is present with at least `threshold`
    /// visibility.
    pub fn all_visible(&self, landmarks: &[BodyLandmark], threshold: f32) -> bool {
        landmarks
            .iter()
            .all(|lm| self.get(*lm).is_some_and(|point| point.is_visible(threshold)))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }
}

// ==============================================================================
// Configuration
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseConfig {
    pub model_complexity: ModelComplexity, // Default: full
    pub smooth_landmarks: bool,            // Default: true
    pub min_detection_confidence: f32,     // Default: 0.5
    pub min_tracking_confidence: f32,      // Default: 0.5
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelComplexity {
    Lite = 0,  // Fastest, less accurate
    Full = 1,  // Balanced
    Heavy = 2, // Slowest, most accurate
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            model_complexity: ModelComplexity::Full,
            smooth_landmarks: true,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PoseError {
    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type PoseResult<T> = Result<T, PoseError>;
