// MediaPipe Pose integration bridge
// Abstraction over the pose model that turns video frames into body landmarks

use crate::models::capture::VideoFrame;
use crate::models::pose::{
    BodyLandmark, Landmark, LandmarkSet, PoseConfig, PoseError, PoseFrame, PoseResult,
};
use std::collections::VecDeque;
use std::time::Instant;

/// Pose model bridge trait
/// Implement this for each inference backend
pub trait MediaPipeBridge: Send {
    /// Run inference on a frame
    fn process_frame(&mut self, frame: &VideoFrame) -> PoseResult<PoseFrame>;

    /// Check if the model is loaded
    fn is_initialized(&self) -> bool;

    /// Get model info
    fn get_model_info(&self) -> String;
}

fn validate_config(config: &PoseConfig) -> PoseResult<()> {
    for (name, value) in [
        ("min_detection_confidence", config.min_detection_confidence),
        ("min_tracking_confidence", config.min_tracking_confidence),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(PoseError::InvalidConfig(format!(
                "{} must be between 0.0 and 1.0, got {}",
                name, value
            )));
        }
    }
    Ok(())
}

// ==============================================================================
// Dummy Implementation
// ==============================================================================

/// Never detects a body
pub struct DummyMediaPipe;

impl MediaPipeBridge for DummyMediaPipe {
    fn process_frame(&mut self, frame: &VideoFrame) -> PoseResult<PoseFrame> {
        Ok(PoseFrame::new(frame.timestamp, None))
    }

    fn is_initialized(&self) -> bool {
        false
    }

    fn get_model_info(&self) -> String {
        "Dummy MediaPipe (no inference)".to_string()
    }
}

// ==============================================================================
// Scripted Implementation
// ==============================================================================

/// One scripted inference result
#[derive(Debug, Clone)]
pub enum ScriptedPose {
    Body(LandmarkSet),
    NoBody,
    Fail(String),
}

/// Replays a fixed sequence of results, then reports no body
pub struct ScriptedMediaPipe {
    script: VecDeque<ScriptedPose>,
}

impl ScriptedMediaPipe {
    pub fn new(script: impl IntoIterator<Item = ScriptedPose>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl MediaPipeBridge for ScriptedMediaPipe {
    fn process_frame(&mut self, frame: &VideoFrame) -> PoseResult<PoseFrame> {
        match self.script.pop_front() {
            Some(ScriptedPose::Body(landmarks)) => Ok(PoseFrame::new(frame.timestamp, Some(landmarks))),
            Some(ScriptedPose::Fail(reason)) => Err(PoseError::InferenceFailed(reason)),
            Some(ScriptedPose::NoBody) | None => Ok(PoseFrame::new(frame.timestamp, None)),
        }
    }

    fn is_initialized(&self) -> bool {
        true
    }

    fn get_model_info(&self) -> String {
        format!("Scripted MediaPipe ({} results queued)", self.script.len())
    }
}

// ==============================================================================
// Simulated Implementation
// ==============================================================================

/// Synthetic figure standing in front of the camera and swaying slowly.
///
/// Dropout frames show the figure turned away: its landmarks come back with
/// low visibility and fail the confidence gate under the default settings.
pub struct SimulatedMediaPipe {
    config: PoseConfig,
    frame_index: u64,
    fps: f32,
    dropout_every: Option<u64>,
    tracked: Option<LandmarkSet>, // Last reported set while a body is followed
}

impl SimulatedMediaPipe {
    const SMOOTHING: f32 = 0.5;
    const FACING_VISIBILITY: f32 = 0.9;
    const TURNED_AWAY_VISIBILITY: f32 = 0.2;

    /// Landmarks that must clear the confidence gate for a body to be reported
    const GATED_LANDMARKS: [BodyLandmark; 3] = [
        BodyLandmark::Nose,
        BodyLandmark::LeftShoulder,
        BodyLandmark::RightShoulder,
    ];

    pub fn new(config: &PoseConfig, fps: u32) -> PoseResult<Self> {
        validate_config(config)?;
        Ok(Self {
            config: config.clone(),
            frame_index: 0,
            fps: fps.max(1) as f32,
            dropout_every: None,
            tracked: None,
        })
    }

    /// Turn the figure away on every `n`th frame.
    pub fn with_dropout_every(mut self, n: u64) -> Self {
        self.dropout_every = Some(n.max(1));
        self
    }

    fn figure(t: f32, visibility: f32) -> LandmarkSet {
        let sway = 0.05 * (0.8 * t).sin();
        let bob = 0.02 * (1.3 * t).sin();
        let point = |x: f32, y: f32| Landmark { x, y, visibility };

        LandmarkSet::centered()
            .with(BodyLandmark::Nose, point(0.5 + sway, 0.25 + bob))
            .with(BodyLandmark::LeftEar, point(0.44 + sway, 0.24 + bob))
            .with(BodyLandmark::RightEar, point(0.56 + sway, 0.24 + bob))
            .with(BodyLandmark::LeftShoulder, point(0.38 + sway, 0.45 + bob))
            .with(BodyLandmark::RightShoulder, point(0.62 + sway, 0.45 + bob))
            .with(
                BodyLandmark::LeftWrist,
                point(0.3 + 0.05 * (2.0 * t).cos(), 0.7 + 0.05 * (2.0 * t).sin()),
            )
            .with(BodyLandmark::RightWrist, point(0.7 + sway, 0.75))
    }

    /// Detection confidence applies while searching for a body, tracking
    /// confidence once one is being followed.
    fn confidence_threshold(&self) -> f32 {
        if self.tracked.is_some() {
            self.config.min_tracking_confidence
        } else {
            self.config.min_detection_confidence
        }
    }

    fn smooth(&self, raw: LandmarkSet) -> LandmarkSet {
        match self.tracked.as_ref() {
            Some(prev) if self.config.smooth_landmarks && prev.len() == raw.len() => {
                let points = prev
                    .points()
                    .iter()
                    .zip(raw.points())
                    .map(|(p, r)| Landmark {
                        x: p.x + Self::SMOOTHING * (r.x - p.x),
                        y: p.y + Self::SMOOTHING * (r.y - p.y),
                        visibility: r.visibility,
                    })
                    .collect();
                LandmarkSet::new(points)
            }
            _ => raw,
        }
    }
}

impl MediaPipeBridge for SimulatedMediaPipe {
    fn process_frame(&mut self, frame: &VideoFrame) -> PoseResult<PoseFrame> {
        let start_time = Instant::now();
        let index = self.frame_index;
        self.frame_index += 1;

        let turned_away = self
            .dropout_every
            .map(|n| index > 0 && index % n == 0)
            .unwrap_or(false);
        let visibility = if turned_away {
            Self::TURNED_AWAY_VISIBILITY
        } else {
            Self::FACING_VISIBILITY
        };

        let raw = Self::figure(index as f32 / self.fps, visibility);
        let landmarks = if raw.all_visible(&Self::GATED_LANDMARKS, self.confidence_threshold()) {
            let landmarks = self.smooth(raw);
            self.tracked = Some(landmarks.clone());
            Some(landmarks)
        } else {
            self.tracked = None;
            None
        };

        let mut pose_frame = PoseFrame::new(frame.timestamp, landmarks);
        pose_frame.processing_time_ms = start_time.elapsed().as_millis() as u64;
        Ok(pose_frame)
    }

    fn is_initialized(&self) -> bool {
        true
    }

    fn get_model_info(&self) -> String {
        format!(
            "Simulated MediaPipe Pose - complexity: {:?}, smoothing: {}",
            self.config.model_complexity, self.config.smooth_landmarks
        )
    }
}
