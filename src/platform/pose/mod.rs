// Pose estimation platform integration
// Provides the MediaPipe bridge and its backends

pub mod mediapipe_bridge;

pub use mediapipe_bridge::{
    DummyMediaPipe, MediaPipeBridge, ScriptedMediaPipe, ScriptedPose, SimulatedMediaPipe,
};
