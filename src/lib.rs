pub mod core;
pub mod models;
pub mod platform;

pub use crate::core::config::Config;
pub use crate::core::placement::place;
pub use crate::core::session_manager::{
    rotate_selection, spawn_session, RunningSession, SessionEvent, SessionHandle, SessionSummary,
    TryOnSession,
};
pub use crate::models::jewelry::{JewelryCategory, Offset3D};
pub use crate::models::pose::{BodyLandmark, Landmark, LandmarkSet};
