pub mod config;
pub mod static_server;

// Overlay logic
pub mod placement;
pub mod asset_registry;
pub mod overlay_controller;

// Scene and session
pub mod viewport;
pub mod scene_renderer;
pub mod session_manager;
