// Data models for capture, pose estimation and jewelry overlays

pub mod capture;
pub mod jewelry;
pub mod pose;
