// Capability providers behind the session: camera frames and pose inference

pub mod capture;
pub mod pose;
