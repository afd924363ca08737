pub mod cli;
pub mod config;
pub mod plate_overlay;
