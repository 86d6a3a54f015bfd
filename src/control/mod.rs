pub mod config;
pub mod controls;
pub mod panel;
pub mod scene;
