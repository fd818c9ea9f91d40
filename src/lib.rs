//! Welcome dashboard library
//!
//! A terminal startup dashboard assembled from small modules (greeting,
//! system, weather, GitHub, stalled Linear issues). Remote data goes through a
//! file-backed cache so opening a shell stays fast.

pub mod app;
pub mod cache;
pub mod cli;
pub mod color;
pub mod config;
pub mod data;
pub mod logging;
pub mod modules;
pub mod registry;
