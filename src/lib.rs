// Library surface for the binary, headless/integration tests and reuse.
// Terminal setup and argument parsing stay in main.rs.
pub mod app;
pub mod app_dirs;
pub mod collection;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod persistence;
pub mod runtime;
pub mod surface;
pub mod ui;
pub mod workout;
