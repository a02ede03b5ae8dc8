/// pulse-cli library root
///
/// The binary has two faces built on the same core:
/// - `serve`: axum REST API exposing host metrics snapshots
/// - default (no subcommand): ratatui dashboard polling that API

pub mod app;
pub mod cli;
pub mod core;
pub mod screens;
pub mod server;
pub mod utils;
