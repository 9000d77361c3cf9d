//! Integration tests for the Vitrine media pipeline

mod cli_commands;
mod config_integration;
mod generation_retry;
mod imagen_client;
mod media_cells;
