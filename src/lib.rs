//! Vitrine: prompt-driven imagery with bounded retries
//!
//! Asynchronous acquisition of generated images for display cells. Each cell
//! owns a cancellable request sequence with exponential backoff; cells can be
//! arranged into seamlessly looping strips and gated behind one-shot reveal
//! transitions.

pub mod asset;
pub mod cell;
pub mod cli;
pub mod coalesce;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod marquee;
pub mod provider;
pub mod reveal;
