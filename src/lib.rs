//! segue: a terminal audio preview player.
//!
//! A single coordinator owns the playback state and the media handle; the
//! terminal UI and the MPRIS bridge both drive it through intents and render
//! its published snapshots.

pub mod app;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod media;
pub mod mpris;
pub mod player;
pub mod runtime;
pub mod track;
pub mod ui;
