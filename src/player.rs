//! Playback state store.
//!
//! `PlayerState` is the single source of truth for what the UI shows. It only
//! changes through [`reduce`], a total function over [`PlayerEvent`]s: bad input is
//! clamped, never rejected.

mod state;

pub use state::*;

#[cfg(test)]
mod tests;
