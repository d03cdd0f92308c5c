//! Game module: the learning session state machine and everything it drives.
//! The engine lives in WASM memory (thread_local) for the lifetime of the
//! Web Worker and is rebuilt from a snapshot after a page reload.
//!
//! - `state`: machine states, the session record, the global container
//! - `timers`: cooperative clock and cancellable task scope
//! - `playback`: timed presentation of the current sequence
//! - `input`: debounce and ordering checks on activations
//! - `progress`: per-round and mastery maps
//! - `snapshot`: persisted record and its storage form
//! - `host`: outbound events and the host callback trait
//! - `engine`: the controller tying them together

pub mod engine;
pub mod host;
pub mod input;
pub mod playback;
pub mod progress;
pub mod snapshot;
pub mod state;
pub mod timers;
