//! Syllable memory game engine, compiled to WASM.
//!
//! A learner hears a growing run of syllables and taps them back in order.
//! Three rounds per phase, one word per phase; tapped syllables are
//! mastered for good and unlock their reward element.
//!
//! Exports `handle_request(method, path, query, body)` for the Web Worker
//! bridge to call. Uses `matchit` for URL routing, the same router engine
//! that powers Axum. Responses are JSON documents.

use wasm_bindgen::prelude::*;

pub mod catalog;
pub mod config;
pub mod error;
pub mod game;
pub mod routes;

pub use catalog::SequenceCatalog;
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use game::engine::{Activation, Engine, EngineView};
pub use game::host::{Host, HostEvent, RecordingHost};
pub use game::snapshot::Snapshot;
pub use game::state::MachineState;

/// One-time setup: panic messages and `log` output go to the browser console.
#[wasm_bindgen]
pub fn engine_init() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("syllable memory engine ready");
}

/// Process an HTTP-like request and return a JSON document.
///
/// Called from JavaScript (Web Worker) via wasm-bindgen.
///
/// # Arguments
/// * `method`: HTTP method ("GET" or "POST")
/// * `path`: URL path (e.g., "/api/engine/tick")
/// * `query`: Query string (e.g., "?phase=alpha&syllable=va")
/// * `body`: Form-encoded or JSON body. Empty string for GET requests.
#[wasm_bindgen]
pub fn handle_request(method: &str, path: &str, query: &str, body: &str) -> String {
    let mut router = matchit::Router::new();

    // Lifecycle and inputs
    router.insert("/api/engine/activate", "activate").ok();
    router.insert("/api/engine/deactivate", "deactivate").ok();
    router.insert("/api/engine/tick", "tick").ok();
    router.insert("/api/engine/press", "press").ok();
    router.insert("/api/engine/advance", "advance").ok();
    router.insert("/api/engine/reset", "reset").ok();

    // Setup
    router.insert("/api/engine/config", "config").ok();
    router.insert("/api/engine/catalog", "catalog").ok();

    // Queries
    router.insert("/api/engine/view", "view").ok();
    router.insert("/api/engine/snapshot", "snapshot").ok();
    router.insert("/api/engine/progress", "progress").ok();

    match router.at(path) {
        Ok(matched) => match (*matched.value, method) {
            ("activate", "POST") => routes::engine::handle_activate_post(body),
            ("deactivate", "POST") => routes::engine::handle_deactivate_post(body),
            ("tick", "POST") => routes::engine::handle_tick_post(body),
            ("press", "POST") => routes::engine::handle_press_post(body),
            ("advance", "POST") => routes::engine::handle_advance_post(body),
            ("reset", "POST") => routes::engine::handle_reset_post(body),
            ("config", "POST") => routes::engine::handle_config_post(body),
            ("catalog", "POST") => routes::engine::handle_catalog_post(body),

            ("view", "GET") => routes::engine::handle_view_get(query),
            ("snapshot", "GET") => routes::engine::handle_snapshot_get(query),
            ("progress", "GET") => routes::engine::handle_progress_get(query),

            _ => method_not_allowed(),
        },
        Err(_) => not_found(),
    }
}

fn not_found() -> String {
    routes::util::error_json("404: route not found")
}

fn method_not_allowed() -> String {
    routes::util::error_json("405: method not allowed")
}
