//! `/api/engine/*` routes: drive the memory game engine from the host.
//!
//! POST handlers answer `{"view": ..., "events": [...]}` so the host can
//! render and then play cues, store snapshots and forward notifications in
//! one pass. The engine itself lives in the thread-local container.

use serde_json::json;

use crate::catalog::SequenceCatalog;
use crate::config::EngineConfig;
use crate::game::engine::Engine;
use crate::game::state::{replace_engine, with_engine, with_engine_mut};
use crate::routes::util::{error_json, get_flag, get_param, get_parsed, parse_form_body, parse_query};

/// View plus every event queued since the last response.
fn respond(engine: &mut Engine) -> String {
    let events = engine.drain_events();
    json!({ "view": engine.view(), "events": events }).to_string()
}

/// Same as `respond`, with an `error` field for a refused request.
fn respond_with_error(engine: &mut Engine, error: &str) -> String {
    let events = engine.drain_events();
    json!({ "view": engine.view(), "events": events, "error": error }).to_string()
}

// ── POST /api/engine/activate ──────────────────────────────────────

/// Handle POST /api/engine/activate
/// Body params:
///   - live=true|false            → bring the scene live or tear it down
///   - reset=true                 → ignore any snapshot, clear all progress
///   - snapshot={stored snapshot} → resume from a reload (base64 or JSON)
pub fn handle_activate_post(body: &str) -> String {
    let params = parse_form_body(body);
    let live = get_param(&params, "live").is_none() || get_flag(&params, "live");
    let reset = get_flag(&params, "reset");
    let stored = get_param(&params, "snapshot").unwrap_or("");

    with_engine_mut(|engine| {
        if live {
            engine.activate_from_storage(stored, reset);
        } else {
            engine.deactivate();
        }
        respond(engine)
    })
}

// ── POST /api/engine/deactivate ────────────────────────────────────

pub fn handle_deactivate_post(_body: &str) -> String {
    with_engine_mut(|engine| {
        engine.deactivate();
        respond(engine)
    })
}

// ── POST /api/engine/tick ──────────────────────────────────────────

/// Handle POST /api/engine/tick  (`ms={elapsed milliseconds}`)
pub fn handle_tick_post(body: &str) -> String {
    let params = parse_form_body(body);
    let Some(ms) = get_parsed::<u64>(&params, "ms") else {
        return error_json("Missing or invalid ms parameter");
    };
    with_engine_mut(|engine| {
        engine.tick(ms);
        respond(engine)
    })
}

// ── POST /api/engine/press ─────────────────────────────────────────

/// Handle POST /api/engine/press  (`index={clicker position}`)
/// The verdict is reported alongside the view; ignored presses are not errors.
pub fn handle_press_post(body: &str) -> String {
    let params = parse_form_body(body);
    let Some(index) = get_parsed::<usize>(&params, "index") else {
        return error_json("Missing or invalid index parameter");
    };
    with_engine_mut(|engine| {
        let verdict = engine.press(index);
        let events = engine.drain_events();
        json!({
            "view": engine.view(),
            "events": events,
            "verdict": format!("{:?}", verdict),
        })
        .to_string()
    })
}

// ── POST /api/engine/advance ───────────────────────────────────────

pub fn handle_advance_post(_body: &str) -> String {
    with_engine_mut(|engine| match engine.advance_phase() {
        Ok(()) => respond(engine),
        Err(e) => respond_with_error(engine, &e.to_string()),
    })
}

// ── POST /api/engine/reset ─────────────────────────────────────────

pub fn handle_reset_post(_body: &str) -> String {
    with_engine_mut(|engine| match engine.full_reset() {
        Ok(()) => respond(engine),
        Err(e) => respond_with_error(engine, &e.to_string()),
    })
}

// ── POST /api/engine/config ────────────────────────────────────────

/// Handle POST /api/engine/config with a JSON `EngineConfig` body.
pub fn handle_config_post(body: &str) -> String {
    let config = match EngineConfig::from_json(body) {
        Ok(config) => config,
        Err(e) => return error_json(&e.to_string()),
    };
    with_engine_mut(|engine| match engine.set_config(config) {
        Ok(()) => json!({ "config": engine.config() }).to_string(),
        Err(e) => error_json(&e.to_string()),
    })
}

// ── POST /api/engine/catalog ───────────────────────────────────────

/// Handle POST /api/engine/catalog with a JSON catalog body.
/// Replaces the engine (inactive) with one built on the new catalog and the
/// current config; problems that would stall a round are listed as warnings.
pub fn handle_catalog_post(body: &str) -> String {
    let catalog = match SequenceCatalog::from_json(body) {
        Ok(catalog) => catalog,
        Err(e) => return error_json(&e.to_string()),
    };
    let warnings: Vec<String> = catalog.validate().iter().map(|e| e.to_string()).collect();
    let config = with_engine_mut(|engine| {
        engine.deactivate();
        engine.config().clone()
    });
    match Engine::new(config, catalog) {
        Ok(engine) => {
            let phases: Vec<String> = engine
                .catalog()
                .phases()
                .iter()
                .map(|p| p.id.clone())
                .collect();
            replace_engine(engine);
            json!({ "phases": phases, "warnings": warnings }).to_string()
        }
        Err(e) => error_json(&e.to_string()),
    }
}

// ── GET /api/engine/view ───────────────────────────────────────────

pub fn handle_view_get(_query: &str) -> String {
    with_engine(|engine| json!(engine.view()).to_string())
}

// ── GET /api/engine/snapshot ───────────────────────────────────────

/// Handle GET /api/engine/snapshot
/// Returns the current snapshot in its storage form (`?format=json` for JSON).
pub fn handle_snapshot_get(query: &str) -> String {
    let params = parse_query(query);
    let json_format = get_param(&params, "format") == Some("json");
    with_engine(|engine| {
        let snapshot = engine.snapshot();
        if json_format {
            snapshot.to_json()
        } else {
            snapshot.to_storage()
        }
    })
}

// ── GET /api/engine/progress ───────────────────────────────────────

/// Handle GET /api/engine/progress?phase={id}&syllable={token}
pub fn handle_progress_get(query: &str) -> String {
    let params = parse_query(query);
    let (Some(phase), Some(syllable)) = (get_param(&params, "phase"), get_param(&params, "syllable"))
    else {
        return error_json("Missing phase or syllable parameter");
    };
    with_engine(|engine| {
        json!({
            "phase": phase,
            "syllable": syllable,
            "mastered": engine.is_mastered(phase, syllable),
            "activatedThisRound": engine.is_activated_this_round(phase, syllable),
            "rewardUnlocked": engine.is_reward_unlocked(phase, syllable),
        })
        .to_string()
    })
}
