// HTTP handler bindings for the snake session
//
// Thin wrappers that bind Rocket routes to `Session` methods. Handlers are
// responsible for:
// - Extracting the Session from Rocket's managed state
// - Delegating to Session methods
// - Serializing snapshots

use rocket::http::Status;
use rocket::serde::json::Json;
use serde_json::{json, Value};

use crate::driver::Session;
use crate::types::Snapshot;

/// GET / endpoint
/// Returns session metadata
#[get("/")]
pub fn index(session: &rocket::State<Session>) -> Json<Value> {
    let snapshot = session.snapshot();

    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "grid_size": snapshot.grid_size,
        "tick_interval_ms": session.config().timing.tick_interval_ms,
        "running": snapshot.running,
    }))
}

/// GET /state endpoint
/// Returns a copy of the last committed state
#[get("/state")]
pub fn state(session: &rocket::State<Session>) -> Json<Snapshot> {
    Json(session.snapshot())
}

/// POST /pause endpoint
/// Toggles the running flag without touching the episode
#[post("/pause")]
pub fn pause(session: &rocket::State<Session>) -> Json<Snapshot> {
    Json(session.toggle_pause())
}

/// POST /reset endpoint
/// Starts a fresh episode; runs immediately unless `running=false`
#[post("/reset?<running>")]
pub fn reset(session: &rocket::State<Session>, running: Option<bool>) -> Json<Snapshot> {
    Json(session.reset(running.unwrap_or(true)))
}

/// POST /grid/<size> endpoint
/// Switches to a new grid size, rejecting odd sizes
#[post("/grid/<size>")]
pub fn grid(session: &rocket::State<Session>, size: i32) -> Result<Json<Snapshot>, (Status, String)> {
    session
        .set_grid_size(size)
        .map(Json)
        .map_err(|e| (Status::BadRequest, e))
}
