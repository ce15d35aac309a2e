// HTTP route tests against a locally dispatched Rocket instance

use rocket::http::Status;
use rocket::local::asynchronous::Client;
use rocket::routes;

use hamiltonian_snake::config::Config;
use hamiltonian_snake::debug_logger::DebugLogger;
use hamiltonian_snake::driver::Session;
use hamiltonian_snake::handler;
use hamiltonian_snake::types::{Phase, Snapshot};

async fn client() -> Client {
    let mut config = Config::default_hardcoded();
    config.game.grid_size = 10;
    config.game.seed = Some(3);
    config.game.start_running = false;
    config.timing.tick_interval_ms = 1000;

    let session =
        Session::new(config, DebugLogger::disabled()).expect("test config is valid");

    let rocket = rocket::build().manage(session).mount(
        "/",
        routes![
            handler::index,
            handler::state,
            handler::pause,
            handler::reset,
            handler::grid
        ],
    );

    Client::tracked(rocket).await.expect("valid rocket instance")
}

#[rocket::async_test]
async fn test_index_reports_metadata() {
    let client = client().await;
    let response = client.get("/").dispatch().await;
    assert_eq!(response.status(), Status::Ok);

    let body: serde_json::Value = response.into_json().await.expect("json body");
    assert_eq!(body["grid_size"], 10);
    assert_eq!(body["tick_interval_ms"], 1000);
    assert_eq!(body["running"], false);
}

#[rocket::async_test]
async fn test_state_returns_snapshot() {
    let client = client().await;
    let response = client.get("/state").dispatch().await;
    assert_eq!(response.status(), Status::Ok);

    let snapshot: Snapshot = response.into_json().await.expect("snapshot body");
    assert_eq!(snapshot.grid_size, 10);
    assert_eq!(snapshot.tick, 0);
    assert_eq!(snapshot.body.len(), 1);
    assert_eq!(snapshot.phase, Phase::Free);
    assert!(!snapshot.running);
}

#[rocket::async_test]
async fn test_pause_toggles_running() {
    let client = client().await;

    let resumed: Snapshot = client
        .post("/pause")
        .dispatch()
        .await
        .into_json()
        .await
        .expect("snapshot body");
    assert!(resumed.running);

    let paused: Snapshot = client
        .post("/pause")
        .dispatch()
        .await
        .into_json()
        .await
        .expect("snapshot body");
    assert!(!paused.running);
}

#[rocket::async_test]
async fn test_reset_honours_running_flag() {
    let client = client().await;

    let running: Snapshot = client
        .post("/reset")
        .dispatch()
        .await
        .into_json()
        .await
        .expect("snapshot body");
    assert!(running.running);
    assert_eq!(running.score, 0);

    let stopped: Snapshot = client
        .post("/reset?running=false")
        .dispatch()
        .await
        .into_json()
        .await
        .expect("snapshot body");
    assert!(!stopped.running);
    assert_eq!(stopped.tick, 0);
}

#[rocket::async_test]
async fn test_grid_rejects_odd_sizes() {
    let client = client().await;

    let response = client.post("/grid/7").dispatch().await;
    assert_eq!(response.status(), Status::BadRequest);

    let response = client.post("/grid/8").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let snapshot: Snapshot = response.into_json().await.expect("snapshot body");
    assert_eq!(snapshot.grid_size, 8);

    let state: Snapshot = client
        .get("/state")
        .dispatch()
        .await
        .into_json()
        .await
        .expect("snapshot body");
    assert_eq!(state.grid_size, 8);
}

#[rocket::async_test]
async fn test_grid_rejects_oversized_boards() {
    let client = client().await;

    let response = client.post("/grid/50000").dispatch().await;
    assert_eq!(response.status(), Status::BadRequest);

    let response = client.post("/grid/202").dispatch().await;
    assert_eq!(response.status(), Status::BadRequest);

    let state: Snapshot = client
        .get("/state")
        .dispatch()
        .await
        .into_json()
        .await
        .expect("snapshot body");
    assert_eq!(state.grid_size, 10);
}
