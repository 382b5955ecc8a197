//! Shared test utilities for dieta integration tests.
//!
//! Provides:
//! - **Temporary databases**: a fresh, migrated SQLite file per test, living
//!   in its own temp directory that is removed when the [`TestDb`] drops.
//! - **A mock generation service**: an axum server on an ephemeral port that
//!   answers `POST /create` with a scripted reply and records every request.
//! - **Fixtures**: JSON payloads for a profile and a plan.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use dieta_db::config::DbConfig;
use dieta_db::pool;

// ---------------------------------------------------------------------------
// Temporary databases
// ---------------------------------------------------------------------------

/// A migrated SQLite database inside a temporary directory.
pub struct TestDb {
    pub pool: SqlitePool,
    pub config: DbConfig,
    /// Held so the directory outlives the pool.
    _dir: TempDir,
}

impl TestDb {
    /// Open a second, independent pool on the same database file.
    ///
    /// Used to simulate a process restart.
    pub async fn reopen(&self) -> SqlitePool {
        pool::open(&self.config)
            .await
            .expect("reopening the test database should succeed")
    }
}

/// Create a temporary database with migrations applied.
pub async fn create_test_db() -> TestDb {
    let dir = TempDir::new().expect("failed to create temp dir for test database");
    let config = DbConfig::for_path(dir.path().join("dieta_test.db"));

    let pool = pool::open(&config)
        .await
        .unwrap_or_else(|e| panic!("failed to open test database: {e:#}"));

    TestDb {
        pool,
        config,
        _dir: dir,
    }
}

// ---------------------------------------------------------------------------
// Mock generation service
// ---------------------------------------------------------------------------

/// What the mock service answers to `POST /create`.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// 200 with `{"data": <plan>}`.
    Plan(Value),
    /// Arbitrary status and raw body.
    Raw(StatusCode, String),
}

#[derive(Clone)]
struct MockState {
    reply: Arc<Mutex<MockReply>>,
    requests: Arc<Mutex<Vec<Value>>>,
}

/// A running mock generation service. Shuts down on drop.
pub struct MockGenerationServer {
    pub base_url: String,
    state: MockState,
    handle: JoinHandle<()>,
}

impl MockGenerationServer {
    /// Start the server on `127.0.0.1` with an ephemeral port.
    pub async fn start(reply: MockReply) -> Self {
        let state = MockState {
            reply: Arc::new(Mutex::new(reply)),
            requests: Arc::new(Mutex::new(Vec::new())),
        };

        let app = Router::new()
            .route("/create", post(create))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("failed to bind mock generation server");
        let addr = listener
            .local_addr()
            .expect("mock server should have a local address");

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    /// Replace the scripted reply for subsequent requests.
    pub fn set_reply(&self, reply: MockReply) {
        *self.state.reply.lock().unwrap() = reply;
    }

    /// Every request body received so far, in arrival order.
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }
}

impl Drop for MockGenerationServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    state.requests.lock().unwrap().push(body);
    let reply = state.reply.lock().unwrap().clone();
    match reply {
        MockReply::Plan(plan) => Json(json!({ "data": plan })).into_response(),
        MockReply::Raw(status, body) => (status, body).into_response(),
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Profile fields as the generation service expects them.
pub fn sample_profile_json() -> Value {
    json!({
        "name": "Ana",
        "age": "29",
        "gender": "Feminino",
        "height": "1.65",
        "weight": "62",
        "objective": "Perder peso",
        "level": "Moderadamente ativo"
    })
}

/// A plan in the service's wire encoding.
pub fn sample_plan_json() -> Value {
    json!({
        "nome": "Ana",
        "objetivo": "Perder peso",
        "refeicoes": [
            {
                "nome": "Café da manhã",
                "horario": "08:00",
                "alimentos": ["2 ovos cozidos", "1 fatia de pão integral", "Café sem açúcar"]
            },
            {
                "nome": "Almoço",
                "horario": "12:30",
                "alimentos": ["Arroz integral", "Frango grelhado", "Salada verde"]
            },
            {
                "nome": "Jantar",
                "horario": "19:30",
                "alimentos": ["Omelete", "Legumes cozidos"]
            }
        ],
        "suplementos": ["Whey protein", "Creatina"]
    })
}

/// A second, distinguishable plan.
pub fn alternate_plan_json() -> Value {
    json!({
        "nome": "Ana (antiga)",
        "objetivo": "Hipertrofia",
        "refeicoes": [
            {
                "nome": "Lanche",
                "horario": "16:00",
                "alimentos": ["Iogurte", "Granola"]
            }
        ],
        "suplementos": ["Creatina"]
    })
}
