//! Test fixtures for integration tests.
//!
//! Starts the full application in-process on an ephemeral port with a small
//! programmatic catalog.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::StreamExt;
use teamquiz_server::{
    Application,
    config::Config,
    domain::{User, UserId, Username},
    infrastructure::{
        auth::JwtIdentityProvider,
        repository::{InMemoryCatalog, inmemory::catalog::CatalogData},
    },
};
use tokio::{net::TcpListener, sync::oneshot};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

pub type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Members of `biology`: alice(1, host in most tests), bob(2), carol(3), dave(4).
/// mallory(9) belongs to `chemistry` only.
const CATALOG: &str = r#"{
    "users": [
        {"id": 1, "username": "alice"},
        {"id": 2, "username": "bob"},
        {"id": 3, "username": "carol"},
        {"id": 4, "username": "dave"},
        {"id": 9, "username": "mallory"}
    ],
    "groups": [
        {"name": "biology", "members": [1, 2, 3, 4]},
        {"name": "chemistry", "members": [9]}
    ],
    "subjects": [
        {"id": 1, "name": "Cells", "group": "biology", "flashcards": [
            {"id": 1, "question": "Powerhouse of the cell?", "answers": [
                {"id": 11, "text": "Mitochondria", "is_correct": true},
                {"id": 12, "text": "Nucleus", "is_correct": false},
                {"id": 13, "text": "Ribosome", "is_correct": false},
                {"id": 14, "text": "Golgi", "is_correct": false}
            ]},
            {"id": 2, "question": "Site of photosynthesis?", "answers": [
                {"id": 21, "text": "Vacuole", "is_correct": false},
                {"id": 22, "text": "Chloroplast", "is_correct": true},
                {"id": 23, "text": "Lysosome", "is_correct": false},
                {"id": 24, "text": "Centriole", "is_correct": false}
            ]},
            {"id": 3, "question": "Controls what enters the cell?", "answers": [
                {"id": 31, "text": "Cell wall", "is_correct": false},
                {"id": 32, "text": "Cytoskeleton", "is_correct": false},
                {"id": 33, "text": "Cell membrane", "is_correct": true},
                {"id": 34, "text": "Nucleolus", "is_correct": false}
            ]}
        ]},
        {"id": 2, "name": "Empty", "group": "biology", "flashcards": []}
    ]
}"#;

/// Correct answer id of each card in the `Cells` deck.
pub const CELLS_CORRECT: [(i64, i64); 3] = [(1, 11), (2, 22), (3, 33)];

pub struct TestServer {
    addr: SocketAddr,
    identity: Arc<JwtIdentityProvider>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let config = Config::load_for_test(&[("server.port", "0")]).expect("config");
        let data: CatalogData = serde_json::from_str(CATALOG).expect("catalog json");
        let app = Application::build(&config, InMemoryCatalog::from_data(data));
        let identity = app.identity.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = app
                .serve(listener, async move {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            addr,
            identity,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self, token: &str) -> String {
        format!("ws://{}/ws/{}", self.addr, token)
    }

    pub fn token(&self, id: i64, name: &str) -> String {
        let user = User::new(UserId::new(id), Username::new(name.to_string()).expect("username"));
        self.identity.issue_token(&user).expect("token")
    }

    pub fn client(&self, id: i64, name: &str) -> ApiClient {
        ApiClient {
            base_url: self.base_url(),
            token: self.token(id, name),
            http: reqwest::Client::new(),
        }
    }

    pub async fn connect_ws(&self, id: i64, name: &str) -> WsClient {
        let (ws, _) = tokio_tungstenite::connect_async(self.ws_url(&self.token(id, name)))
            .await
            .expect("websocket connect");
        ws
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Authenticated HTTP client for one user.
pub struct ApiClient {
    base_url: String,
    pub token: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()
            .await
            .expect("request")
    }

    pub async fn post(&self, path: &str, body: serde_json::Value) -> reqwest::Response {
        self.http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .expect("request")
    }

    pub async fn post_empty(&self, path: &str) -> reqwest::Response {
        self.http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()
            .await
            .expect("request")
    }

    /// Create a `Cells` lobby in `biology` and return its session id and join code.
    pub async fn create_cells_lobby(&self) -> (String, String) {
        let response = self
            .post(
                "/lobby/create",
                serde_json::json!({"subject_name": "Cells", "group_name": "biology"}),
            )
            .await;
        assert_eq!(response.status(), 201);
        let body: serde_json::Value = response.json().await.expect("json");
        (
            body["session"]["id"].as_str().expect("id").to_string(),
            body["session"]["join_code"].as_str().expect("code").to_string(),
        )
    }
}

/// Read frames until one with `type == kind` arrives.
pub async fn next_event(ws: &mut WsClient, kind: &str) -> serde_json::Value {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let frame = ws.next().await.expect("stream ended").expect("websocket error");
            if let Message::Text(text) = frame {
                let value: serde_json::Value = serde_json::from_str(text.as_str()).expect("json frame");
                if value["type"] == kind {
                    return value;
                }
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {kind}"))
}

/// Collect every JSON frame up to and including the first one of `kind`.
pub async fn events_until(ws: &mut WsClient, kind: &str) -> Vec<serde_json::Value> {
    tokio::time::timeout(Duration::from_secs(5), async {
        let mut seen = Vec::new();
        loop {
            let frame = ws.next().await.expect("stream ended").expect("websocket error");
            if let Message::Text(text) = frame {
                let value: serde_json::Value = serde_json::from_str(text.as_str()).expect("json frame");
                let done = value["type"] == kind;
                seen.push(value);
                if done {
                    return seen;
                }
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {kind}"))
}
