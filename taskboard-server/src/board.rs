//! Board server core: shared state, WebSocket handler, connection registry,
//! and intent routing.
//!
//! The board server accepts WebSocket connections, hands each new observer
//! the full current task collection, and applies incoming intents against
//! the authoritative [`TaskStore`]. Every successful mutation is broadcast
//! as a fact to all connected observers, including the originator; failures
//! are reported to the originating connection only.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Json;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use futures_util::{SinkExt, StreamExt};
use taskboard_proto::codec;
use taskboard_proto::protocol::{ClientIntent, ServerFact};
use taskboard_proto::task::Task;
use tokio::sync::{Mutex, RwLock, mpsc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::store::{StoreError, TaskStore};
use crate::uploads::AttachmentStore;

/// Identifier for a single WebSocket connection, assigned at upgrade time.
pub type ConnId = u64;

/// Shared board state holding the connection registry, the authoritative
/// task store, and the attachment intake.
pub struct BoardState {
    /// Maps connection id to a channel sender for delivering facts.
    connections: RwLock<HashMap<ConnId, mpsc::UnboundedSender<Message>>>,
    /// Authoritative task collection. The lock is held across mutation and
    /// fact fan-out so observers see facts in mutation order.
    store: Mutex<TaskStore>,
    /// Blob area for uploaded attachments.
    uploads: AttachmentStore,
    /// Source of connection ids.
    next_conn_id: AtomicU64,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardState {
    /// Creates board state with an empty store and the default `uploads`
    /// blob directory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_uploads(AttachmentStore::new("uploads"))
    }

    /// Creates board state with a custom attachment intake.
    #[must_use]
    pub fn with_uploads(uploads: AttachmentStore) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            store: Mutex::new(TaskStore::new()),
            uploads,
            next_conn_id: AtomicU64::new(1),
        }
    }

    /// The attachment intake for this board.
    #[must_use]
    pub const fn uploads(&self) -> &AttachmentStore {
        &self.uploads
    }

    /// Reserves the next connection id.
    fn next_conn_id(&self) -> ConnId {
        self.next_conn_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Registers a connection, storing the sender half of its fact channel.
    pub async fn register(&self, conn_id: ConnId, sender: mpsc::UnboundedSender<Message>) {
        let mut conns = self.connections.write().await;
        conns.insert(conn_id, sender);
    }

    /// Removes a connection from the registry. In-flight facts already
    /// queued on its channel are dropped with it; reconnecting clients are
    /// caught up by the full-collection sync instead.
    pub async fn unregister(&self, conn_id: ConnId) {
        let mut conns = self.connections.write().await;
        conns.remove(&conn_id);
    }

    /// Number of currently registered connections.
    pub async fn connection_count(&self) -> usize {
        let conns = self.connections.read().await;
        conns.len()
    }

    /// Returns a snapshot of the full task collection in insertion order.
    pub async fn tasks_snapshot(&self) -> Vec<Task> {
        let store = self.store.lock().await;
        store.list_all().to_vec()
    }

    /// Applies one client intent to the store and fans out the result.
    ///
    /// The store lock is held for the whole call, so intents are applied
    /// one at a time and their facts are broadcast in apply order. A failed
    /// intent leaves the store untouched and produces an error fact for the
    /// originator only.
    pub async fn apply_intent(&self, origin: ConnId, intent: ClientIntent) {
        let mut store = self.store.lock().await;
        match intent {
            ClientIntent::Create(draft) => {
                let task = store.create(draft).clone();
                tracing::info!(task_id = task.id.get(), title = %task.title, "task created");
                self.broadcast(&ServerFact::Created(task)).await;
            }
            ClientIntent::Update(patch) => {
                let id = patch.id;
                match store.update(patch) {
                    Ok(task) => {
                        let task = task.clone();
                        tracing::info!(task_id = id.get(), "task updated");
                        self.broadcast(&ServerFact::Updated(task)).await;
                    }
                    Err(e) => self.report_failure(origin, &e).await,
                }
            }
            ClientIntent::Move {
                task_id,
                new_status,
            } => match store.move_task(task_id, new_status) {
                Ok((task_id, new_status)) => {
                    tracing::info!(task_id = task_id.get(), status = %new_status, "task moved");
                    self.broadcast(&ServerFact::Moved {
                        task_id,
                        new_status,
                    })
                    .await;
                }
                Err(e) => self.report_failure(origin, &e).await,
            },
            ClientIntent::Delete(id) => match store.delete(id) {
                Ok(id) => {
                    tracing::info!(task_id = id.get(), "task deleted");
                    self.broadcast(&ServerFact::Deleted(id)).await;
                }
                Err(e) => self.report_failure(origin, &e).await,
            },
        }
    }

    /// Clears the store, rewinds the id counter, and broadcasts the empty
    /// collection so every observer converges on the clean state.
    pub async fn reset_board(&self) {
        let mut store = self.store.lock().await;
        store.reset();
        tracing::info!("board reset");
        self.broadcast(&ServerFact::Sync(Vec::new())).await;
    }

    /// Sends a fact to every registered connection.
    ///
    /// Sends to connections whose channel has closed are dropped silently;
    /// the reader side unregisters them on disconnect.
    async fn broadcast(&self, fact: &ServerFact) {
        let text = match codec::encode_fact(fact) {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode fact for broadcast");
                return;
            }
        };
        let conns = self.connections.read().await;
        for sender in conns.values() {
            let _ = sender.send(Message::Text(text.clone().into()));
        }
    }

    /// Sends a fact to a single registered connection.
    async fn send_to(&self, conn_id: ConnId, fact: &ServerFact) {
        let text = match codec::encode_fact(fact) {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode fact");
                return;
            }
        };
        let conns = self.connections.read().await;
        if let Some(sender) = conns.get(&conn_id) {
            let _ = sender.send(Message::Text(text.into()));
        }
    }

    /// Reports a failed intent to its originator. Nothing is broadcast, so
    /// other observers' views stay untouched.
    async fn report_failure(&self, origin: ConnId, error: &StoreError) {
        tracing::warn!(conn_id = origin, error = %error, "intent rejected");
        self.send_to(
            origin,
            &ServerFact::Error {
                message: error.to_string(),
            },
        )
        .await;
    }
}

/// Handles an upgraded WebSocket connection for a single observer.
///
/// The connection lifecycle:
/// 1. Assign a connection id and register a fact channel.
/// 2. Send the full current task collection as the point-to-point sync fact.
/// 3. Enter the message loop, applying intents as they arrive.
/// 4. On disconnect, unregister. No store mutation occurs on disconnect.
pub async fn handle_socket(socket: WebSocket, state: Arc<BoardState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let conn_id = state.next_conn_id();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    state.register(conn_id, tx).await;

    tracing::info!(conn_id, "observer connected");

    // Hand the new observer the authoritative collection before any
    // broadcast fact reaches it through the channel.
    let sync = ServerFact::Sync(state.tasks_snapshot().await);
    if let Err(e) = send_fact(&mut ws_sender, &sync).await {
        tracing::error!(conn_id, error = %e, "failed to send initial sync");
        state.unregister(conn_id).await;
        return;
    }

    // Writer task: forwards facts from the channel to the WebSocket.
    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                tracing::warn!(conn_id, "WebSocket write failed");
                break;
            }
        }
    });

    // Reader loop: decode and apply intents from this observer.
    let reader_state = Arc::clone(&state);
    let mut read_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Text(text) => {
                    handle_text_message(conn_id, text.as_str(), &reader_state).await;
                }
                Message::Close(_) => {
                    tracing::info!(conn_id, "received close frame");
                    break;
                }
                _ => {
                    // Ignore binary, ping, pong frames.
                }
            }
        }
    });

    // Wait for either task to finish, then abort the other.
    tokio::select! {
        _ = &mut read_task => {
            write_task.abort();
        }
        _ = &mut write_task => {
            read_task.abort();
        }
    }

    state.unregister(conn_id).await;
    tracing::info!(conn_id, "observer disconnected and unregistered");
}

/// Handles one text frame from a connected observer.
///
/// Frames that do not decode to an intent are reported back to the sender
/// as an error fact; the store is untouched and nothing is broadcast.
async fn handle_text_message(conn_id: ConnId, text: &str, state: &Arc<BoardState>) {
    match codec::decode_intent(text) {
        Ok(intent) => state.apply_intent(conn_id, intent).await,
        Err(e) => {
            tracing::warn!(conn_id, error = %e, "failed to decode intent");
            state
                .send_to(
                    conn_id,
                    &ServerFact::Error {
                        message: format!("malformed intent: {e}"),
                    },
                )
                .await;
        }
    }
}

/// Encodes and sends a fact directly on a WebSocket sender.
async fn send_fact(
    ws_sender: &mut (impl SinkExt<Message, Error = axum::Error> + Unpin),
    fact: &ServerFact,
) -> Result<(), String> {
    let text = codec::encode_fact(fact).map_err(|e| e.to_string())?;
    ws_sender
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| format!("WebSocket send error: {e}"))
}

/// Builds the board's HTTP router: the WebSocket endpoint, the upload and
/// reset side endpoints, and static retrieval of the uploads blob area.
#[must_use]
pub fn router(state: Arc<BoardState>) -> axum::Router {
    // CORS is wide open: the board is served to browser clients on other
    // origins during development.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // The request body cap sits above the intake's own size check so an
    // oversized upload gets the intake's 400, not a framework 413.
    let body_limit = usize::try_from(state.uploads().max_size().saturating_mul(2))
        .unwrap_or(usize::MAX);

    axum::Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/upload", post(upload_handler))
        .route("/api/reset", post(reset_handler))
        .nest_service("/uploads", ServeDir::new(state.uploads().root()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// axum handler that upgrades an HTTP request to a WebSocket connection.
async fn ws_handler(
    ws: axum::extract::ws::WebSocketUpgrade,
    State(state): State<Arc<BoardState>>,
) -> impl axum::response::IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// `POST /api/upload`: accepts a multipart form with a `file` field,
/// validates and persists it, and returns the attachment descriptor.
async fn upload_handler(
    State(state): State<Arc<BoardState>>,
    mut multipart: Multipart,
) -> (StatusCode, Json<serde_json::Value>) {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "malformed multipart request");
                return bad_request("No file uploaded");
            }
        };
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read upload body");
                return bad_request("No file uploaded");
            }
        };

        return match state.uploads().save(&filename, &content_type, &data).await {
            Ok(attachment) => (StatusCode::OK, Json(serde_json::json!(attachment))),
            Err(e) if e.is_rejection() => bad_request(&e.to_string()),
            Err(e) => {
                tracing::error!(error = %e, "failed to persist upload");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "upload failed" })),
                )
            }
        };
    }
    bad_request("No file uploaded")
}

/// `POST /api/reset`: clears the store and resyncs every observer.
async fn reset_handler(State(state): State<Arc<BoardState>>) -> Json<serde_json::Value> {
    state.reset_board().await;
    Json(serde_json::json!({ "message": "Tasks reset" }))
}

fn bad_request(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
}

/// Starts the board server on the given address and returns the bound
/// address and a join handle.
///
/// This is the primary entry point used by both `main.rs` and test code.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(BoardState::new())).await
}

/// Starts the board server with a pre-configured [`BoardState`].
///
/// Use [`BoardState::with_uploads`] to point the intake at the uploads
/// directory resolved from [`crate::config::BoardConfig`].
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<BoardState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "board server error");
        }
    });

    Ok((bound_addr, handle))
}
