use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;

/// Serve `router` on an ephemeral localhost port; returns the base URL.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server");
    });
    format!("http://{addr}")
}

// ---------------------------------------------------------------------------
// Image host
// ---------------------------------------------------------------------------

/// Serves fixed bytes per path; anything else is a 404.
pub struct ImageHost {
    base_url: String,
    hits: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct ImageHostState {
    images: Arc<HashMap<String, Vec<u8>>>,
    hits: Arc<AtomicUsize>,
}

impl ImageHost {
    pub async fn start(images: Vec<(&str, Vec<u8>)>) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = ImageHostState {
            images: Arc::new(
                images
                    .into_iter()
                    .map(|(path, bytes)| (path.to_string(), bytes))
                    .collect(),
            ),
            hits: Arc::clone(&hits),
        };
        let router = Router::new().fallback(serve_image).with_state(state);
        Self {
            base_url: spawn(router).await,
            hits,
        }
    }

    /// Absolute URL for `path` (which must start with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn serve_image(State(state): State<ImageHostState>, uri: Uri) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    match state.images.get(uri.path()) {
        Some(bytes) => ([(CONTENT_TYPE, "image/png")], bytes.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

// ---------------------------------------------------------------------------
// Batch transform service
// ---------------------------------------------------------------------------

/// How the stub answers every batch.
#[derive(Clone)]
pub enum TransformReply {
    /// 200 with a ZIP body.
    Archive(Vec<u8>),
    /// Error status with a text body.
    Status(u16, String),
    /// 200 with arbitrary bytes.
    Raw(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct RecordedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// One multipart submission as the stub received it.
#[derive(Debug, Clone, Default)]
pub struct RecordedBatch {
    /// File parts in arrival order.
    pub files: Vec<RecordedFile>,
    /// Plain text fields in arrival order.
    pub texts: Vec<(String, String)>,
}

impl RecordedBatch {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone)]
struct TransformState {
    reply: Arc<TransformReply>,
    batches: Arc<Mutex<Vec<RecordedBatch>>>,
}

/// Local stand-in for `POST /tryon/batch`.
pub struct TransformStub {
    base_url: String,
    batches: Arc<Mutex<Vec<RecordedBatch>>>,
}

impl TransformStub {
    pub async fn start(reply: TransformReply) -> Self {
        let batches = Arc::new(Mutex::new(Vec::new()));
        let state = TransformState {
            reply: Arc::new(reply),
            batches: Arc::clone(&batches),
        };
        let router = Router::new()
            .route("/tryon/batch", post(handle_batch))
            .with_state(state);
        Self {
            base_url: spawn(router).await,
            batches,
        }
    }

    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }

    pub fn batches(&self) -> Vec<RecordedBatch> {
        self.batches.lock().expect("batches lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.batches.lock().expect("batches lock").len()
    }
}

async fn handle_batch(State(state): State<TransformState>, multipart: Multipart) -> Response {
    let batch = record_multipart(multipart).await;
    state.batches.lock().expect("batches lock").push(batch);

    match state.reply.as_ref() {
        TransformReply::Archive(bytes) => {
            ([(CONTENT_TYPE, "application/zip")], bytes.clone()).into_response()
        }
        TransformReply::Status(code, body) => (
            StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body.clone(),
        )
            .into_response(),
        TransformReply::Raw(bytes) => bytes.clone().into_response(),
    }
}

async fn record_multipart(mut multipart: Multipart) -> RecordedBatch {
    let mut batch = RecordedBatch::default();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();

        match file_name {
            Some(file_name) => batch.files.push(RecordedFile {
                field: name,
                file_name,
                content_type,
                data,
            }),
            None => batch
                .texts
                .push((name, String::from_utf8_lossy(&data).into_owned())),
        }
    }

    batch
}

// ---------------------------------------------------------------------------
// Image upload API
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct UploadState {
    secure_url: Arc<String>,
    uploads: Arc<Mutex<Vec<RecordedBatch>>>,
}

/// Local stand-in for `POST /v1_1/{cloud}/image/upload`. Every upload is
/// answered with the same `secure_url`.
pub struct UploadStub {
    base_url: String,
    uploads: Arc<Mutex<Vec<RecordedBatch>>>,
}

impl UploadStub {
    pub async fn start(secure_url: &str) -> Self {
        let uploads = Arc::new(Mutex::new(Vec::new()));
        let state = UploadState {
            secure_url: Arc::new(secure_url.to_string()),
            uploads: Arc::clone(&uploads),
        };
        let router = Router::new()
            .route("/v1_1/{cloud}/image/upload", post(handle_upload))
            .with_state(state);
        Self {
            base_url: spawn(router).await,
            uploads,
        }
    }

    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }

    /// Multipart forms received so far, in arrival order.
    pub fn uploads(&self) -> Vec<RecordedBatch> {
        self.uploads.lock().expect("uploads lock").clone()
    }
}

async fn handle_upload(State(state): State<UploadState>, multipart: Multipart) -> Response {
    let upload = record_multipart(multipart).await;
    state.uploads.lock().expect("uploads lock").push(upload);

    let body = format!(r#"{{"secure_url":"{}"}}"#, state.secure_url);
    ([(CONTENT_TYPE, "application/json")], body).into_response()
}
