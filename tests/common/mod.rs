//! In-process HTTP server standing in for issuu and the Telegram Bot API.
//!
//! Responses are registered per path; every request is recorded so tests
//! can assert on what was sent.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use issuu2pdf::FetcherConfig;
use std::collections::HashMap;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
struct Route {
    status: u16,
    body: Vec<u8>,
    delay: Duration,
}

#[derive(Clone, Default)]
struct MockState {
    routes: Arc<Mutex<HashMap<String, Route>>>,
    requests: Arc<Mutex<Vec<(String, Bytes)>>>,
}

pub struct MockServer {
    pub addr: SocketAddr,
    state: MockState,
}

async fn respond(State(state): State<MockState>, uri: Uri, body: Bytes) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().unwrap().push((path.clone(), body));

    let route = state.routes.lock().unwrap().get(&path).cloned();
    match route {
        Some(route) => {
            if !route.delay.is_zero() {
                tokio::time::sleep(route.delay).await;
            }
            let status = StatusCode::from_u16(route.status).unwrap();
            (status, route.body).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Route library logs through the test harness; `RUST_LOG` overrides the
/// default `warn`. Safe to call from every test.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

impl MockServer {
    /// Bind to an ephemeral port on the current runtime.
    pub async fn start() -> Self {
        init_logging();
        let state = MockState::default();
        let app = Router::new().fallback(respond).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Config pointing both the manifest and image fetches at this server.
    pub fn fetcher_config(&self) -> FetcherConfig {
        self.fetcher_builder().build().unwrap()
    }

    pub fn fetcher_builder(&self) -> issuu2pdf::FetcherConfigBuilder {
        FetcherConfig::builder()
            .manifest_base_url(self.base_url())
            .image_scheme("http")
            .timeout_secs(5)
    }

    pub fn route(&self, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.route_delayed(path, status, body, Duration::ZERO);
    }

    pub fn route_delayed(&self, path: &str, status: u16, body: impl Into<Vec<u8>>, delay: Duration) {
        self.state.routes.lock().unwrap().insert(
            path.to_string(),
            Route {
                status,
                body: body.into(),
                delay,
            },
        );
    }

    /// Scheme-less image location as the reader's manifest lists it.
    pub fn image_uri(&self, name: &str) -> String {
        format!("{}/img/{}", self.addr, name)
    }

    /// Serve a JPEG of the given size at [`Self::image_uri`]`(name)`.
    pub fn image(&self, name: &str, width: u32, height: u32) -> String {
        self.route(&format!("/img/{name}"), 200, jpeg(width, height));
        self.image_uri(name)
    }

    /// Serve a manifest for `owner/document_id`; `None` entries have no `imageUri`.
    pub fn manifest(&self, owner: &str, document_id: &str, pages: &[Option<String>]) {
        let pages: Vec<serde_json::Value> = pages
            .iter()
            .map(|uri| match uri {
                Some(uri) => serde_json::json!({ "imageUri": uri, "width": 800 }),
                None => serde_json::json!({ "width": 800 }),
            })
            .collect();
        let body = serde_json::json!({ "document": { "pages": pages } });
        self.route(
            &format!("/{owner}/{document_id}/reader3_4.json"),
            200,
            body.to_string(),
        );
    }

    /// Bodies of every request made to `path`, in arrival order.
    pub fn requests_to(&self, path: &str) -> Vec<Bytes> {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .collect()
    }

    /// Paths of every request, in arrival order.
    pub fn request_paths(&self) -> Vec<String> {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([20, 90, 160])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

/// `(width, height)` of every page's MediaBox, in page order.
pub fn page_sizes(pdf: &[u8]) -> Vec<(i64, i64)> {
    let doc = lopdf::Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| {
            let media_box = doc
                .get_dictionary(id)
                .unwrap()
                .get(b"MediaBox")
                .unwrap()
                .as_array()
                .unwrap()
                .clone();
            (media_box[2].as_i64().unwrap(), media_box[3].as_i64().unwrap())
        })
        .collect()
}
