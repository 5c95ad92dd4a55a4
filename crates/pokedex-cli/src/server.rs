//! Read-only HTTP query service.
//!
//! Loads the dataset once, then answers `/collection` lookups from an
//! immutable in-memory catalog shared by every connection task.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use tokio::net::TcpListener;

use pokedex_catalog::{load_path, Catalog, LoadSummary};

#[derive(Debug, Clone)]
pub(crate) struct ServerConfig {
    pub(crate) listen: SocketAddr,
    pub(crate) data: PathBuf,
    pub(crate) ready_file: Option<PathBuf>,
}

struct ServerState {
    config: ServerConfig,
    catalog: Arc<Catalog>,
    source_label: String,
    summary: LoadSummary,
    loaded_at_unix_secs: u64,
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

pub(crate) fn cmd_serve(args: crate::ServeArgs) -> Result<()> {
    let config = ServerConfig {
        listen: args.listen,
        data: args.data.data,
        ready_file: args.ready_file,
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to initialize tokio runtime: {e}"))?;

    rt.block_on(async move { serve_async(config).await })
}

async fn serve_async(config: ServerConfig) -> Result<()> {
    let loaded = tokio::task::spawn_blocking({
        let data = config.data.clone();
        move || load_path(&data)
    })
    .await
    .map_err(|e| anyhow!("serve: failed to join loader task: {e}"))??;

    let state = Arc::new(ServerState {
        config: config.clone(),
        catalog: Arc::new(loaded.catalog),
        source_label: loaded.source.label(),
        summary: loaded.summary,
        loaded_at_unix_secs: now_unix_secs(),
    });

    let listener = TcpListener::bind(config.listen)
        .await
        .map_err(|e| anyhow!("serve: failed to bind {}: {e}", config.listen))?;
    let bound = listener
        .local_addr()
        .map_err(|e| anyhow!("serve: failed to read bound addr: {e}"))?;

    tracing::info!(
        addr = %bound,
        records = state.catalog.len(),
        source = %state.source_label,
        "listening on http://{bound}"
    );
    if let Some(path) = config.ready_file.as_ref() {
        if let Err(e) = write_ready_file(path, bound) {
            tracing::warn!(path = %path.display(), error = %e, "failed to write ready file");
        }
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => accepted
                .map_err(|e| anyhow!("serve: accept failed: {e}"))?,
            _ = &mut shutdown => {
                tracing::info!("shutting down");
                return Ok(());
            }
        };
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle_request(req, state.clone()));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::warn!(peer = %peer, error = %e, "connection error");
            }
        });
    }
}

/// Written atomically so a watcher never reads half a file.
fn write_ready_file(path: &Path, bound: SocketAddr) -> Result<()> {
    let payload = serde_json::json!({
        "version": "pokedex_server_ready_v1",
        "addr": bound.to_string(),
        "pid": std::process::id(),
    });
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, serde_json::to_string_pretty(&payload)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<ServerState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    tracing::debug!(%method, %path, "request");

    let resp = if method == Method::GET {
        route(&state, &path)
    } else {
        let mut resp = json_error(StatusCode::METHOD_NOT_ALLOWED, "only GET is supported");
        resp.headers_mut().insert(ALLOW, HeaderValue::from_static("GET"));
        resp
    };

    Ok(resp)
}

fn route(state: &ServerState, path: &str) -> Response<Full<Bytes>> {
    match path {
        "/healthz" => text_response(StatusCode::OK, "ok\n"),
        "/status" => json_response(StatusCode::OK, &status_payload(state)),
        "/collection" | "/collection/" => json_response(StatusCode::OK, &state.catalog.list_all()),
        _ => match path.strip_prefix("/collection/") {
            Some(rest) => collection_route(&state.catalog, rest),
            None => json_error(StatusCode::NOT_FOUND, &format!("no route for {path}")),
        },
    }
}

fn collection_route(catalog: &Catalog, rest: &str) -> Response<Full<Bytes>> {
    if let Some(raw) = rest.strip_prefix("search/") {
        return match percent_decode_str(raw).decode_utf8() {
            Ok(query) => json_response(StatusCode::OK, &catalog.search(&query)),
            Err(_) => json_error(StatusCode::BAD_REQUEST, "search query is not valid UTF-8"),
        };
    }

    if let Some(raw) = rest.strip_prefix("random/") {
        return match raw.parse::<usize>() {
            Ok(count) => json_response(
                StatusCode::OK,
                &catalog.random_sample(count, &mut rand::thread_rng()),
            ),
            Err(_) => json_error(
                StatusCode::BAD_REQUEST,
                &format!("invalid count `{raw}` (expected a non-negative integer)"),
            ),
        };
    }

    if rest.contains('/') || rest == "search" || rest == "random" {
        return json_error(StatusCode::NOT_FOUND, &format!("no route for /collection/{rest}"));
    }

    match rest.parse::<u32>() {
        Ok(id) if id > 0 => match catalog.get(id) {
            Some(record) => json_response(StatusCode::OK, record),
            None => json_error(StatusCode::NOT_FOUND, &format!("record {id} not found")),
        },
        _ => json_error(
            StatusCode::BAD_REQUEST,
            &format!("invalid id `{rest}` (expected a positive integer)"),
        ),
    }
}

fn status_payload(state: &ServerState) -> serde_json::Value {
    serde_json::json!({
        "version": "pokedex_server_status_v1",
        "listen": state.config.listen.to_string(),
        "dataset": {
            "label": state.source_label,
            "path": state.config.data.display().to_string(),
            "records": state.catalog.len(),
            "loaded": state.summary.loaded,
            "skipped": state.summary.skipped,
            "corrected_totals": state.summary.corrected_totals,
            "loaded_at_unix_secs": state.loaded_at_unix_secs,
        },
    })
}

fn text_response(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"internal error"))))
}

fn json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{\"error\":\"serialize\"}".to_vec());
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"{\"error\":\"internal\"}"))))
}

fn json_error(status: StatusCode, msg: &str) -> Response<Full<Bytes>> {
    let v = serde_json::json!({ "error": msg });
    json_response(status, &v)
}
