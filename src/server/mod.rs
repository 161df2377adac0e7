//! Development server with live reload

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use percent_encoding::percent_decode_str;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::commands::build;
use crate::Site;

const LIVE_RELOAD_PATH: &str = "/__livereload";

/// Live reload script injected into HTML pages
const LIVE_RELOAD_SCRIPT: &str = r#"<script>
(function() {
    var ws = new WebSocket((location.protocol === 'https:' ? 'wss://' : 'ws://') + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        console.log('Live reload disconnected. Attempting to reconnect...');
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
"#;

/// Server state
struct ServerState {
    dest_dir: PathBuf,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

/// Serve the output directory, rebuilding on change unless `live_reload` is off
pub async fn start(site: &Site, ip: &str, port: u16, live_reload: bool, open: bool) -> Result<()> {
    let (reload_tx, _) = broadcast::channel::<()>(16);

    let state = Arc::new(ServerState {
        dest_dir: site.dest_dir.clone(),
        reload_tx: reload_tx.clone(),
        live_reload,
    });

    let app = Router::new()
        .route(LIVE_RELOAD_PATH, get(livereload_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    if live_reload {
        println!("Live reload enabled. Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if live_reload {
        let site = site.clone();
        tokio::task::spawn_blocking(move || {
            let result = build::watch(&site, |report| {
                println!("Rebuilt: {}", report.summary());
                let _ = reload_tx.send(());
            });
            if let Err(e) = result {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Serves files, injecting the live reload script into HTML
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let Some(file_path) = resolve_path(&state.dest_dir, request.uri().path()) else {
        return (StatusCode::BAD_REQUEST, "Bad path").into_response();
    };

    let is_html = file_path
        .extension()
        .map(|ext| ext == "html" || ext == "htm")
        .unwrap_or(false);

    if is_html && state.live_reload {
        match tokio::fs::read_to_string(&file_path).await {
            Ok(content) => Html(inject_live_reload(&content)).into_response(),
            Err(_) => not_found(&state.dest_dir).await,
        }
    } else if file_path.exists() {
        let mut service = ServeDir::new(&state.dest_dir).append_index_html_on_directories(true);
        match service.try_call(request).await {
            Ok(response) => response.into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
        }
    } else {
        not_found(&state.dest_dir).await
    }
}

async fn not_found(dest_dir: &Path) -> Response {
    match tokio::fs::read_to_string(dest_dir.join("404.html")).await {
        Ok(content) => (StatusCode::NOT_FOUND, Html(content)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Map a request path onto a file under `dest_dir`.
///
/// Returns `None` for paths that try to leave it.
fn resolve_path(dest_dir: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    let relative = Path::new(decoded.trim_start_matches('/'));

    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    let candidate = dest_dir.join(relative);
    if candidate.is_dir() {
        return Some(candidate.join("index.html"));
    }
    if candidate.exists() || candidate.extension().is_some() {
        return Some(candidate);
    }

    // `/about` -> `about.html`
    let with_html = candidate.with_extension("html");
    if with_html.exists() {
        Some(with_html)
    } else {
        Some(candidate)
    }
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    match html.rfind("</body>") {
        Some(pos) => format!("{}{}{}", &html[..pos], LIVE_RELOAD_SCRIPT, &html[pos..]),
        None => format!("{}{}", html, LIVE_RELOAD_SCRIPT),
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
