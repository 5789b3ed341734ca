//! Minimal HTTP server for exercising the Fill client and the CLI end to end.
//!
//! An axum app on its own runtime thread answers every request from a table
//! of canned responses keyed by path. Unknown paths get a 404 and anything
//! but `GET` a 405. Usable from both `#[test]` and `#[tokio::test]`.

use axum::Router;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread;

type Routes = Arc<Mutex<HashMap<String, (u16, Vec<u8>)>>>;

/// Canned-response HTTP server bound to an ephemeral localhost port.
pub struct StubServer {
    addr: SocketAddr,
    routes: Routes,
}

impl StubServer {
    /// Bind and start serving.
    pub fn start() -> std::io::Result<Self> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let routes: Routes = Arc::default();
        let app = Router::new().fallback(respond).with_state(Arc::clone(&routes));

        thread::spawn(move || {
            let _ = runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener)?;
                axum::serve(listener, app).await
            });
        });

        Ok(Self {
            addr,
            routes,
        })
    }

    /// Answer `GET path` with `status` and `body`.
    #[must_use]
    pub fn route(self, path: &str, status: u16, body: impl AsRef<[u8]>) -> Self {
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path.to_string(), (status, body.as_ref().to_vec()));
        self
    }

    /// Absolute URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn respond(State(routes): State<Routes>, method: Method, uri: Uri) -> Response {
    if method != Method::GET {
        return (StatusCode::METHOD_NOT_ALLOWED, "method not allowed").into_response();
    }

    let canned = routes
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(uri.path())
        .cloned();

    match canned {
        Some((status, body)) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}
