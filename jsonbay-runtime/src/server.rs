//! Request gate - minimal HTTP front for a served instance
//!
//! Every request first awaits the process's memoized bootstrap, then passes
//! the auth strategy, then reads the stored document. The CRUD/GraphQL route
//! surface of the full API is layered on top of this gate elsewhere.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::auth::AUTH_HEADER;
use crate::bootstrap::Bootstrapper;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {0}: {1}")]
    Bind(SocketAddr, std::io::Error),

    #[error("Accept failed: {0}")]
    Accept(std::io::Error),
}

/// HTTP front bound to a local address
pub struct ApiServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl ApiServer {
    pub async fn bind(addr: SocketAddr) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(addr, e))?;
        let local_addr = listener.local_addr().map_err(|e| ServerError::Bind(addr, e))?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve connections until the process ends.
    pub async fn serve(self, bootstrapper: Arc<Bootstrapper>) -> Result<(), ServerError> {
        tracing::info!(addr = %self.local_addr, "listening");
        loop {
            let (stream, _) = self.listener.accept().await.map_err(ServerError::Accept)?;
            let bootstrapper = bootstrapper.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service =
                    service_fn(move |req| handle_request(bootstrapper.clone(), req));
                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::debug!("connection error: {e}");
                }
            });
        }
    }
}

async fn handle_request(
    bootstrapper: Arc<Bootstrapper>,
    req: Request<hyper::body::Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    // Gate on the memoized cold-start outcome before anything else.
    let state = match bootstrapper.ready().await {
        Ok(state) => state,
        Err(e) => {
            return Ok(text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
            ));
        }
    };

    let authorization = req
        .headers()
        .get(AUTH_HEADER)
        .and_then(|value| value.to_str().ok());
    if let Err(e) = state.auth.authorize(authorization) {
        return Ok(text_response(StatusCode::UNAUTHORIZED, e.to_string()));
    }

    if req.method() != Method::GET {
        return Ok(text_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "Only document reads are served here".to_string(),
        ));
    }

    match state.storage.read().await {
        Ok(document) => {
            let body = serde_json::to_vec(&document).unwrap_or_default();
            let response = Response::builder()
                .status(StatusCode::OK)
                .header("content-type", "application/json")
                .body(Full::new(Bytes::from(body)))
                .expect("static response parts");
            Ok(response)
        }
        Err(e) => Ok(text_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        )),
    }
}

fn text_response(status: StatusCode, message: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("content-type", "text/plain")
        .body(Full::new(Bytes::from(message)))
        .expect("static response parts")
}
