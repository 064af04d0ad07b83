//! Mutating admission webhook server
//!
//! Serves `POST /pods` for the API server and `GET /healthz` for probes, over
//! TLS when a certificate is configured.

pub mod handler;
pub mod manifest;
pub mod tls;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{error, info, warn};

use crate::config::InjectorSettings;
use crate::metrics::ADMISSION_DURATION;

/// Path the MutatingWebhookConfiguration points at
pub const PODS_PATH: &str = "/pods";

/// Largest AdmissionReview body accepted
pub const MAX_REVIEW_BYTES: usize = 3 * 1024 * 1024;

/// Shared state of the webhook handlers
#[derive(Debug)]
pub struct Context {
    pub settings: InjectorSettings,
}

impl Context {
    /// Create a new context
    pub fn new(settings: InjectorSettings) -> Arc<Self> {
        Arc::new(Self { settings })
    }
}

/// Accept connections until the listener fails
pub async fn serve(
    addr: SocketAddr,
    tls: Option<TlsAcceptor>,
    ctx: Arc<Context>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(
        "Admission webhook listening on {} ({})",
        addr,
        if tls.is_some() { "https" } else { "http" }
    );

    loop {
        let (stream, peer) = listener.accept().await?;
        let ctx = ctx.clone();
        let tls = tls.clone();

        tokio::spawn(async move {
            match tls {
                Some(acceptor) => match acceptor.accept(stream).await {
                    Ok(stream) => serve_connection(stream, ctx).await,
                    Err(e) => warn!(peer = %peer, error = %e, "TLS handshake failed"),
                },
                None => serve_connection(stream, ctx).await,
            }
        });
    }
}

async fn serve_connection<S>(stream: S, ctx: Arc<Context>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = service_fn(move |req| handle_request(req, ctx.clone()));
    if let Err(e) = http1::Builder::new()
        .serve_connection(TokioIo::new(stream), service)
        .await
    {
        error!("Error serving connection: {}", e);
    }
}

/// Route one HTTP request
async fn handle_request(
    req: Request<hyper::body::Incoming>,
    ctx: Arc<Context>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::POST, PODS_PATH) => {
            let start = Instant::now();
            let body = match read_body(req.into_body(), MAX_REVIEW_BYTES).await {
                Ok(body) => body,
                Err(status) => {
                    let reason = status.canonical_reason().unwrap_or("Bad Request");
                    return Ok(respond(status, "text/plain", reason));
                }
            };
            let review = handler::review(&body, &ctx.settings);
            ADMISSION_DURATION.observe(start.elapsed().as_secs_f64());

            match serde_json::to_vec(&review) {
                Ok(json) => respond(StatusCode::OK, "application/json", json),
                Err(e) => {
                    error!("Failed to encode admission review: {}", e);
                    respond(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "text/plain",
                        "Failed to encode admission review",
                    )
                }
            }
        }
        (&Method::GET, "/healthz") => respond(StatusCode::OK, "text/plain", "ok"),
        _ => respond(StatusCode::NOT_FOUND, "text/plain", "Not Found"),
    };

    Ok(response)
}

/// Collect a request body of at most `limit` bytes
///
/// Oversized bodies map to 413 and unreadable ones to 400.
pub async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, StatusCode>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => {
            warn!(limit, "Admission request body too large");
            Err(StatusCode::PAYLOAD_TOO_LARGE)
        }
        Err(e) => {
            warn!(error = %e, "Failed to read admission request body");
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

fn respond(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
