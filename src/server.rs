//! HTTP surface
//!
//! `GET /` is a liveness probe and `GET /query?q=...` answers one question.
//! Every response, whatever the route or outcome, carries the contact header
//! and (unless disabled) permissive CORS headers.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::{ServerConfig, CONTACT_HEADER};
use crate::query::QueryDispatcher;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    #[error("invalid contact header value '{0}'")]
    InvalidHeader(String),
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Serves the question endpoint over HTTP/1.1.
#[derive(Debug, Clone)]
pub struct QueryServer {
    config: Arc<ServerConfig>,
    contact: HeaderValue,
    dispatcher: Arc<QueryDispatcher>,
}

impl QueryServer {
    pub fn new(config: ServerConfig, dispatcher: Arc<QueryDispatcher>) -> Result<Self, ServerError> {
        let contact = HeaderValue::from_str(&config.contact)
            .map_err(|_| ServerError::InvalidHeader(config.contact.clone()))?;
        Ok(Self {
            config: Arc::new(config),
            contact,
            dispatcher,
        })
    }

    /// Bind the configured address and serve until the task is cancelled
    pub async fn start(&self) -> Result<(), ServerError> {
        let addr = self.config.addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindFailed(addr, e))?;

        self.serve(listener).await
    }

    /// Serve connections from an already bound listener.
    ///
    /// A failed `accept` only drops that connection; the loop keeps serving.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        if let Ok(addr) = listener.local_addr() {
            info!("listening on {}", addr);
        }

        loop {
            let (stream, remote_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("failed to accept connection: {}", e);
                    tokio::task::yield_now().await;
                    continue;
                }
            };
            let io = TokioIo::new(stream);
            let server = self.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                    let server = server.clone();
                    async move { Ok::<_, Infallible>(server.handle(&req)) }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    warn!("HTTP connection error from {}: {}", remote_addr, e);
                }
            });
        }
    }

    /// Route one request and decorate the response with the shared headers
    pub fn handle<B>(&self, req: &Request<B>) -> Response<Full<Bytes>> {
        let method = req.method();
        let path = req.uri().path();
        debug!(%method, path, "request");

        let mut response = match (method, path) {
            (&Method::OPTIONS, _) => preflight_response(),
            (&Method::GET, "/") => {
                json_response(StatusCode::OK, json!({ "message": "API is running." }))
            }
            (&Method::GET, "/query") => self.handle_query(req.uri().query().unwrap_or("")),
            (_, "/") | (_, "/query") => json_response(
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "detail": "Method Not Allowed" }),
            ),
            _ => json_response(StatusCode::NOT_FOUND, json!({ "detail": "Not Found" })),
        };

        if self.config.enable_cors {
            cors_headers(&mut response);
        }
        response
            .headers_mut()
            .insert(HeaderName::from_static(CONTACT_HEADER), self.contact.clone());

        response
    }

    fn handle_query(&self, query: &str) -> Response<Full<Bytes>> {
        let params = parse_query_params(query);
        match params.get("q") {
            Some(question) => {
                let body = self.dispatcher.respond(question);
                json_response(
                    StatusCode::OK,
                    serde_json::to_value(body).unwrap_or_else(|_| json!({ "answer": null })),
                )
            }
            None => json_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "detail": [{
                        "type": "missing",
                        "loc": ["query", "q"],
                        "msg": "Field required",
                        "input": null,
                    }]
                }),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn json_response(status: StatusCode, body: serde_json::Value) -> Response<Full<Bytes>> {
    let json = serde_json::to_vec(&body).unwrap_or_default();
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"{}"))))
}

fn preflight_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(b"OK")));
    response.headers_mut().insert(
        "Access-Control-Max-Age",
        HeaderValue::from_static("600"),
    );
    response
}

fn cors_headers(response: &mut Response<Full<Bytes>>) {
    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert("Access-Control-Allow-Methods", HeaderValue::from_static("*"));
    headers.insert("Access-Control-Allow-Headers", HeaderValue::from_static("*"));
}

// ---------------------------------------------------------------------------
// Query string parsing
// ---------------------------------------------------------------------------

/// Parse URL query parameters; keys and values are form-decoded and later
/// duplicates win.
fn parse_query_params(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let value = parts.next().unwrap_or("");
            Some((form_decode(key), form_decode(value)))
        })
        .collect()
}

fn form_decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| spaced.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{SalesRecord, SalesTable};
    use http_body_util::BodyExt;

    fn server(enable_cors: bool) -> QueryServer {
        let table = SalesTable::from_records(vec![
            SalesRecord::new("salad", "east erichburgh", "alabama", "a", 50.0, "2024-01-01"),
            SalesRecord::new("salad", "east erichburgh", "alabama", "b", 30.0, "2024-01-02"),
        ])
        .unwrap();
        let config = ServerConfig {
            enable_cors,
            ..ServerConfig::default()
        };
        QueryServer::new(config, Arc::new(QueryDispatcher::new(Arc::new(table)))).unwrap()
    }

    fn get(uri: &str) -> Request<()> {
        Request::builder().uri(uri).body(()).unwrap()
    }

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_parse_query_params() {
        let params = parse_query_params("q=total+sales%20of%20salad&x=1&q=last");
        assert_eq!(params.get("q").map(String::as_str), Some("last"));
        assert_eq!(params.get("x").map(String::as_str), Some("1"));

        let params = parse_query_params("q=What%20is%20the%20total%3F");
        assert_eq!(params.get("q").map(String::as_str), Some("What is the total?"));
        assert!(parse_query_params("").is_empty());
    }

    #[test]
    fn test_form_decode_keeps_invalid_escapes() {
        assert_eq!(form_decode("a+b"), "a b");
        assert_eq!(form_decode("%FF%FE"), "%FF%FE");
    }

    #[tokio::test]
    async fn test_query_endpoint() {
        let server = server(true);
        let response =
            server.handle(&get("/query?q=What+is+the+total+sales+of+salad+in+East+Erichburgh%3F"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "answer": 80 }));

        let response = server.handle(&get("/query?q=xyzzy"));
        assert_eq!(
            body_json(response).await,
            json!({ "answer": "Question not recognized" })
        );
    }

    #[tokio::test]
    async fn test_missing_question_is_unprocessable() {
        let response = server(true).handle(&get("/query"));
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["detail"][0]["loc"], json!(["query", "q"]));
    }

    #[tokio::test]
    async fn test_root_and_unknown_routes() {
        let server = server(true);
        let response = server.handle(&get("/"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "message": "API is running." }));

        let response = server.handle(&get("/nope"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let post = Request::builder().method(Method::POST).uri("/query").body(()).unwrap();
        assert_eq!(server.handle(&post).status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_every_response_carries_contact_header() {
        let server = server(false);
        for uri in ["/", "/query?q=x", "/query", "/missing"] {
            let response = server.handle(&get(uri));
            assert_eq!(
                response.headers().get(CONTACT_HEADER).unwrap(),
                crate::config::DEFAULT_CONTACT
            );
            assert!(!response.headers().contains_key("Access-Control-Allow-Origin"));
        }
    }

    #[test]
    fn test_cors_headers_and_preflight() {
        let server = server(true);
        let response = server.handle(&get("/query?q=x"));
        assert_eq!(response.headers().get("Access-Control-Allow-Origin").unwrap(), "*");

        let preflight = Request::builder()
            .method(Method::OPTIONS)
            .uri("/query")
            .body(())
            .unwrap();
        let response = server.handle(&preflight);
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("Access-Control-Allow-Methods"));
        assert!(response.headers().contains_key(CONTACT_HEADER));
    }

    #[test]
    fn test_invalid_contact_is_rejected() {
        let config = ServerConfig {
            contact: "bad\nvalue".to_string(),
            ..ServerConfig::default()
        };
        let dispatcher = Arc::new(QueryDispatcher::new(Arc::new(SalesTable::empty())));
        assert!(matches!(
            QueryServer::new(config, dispatcher),
            Err(ServerError::InvalidHeader(_))
        ));
    }
}
