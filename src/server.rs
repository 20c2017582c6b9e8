//! HTTP front end
//!
//! Thin warp layer over an injected [`Dispatcher`]:
//!
//! - `GET /process/{text}` and `POST /process` (`{"text": ".."}`) dispatch a request
//! - `GET /agents` lists agent descriptions
//! - `GET /echo/{message}` returns the message as plain text
//! - `GET /health` reports whether a router is wired in
//! - `GET /metrics` exports dispatch metrics
//! - `GET /` lists the endpoints

use crate::dispatcher::Dispatcher;
use crate::error::{SwitchboardError, SwitchboardResult};
use crate::protocol::{Description, Request, ResponseBody};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};
use warp::http::StatusCode;
use warp::reply::Response as HttpResponse;
use warp::{Filter, Rejection, Reply};

/// Largest accepted `POST /process` body
const MAX_BODY_BYTES: u64 = 16 * 1024;

/// Body of `POST /process`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
struct AgentsResponse {
    agents: Vec<Description>,
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    configured: bool,
    agents: usize,
    uptime_seconds: u64,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct ApiDocumentationResponse {
    endpoints: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    timestamp: u64,
}

fn with_dispatcher(
    dispatcher: Arc<Dispatcher>,
) -> impl Filter<Extract = (Arc<Dispatcher>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&dispatcher))
}

/// All routes, with rejection recovery and request tracing
pub fn routes(
    dispatcher: Arc<Dispatcher>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let process_get = warp::path!("process" / String)
        .and(warp::get())
        .and(with_dispatcher(Arc::clone(&dispatcher)))
        .and_then(handle_process_path);

    let process_post = warp::path!("process")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<ProcessRequest>())
        .and(with_dispatcher(Arc::clone(&dispatcher)))
        .and_then(handle_process_body);

    let agents = warp::path!("agents")
        .and(warp::get())
        .and(with_dispatcher(Arc::clone(&dispatcher)))
        .and_then(handle_agents);

    let echo = warp::path!("echo" / String)
        .and(warp::get())
        .and_then(handle_echo);

    let health = warp::path!("health")
        .and(warp::get())
        .and(with_dispatcher(Arc::clone(&dispatcher)))
        .and_then(handle_health);

    let metrics = warp::path!("metrics")
        .and(warp::get())
        .and(with_dispatcher(dispatcher))
        .and_then(handle_metrics);

    let root = warp::path::end().and(warp::get()).and_then(handle_root);

    process_get
        .or(process_post)
        .or(agents)
        .or(echo)
        .or(health)
        .or(metrics)
        .or(root)
        .with(warp::cors().allow_any_origin())
        .with(warp::trace::request())
        .recover(handle_rejection)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(
    dispatcher: Arc<Dispatcher>,
    addr: SocketAddr,
    shutdown: F,
) -> SwitchboardResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (bound, server) = warp::serve(routes(dispatcher))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(|e| SwitchboardError::internal_error(format!("Failed to bind {addr}: {e}")))?;

    info!(address = %bound, "HTTP server listening");
    server.await;
    info!("HTTP server stopped");
    Ok(())
}

async fn dispatch_reply(dispatcher: &Dispatcher, text: String) -> HttpResponse {
    let response = dispatcher.dispatch(&Request::new(text)).await;
    let body: ResponseBody = response.body();
    warp::reply::json(&body).into_response()
}

async fn handle_process_path(
    text: String,
    dispatcher: Arc<Dispatcher>,
) -> Result<HttpResponse, Infallible> {
    match urlencoding::decode(&text) {
        Ok(decoded) => Ok(dispatch_reply(&dispatcher, decoded.into_owned()).await),
        Err(e) => Ok(error_reply(
            StatusCode::BAD_REQUEST,
            format!("Request text is not valid UTF-8: {e}"),
        )),
    }
}

async fn handle_process_body(
    body: ProcessRequest,
    dispatcher: Arc<Dispatcher>,
) -> Result<HttpResponse, Infallible> {
    Ok(dispatch_reply(&dispatcher, body.text).await)
}

async fn handle_agents(dispatcher: Arc<Dispatcher>) -> Result<HttpResponse, Infallible> {
    let response = AgentsResponse {
        agents: dispatcher.list_agents(),
    };
    Ok(warp::reply::json(&response).into_response())
}

async fn handle_echo(message: String) -> Result<HttpResponse, Infallible> {
    match urlencoding::decode(&message) {
        Ok(decoded) => Ok(decoded.into_owned().into_response()),
        Err(e) => Ok(error_reply(
            StatusCode::BAD_REQUEST,
            format!("Message is not valid UTF-8: {e}"),
        )),
    }
}

async fn handle_health(dispatcher: Arc<Dispatcher>) -> Result<HttpResponse, Infallible> {
    let configured = dispatcher.is_configured();
    let status = HealthStatus {
        status: if configured { "healthy" } else { "degraded" },
        configured,
        agents: dispatcher.registry().len(),
        uptime_seconds: dispatcher.metrics().snapshot().uptime_seconds,
        timestamp: current_timestamp(),
    };

    let code = if configured {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok(warp::reply::with_status(warp::reply::json(&status), code).into_response())
}

async fn handle_metrics(dispatcher: Arc<Dispatcher>) -> Result<HttpResponse, Infallible> {
    Ok(warp::reply::json(&dispatcher.metrics().snapshot()).into_response())
}

async fn handle_root() -> Result<HttpResponse, Infallible> {
    let endpoints = BTreeMap::from([
        ("/process/{text}", "Dispatch the URL-encoded text (GET)"),
        ("/process", "Dispatch {\"text\": \"..\"} (POST)"),
        ("/agents", "Descriptions of the registered agents"),
        ("/echo/{message}", "Return the message unchanged"),
        ("/health", "Routing configuration status"),
        ("/metrics", "Dispatch metrics and per-agent statistics"),
    ]);
    Ok(warp::reply::json(&ApiDocumentationResponse { endpoints }).into_response())
}

async fn handle_rejection(rejection: Rejection) -> Result<HttpResponse, Infallible> {
    let (code, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(e) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid request body: {e}"))
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body too large".to_string(),
        )
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        )
    } else {
        debug!(?rejection, "Unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    Ok(error_reply(code, message))
}

fn error_reply(code: StatusCode, error: String) -> HttpResponse {
    let body = ErrorResponse {
        error,
        timestamp: current_timestamp(),
    };
    warp::reply::with_status(warp::reply::json(&body), code).into_response()
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::builtin::EchoAgent;
    use crate::agent::AgentRegistry;
    use crate::dispatcher::DispatchSettings;
    use crate::routing::SingleAgentRouter;

    fn echo_dispatcher() -> Arc<Dispatcher> {
        let registry = AgentRegistry::new()
            .with_agent(Arc::new(EchoAgent::new()))
            .unwrap();
        Arc::new(
            Dispatcher::new(
                Arc::new(registry),
                Box::new(SingleAgentRouter::new("echo")),
                DispatchSettings::default(),
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_process_path_is_percent_decoded() {
        let response = warp::test::request()
            .method("GET")
            .path("/process/hello%20there")
            .reply(&routes(echo_dispatcher()))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: ResponseBody = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body.text, "hello there");
        assert!(body.understood);
    }

    #[tokio::test]
    async fn test_echo_route_is_plain_text() {
        let response = warp::test::request()
            .path("/echo/ping%21")
            .reply(&routes(echo_dispatcher()))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"ping!");
    }

    #[tokio::test]
    async fn test_unknown_path_is_json_404() {
        let response = warp::test::request()
            .path("/nope")
            .reply(&routes(echo_dispatcher()))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["error"], "Not found");
    }
}
