use std::fmt::Display;
use std::sync::Arc;

use anyhow::Context as _;
use axum::extract::ws::{self, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, post};
use axum::{Json, Router};
use futures_util::StreamExt as _;
use http::StatusCode;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;

use crate::huemor::config::Config;
use crate::huemor::joke::{ColourDescription, JokeService};
use crate::huemor::message_bus::{Message, MessageBus, UiCommand};
use crate::utils::ResultExt as _;
use huemor_model::ColourName;

struct AppState {
    message_bus: MessageBus,
    joke_service: JokeService,
}

type AppStateArg = State<Arc<AppState>>;

#[derive(Serialize)]
struct EmptyResponse;

impl IntoResponse for EmptyResponse {
    fn into_response(self) -> Response {
        serde_json::to_string(&EmptyResponse)
            .unwrap()
            .into_response()
    }
}

async fn initialize_ui(State(state): AppStateArg) -> impl IntoResponse {
    debug!("initialize_ui");
    state
        .message_bus
        .send(Message::UiCommand(UiCommand::InitializeUi));
    EmptyResponse
}

async fn press_button(State(state): AppStateArg) -> impl IntoResponse {
    debug!("press_button()");
    state
        .message_bus
        .send(Message::UiCommand(UiCommand::PressButton));
    EmptyResponse
}

#[derive(Debug, Deserialize)]
struct ToggleColour {
    name: ColourName,
}
async fn toggle_colour(
    State(state): AppStateArg,
    Json(body): Json<ToggleColour>,
) -> impl IntoResponse {
    debug!("toggle_colour({:?})", body);
    state
        .message_bus
        .send(Message::UiCommand(UiCommand::ToggleColour(body.name)));
    EmptyResponse
}

async fn reset(State(state): AppStateArg) -> impl IntoResponse {
    debug!("reset()");
    state.message_bus.send(Message::UiCommand(UiCommand::Reset));
    EmptyResponse
}

#[derive(Debug, Deserialize)]
struct JokeRequestBody {
    colour1: String,
    #[serde(default)]
    mood1: Option<String>,
    colour2: String,
    #[serde(default)]
    mood2: Option<String>,
}

#[derive(Debug, Serialize)]
struct JokeResponseBody {
    joke: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Stateless joke endpoint. Upstream failures still answer with a usable
/// `joke` body; the 500 status is only a signal.
async fn generate_joke(State(state): AppStateArg, Json(body): Json<JokeRequestBody>) -> Response {
    debug!("generate_joke({body:?})");
    if body.colour1.trim().is_empty() || body.colour2.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "Need 2 colours".into(),
            }),
        )
            .into_response();
    }
    let first = ColourDescription::new(body.colour1, body.mood1);
    let second = ColourDescription::new(body.colour2, body.mood2);
    let outcome = state.joke_service.generate(&first, &second).await;
    let status = if outcome.degraded {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Json(JokeResponseBody { joke: outcome.joke })).into_response()
}

async fn create_ui_event_stream(ws: WebSocketUpgrade, State(state): AppStateArg) -> Response {
    ws.on_upgrade(move |socket| ui_event_stream(socket, state.message_bus.clone()))
}

fn wrap_result<T: Serialize, E: Display>(
    r: std::result::Result<T, E>,
) -> std::result::Result<ws::Message, axum::Error> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    enum WrappedResult<T> {
        Success(T),
        Error(String),
    }
    let wrapped_result = match r {
        Ok(data) => WrappedResult::Success(data),
        Err(e) => WrappedResult::Error(e.to_string()),
    };
    let json_text = serde_json::to_string_pretty(&wrapped_result)
        .unwrap_or_else(|e| format!("{{ \"error\": \"JSON serialization failed: {e}\" }}"));
    Ok(ws::Message::text(json_text))
}

async fn ui_event_stream(socket: WebSocket, message_bus: MessageBus) {
    info!("New UI event stream started.");
    let stream = message_bus.subscribe().ui_update_stream().map(wrap_result);
    match stream.forward(socket).await {
        Ok(()) => {
            info!("UI event stream closed.");
        }
        Err(e) => {
            info!("UI event stream closed with: {e}.");
        }
    }
}

fn router(state: Arc<AppState>, config: &Config) -> Router {
    Router::new()
        .route("/api/joke", post(generate_joke))
        .nest(
            "/api/v1",
            Router::new()
                .route("/ui_stream", any(create_ui_event_stream))
                .route("/initialize_ui", post(initialize_ui))
                .route("/press_button", post(press_button))
                .route("/toggle_colour", post(toggle_colour))
                .route("/reset", post(reset)),
        )
        .with_state(state)
        .fallback_service(ServeDir::new(&config.static_serving_dir))
}

pub async fn serve(message_bus: MessageBus, joke_service: JokeService, config: &Config) {
    let shared_state = Arc::new(AppState {
        message_bus,
        joke_service,
    });
    let app = router(shared_state, config);
    let listener = tokio::net::TcpListener::bind(&config.serving_addr)
        .await
        .unwrap();
    axum::serve(listener, app)
        .await
        .context("Api server failed")
        .print_err();
}

#[cfg(test)]
mod test {
    use async_trait::async_trait;
    use axum::{body, body::Body, http::Request};
    use futures_util::stream::TryStreamExt as _;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::huemor::joke::{CompletionError, TextCompletion, UPSTREAM_FALLBACK_JOKE};

    use super::*;

    struct FixedCompletion(&'static str);

    #[async_trait]
    impl TextCompletion for FixedCompletion {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, CompletionError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingCompletion;

    #[async_trait]
    impl TextCompletion for FailingCompletion {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, CompletionError> {
            Err(CompletionError::Api {
                status: StatusCode::TOO_MANY_REQUESTS,
                message: "quota exceeded".into(),
            })
        }
    }

    fn test_app(completion: impl TextCompletion + 'static) -> (Router, MessageBus) {
        let message_bus = MessageBus::new();
        let state = Arc::new(AppState {
            message_bus: message_bus.clone(),
            joke_service: JokeService::new(Arc::new(completion)),
        });
        (router(state, &Config::default()), message_bus)
    }

    fn joke_request(body: Value) -> Request<Body> {
        Request::post("/api/joke")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn body_json(response: Response) -> Value {
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn joke_endpoint_rejects_blank_colour() {
        let (app, _bus) = test_app(FixedCompletion("unused"));
        let request = joke_request(json!({ "colour1": "", "colour2": "Blue" }));
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Need 2 colours");
    }

    #[tokio::test]
    async fn joke_endpoint_returns_generated_joke() {
        let (app, _bus) = test_app(FixedCompletion("Red and blue walk into a bar..."));
        let request = joke_request(json!({
            "colour1": "Cherry Red",
            "mood1": "bold & fearless",
            "colour2": "Ocean Blue",
            "mood2": "calm & collected"
        }));
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["joke"], "Red and blue walk into a bar...");
    }

    #[tokio::test]
    async fn joke_endpoint_maps_upstream_failure_to_fallback() {
        let (app, _bus) = test_app(FailingCompletion);
        let request = joke_request(json!({ "colour1": "Red", "colour2": "Blue" }));
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["joke"], UPSTREAM_FALLBACK_JOKE);
    }

    #[tokio::test]
    async fn toggle_colour_lands_on_the_bus() {
        let (app, bus) = test_app(FixedCompletion("unused"));
        let messages = bus.subscribe().stream();
        let request = Request::post("/api/v1/toggle_colour")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "name": "Lavender" }).to_string()))
            .expect("request");
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let message = std::pin::pin!(messages)
            .try_next()
            .await
            .expect("bus message")
            .expect("open bus");
        assert!(matches!(
            message,
            Message::UiCommand(UiCommand::ToggleColour(name)) if name.as_str() == "Lavender"
        ));
    }
}
