use crate::config::ServeArgs;
use crate::data::{TimetableOutput, TimetableRequest, lenient_u32};
use crate::error::{ApiError, MessageBody};
use crate::gateway::GenerationGateway;
use crate::solver;
use crate::store::{ChangeRequest, DemoStore, MemoryStore, RequestStatus, Role};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<Box<dyn DemoStore>>>,
    gateway: Option<GenerationGateway>,
}

impl AppState {
    pub fn new(store: Box<dyn DemoStore>, gateway: Option<GenerationGateway>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            gateway,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    success: bool,
    role: Role,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DraftSaved {
    success: bool,
    message: String,
    draft_id: String,
}

#[derive(Debug, Deserialize)]
struct SubmitRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    #[serde(default, deserialize_with = "lenient_u32")]
    id: Option<u32>,
    status: RequestStatus,
}

async fn generate_handler(
    State(state): State<AppState>,
    Json(input): Json<TimetableRequest>,
) -> Json<TimetableOutput> {
    let subjects = match &state.gateway {
        Some(gateway) => gateway.subjects_or_fallback(&input).await,
        None => None,
    };
    Json(solver::solve(&input, subjects))
}

async fn login_handler(
    State(state): State<AppState>,
    Json(login): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let store = state.store.lock().await;
    let role = store
        .authenticate(&login.username, &login.password)
        .ok_or(ApiError::InvalidCredentials)?;
    info!("User {} logged in as {:?}", login.username, role);
    Ok(Json(LoginResponse {
        success: true,
        role,
    }))
}

async fn timetable_handler(State(state): State<AppState>) -> Json<Value> {
    Json(state.store.lock().await.timetable().clone())
}

async fn create_timetable_handler(
    State(state): State<AppState>,
    Json(timetable): Json<Value>,
) -> Json<MessageBody> {
    state.store.lock().await.replace_timetable(timetable);
    Json(MessageBody::ok("New timetable created successfully."))
}

async fn save_draft_handler(
    State(state): State<AppState>,
    Json(draft): Json<Value>,
) -> Json<DraftSaved> {
    let draft_id = state.store.lock().await.save_draft(draft);
    info!("Saved {draft_id}");
    Json(DraftSaved {
        success: true,
        message: "Draft saved successfully.".to_string(),
        draft_id,
    })
}

async fn drafts_handler(State(state): State<AppState>) -> Json<BTreeMap<String, Value>> {
    Json(state.store.lock().await.drafts().clone())
}

async fn approve_draft_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageBody>, ApiError> {
    state.store.lock().await.approve_draft(&id)?;
    info!("Approved {id}");
    Ok(Json(MessageBody::ok("Draft approved and timetable updated.")))
}

async fn discard_draft_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageBody>, ApiError> {
    state.store.lock().await.discard_draft(&id)?;
    Ok(Json(MessageBody::ok("Draft discarded.")))
}

async fn requests_handler(State(state): State<AppState>) -> Json<Vec<ChangeRequest>> {
    Json(state.store.lock().await.requests().to_vec())
}

async fn submit_request_handler(
    State(state): State<AppState>,
    Json(submit): Json<SubmitRequest>,
) -> Json<MessageBody> {
    let created = state
        .store
        .lock()
        .await
        .submit_request(submit.username, submit.text);
    info!("Change request {} submitted by {}", created.id, created.sender);
    Json(MessageBody::ok("Request submitted successfully."))
}

async fn update_request_status_handler(
    State(state): State<AppState>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<MessageBody>, ApiError> {
    // an unparseable id cannot match any request
    let id = update.id.unwrap_or(0);
    state
        .store
        .lock()
        .await
        .update_request_status(id, update.status)?;
    Ok(Json(MessageBody::ok("Request status updated.")))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/timetable/generate", post(generate_handler))
        .route("/api/login", post(login_handler))
        .route("/api/timetable", get(timetable_handler))
        .route("/api/create-timetable", post(create_timetable_handler))
        .route("/api/save-draft", post(save_draft_handler))
        .route("/api/drafts", get(drafts_handler))
        .route("/api/approve-draft/:id", post(approve_draft_handler))
        .route("/api/discard-draft/:id", post(discard_draft_handler))
        .route("/api/requests", get(requests_handler))
        .route("/api/submit-request", post(submit_request_handler))
        .route("/api/update-request-status", post(update_request_status_handler))
        // the browser frontend may be served from another origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let gateway = match &args.gateway_url {
        Some(url) => {
            info!("Generation gateway enabled at {url}");
            Some(GenerationGateway::new(
                url,
                Duration::from_millis(args.gateway_timeout_ms),
            )?)
        }
        None => None,
    };
    let app = build_router(AppState::new(Box::new(MemoryStore::seeded()), gateway));

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::json;
    use tower::ServiceExt;

    fn test_app() -> Router {
        build_router(AppState::new(Box::new(MemoryStore::seeded()), None))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap())),
            None => request.body(Body::empty()),
        };
        app.clone().oneshot(request.unwrap()).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn login_returns_role_or_unauthorized() {
        let app = test_app();

        let ok = send(
            &app,
            "POST",
            "/api/login",
            Some(json!({ "username": "teacher1", "password": "teacherpass" })),
        )
        .await;
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(json_body(ok).await, json!({ "success": true, "role": "teacher" }));

        let denied = send(
            &app,
            "POST",
            "/api/login",
            Some(json!({ "username": "teacher1", "password": "nope" })),
        )
        .await;
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(denied).await,
            json!({ "success": false, "message": "Invalid username or password" })
        );
    }

    #[tokio::test]
    async fn generate_returns_grid_and_labels() {
        let app = test_app();
        let response = send(
            &app,
            "POST",
            "/v1/timetable/generate",
            Some(json!({
                "workingDays": "Mon-Sat",
                "periodsPerDay": 3,
                "startTime": "09:00",
                "lunchBreakPeriod": 2,
                "subjectAllocations": [{ "subject": "Math" }, { "subject": "" }],
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["timeLabels"][2], "11:15 AM–12:00 PM");
        assert_eq!(body["timetable"]["layout"], "flat");
        let rows = body["timetable"]["grids"]["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0]["cells"][1], json!({ "kind": "lunch" }));
        assert_eq!(rows[0]["cells"][0]["teacher"], "TBA");
    }

    #[tokio::test]
    async fn generate_uses_gateway_subjects() {
        let gateway_app = Router::new().route(
            "/generate",
            post(|| async { Json(json!({ "subjects": ["Art", "Music"] })) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, gateway_app).await.unwrap();
        });
        let gateway =
            GenerationGateway::new(&format!("http://{addr}/generate"), Duration::from_secs(2))
                .unwrap();
        let app = build_router(AppState::new(Box::new(MemoryStore::seeded()), Some(gateway)));

        let body = json_body(
            send(
                &app,
                "POST",
                "/v1/timetable/generate",
                Some(json!({
                    "periodsPerDay": 2,
                    "subjectAllocations": [{ "subject": "Math" }],
                })),
            )
            .await,
        )
        .await;
        assert_eq!(body["subjectPool"], json!(["Art", "Music"]));
        assert_eq!(body["sections"][0]["subject"], "Math");
        let cells = &body["timetable"]["grids"]["rows"][0]["cells"];
        assert_eq!(cells[0]["subject"], "Art");
        assert_eq!(cells[1]["subject"], "Music");
    }

    #[tokio::test]
    async fn unreachable_gateway_falls_back_to_local_subjects() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let gateway =
            GenerationGateway::new(&format!("http://{addr}/generate"), Duration::from_secs(2))
                .unwrap();
        let app = build_router(AppState::new(Box::new(MemoryStore::seeded()), Some(gateway)));

        let response = send(
            &app,
            "POST",
            "/v1/timetable/generate",
            Some(json!({ "subjectAllocations": [{ "subject": "Math" }] })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["subjectPool"], json!(["Math"]));
    }

    #[tokio::test]
    async fn cross_origin_requests_are_allowed() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/timetable")
                    .header("origin", "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
    }

    #[tokio::test]
    async fn approved_draft_becomes_timetable() {
        let app = test_app();
        let saved = json_body(
            send(&app, "POST", "/api/save-draft", Some(json!({ "Friday": "Art" }))).await,
        )
        .await;
        let draft_id = saved["draftId"].as_str().unwrap().to_string();

        let drafts = json_body(send(&app, "GET", "/api/drafts", None).await).await;
        assert_eq!(drafts[&draft_id], json!({ "Friday": "Art" }));

        let approved = send(&app, "POST", &format!("/api/approve-draft/{draft_id}"), None).await;
        assert_eq!(approved.status(), StatusCode::OK);

        let timetable = json_body(send(&app, "GET", "/api/timetable", None).await).await;
        assert_eq!(timetable, json!({ "Friday": "Art" }));
    }

    #[tokio::test]
    async fn unknown_draft_is_not_found() {
        let app = test_app();
        for route in ["/api/approve-draft/draft-0", "/api/discard-draft/draft-0"] {
            let response = send(&app, "POST", route, None).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(json_body(response).await["message"], "Draft not found.");
        }
    }

    #[tokio::test]
    async fn change_requests_flow() {
        let app = test_app();
        send(
            &app,
            "POST",
            "/api/submit-request",
            Some(json!({ "username": "teacher1", "text": "Swap P3" })),
        )
        .await;

        let updated = send(
            &app,
            "POST",
            "/api/update-request-status",
            Some(json!({ "id": "2", "status": "approved" })),
        )
        .await;
        assert_eq!(updated.status(), StatusCode::OK);

        let requests = json_body(send(&app, "GET", "/api/requests", None).await).await;
        assert_eq!(requests[0]["id"], 2);
        assert_eq!(requests[0]["status"], "approved");
        assert_eq!(requests[1]["status"], "pending");

        let missing = send(
            &app,
            "POST",
            "/api/update-request-status",
            Some(json!({ "id": 99, "status": "rejected" })),
        )
        .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_timetable_replaces_current() {
        let app = test_app();
        let created = send(
            &app,
            "POST",
            "/api/create-timetable",
            Some(json!({ "Monday": "Drama" })),
        )
        .await;
        assert_eq!(json_body(created).await["success"], true);

        let timetable = json_body(send(&app, "GET", "/api/timetable", None).await).await;
        assert_eq!(timetable, json!({ "Monday": "Drama" }));
    }
}
