//! HTTP API for the Synergy dashboard.

use crate::error::{Error, Result};
use crate::node::SynergyState;
use crate::partner::{self, PartnerClient};
use crate::pi_client::{PiClient, PiError};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use synergy_blueprint::{
    analyze_image, generate_floor_plan_svg, parse_description, Blueprint, ParsedDescription,
};
use synergy_directory::{Company, DirectoryStats};
use synergy_valuation::market::{generate_market_data, Comparable, MarketTrend};
use synergy_valuation::{
    calculate_estimated_value, calculate_pi_value, calculate_verified_value,
    compare_pi_valuations, generate_housing_recommendations, valuation_summary, verify_pi_source,
    HousingRecommendation, MarketData, PiValuation, PropertyProfile, SourceType,
    SourceVerification, ValuationComparison, ValuationSummary, DEFAULT_BASE_PRICE,
};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

type AppState = Arc<RwLock<SynergyState>>;

/// Largest accepted image upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Credits granted to every user on login.
pub const STARTING_CREDITS: u32 = 10;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    // CORS layer for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health))
        .route("/api/health", get(health))
        // Blueprints
        .route("/api/blueprints", get(list_blueprints))
        .route("/api/blueprints/generate", post(generate_blueprint))
        .route(
            "/api/blueprints/generate-from-image",
            post(generate_from_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/blueprints/parse", post(parse_blueprint_description))
        .route("/api/blueprints/floor-plan/{rooms}", get(floor_plan))
        .route("/api/blueprints/{id}", get(get_blueprint))
        // Pi valuation
        .route("/api/valuation/calculate", post(calculate_valuation))
        .route("/api/valuation/compare", get(compare_valuations))
        .route("/api/valuation/verify", post(verify_source))
        .route("/api/valuation/summary", get(get_valuation_summary))
        // Real-estate market
        .route("/api/market/estimate", post(estimate_value))
        .route("/api/market/recommendations", post(recommendations))
        // Company directory
        .route("/api/companies", get(search_companies))
        .route("/api/companies/stats", get(company_stats))
        // Pi Platform
        .route("/api/login", post(login))
        .route("/api/pi/payments/approve", post(approve_payment))
        .route("/api/pi/payments/complete", post(complete_payment))
        // Triumph partner bridge
        .route("/api/call-triumph", post(call_partner))
        .route("/api/from-triumph", post(from_partner))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn check_room_limit(rooms: u32, max_rooms: u32) -> Result<()> {
    if rooms > max_rooms {
        return Err(Error::InvalidInput(format!(
            "Room count {rooms} exceeds the maximum of {max_rooms}"
        )));
    }
    Ok(())
}

// --- Health ---

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        timestamp: Utc::now(),
    })
}

// --- Blueprint endpoints ---

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

async fn generate_blueprint(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<Blueprint>> {
    let max_rooms = state.read().await.config.max_rooms;
    let parsed = parse_description(&req.description)?;
    check_room_limit(parsed.rooms, max_rooms)?;
    let blueprint = Blueprint::from_parsed(&req.name, &req.description, &parsed, Utc::now())?;

    tracing::info!(
        "Generated blueprint {} ({} rooms, {})",
        blueprint.id,
        blueprint.rooms,
        blueprint.style
    );
    store(&state, blueprint.clone()).await;
    Ok(Json(blueprint))
}

/// Add to the gallery, holding the write lock only for the insert.
async fn store(state: &AppState, blueprint: Blueprint) {
    if let Some(evicted) = state.write().await.gallery.insert(blueprint) {
        tracing::debug!("Gallery full, evicted blueprint {}", evicted.id);
    }
}

struct Upload {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

async fn generate_from_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Blueprint>> {
    let mut name = None;
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(e.to_string()))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("name") => {
                let text = field.text().await.map_err(|e| Error::InvalidInput(e.to_string()))?;
                name = Some(text);
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| Error::InvalidInput(e.to_string()))?;
                upload = Some(Upload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let (Some(name), Some(upload)) = (name.filter(|n| !n.trim().is_empty()), upload) else {
        return Err(Error::InvalidInput("Missing required fields".into()));
    };

    let analysis = analyze_image(&upload.file_name, &upload.content_type, &upload.bytes)?;
    check_room_limit(analysis.rooms, state.read().await.config.max_rooms)?;
    let blueprint = Blueprint::from_image(&name, &analysis, Utc::now())?;

    tracing::info!(
        "Generated blueprint {} from image {} ({} bytes)",
        blueprint.id,
        upload.file_name,
        upload.bytes.len()
    );
    store(&state, blueprint.clone()).await;
    Ok(Json(blueprint))
}

#[derive(Debug, Deserialize)]
struct ParseRequest {
    description: String,
}

async fn parse_blueprint_description(
    State(state): State<AppState>,
    Json(req): Json<ParseRequest>,
) -> Result<Json<ParsedDescription>> {
    let parsed = parse_description(&req.description)?;
    check_room_limit(parsed.rooms, state.read().await.config.max_rooms)?;
    Ok(Json(parsed))
}

async fn floor_plan(
    State(state): State<AppState>,
    Path(rooms): Path<u32>,
) -> Result<impl IntoResponse> {
    check_room_limit(rooms, state.read().await.config.max_rooms)?;
    let svg = generate_floor_plan_svg(rooms)?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

async fn list_blueprints(State(state): State<AppState>) -> Json<Vec<Blueprint>> {
    Json(state.read().await.gallery.list())
}

async fn get_blueprint(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Blueprint>> {
    let state = state.read().await;
    state
        .gallery
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| Error::NotFound("Blueprint".into()))
}

// --- Valuation endpoints ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalculateRequest {
    amount: f64,
    source_type: SourceType,
    base_price: Option<f64>,
}

async fn calculate_valuation(Json(req): Json<CalculateRequest>) -> Result<Json<PiValuation>> {
    let base_price = req.base_price.unwrap_or(DEFAULT_BASE_PRICE);
    Ok(Json(calculate_pi_value(req.amount, req.source_type, base_price)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompareParams {
    amount: f64,
    base_price: Option<f64>,
}

async fn compare_valuations(
    Query(params): Query<CompareParams>,
) -> Result<Json<ValuationComparison>> {
    let base_price = params.base_price.unwrap_or(DEFAULT_BASE_PRICE);
    Ok(Json(compare_pi_valuations(params.amount, base_price)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest {
    source_type: SourceType,
    proof_of_work: Option<String>,
    network_contribution: Option<String>,
    /// When given, the verified holding is valued too
    amount: Option<f64>,
    base_price: Option<f64>,
}

#[derive(Debug, Serialize)]
struct VerifyResponse {
    #[serde(flatten)]
    verification: SourceVerification,
    #[serde(skip_serializing_if = "Option::is_none")]
    valuation: Option<PiValuation>,
}

async fn verify_source(Json(req): Json<VerifyRequest>) -> Result<Json<VerifyResponse>> {
    let proof_of_work = req.proof_of_work.as_deref();
    let network_contribution = req.network_contribution.as_deref();

    let response = match req.amount {
        Some(amount) => {
            let (verification, valuation) = calculate_verified_value(
                amount,
                req.source_type,
                req.base_price.unwrap_or(DEFAULT_BASE_PRICE),
                proof_of_work,
                network_contribution,
            )?;
            VerifyResponse {
                verification,
                valuation: Some(valuation),
            }
        }
        None => VerifyResponse {
            verification: verify_pi_source(req.source_type, proof_of_work, network_contribution),
            valuation: None,
        },
    };
    Ok(Json(response))
}

async fn get_valuation_summary() -> Json<ValuationSummary> {
    Json(valuation_summary())
}

// --- Market endpoints ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EstimateRequest {
    square_feet: u32,
    bedrooms: u32,
    price_per_sq_ft: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimateResponse {
    estimated_value: u64,
}

async fn estimate_value(Json(req): Json<EstimateRequest>) -> Result<Json<EstimateResponse>> {
    let estimated_value = calculate_estimated_value(req.square_feet, req.bedrooms, req.price_per_sq_ft)?;
    Ok(Json(EstimateResponse { estimated_value }))
}

/// Raw market inputs; the aggregates are always recomputed from them.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarketInput {
    comparables: Vec<Comparable>,
    market_trend: MarketTrend,
    inventory_months: f64,
}

#[derive(Debug, Deserialize)]
struct RecommendationRequest {
    profile: PropertyProfile,
    /// Mock market data is generated when omitted
    market: Option<MarketInput>,
}

#[derive(Debug, Serialize)]
struct RecommendationResponse {
    market: MarketData,
    recommendations: Vec<HousingRecommendation>,
}

async fn recommendations(
    Json(req): Json<RecommendationRequest>,
) -> Result<Json<RecommendationResponse>> {
    let market = match req.market {
        Some(input) => {
            MarketData::from_comparables(input.comparables, input.market_trend, input.inventory_months)?
        }
        None => generate_market_data(&mut rand::thread_rng()),
    };
    let recommendations = generate_housing_recommendations(&req.profile, &market);
    Ok(Json(RecommendationResponse {
        market,
        recommendations,
    }))
}

// --- Company directory endpoints ---

#[derive(Debug, Deserialize)]
struct CompanyQuery {
    q: Option<String>,
    category: Option<String>,
}

#[derive(Debug, Serialize)]
struct CompanyHit {
    category: String,
    #[serde(flatten)]
    company: Company,
}

async fn search_companies(
    State(state): State<AppState>,
    Query(query): Query<CompanyQuery>,
) -> Json<Vec<CompanyHit>> {
    let state = state.read().await;
    let hits = state
        .directory
        .search(query.q.as_deref().unwrap_or(""), query.category.as_deref())
        .into_iter()
        .map(|m| CompanyHit {
            category: m.category.to_string(),
            company: m.company.clone(),
        })
        .collect();
    Json(hits)
}

async fn company_stats(State(state): State<AppState>) -> Json<DirectoryStats> {
    Json(state.read().await.directory.stats())
}

// --- Pi Platform endpoints ---

/// Clone the Pi client out so no lock is held across upstream calls.
async fn pi_client(state: &AppState, missing: &str) -> Result<PiClient> {
    state.read().await.pi.clone().ok_or_else(|| {
        tracing::error!("PI_API_KEY not configured");
        Error::Config(missing.to_string())
    })
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    pi_auth_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    id: String,
    username: String,
    credits_balance: u32,
    terms_accepted: bool,
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let token = present(req.pi_auth_token)
        .ok_or_else(|| Error::InvalidInput("Missing pi_auth_token".into()))?;
    let pi = pi_client(&state, "Server configuration error").await?;

    let user = pi.me(&token).await.map_err(|e| match e {
        PiError::Upstream { status, .. } => {
            tracing::warn!("Pi token verification failed with status {}", status);
            Error::Unauthorized("Invalid Pi authentication token".into())
        }
        source => Error::Pi {
            message: "Pi authentication unavailable",
            source,
        },
    })?;

    tracing::info!("Pi user {} logged in", user.username);
    Ok(Json(LoginResponse {
        id: user.uid,
        username: user.username,
        credits_balance: STARTING_CREDITS,
        terms_accepted: true,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentRequest {
    payment_id: Option<String>,
    txid: Option<String>,
}

/// `{success, paymentId, ...}` with upstream fields taking precedence.
fn payment_response(mut fields: Map<String, Value>, upstream: Map<String, Value>) -> Json<Value> {
    fields.extend(upstream);
    Json(Value::Object(fields))
}

async fn approve_payment(
    State(state): State<AppState>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<Value>> {
    let payment_id = present(req.payment_id)
        .ok_or_else(|| Error::InvalidInput("Payment ID is required".into()))?;
    let pi = pi_client(&state, "Payment system not configured").await?;

    let upstream = pi.approve_payment(&payment_id).await.map_err(|source| {
        tracing::warn!("Pi payment approval failed for {}: {}", payment_id, source);
        Error::Pi {
            message: "Payment approval failed",
            source,
        }
    })?;

    tracing::info!("Payment approved: {}", payment_id);
    let mut fields = Map::new();
    fields.insert("success".into(), Value::Bool(true));
    fields.insert("paymentId".into(), Value::String(payment_id));
    Ok(payment_response(fields, upstream))
}

async fn complete_payment(
    State(state): State<AppState>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<Value>> {
    let (Some(payment_id), Some(txid)) = (present(req.payment_id), present(req.txid)) else {
        return Err(Error::InvalidInput(
            "Payment ID and transaction ID are required".into(),
        ));
    };
    let pi = pi_client(&state, "Payment system not configured").await?;

    let upstream = pi.complete_payment(&payment_id, &txid).await.map_err(|source| {
        tracing::warn!("Pi payment completion failed for {}: {}", payment_id, source);
        Error::Pi {
            message: "Payment completion failed",
            source,
        }
    })?;

    tracing::info!("Payment completed: {} {}", payment_id, txid);
    let mut fields = Map::new();
    fields.insert("success".into(), Value::Bool(true));
    fields.insert("paymentId".into(), Value::String(payment_id));
    fields.insert("txid".into(), Value::String(txid));
    Ok(payment_response(fields, upstream))
}

// --- Triumph partner bridge ---

async fn partner_client(state: &AppState) -> Result<PartnerClient> {
    state.read().await.partner.clone().ok_or_else(|| {
        tracing::error!("SHARED_SECRET_KEY not configured");
        Error::Config("Server configuration error".into())
    })
}

async fn call_partner(State(state): State<AppState>, Json(body): Json<Value>) -> Result<Json<Value>> {
    let partner = partner_client(&state).await?;
    let reply = partner.send(&body).await.map_err(|e| {
        tracing::warn!("Triumph call to {} failed: {}", partner.base_url(), e);
        Error::Partner(e)
    })?;
    Ok(Json(reply))
}

#[derive(Debug, Default, Deserialize)]
struct PartnerMessage {
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PartnerReply {
    success: bool,
    received: Value,
    stem_response: String,
    timestamp: String,
}

/// Inbound call from the partner. The shared secret is checked before the
/// body is parsed. A signature, when present, must match the body.
async fn from_partner(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PartnerReply>> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let secret = state.read().await.config.shared_secret_key.clone();

    let authorized = match (secret.as_deref(), header(partner::SHARED_SECRET_HEADER)) {
        (Some(secret), Some(presented)) => {
            let signature_ok = match header(partner::SIGNATURE_HEADER) {
                Some(sig) => partner::verify_signature(secret, &body, sig),
                None => true,
            };
            partner::shared_secret_matches(secret, presented) && signature_ok
        }
        _ => false,
    };
    if !authorized {
        tracing::warn!("Rejected unauthenticated Triumph request");
        return Err(Error::Unauthorized("Unauthorized".into()));
    }

    let msg: PartnerMessage = serde_json::from_slice(&body)
        .map_err(|e| Error::InvalidInput(format!("Invalid JSON body: {e}")))?;
    tracing::info!("Received from Triumph: {}", msg.message);

    Ok(Json(PartnerReply {
        success: true,
        received: msg.data,
        stem_response: format!("Stem Synergy processed: {}", msg.message),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::pi_client::mock;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    fn state_with(config: ServerConfig) -> AppState {
        Arc::new(RwLock::new(SynergyState::new(config).unwrap()))
    }

    fn app() -> (Router, AppState) {
        let state = state_with(ServerConfig::default());
        (build_router(state.clone()), state)
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let req = Request::get(uri).body(Body::empty()).unwrap();
        let (status, body) = send(app, req).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, body) = send(app, req).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = app();
        for uri in ["/health", "/api/health"] {
            let (status, body) = get_json(&app, uri).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "ok");
            assert!(body["timestamp"].is_string());
        }
    }

    #[tokio::test]
    async fn generate_stores_in_gallery() {
        let (app, state) = app();
        let (status, body) = post_json(
            &app,
            "/api/blueprints/generate",
            json!({ "name": "Family Home", "description": "A modern 3-bedroom house" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rooms"], 3);
        assert_eq!(body["squareFeet"], 1200);
        assert_eq!(body["style"], "Modern");
        assert!(body["svgData"].as_str().unwrap().starts_with("<svg"));
        assert_eq!(state.read().await.gallery.len(), 1);

        let id = body["id"].as_str().unwrap();
        let (status, fetched) = get_json(&app, &format!("/api/blueprints/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, body);

        let (_, list) = get_json(&app, "/api/blueprints").await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn generate_requires_fields() {
        let (app, _) = app();
        let (status, body) =
            post_json(&app, "/api/blueprints/generate", json!({ "name": "No description" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields");
    }

    #[tokio::test]
    async fn room_limit_enforced() {
        let state = state_with(ServerConfig {
            max_rooms: 5,
            ..ServerConfig::default()
        });
        let app = build_router(state);

        let (status, _) = post_json(
            &app,
            "/api/blueprints/generate",
            json!({ "name": "Mansion", "description": "10 bedroom estate" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_json(&app, "/api/blueprints/floor-plan/6").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        for description in ["a 0-bedroom studio", "a 4000000000-bedroom palace", "6 bedroom villa"] {
            let (status, body) =
                post_json(&app, "/api/blueprints/parse", json!({ "description": description })).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{description}");
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn rejected_generate_skips_write_lock() {
        let state = state_with(ServerConfig {
            max_rooms: 5,
            ..ServerConfig::default()
        });
        let app = build_router(state.clone());

        let _reader = state.read().await;
        let request = post_json(
            &app,
            "/api/blueprints/generate",
            json!({ "name": "Mansion", "description": "10 bedroom estate" }),
        );
        let (status, _) = tokio::time::timeout(std::time::Duration::from_secs(5), request)
            .await
            .expect("handler blocked on the gallery lock");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn gallery_evicts_past_capacity() {
        let state = state_with(ServerConfig {
            gallery_capacity: 2,
            ..ServerConfig::default()
        });
        let app = build_router(state.clone());

        let mut ids = Vec::new();
        for name in ["one", "two", "three"] {
            let (status, body) = post_json(
                &app,
                "/api/blueprints/generate",
                json!({ "name": name, "description": "2 bedroom flat" }),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            ids.push(body["id"].as_str().unwrap().to_string());
        }

        assert_eq!(state.read().await.gallery.len(), 2);
        let (status, _) = get_json(&app, &format!("/api/blueprints/{}", ids[0])).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = get_json(&app, &format!("/api/blueprints/{}", ids[2])).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_blueprint_is_404() {
        let (app, _) = app();
        let (status, body) = get_json(&app, "/api/blueprints/bp_0_nothing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Blueprint not found");
    }

    #[tokio::test]
    async fn floor_plan_is_svg() {
        let (app, _) = app();
        let req = Request::get("/api/blueprints/floor-plan/4").body(Body::empty()).unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/svg+xml");

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let svg = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(svg.starts_with(r#"<svg viewBox="0 0 340 340""#));
        assert_eq!(svg.matches("<rect").count(), 4);

        let (status, _) = get_json(&app, "/api/blueprints/floor-plan/0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn parse_endpoint() {
        let (app, state) = app();
        let (status, body) = post_json(
            &app,
            "/api/blueprints/parse",
            json!({ "description": "Rustic 2 bedroom cabin" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rooms"], 2);
        assert_eq!(body["style"], "Rustic");
        assert_eq!(body["squareFeet"], 800);
        assert_eq!(body["styleMatched"], true);
        assert!(state.read().await.gallery.is_empty());
    }

    fn multipart_body(boundary: &str, name: Option<&str>, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        if let Some(name) = name {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\n{name}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"plan.png\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        body
    }

    async fn upload(app: &Router, body: Vec<u8>) -> (StatusCode, Value) {
        let req = Request::post("/api/blueprints/generate-from-image")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(app, req).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn generate_from_image() {
        let (app, state) = app();
        let png = [0x89, b'P', b'N', b'G', 1, 2, 3, 4];
        let (status, body) =
            upload(&app, multipart_body("XBOUNDARY", Some("Sketch"), "image/png", &png)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Sketch");
        let rooms = body["rooms"].as_u64().unwrap();
        assert!((3..=6).contains(&rooms));
        assert!(body["svgData"].as_str().unwrap().contains("#e8f4f8"));
        assert_eq!(state.read().await.gallery.len(), 1);
    }

    #[tokio::test]
    async fn image_upload_validation() {
        let (app, _) = app();

        let (status, body) =
            upload(&app, multipart_body("XBOUNDARY", Some("Doc"), "application/pdf", b"%PDF")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "File must be an image");

        let (status, body) =
            upload(&app, multipart_body("XBOUNDARY", None, "image/png", b"png")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields");
    }

    #[tokio::test]
    async fn valuation_endpoints() {
        let (app, _) = app();

        let (status, body) = post_json(
            &app,
            "/api/valuation/calculate",
            json!({ "amount": 100.0, "sourceType": "MINED", "basePrice": 2.0 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalValue"], 2000.0);

        let (status, _) = post_json(
            &app,
            "/api/valuation/calculate",
            json!({ "amount": -1.0, "sourceType": "MINED" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = post_json(
            &app,
            "/api/valuation/calculate",
            json!({ "amount": 1e200, "sourceType": "MINED", "basePrice": 1e200 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("overflows"));

        let (status, _) = get_json(&app, "/api/valuation/compare?amount=1e200&basePrice=1e200").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get_json(&app, "/api/valuation/compare?amount=100").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mined"]["totalValue"], 1000.0);
        assert_eq!(body["contributed"]["totalValue"], 500.0);

        let (status, body) = get_json(&app, "/api/valuation/summary").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rules"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn verify_downgrades_without_evidence() {
        let (app, _) = app();
        let (status, body) = post_json(
            &app,
            "/api/valuation/verify",
            json!({ "sourceType": "MINED", "amount": 10.0 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["verified"], false);
        assert_eq!(body["sourceType"], "PURCHASED_CEX");
        assert_eq!(body["valuation"]["totalValue"], 10.0);

        let (_, body) = post_json(
            &app,
            "/api/valuation/verify",
            json!({ "sourceType": "CONTRIBUTED", "networkContribution": "node-42" }),
        )
        .await;
        assert_eq!(body["verified"], true);
        assert!(body.get("valuation").is_none());
    }

    #[tokio::test]
    async fn market_endpoints() {
        let (app, _) = app();
        let (status, body) = post_json(
            &app,
            "/api/market/estimate",
            json!({ "squareFeet": 2000, "bedrooms": 4, "pricePerSqFt": 150.0 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["estimatedValue"], 380_000);

        let (status, body) = post_json(
            &app,
            "/api/market/recommendations",
            json!({ "profile": { "rooms": 2, "squareFeet": 1000, "style": "Modern" } }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<&str> = body["recommendations"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|r| r["title"].as_str())
            .collect();
        assert!(titles.contains(&"Consider Expansion"));
        assert!(titles.contains(&"Add Guest Room"));
        assert!(titles.contains(&"Energy Efficiency Focus"));
        assert_eq!(body["market"]["comparables"].as_array().unwrap().len(), 5);
    }

    fn comparable_json(price: u64) -> Value {
        json!({
            "address": "1 Oak Street",
            "price": price,
            "pricePerSqFt": 200.0,
            "bedrooms": 3,
            "bathrooms": 2,
            "squareFeet": 1800,
            "daysOnMarket": 10,
            "soldDaysAgo": 5,
            "status": "sold"
        })
    }

    #[tokio::test]
    async fn recommendations_aggregate_supplied_market() {
        let (app, _) = app();
        let profile = json!({ "rooms": 4, "squareFeet": 3000, "style": "Traditional" });

        let (status, body) = post_json(
            &app,
            "/api/market/recommendations",
            json!({
                "profile": profile,
                "market": {
                    "comparables": [comparable_json(300_000), comparable_json(500_000)],
                    "marketTrend": "up",
                    "inventoryMonths": 2.0
                }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["market"]["averagePrice"], 400_000.0);
        assert_eq!(body["market"]["medianPrice"], 500_000);
        assert_eq!(body["market"]["marketTrend"], "up");

        let (status, _) = post_json(
            &app,
            "/api/market/recommendations",
            json!({
                "profile": profile,
                "market": { "comparables": [], "marketTrend": "up", "inventoryMonths": 2.0 }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_json(
            &app,
            "/api/market/recommendations",
            json!({
                "profile": profile,
                "market": {
                    "comparables": [comparable_json(300_000)],
                    "marketTrend": "up",
                    "inventoryMonths": -4.0
                }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn company_search_and_stats() {
        let (app, _) = app();

        let (status, body) = get_json(&app, "/api/companies?q=amazon").await;
        assert_eq!(status, StatusCode::OK);
        let hits = body.as_array().unwrap();
        assert!(hits.iter().any(|h| h["domain"] == "amazon.com" && h["category"] == "Retail & Consumer"));

        let (_, body) = get_json(&app, "/api/companies?category=Government%20Services").await;
        assert_eq!(body.as_array().unwrap().len(), 9);

        let (_, body) = get_json(&app, "/api/companies").await;
        assert_eq!(body.as_array().unwrap().len(), 677);

        let (status, body) = get_json(&app, "/api/companies/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalCompanies"], 677);
        assert_eq!(body["totalRevenue"], "$16.1T+");
    }

    #[tokio::test]
    async fn pi_endpoints_need_key() {
        let (app, _) = app();

        let (status, body) = post_json(&app, "/api/login", json!({ "pi_auth_token": "t" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server configuration error");

        let (status, body) =
            post_json(&app, "/api/pi/payments/approve", json!({ "paymentId": "p1" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Payment system not configured");

        let (status, body) = post_json(&app, "/api/pi/payments/approve", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Payment ID is required");
    }

    async fn app_with_mock_pi() -> Router {
        let base_url = mock::spawn().await;
        let state = state_with(ServerConfig::default());
        state.write().await.pi = Some(mock::client(&base_url, mock::SERVER_KEY));
        build_router(state)
    }

    #[tokio::test]
    async fn login_against_pi() {
        let app = app_with_mock_pi().await;

        let (status, body) =
            post_json(&app, "/api/login", json!({ "pi_auth_token": mock::USER_TOKEN })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "id": "user-123", "username": "pioneer", "credits_balance": 10, "terms_accepted": true })
        );

        let (status, body) = post_json(&app, "/api/login", json!({ "pi_auth_token": "bad" })).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid Pi authentication token");

        let (status, _) = post_json(&app, "/api/login", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn payment_flow_against_pi() {
        let app = app_with_mock_pi().await;

        let (status, body) =
            post_json(&app, "/api/pi/payments/approve", json!({ "paymentId": "pay_7" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["paymentId"], "pay_7");
        assert_eq!(body["status"]["developer_approved"], true);

        let (status, body) = post_json(
            &app,
            "/api/pi/payments/complete",
            json!({ "paymentId": "pay_7", "txid": "tx_1" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["txid"], "tx_1");
        assert_eq!(body["transaction"]["txid"], "tx_1");

        let (status, body) =
            post_json(&app, "/api/pi/payments/complete", json!({ "paymentId": "pay_7" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Payment ID and transaction ID are required");
    }

    #[tokio::test]
    async fn payment_upstream_failure_passes_status() {
        let app = app_with_mock_pi().await;
        let (status, body) =
            post_json(&app, "/api/pi/payments/approve", json!({ "paymentId": "missing" })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Payment approval failed");
        assert_eq!(body["details"]["error"], "payment_not_found");
    }

    async fn post_partner(app: &Router, headers: &[(&str, &str)], body: &str) -> (StatusCode, Value) {
        let mut req = Request::post("/api/from-triumph").header(header::CONTENT_TYPE, "application/json");
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        let (status, body) = send(app, req.body(Body::from(body.to_string())).unwrap()).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn app_with_secret(secret: &str) -> Router {
        build_router(state_with(ServerConfig {
            shared_secret_key: Some(secret.into()),
            ..ServerConfig::default()
        }))
    }

    #[tokio::test]
    async fn call_partner_needs_secret() {
        let (app, _) = app();
        let (status, body) = post_json(&app, "/api/call-triumph", json!({ "message": "hi" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server configuration error");
    }

    #[tokio::test]
    async fn call_partner_forwards_signed_body() {
        let base_url = partner::mock::spawn().await;
        let state = state_with(ServerConfig::default());
        state.write().await.partner = Some(partner::mock::client(&base_url, partner::mock::SECRET));
        let app = build_router(state.clone());

        let (status, body) = post_json(
            &app,
            "/api/call-triumph",
            json!({ "message": "blueprint ready", "data": { "id": "bp_1" } }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["triumphResponse"], "Triumph Synergy processed: blueprint ready");
        assert_eq!(body["received"]["id"], "bp_1");

        state.write().await.partner = Some(partner::mock::client(&base_url, "wrong"));
        let (status, body) = post_json(&app, "/api/call-triumph", json!({ "message": "x" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to communicate with Triumph");
    }

    #[tokio::test]
    async fn inbound_partner_call_is_authenticated() {
        let app = app_with_secret("handshake");
        let body = r#"{"message":"hello","data":{"rooms":3}}"#;

        let (status, reply) = post_partner(&app, &[("x-shared-secret", "handshake")], body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["success"], true);
        assert_eq!(reply["received"]["rooms"], 3);
        assert_eq!(reply["stemResponse"], "Stem Synergy processed: hello");
        assert!(reply["timestamp"].as_str().unwrap().ends_with('Z'));

        let signature = partner::sign_payload("handshake", body.as_bytes()).unwrap();
        let signed = [("x-shared-secret", "handshake"), ("x-signature", signature.as_str())];
        let (status, _) = post_partner(&app, &signed, body).await;
        assert_eq!(status, StatusCode::OK);

        let tampered = r#"{"message":"hello","data":{"rooms":30}}"#;
        let (status, _) = post_partner(&app, &signed, tampered).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, reply) = post_partner(&app, &[("x-shared-secret", "guess")], body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply["error"], "Unauthorized");

        let (status, _) = post_partner(&app, &[], body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Authentication is checked before the body is parsed
        let (status, _) = post_partner(&app, &[], "not json").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = post_partner(&app, &[("x-shared-secret", "handshake")], "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn inbound_partner_call_rejected_without_configured_secret() {
        let (app, _) = app();
        let (status, _) = post_partner(&app, &[], r#"{"message":"hi"}"#).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = post_partner(&app, &[("x-shared-secret", "")], r#"{"message":"hi"}"#).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
