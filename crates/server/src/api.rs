//! JSON API for the menu, the set planner, and the order board.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use smartmenu_agent::{parse_request, strip_ui_actions, extract_ui_action, MenuPicker};
use smartmenu_core::{
    format_price_kzt, generate_bundles, replacements, Bundle, Cart, Catalog, GuestIntent,
    MenuItem, MenuItemId, Order, OrderId, OrderStatus, Tag,
};
use smartmenu_db::{snapshot_digest, OrderFeed, OrderRepository, RepositoryError};

#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<Catalog>,
    pub orders: Arc<dyn OrderRepository>,
    pub feed: Arc<OrderFeed>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError { error: message.into() }))
}

fn not_found(message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (StatusCode::NOT_FOUND, Json(ApiError { error: message.into() }))
}

fn repository_error(error: RepositoryError) -> (StatusCode, Json<ApiError>) {
    match error {
        RepositoryError::NotFound(id) => not_found(format!("order not found: {id}")),
        RepositoryError::Domain(domain) => {
            (StatusCode::CONFLICT, Json(ApiError { error: domain.to_string() }))
        }
        other => (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiError { error: other.to_string() })),
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/menu", get(list_menu))
        .route("/api/v1/menu/{id}", get(get_menu_item))
        .route("/api/v1/plan", post(plan))
        .route("/api/v1/replacements", post(list_replacements))
        .route("/api/v1/orders", get(list_orders).post(create_order))
        .route("/api/v1/orders/{id}/status", post(update_order_status))
        .route("/api/v1/agent/reply", post(process_agent_reply))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    pub category: Option<String>,
}

async fn list_menu(
    Query(query): Query<MenuQuery>,
    State(state): State<ApiState>,
) -> Result<Json<Vec<MenuItem>>, (StatusCode, Json<ApiError>)> {
    let items = match query.category.as_deref() {
        None => state.catalog.items().to_vec(),
        Some(key) => {
            let category = smartmenu_core::Category::ALL
                .into_iter()
                .find(|category| category.key() == key)
                .ok_or_else(|| bad_request(format!("unknown category `{key}`")))?;
            state.catalog.in_category(category).cloned().collect()
        }
    };
    Ok(Json(items))
}

async fn get_menu_item(
    Path(id): Path<String>,
    State(state): State<ApiState>,
) -> Result<Json<MenuItem>, (StatusCode, Json<ApiError>)> {
    state
        .catalog
        .find(&MenuItemId::new(id.clone()))
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(format!("menu item not found: {id}")))
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub message: String,
    /// Pins the randomized choice points; omitted in production requests.
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub reply: String,
    pub intent: GuestIntent,
    pub bundles: Vec<Bundle>,
}

async fn plan(State(state): State<ApiState>, Json(request): Json<PlanRequest>) -> Json<PlanResponse> {
    let intent = parse_request(&request.message);
    let mut rng = match request.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let bundles = generate_bundles(&state.catalog, &intent, &mut rng);

    info!(
        event_name = "api.plan.generated",
        people = intent.people,
        budget_kzt = intent.budget_kzt,
        bundles = bundles.len(),
        "generated bundle plan"
    );

    let reply = format!(
        "Отлично! Для {} человек с бюджетом {} подготовил 3 варианта. Выберите подходящий или замените позиции.",
        intent.people,
        format_price_kzt(intent.budget_kzt)
    );

    Json(PlanResponse { reply, intent, bundles })
}

#[derive(Debug, Deserialize)]
pub struct ReplacementsRequest {
    pub item_id: String,
    #[serde(default)]
    pub exclude_tags: Vec<Tag>,
}

async fn list_replacements(
    State(state): State<ApiState>,
    Json(request): Json<ReplacementsRequest>,
) -> Result<Json<Vec<MenuItem>>, (StatusCode, Json<ApiError>)> {
    let current = state
        .catalog
        .find(&MenuItemId::new(request.item_id.clone()))
        .ok_or_else(|| not_found(format!("menu item not found: {}", request.item_id)))?;

    Ok(Json(replacements(&state.catalog, current, &request.exclude_tags)))
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub table: String,
    #[serde(default)]
    pub comment: String,
    pub lines: Vec<CreateOrderLine>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderLine {
    pub item_id: String,
    pub quantity: u32,
}

async fn create_order(
    State(state): State<ApiState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), (StatusCode, Json<ApiError>)> {
    if request.table.trim().is_empty() {
        return Err(bad_request("table must not be empty"));
    }

    let mut cart = Cart::new();
    for line in &request.lines {
        let item = state
            .catalog
            .find(&MenuItemId::new(line.item_id.clone()))
            .ok_or_else(|| bad_request(format!("unknown menu item `{}`", line.item_id)))?;
        cart.add(item.clone(), line.quantity);
    }

    if cart.is_empty() {
        return Err(bad_request("order must contain at least one item"));
    }

    let order = Order::create(request.table, cart.into_order_lines(), request.comment);
    state.orders.insert(&order).await.map_err(repository_error)?;

    info!(
        event_name = "api.order.created",
        order_id = %order.id.0,
        table = %order.table,
        total_kzt = order.total_kzt,
        "order accepted"
    );

    Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    /// Digest from the caller's last snapshot; unchanged boards return 304.
    pub known_digest: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderBoard {
    pub digest: String,
    pub orders: Vec<Order>,
}

async fn list_orders(
    Query(query): Query<OrdersQuery>,
    State(state): State<ApiState>,
) -> Result<Json<OrderBoard>, StatusCode> {
    let snapshot = state.feed.latest();

    // The feed lags one poll interval behind writes; read through to the
    // store so a client sees its own order immediately.
    let orders = match state.orders.list_recent(100).await {
        Ok(orders) => orders,
        Err(_) => snapshot.orders,
    };
    let digest = snapshot_digest(&orders);

    if query.known_digest.as_deref() == Some(digest.as_str()) {
        return Err(StatusCode::NOT_MODIFIED);
    }

    Ok(Json(OrderBoard { digest, orders }))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}

async fn update_order_status(
    Path(id): Path<String>,
    State(state): State<ApiState>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Order>, (StatusCode, Json<ApiError>)> {
    let order = state
        .orders
        .update_status(&OrderId(id), request.status)
        .await
        .map_err(repository_error)?;

    info!(
        event_name = "api.order.status_updated",
        order_id = %order.id.0,
        status = order.status.as_str(),
        "order status advanced"
    );

    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct AgentReplyRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct AgentReplyResponse {
    /// Agent text with action blocks removed.
    pub text: String,
    pub picker: Option<MenuPicker>,
}

/// Maps raw agent output to UI state: visible text plus, when the reply
/// carries a well-formed picker action, the parsed picker payload.
async fn process_agent_reply(Json(request): Json<AgentReplyRequest>) -> Json<AgentReplyResponse> {
    let picker = extract_ui_action(&request.text).as_ref().and_then(MenuPicker::from_action);
    Json(AgentReplyResponse { text: strip_ui_actions(&request.text), picker })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use smartmenu_core::Catalog;
    use smartmenu_db::{InMemoryOrderRepository, OrderFeed};

    use super::{router, ApiState};

    fn test_state() -> ApiState {
        let orders = Arc::new(InMemoryOrderRepository::default());
        let (feed, _poller) = OrderFeed::spawn(orders.clone(), Duration::from_millis(50));
        ApiState { catalog: Arc::new(Catalog::builtin()), orders, feed: Arc::new(feed) }
    }

    async fn send(state: ApiState, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state).oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    #[tokio::test]
    async fn menu_endpoints_serve_the_catalog() {
        let state = test_state();

        let (status, body) = send(state.clone(), get("/api/v1/menu")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().expect("item list").len(), 42);

        let (status, body) = send(state.clone(), get("/api/v1/menu?category=hookah")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().expect("hookah list").len(), 3);

        let (status, body) = send(state.clone(), get("/api/v1/menu/h1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Классический кальян");

        let (status, _) = send(state, get("/api/v1/menu/zz")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn plan_parses_the_message_and_returns_three_bundles() {
        let state = test_state();
        let (status, body) = send(
            state,
            post_json(
                "/api/v1/plan",
                json!({"message": "нас трое, бюджет 30000, кальян", "seed": 11}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["intent"]["people"], 3);
        assert_eq!(body["intent"]["budget_kzt"], 30_000);
        assert_eq!(body["bundles"].as_array().expect("bundles").len(), 3);
        assert!(body["reply"].as_str().expect("reply").starts_with("Отлично! Для 3 человек"));
    }

    #[tokio::test]
    async fn replacements_respect_the_dietary_filter() {
        let state = test_state();
        let (status, body) = send(
            state,
            post_json(
                "/api/v1/replacements",
                json!({"item_id": "g6", "exclude_tags": ["halal"]}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let candidates = body.as_array().expect("candidates");
        assert!(!candidates.is_empty());
        assert!(candidates.len() <= 6);
        for candidate in candidates {
            assert_eq!(candidate["category"], "hot");
            assert!(candidate["tags"]
                .as_array()
                .expect("tags")
                .iter()
                .any(|tag| tag == "halal"));
        }
    }

    #[tokio::test]
    async fn order_lifecycle_over_http() {
        let state = test_state();

        let (status, created) = send(
            state.clone(),
            post_json(
                "/api/v1/orders",
                json!({
                    "table": "Стол 9",
                    "comment": "поскорее",
                    "lines": [
                        {"item_id": "g6", "quantity": 2},
                        {"item_id": "n4", "quantity": 1}
                    ]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["total_kzt"], 2 * 3800 + 2500);
        let order_id = created["id"].as_str().expect("order id").to_string();

        let (status, board) = send(state.clone(), get("/api/v1/orders")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(board["orders"].as_array().expect("orders").len(), 1);
        let digest = board["digest"].as_str().expect("digest").to_string();

        // Same digest, nothing changed: not modified.
        let (status, _) =
            send(state.clone(), get(&format!("/api/v1/orders?known_digest={digest}"))).await;
        assert_eq!(status, StatusCode::NOT_MODIFIED);

        let (status, updated) = send(
            state.clone(),
            post_json(&format!("/api/v1/orders/{order_id}/status"), json!({"status": "cooking"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "cooking");

        // The status change must invalidate the digest.
        let (status, _) =
            send(state.clone(), get(&format!("/api/v1/orders?known_digest={digest}"))).await;
        assert_eq!(status, StatusCode::OK);

        // Regression attempt is rejected with a conflict.
        let (status, _) = send(
            state,
            post_json(&format!("/api/v1/orders/{order_id}/status"), json!({"status": "new"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn invalid_orders_are_rejected() {
        let state = test_state();

        let (status, _) = send(
            state.clone(),
            post_json("/api/v1/orders", json!({"table": "Стол 1", "lines": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            state,
            post_json(
                "/api/v1/orders",
                json!({"table": "Стол 1", "lines": [{"item_id": "nope", "quantity": 1}]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn agent_reply_endpoint_splits_text_and_picker() {
        let state = test_state();
        let reply = "Готово!\n<UI_ACTION>{\"action\": \"OPEN_MENU_PICKER\", \"title\": \"Подбор\", \"variants\": []}</UI_ACTION>";

        let (status, body) =
            send(state.clone(), post_json("/api/v1/agent/reply", json!({"text": reply}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Готово!");
        assert_eq!(body["picker"]["title"], "Подбор");

        let (status, body) =
            send(state, post_json("/api/v1/agent/reply", json!({"text": "просто текст"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["picker"].is_null());
    }
}
