use crate::{
    api::{AppState, idempotency::idempotency_middleware, models::*},
    core::models::{
        balance::{BalanceSheet, UserBalance},
        expense::Expense,
        group::Group,
        settlement::{DebtSimplification, Settlement},
        user::User,
    },
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
};

// Define API routes
pub fn api_routes(state: AppState) -> Router {
    let idempotent_routes = Router::new()
        .route("/expenses", post(create_expense))
        .route("/settlements", post(create_settlement))
        .route_layer(middleware::from_fn_with_state(state.clone(), idempotency_middleware));

    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route("/users/by-email", get(get_user_by_email))
        .route("/users/{user_id}", get(get_user))
        .route("/users/{user_id}/groups", get(get_user_groups))
        .route("/users/{user_id}/expenses", get(list_user_expenses))
        .route("/users/{user_id}/settlements", get(list_user_settlements))
        .route("/groups", post(create_group).get(list_groups))
        .route("/groups/{group_id}", get(get_group))
        .route("/groups/{group_id}/members", get(get_group_members).post(add_member))
        .route("/groups/{group_id}/members/{user_id}", delete(remove_member))
        .route("/groups/{group_id}/expenses", get(list_group_expenses))
        .route("/groups/{group_id}/settlements", get(list_group_settlements))
        .route("/groups/{group_id}/balances", get(get_group_balances))
        .route("/groups/{group_id}/balances/{user_id}", get(get_balance))
        .route("/groups/{group_id}/balance-sheet", get(get_balance_sheet))
        .route("/groups/{group_id}/simplify", get(simplify_debts))
        .route("/expenses/{expense_id}", get(get_expense))
        .route("/settlements/{settlement_id}", get(get_settlement))
        .merge(idempotent_routes)
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = User),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.service.create_user(&req.name, &req.email).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = String, Path, description = "ID of the user to retrieve")
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = User),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn get_user(State(state): State<AppState>, Path(user_id): Path<String>) -> Result<Json<User>, ApiError> {
    let user = state.service.get_user(&user_id).await?;
    Ok(Json(user))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Users, newest first", body = [User])
    )
)]
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.service.list_users(query.page, query.limit).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/by-email",
    params(EmailQuery),
    responses(
        (status = 200, description = "User registered with the email", body = User),
        (status = 400, description = "Malformed email", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
async fn get_user_by_email(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<User>, ApiError> {
    let user = state.service.get_user_by_email(&query.email).await?;
    Ok(Json(user))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/expenses",
    params(
        ("user_id" = String, Path, description = "ID of the payer"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Expenses the user paid for, newest first", body = [Expense]),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
async fn list_user_expenses(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    let expenses = state
        .service
        .list_user_expenses(&user_id, query.page, query.limit)
        .await?;
    Ok(Json(expenses))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/settlements",
    params(
        ("user_id" = String, Path, description = "ID of the user"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Settlements paid or received by the user, newest first", body = [Settlement]),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
async fn list_user_settlements(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Vec<Settlement>>, ApiError> {
    let settlements = state
        .service
        .list_user_settlements(&user_id, query.page, query.limit)
        .await?;
    Ok(Json(settlements))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/groups",
    params(
        ("user_id" = String, Path, description = "ID of the user")
    ),
    responses(
        (status = 200, description = "Groups the user belongs to", body = [Group]),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
async fn get_user_groups(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Group>>, ApiError> {
    let groups = state.service.get_user_groups(&user_id).await?;
    Ok(Json(groups))
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created successfully", body = Group),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn create_group(
    State(state): State<AppState>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let group = state
        .service
        .create_group(&req.name, req.description.as_deref(), &req.created_by)
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "/api/groups",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Groups, newest first", body = [Group])
    )
)]
async fn list_groups(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Vec<Group>>, ApiError> {
    let groups = state.service.list_groups(query.page, query.limit).await?;
    Ok(Json(groups))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group to retrieve")
    ),
    responses(
        (status = 200, description = "Group retrieved successfully", body = Group),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
async fn get_group(State(state): State<AppState>, Path(group_id): Path<String>) -> Result<Json<Group>, ApiError> {
    let group = state.service.get_group(&group_id).await?;
    Ok(Json(group))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/members",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Group members", body = [User]),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
async fn get_group_members(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<User>>, ApiError> {
    let members = state.service.get_group_members(&group_id).await?;
    Ok(Json(members))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/members",
    request_body = AddMemberRequest,
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Member added", body = Group),
        (status = 404, description = "Group or user not found", body = ErrorResponse),
        (status = 409, description = "Already a member", body = ErrorResponse)
    )
)]
async fn add_member(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Json<Group>, ApiError> {
    let group = state.service.add_member(&group_id, &req.user_id).await?;
    Ok(Json(group))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{group_id}/members/{user_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        ("user_id" = String, Path, description = "ID of the member to remove")
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 400, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
async fn remove_member(
    State(state): State<AppState>,
    Path((group_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.service.remove_member(&group_id, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = CreateExpenseRequest,
    params(
        ("Idempotency-Key" = String, Header, description = "UUID identifying this request")
    ),
    responses(
        (status = 201, description = "Expense recorded", body = Expense),
        (status = 400, description = "Invalid expense or split", body = ErrorResponse),
        (status = 404, description = "Group or user not found", body = ErrorResponse),
        (status = 409, description = "Idempotency key reused", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn create_expense(
    State(state): State<AppState>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let expense = state.service.create_expense(req.into()).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

#[utoipa::path(
    get,
    path = "/api/expenses/{expense_id}",
    params(
        ("expense_id" = String, Path, description = "ID of the expense")
    ),
    responses(
        (status = 200, description = "Expense with its splits", body = Expense),
        (status = 404, description = "Expense not found", body = ErrorResponse)
    )
)]
async fn get_expense(
    State(state): State<AppState>,
    Path(expense_id): Path<String>,
) -> Result<Json<Expense>, ApiError> {
    let expense = state.service.get_expense(&expense_id).await?;
    Ok(Json(expense))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/expenses",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Expenses, newest first", body = [Expense]),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
async fn list_group_expenses(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    let expenses = state
        .service
        .list_group_expenses(&group_id, query.page, query.limit)
        .await?;
    Ok(Json(expenses))
}

#[utoipa::path(
    post,
    path = "/api/settlements",
    request_body = CreateSettlementRequest,
    params(
        ("Idempotency-Key" = String, Header, description = "UUID identifying this request")
    ),
    responses(
        (status = 201, description = "Settlement recorded", body = Settlement),
        (status = 400, description = "Invalid settlement or insufficient debt", body = ErrorResponse),
        (status = 404, description = "Group or user not found", body = ErrorResponse),
        (status = 409, description = "Idempotency key reused", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn create_settlement(
    State(state): State<AppState>,
    Json(req): Json<CreateSettlementRequest>,
) -> Result<(StatusCode, Json<Settlement>), ApiError> {
    let settlement = state.service.create_settlement(req.into()).await?;
    Ok((StatusCode::CREATED, Json(settlement)))
}

#[utoipa::path(
    get,
    path = "/api/settlements/{settlement_id}",
    params(
        ("settlement_id" = String, Path, description = "ID of the settlement")
    ),
    responses(
        (status = 200, description = "Settlement retrieved", body = Settlement),
        (status = 404, description = "Settlement not found", body = ErrorResponse)
    )
)]
async fn get_settlement(
    State(state): State<AppState>,
    Path(settlement_id): Path<String>,
) -> Result<Json<Settlement>, ApiError> {
    let settlement = state.service.get_settlement(&settlement_id).await?;
    Ok(Json(settlement))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/settlements",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Settlements, newest first", body = [Settlement]),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
async fn list_group_settlements(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Vec<Settlement>>, ApiError> {
    let settlements = state
        .service
        .list_group_settlements(&group_id, query.page, query.limit)
        .await?;
    Ok(Json(settlements))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/balances",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        CurrencyQuery
    ),
    responses(
        (status = 200, description = "Every balance of the group", body = [UserBalance]),
        (status = 400, description = "Unsupported currency", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
async fn get_group_balances(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Query(query): Query<CurrencyQuery>,
) -> Result<Json<Vec<UserBalance>>, ApiError> {
    let balances = state
        .service
        .get_group_balances(&group_id, query.currency.as_deref())
        .await?;
    Ok(Json(balances))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/balances/{user_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        ("user_id" = String, Path, description = "ID of the user"),
        CurrencyQuery
    ),
    responses(
        (status = 200, description = "Balance of one user, zero when none is recorded", body = UserBalance),
        (status = 404, description = "Group or user not found", body = ErrorResponse)
    )
)]
async fn get_balance(
    State(state): State<AppState>,
    Path((group_id, user_id)): Path<(String, String)>,
    Query(query): Query<CurrencyQuery>,
) -> Result<Json<UserBalance>, ApiError> {
    let balance = state
        .service
        .get_balance(&group_id, &user_id, query.currency.as_deref())
        .await?;
    Ok(Json(balance))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/balance-sheet",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        CurrencyQuery
    ),
    responses(
        (status = 200, description = "Balances with totals", body = BalanceSheet),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
async fn get_balance_sheet(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Query(query): Query<CurrencyQuery>,
) -> Result<Json<BalanceSheet>, ApiError> {
    let sheet = state
        .service
        .get_balance_sheet(&group_id, query.currency.as_deref())
        .await?;
    Ok(Json(sheet))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/simplify",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        CurrencyQuery
    ),
    responses(
        (status = 200, description = "Suggested payments that settle the group", body = DebtSimplification),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
async fn simplify_debts(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Query(query): Query<CurrencyQuery>,
) -> Result<Json<DebtSimplification>, ApiError> {
    let result = state
        .service
        .simplify_debts(&group_id, query.currency.as_deref())
        .await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::money::Currency;
    use crate::core::services::LedgerService;
    use crate::infrastructure::cache::in_memory::InMemoryIdempotencyStore;
    use crate::infrastructure::storage::in_memory::InMemoryStorage;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> Router {
        let state = AppState {
            service: Arc::new(LedgerService::new(InMemoryStorage::new(), Currency::Usd)),
            idempotency: Arc::new(InMemoryIdempotencyStore::new()),
            idempotency_ttl: Duration::from_secs(3600),
        };
        Router::new().nest("/api", api_routes(state))
    }

    async fn send(app: &Router, method: &str, uri: &str, key: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(key) = key {
            builder = builder.header("idempotency-key", key);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn group_with_two_members(app: &Router) -> (String, String, String) {
        let (_, alice) = send(app, "POST", "/api/users", None, json!({"name": "Alice", "email": "alice@example.com"})).await;
        let (_, bob) = send(app, "POST", "/api/users", None, json!({"name": "Bob", "email": "bob@example.com"})).await;
        let alice = alice["id"].as_str().unwrap().to_string();
        let bob = bob["id"].as_str().unwrap().to_string();
        let (status, group) = send(app, "POST", "/api/groups", None, json!({"name": "Flat", "created_by": alice})).await;
        assert_eq!(status, StatusCode::CREATED);
        let group = group["id"].as_str().unwrap().to_string();
        let (status, _) = send(
            app,
            "POST",
            &format!("/api/groups/{}/members", group),
            None,
            json!({"user_id": bob}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        (group, alice, bob)
    }

    #[tokio::test]
    async fn expense_requires_idempotency_key() {
        let app = app();
        let (group, alice, bob) = group_with_two_members(&app).await;
        let body = json!({
            "group_id": group, "paid_by": alice, "amount": "40.00", "description": "Groceries",
            "split_strategy": "equal", "splits": [{"user_id": alice}, {"user_id": bob}]
        });
        let (status, error) = send(&app, "POST", "/api/expenses", None, body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["kind"], "VALIDATION");

        let (status, _) = send(&app, "POST", "/api/expenses", Some("not-a-uuid"), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn retried_expense_is_replayed_not_recorded_twice() {
        let app = app();
        let (group, alice, bob) = group_with_two_members(&app).await;
        let key = Uuid::new_v4().to_string();
        let body = json!({
            "group_id": group, "paid_by": alice, "amount": "40.00", "description": "Groceries",
            "split_strategy": "equal", "splits": [{"user_id": alice}, {"user_id": bob}]
        });

        let (status, first) = send(&app, "POST", "/api/expenses", Some(&key), body.clone()).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, second) = send(&app, "POST", "/api/expenses", Some(&key), body).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["id"], second["id"]);

        let (_, expenses) = send(&app, "GET", &format!("/api/groups/{}/expenses", group), None, Value::Null).await;
        assert_eq!(expenses.as_array().unwrap().len(), 1);
        let (_, balance) = send(
            &app,
            "GET",
            &format!("/api/groups/{}/balances/{}", group, bob),
            None,
            Value::Null,
        )
        .await;
        assert_eq!(balance["balance"], "20.00");
    }

    #[tokio::test]
    async fn reused_key_with_different_body_conflicts() {
        let app = app();
        let (group, alice, bob) = group_with_two_members(&app).await;
        let key = Uuid::new_v4().to_string();
        let body = |amount: &str| {
            json!({
                "group_id": group, "paid_by": alice, "amount": amount, "description": "Taxi",
                "split_strategy": "equal", "splits": [{"user_id": alice}, {"user_id": bob}]
            })
        };
        let (status, _) = send(&app, "POST", "/api/expenses", Some(&key), body("10.00")).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, error) = send(&app, "POST", "/api/expenses", Some(&key), body("12.00")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error["kind"], "ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn reused_key_with_different_query_conflicts() {
        let app = app();
        let (group, alice, bob) = group_with_two_members(&app).await;
        let key = Uuid::new_v4().to_string();
        let body = json!({
            "group_id": group, "paid_by": alice, "amount": "10.00", "description": "Taxi",
            "split_strategy": "equal", "splits": [{"user_id": alice}, {"user_id": bob}]
        });
        let (status, _) = send(&app, "POST", "/api/expenses?source=web", Some(&key), body.clone()).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(&app, "POST", "/api/expenses?source=web", Some(&key), body.clone()).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(&app, "POST", "/api/expenses?source=mobile", Some(&key), body).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn failed_request_does_not_consume_key() {
        let app = app();
        let (group, alice, bob) = group_with_two_members(&app).await;
        let key = Uuid::new_v4().to_string();
        let settlement = json!({
            "group_id": group, "from_user_id": bob, "to_user_id": alice, "amount": "5.00"
        });
        let (status, error) = send(&app, "POST", "/api/settlements", Some(&key), settlement.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["kind"], "INSUFFICIENT_DEBT");

        let expense = json!({
            "group_id": group, "paid_by": alice, "amount": "10.00", "description": "Taxi",
            "split_strategy": "exact", "splits": [{"user_id": bob, "amount": "10.00"}]
        });
        let (status, _) = send(&app, "POST", "/api/expenses", Some(&Uuid::new_v4().to_string()), expense).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, recorded) = send(&app, "POST", "/api/settlements", Some(&key), settlement).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(recorded["amount"], "5.00");
    }

    #[tokio::test]
    async fn simplify_and_unknown_group() {
        let app = app();
        let (status, error) = send(
            &app,
            "GET",
            &format!("/api/groups/{}/simplify", Uuid::new_v4()),
            None,
            Value::Null,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["kind"], "NOT_FOUND");

        let (group, _, _) = group_with_two_members(&app).await;
        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/groups/{}/simplify?currency=XYZ", group),
            None,
            Value::Null,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn user_lookup_routes() {
        let app = app();
        let (group, alice, _) = group_with_two_members(&app).await;

        let (status, user) = send(&app, "GET", "/api/users/by-email?email=Alice%40example.com", None, Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["id"], alice.as_str());

        let (status, users) = send(&app, "GET", "/api/users?limit=1", None, Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(users.as_array().unwrap().len(), 1);

        let (status, groups) = send(&app, "GET", "/api/groups", None, Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(groups[0]["id"], group.as_str());

        let (status, history) = send(&app, "GET", &format!("/api/users/{}/expenses", alice), None, Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert!(history.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = health().await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.service, "splitledger");
    }
}
