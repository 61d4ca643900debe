use axum::{Json, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::core::errors::{ErrorKind, FieldError, LedgerError};
use crate::core::models::expense::SplitStrategy;
use crate::core::services::{NewExpense, NewSettlement};
use crate::core::split::ShareInput;

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AddMemberRequest {
    pub user_id: String,
}

/// One participant of an expense. `amount` is read for exact splits,
/// `percentage` for percentage splits, neither for equal splits.
#[derive(Deserialize, ToSchema)]
pub struct SplitRequest {
    pub user_id: String,
    #[schema(value_type = Option<String>, example = "25.00")]
    pub amount: Option<Decimal>,
    #[schema(value_type = Option<String>, example = "50")]
    pub percentage: Option<Decimal>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateExpenseRequest {
    pub group_id: String,
    pub paid_by: String,
    #[schema(value_type = String, example = "100.00")]
    pub amount: Decimal,
    pub currency: Option<String>,
    pub description: String,
    pub split_strategy: SplitStrategy,
    pub splits: Vec<SplitRequest>,
}

impl From<CreateExpenseRequest> for NewExpense {
    fn from(req: CreateExpenseRequest) -> Self {
        NewExpense {
            group_id: req.group_id,
            paid_by: req.paid_by,
            amount: req.amount,
            currency: req.currency,
            description: req.description,
            split_strategy: req.split_strategy,
            splits: req
                .splits
                .into_iter()
                .map(|s| ShareInput {
                    user_id: s.user_id,
                    amount: s.amount,
                    percentage: s.percentage,
                })
                .collect(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSettlementRequest {
    pub group_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    #[schema(value_type = String, example = "20.00")]
    pub amount: Decimal,
    pub currency: Option<String>,
    pub description: Option<String>,
}

impl From<CreateSettlementRequest> for NewSettlement {
    fn from(req: CreateSettlementRequest) -> Self {
        NewSettlement {
            group_id: req.group_id,
            from_user_id: req.from_user_id,
            to_user_id: req.to_user_id,
            amount: req.amount,
            currency: req.currency,
            description: req.description,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CurrencyQuery {
    /// ISO code; the configured default currency when omitted
    pub currency: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldError>,
}

// Newtype wrapper for LedgerError to implement IntoResponse
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Validation | ErrorKind::InvalidSplit | ErrorKind::InsufficientDebt => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::AlreadyExists => StatusCode::CONFLICT,
            ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let kind = self.0.kind();
        let body = match self.0 {
            LedgerError::StorageError(cause) => {
                error!("Storage failure: {}", cause);
                ErrorResponse {
                    error: "Internal server error".to_string(),
                    kind,
                    field: None,
                }
            }
            LedgerError::InvalidInput(_, field) => ErrorResponse {
                error: field.to_string(),
                kind,
                field: Some(field),
            },
            other => ErrorResponse {
                error: other.to_string(),
                kind,
                field: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
