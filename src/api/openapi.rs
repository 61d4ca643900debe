use utoipa::OpenApi;

use crate::{
    api::models::{
        AddMemberRequest, CreateExpenseRequest, CreateGroupRequest, CreateSettlementRequest, CreateUserRequest,
        ErrorResponse, HealthResponse, SplitRequest,
    },
    core::{
        errors::{ErrorKind, FieldError},
        models::{
            balance::{BalanceSheet, BalanceSummary, UserBalance},
            expense::{Expense, Split, SplitStrategy},
            group::{Group, GroupMember},
            settlement::{DebtSimplification, Settlement, SettlementSuggestion},
            user::User,
        },
        money::Currency,
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::health,
        super::handlers::create_user,
        super::handlers::list_users,
        super::handlers::get_user_by_email,
        super::handlers::get_user,
        super::handlers::get_user_groups,
        super::handlers::list_user_expenses,
        super::handlers::list_user_settlements,
        super::handlers::create_group,
        super::handlers::list_groups,
        super::handlers::get_group,
        super::handlers::get_group_members,
        super::handlers::add_member,
        super::handlers::remove_member,
        super::handlers::create_expense,
        super::handlers::get_expense,
        super::handlers::list_group_expenses,
        super::handlers::create_settlement,
        super::handlers::get_settlement,
        super::handlers::list_group_settlements,
        super::handlers::get_group_balances,
        super::handlers::get_balance,
        super::handlers::get_balance_sheet,
        super::handlers::simplify_debts
    ),
    components(schemas(
        CreateUserRequest,
        CreateGroupRequest,
        AddMemberRequest,
        SplitRequest,
        CreateExpenseRequest,
        CreateSettlementRequest,
        ErrorResponse,
        HealthResponse,
        ErrorKind,
        FieldError,
        Currency,
        User,
        Group,
        GroupMember,
        SplitStrategy,
        Split,
        Expense,
        Settlement,
        SettlementSuggestion,
        DebtSimplification,
        UserBalance,
        BalanceSummary,
        BalanceSheet
    )),
    info(
        title = "Splitledger API",
        description = "Shared expense ledger with balances, settlements and debt simplification",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
