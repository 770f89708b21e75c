//! Account, balance and ledger handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vouchr_core::{
    CreditAccount, CreditTransaction, IssuanceError, MemberRole, TransactionType, UserId,
};
use vouchr_store::{Store, StoreError};

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::handlers::codes::CodeResponse;
use crate::handlers::{run_blocking, PageQuery};
use crate::state::AppState;

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))
}

/// Create account request.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// User ID; generated when omitted.
    pub user_id: Option<String>,
    /// Network role (default: member).
    #[serde(default)]
    pub role: Option<String>,
    /// Network level (default: 1).
    #[serde(default = "default_level")]
    pub level: u32,
}

fn default_level() -> u32 {
    1
}

/// Account response.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// User ID.
    pub user_id: String,
    /// Current balance.
    pub balance: Decimal,
    /// Network role.
    pub role: String,
    /// Network level.
    pub level: u32,
    /// Whether the account has been activated.
    pub activated: bool,
    /// Credits spent on codes, all time.
    pub lifetime_spent: Decimal,
    /// Credits received, all time.
    pub lifetime_credited: Decimal,
    /// Creation timestamp.
    pub created_at: String,
}

impl From<&CreditAccount> for AccountResponse {
    fn from(account: &CreditAccount) -> Self {
        Self {
            user_id: account.user_id.to_string(),
            balance: account.balance,
            role: account.role.to_string(),
            level: account.level,
            activated: account.activated,
            lifetime_spent: account.lifetime_spent,
            lifetime_credited: account.lifetime_credited,
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// Create a credit account.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<CreateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let user_id = match body.user_id.as_deref() {
        Some(raw) => parse_user_id(raw)?,
        None => UserId::generate(),
    };
    let role = match body.role.as_deref() {
        Some(raw) => raw
            .parse::<MemberRole>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => MemberRole::Member,
    };

    let account = CreditAccount::new(user_id, role, body.level);
    let store = Arc::clone(&state.store);
    let created = account.clone();
    run_blocking(move || match store.create_account(&created) {
        Ok(()) => Ok(()),
        Err(StoreError::AlreadyExists { .. }) => Err(ApiError::Conflict(format!(
            "Account already exists for user {user_id}"
        ))),
        Err(e) => Err(e.into()),
    })
    .await?;

    tracing::info!(
        service = %auth.service_name,
        user_id = %user_id,
        role = %role,
        level = body.level,
        "Account created"
    );

    Ok(Json(AccountResponse::from(&account)))
}

/// Get an account.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(user_id): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let account = state
        .store
        .get_account(&user_id)?
        .ok_or_else(|| IssuanceError::UserNotFound {
            user_id: user_id.to_string(),
        })?;

    Ok(Json(AccountResponse::from(&account)))
}

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// User ID.
    pub user_id: String,
    /// Current balance.
    pub balance: Decimal,
}

/// Get the current balance.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(user_id): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let balance = state.store.get_balance(&user_id)?;

    Ok(Json(BalanceResponse {
        user_id: user_id.to_string(),
        balance,
    }))
}

/// Transaction response.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: String,
    /// Signed amount (positive = credit, negative = debit).
    pub amount: Decimal,
    /// Transaction type.
    pub transaction_type: TransactionType,
    /// Balance after this transaction.
    pub balance_after: Decimal,
    /// Description.
    pub description: String,
    /// Purchase this debit paid for.
    pub issuance_id: Option<String>,
    /// Timestamp.
    pub created_at: String,
}

impl From<&CreditTransaction> for TransactionResponse {
    fn from(tx: &CreditTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            amount: tx.amount,
            transaction_type: tx.transaction_type,
            balance_after: tx.balance_after,
            description: tx.description.clone(),
            issuance_id: tx.issuance_id.map(|id| id.to_string()),
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// List transactions response.
#[derive(Debug, Serialize)]
pub struct ListTransactionsResponse {
    /// Transactions (newest first).
    pub transactions: Vec<TransactionResponse>,
    /// Whether there are more transactions.
    pub has_more: bool,
}

/// List ledger history.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListTransactionsResponse>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    state.store.get_balance(&user_id)?;

    // Fetch one more than requested to determine has_more
    let limit = query.capped_limit();
    let transactions = state
        .store
        .list_transactions_by_user(&user_id, limit + 1, query.offset)?;

    let has_more = transactions.len() > limit;
    let transactions = transactions
        .iter()
        .take(limit)
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(ListTransactionsResponse {
        transactions,
        has_more,
    }))
}

/// List codes response.
#[derive(Debug, Serialize)]
pub struct ListCodesResponse {
    /// Codes (newest purchase first).
    pub codes: Vec<CodeResponse>,
    /// Whether there are more codes.
    pub has_more: bool,
}

/// List the codes a merchant bought.
pub async fn list_codes(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListCodesResponse>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    state.store.get_balance(&user_id)?;

    let limit = query.capped_limit();
    let codes = state
        .store
        .list_codes_by_owner(&user_id, limit + 1, query.offset)?;

    let has_more = codes.len() > limit;
    let codes = codes.iter().take(limit).map(CodeResponse::from).collect();

    Ok(Json(ListCodesResponse { codes, has_more }))
}

/// Add credits request.
#[derive(Debug, Deserialize)]
pub struct AddCreditsRequest {
    /// User ID to credit.
    pub user_id: String,
    /// Amount to add; must be positive.
    pub amount: Decimal,
    /// Top-up (default), refund or adjustment.
    #[serde(default = "default_credit_type")]
    pub transaction_type: TransactionType,
    /// Reason shown in the ledger.
    pub description: String,
}

fn default_credit_type() -> TransactionType {
    TransactionType::TopUp
}

/// Add credits response.
#[derive(Debug, Serialize)]
pub struct AddCreditsResponse {
    /// Always `true`; failures use the error body.
    pub success: bool,
    /// Ledger entry ID.
    pub transaction_id: String,
    /// Balance after the credit.
    pub new_balance: Decimal,
}

/// Add credits to an account.
pub async fn add_credits(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<AddCreditsRequest>,
) -> Result<Json<AddCreditsResponse>, ApiError> {
    let user_id = parse_user_id(&body.user_id)?;
    if !body.transaction_type.is_credit() {
        return Err(ApiError::BadRequest(
            "transaction_type must be top_up, refund or adjustment".into(),
        ));
    }

    let store = Arc::clone(&state.store);
    let AddCreditsRequest {
        amount,
        transaction_type,
        description,
        ..
    } = body;
    let tx = run_blocking(move || {
        Ok(store.credit(&user_id, amount, transaction_type, &description)?)
    })
    .await?;

    tracing::info!(
        service = %auth.service_name,
        user_id = %user_id,
        amount = %amount,
        new_balance = %tx.balance_after,
        "Credits added"
    );

    Ok(Json(AddCreditsResponse {
        success: true,
        transaction_id: tx.id.to_string(),
        new_balance: tx.balance_after,
    }))
}
