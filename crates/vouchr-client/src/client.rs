//! vouchr HTTP client implementation.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use vouchr_core::PurchaseMode;

use crate::error::ClientError;
use crate::types::{
    AddCreditsRequest, AddCreditsResponse, ApiErrorResponse, BalanceResponse, BatchOrder,
    BatchPurchaseRequest, BatchPurchaseResponse, BatchRun, BatchStatus, CodeInfo,
    PurchaseRequest, PurchaseResponse, RedeemRequest, RedeemResponse, SetStockRequest, StockInfo,
};

/// vouchr API client.
#[derive(Debug, Clone)]
pub struct VouchrClient {
    client: Client,
    base_url: Url,
    api_key: String,
    service_name: String,
}

impl VouchrClient {
    /// Create a new vouchr client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the vouchr service (e.g., `"http://vouchr:8080"`)
    /// * `api_key` - Service API key for authentication
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the base URL is invalid.
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, api_key, ClientOptions::default())
    }

    /// Create a new vouchr client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the base URL is invalid, or
    /// `ClientError::Http` if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl AsRef<str>,
        api_key: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url.as_ref())
            .map_err(|e| ClientError::Configuration(format!("invalid base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Configuration(format!(
                "base URL cannot have paths: {base_url}"
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            service_name: options.service_name,
        })
    }

    // =========================================================================
    // Purchases
    // =========================================================================

    /// Buy codes in one atomic call.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InsufficientFunds` or `ClientError::OutOfStock`
    /// when the purchase cannot be fulfilled; nothing is charged in that case.
    pub async fn purchase(&self, request: &PurchaseRequest) -> Result<PurchaseResponse, ClientError> {
        let builder = self.request(Method::POST, &["v1", "purchases"])?;
        self.send(builder.json(request)).await
    }

    /// Buy codes for the buyer's own use; they come back already redeemed.
    ///
    /// # Errors
    ///
    /// Same as [`VouchrClient::purchase`].
    pub async fn purchase_own(
        &self,
        mut request: PurchaseRequest,
    ) -> Result<PurchaseResponse, ClientError> {
        request.mode = PurchaseMode::BuyOwn;
        self.purchase(&request).await
    }

    /// Issue one batch of a large order.
    ///
    /// Sending an index that already committed returns the stored codes
    /// without charging again.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn purchase_batch(
        &self,
        request: &BatchPurchaseRequest,
    ) -> Result<BatchPurchaseResponse, ClientError> {
        let builder = self.request(Method::POST, &["v1", "purchases", "batch"])?;
        self.send(builder.json(request)).await
    }

    /// Drive an order through every batch until it completes or a batch fails.
    pub async fn purchase_all_batches(&self, order: BatchOrder) -> BatchRun {
        let mut batches: Vec<BatchPurchaseResponse> = Vec::new();
        let mut issued: Vec<String> = Vec::new();
        let mut batch_index = 0;

        loop {
            let request = BatchPurchaseRequest::for_order(&order, batch_index, issued.clone());
            let response = match self.purchase_batch(&request).await {
                Ok(response) => response,
                Err(err) => {
                    tracing::warn!(
                        request_id = %order.request_id,
                        batch_index,
                        committed = issued.len(),
                        error = %err,
                        "Batch failed"
                    );
                    return BatchRun {
                        batches,
                        error: Some(err),
                    };
                }
            };

            issued.extend(response.newly_issued.iter().cloned());
            let is_complete = response.is_complete;
            let next_batch_index = response.next_batch_index;
            batches.push(response);

            if is_complete {
                tracing::debug!(
                    request_id = %order.request_id,
                    batches = batches.len(),
                    codes = issued.len(),
                    "Batch order complete"
                );
                return BatchRun {
                    batches,
                    error: None,
                };
            }
            if next_batch_index <= batch_index {
                return BatchRun {
                    batches,
                    error: Some(ClientError::Api {
                        code: "stalled".to_string(),
                        message: format!("batch index did not advance past {batch_index}"),
                        status: 200,
                    }),
                };
            }
            batch_index = next_batch_index;
        }
    }

    /// Get the stored progress of a batched order.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if the order is unknown.
    pub async fn get_batch(&self, request_id: &str) -> Result<BatchStatus, ClientError> {
        let builder = self.request(Method::GET, &["v1", "purchases", "batch", request_id])?;
        self.send(builder).await
    }

    // =========================================================================
    // Codes
    // =========================================================================

    /// Redeem a code.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AlreadyRedeemed` if someone else got there first,
    /// or `ClientError::CodeNotFound` for an unknown code.
    pub async fn redeem(
        &self,
        code: impl Into<String>,
        redeemer_id: impl Into<String>,
    ) -> Result<RedeemResponse, ClientError> {
        let request = RedeemRequest {
            code: code.into(),
            redeemer_id: redeemer_id.into(),
        };
        let builder = self.request(Method::POST, &["v1", "redemptions"])?;
        self.send(builder.json(&request)).await
    }

    /// Look up a code.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::CodeNotFound` for an unknown code.
    pub async fn get_code(&self, code: &str) -> Result<CodeInfo, ClientError> {
        let builder = self.request(Method::GET, &["v1", "codes", code])?;
        self.send(builder).await
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// Get the stock level of a product.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if the product was never stocked.
    pub async fn get_stock(&self, product_key: &str) -> Result<StockInfo, ClientError> {
        let builder = self.request(Method::GET, &["v1", "stock", product_key])?;
        self.send(builder).await
    }

    /// Set the stock count of a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn set_stock(&self, product_key: &str, count: u64) -> Result<StockInfo, ClientError> {
        let builder = self.request(Method::PUT, &["v1", "stock", product_key])?;
        self.send(builder.json(&SetStockRequest { count })).await
    }

    // =========================================================================
    // Credits
    // =========================================================================

    /// Get a user's current balance.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UserNotFound` if the account doesn't exist.
    pub async fn get_balance(&self, user_id: &str) -> Result<BalanceResponse, ClientError> {
        let builder = self.request(Method::GET, &["v1", "accounts", user_id, "balance"])?;
        self.send(builder).await
    }

    /// Top up a user's balance.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for a non-positive amount.
    pub async fn top_up(
        &self,
        user_id: impl Into<String>,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<AddCreditsResponse, ClientError> {
        let request = AddCreditsRequest {
            user_id: user_id.into(),
            amount,
            transaction_type: "top_up".to_string(),
            description: description.into(),
        };
        let builder = self.request(Method::POST, &["v1", "credits", "add"])?;
        self.send(builder.json(&request)).await
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    /// Build an authenticated request; path segments are percent-encoded.
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::Configuration("base URL cannot have paths".into()))?
            .pop_if_empty()
            .extend(segments);

        Ok(self
            .client
            .request(method, url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        Self::handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        let Ok(api_error) = error_body else {
            return Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            });
        };

        let body = api_error.error;
        let detail = |name: &str| {
            body.details
                .as_ref()
                .and_then(|d| d.get(name))
                .cloned()
                .unwrap_or(serde_json::Value::Null)
        };

        let err = match body.code.as_str() {
            "insufficient_funds" => ClientError::InsufficientFunds {
                balance: serde_json::from_value(detail("balance")).unwrap_or_default(),
                required: serde_json::from_value(detail("required")).unwrap_or_default(),
            },
            "out_of_stock" => ClientError::OutOfStock {
                product_key: detail("product_key").as_str().unwrap_or_default().to_string(),
                available: detail("available").as_u64().unwrap_or(0),
                requested: detail("requested").as_u64().unwrap_or(0),
            },
            "already_redeemed" => ClientError::AlreadyRedeemed,
            "code_not_found" => ClientError::CodeNotFound,
            "user_not_found" => ClientError::UserNotFound {
                message: body.message,
            },
            "validation_error" | "invalid_line_items" | "bad_request" => ClientError::Validation {
                message: body.message,
            },
            "conflict" => ClientError::Conflict {
                message: body.message,
            },
            _ => ClientError::Api {
                code: body.code,
                message: body.message,
                status: status.as_u16(),
            },
        };
        Err(err)
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// Service name to include in requests.
    pub service_name: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            service_name: "unknown".to_string(),
        }
    }
}

impl ClientOptions {
    /// Create options with a service name.
    #[must_use]
    pub fn with_service_name(name: impl Into<String>) -> Self {
        Self {
            service_name: name.into(),
            ..Self::default()
        }
    }
}
