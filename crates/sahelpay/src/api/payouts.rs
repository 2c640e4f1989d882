use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};

use super::Page;
use crate::constants::{MAX_PAYOUT_AMOUNT, MIN_PAYOUT_AMOUNT};
use crate::error::SahelPayError;
use crate::http_client::SahelPayClient;
use crate::resources::{Payout, PayoutStats};

/// Parameters of `POST /v1/payouts`.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePayout {
    /// In XOF, between 100 and 5 000 000.
    pub amount: i64,
    pub provider: String,
    pub recipient_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `MERCHANT_WITHDRAWAL`, `SUPPLIER_PAYMENT`, ... (default `OTHER`)
    #[serde(rename = "type")]
    pub payout_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    /// Replaying a request with the same key returns the original payout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl CreatePayout {
    pub fn new(amount: i64, provider: impl Into<String>, recipient_phone: impl Into<String>) -> Self {
        Self {
            amount,
            provider: provider.into(),
            recipient_phone: recipient_phone.into(),
            recipient_name: None,
            description: None,
            payout_type: "OTHER".to_string(),
            metadata: None,
            idempotency_key: None,
        }
    }

    fn validate(&self) -> Result<(), SahelPayError> {
        if self.amount < MIN_PAYOUT_AMOUNT {
            return Err(SahelPayError::validation(
                format!("minimum payout amount is {MIN_PAYOUT_AMOUNT} XOF"),
                "INVALID_AMOUNT",
            ));
        }
        if self.amount > MAX_PAYOUT_AMOUNT {
            return Err(SahelPayError::validation(
                format!("maximum payout amount is {MAX_PAYOUT_AMOUNT} XOF"),
                "INVALID_AMOUNT",
            ));
        }
        Ok(())
    }
}

/// Filters for [`Payouts::list`].
#[derive(Debug, Clone)]
pub struct ListPayouts {
    pub limit: u32,
    pub page: u32,
    pub status: Option<String>,
    pub payout_type: Option<String>,
}

impl Default for ListPayouts {
    fn default() -> Self {
        Self {
            limit: 20,
            page: 1,
            status: None,
            payout_type: None,
        }
    }
}

pub struct Payouts<'a> {
    client: &'a SahelPayClient,
}

impl<'a> Payouts<'a> {
    pub(crate) fn new(client: &'a SahelPayClient) -> Self {
        Self { client }
    }

    /// Send money to a mobile wallet. Out-of-range amounts fail with
    /// `INVALID_AMOUNT` before any request is made.
    pub async fn create(&self, req: CreatePayout) -> Result<Payout, SahelPayError> {
        req.validate()?;
        let body = serde_json::to_value(&req)
            .map_err(|e| SahelPayError::MalformedPayload(e.to_string()))?;
        let payout: Payout = self
            .client
            .data(Method::POST, "/v1/payouts", &[], Some(&body))
            .await?;
        tracing::info!(
            reference = %payout.reference,
            provider = %payout.provider,
            amount = payout.amount,
            "payout created"
        );
        Ok(payout)
    }

    pub async fn retrieve(&self, reference: &str) -> Result<Payout, SahelPayError> {
        self.client
            .data(Method::GET, &format!("/v1/payouts/{reference}"), &[], None)
            .await
    }

    pub async fn list(&self, filter: ListPayouts) -> Result<Page<Payout>, SahelPayError> {
        let mut query = super::limit_page(filter.limit, filter.page);
        if let Some(status) = filter.status {
            query.push(("status", status));
        }
        if let Some(kind) = filter.payout_type {
            query.push(("type", kind));
        }
        let data: Value = self
            .client
            .data(Method::GET, "/v1/payouts", &query, None)
            .await?;
        Page::from_data(data, "payouts")
    }

    /// Cancel a payout that has not been processed yet.
    pub async fn cancel(&self, reference: &str) -> Result<Payout, SahelPayError> {
        self.client
            .data(Method::DELETE, &format!("/v1/payouts/{reference}"), &[], None)
            .await
    }

    pub async fn stats(&self) -> Result<PayoutStats, SahelPayError> {
        self.client
            .data(Method::GET, "/v1/payouts/stats", &[], None)
            .await
    }
}

/// Parameters of `POST /v1/withdrawals`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateWithdrawal {
    pub amount: i64,
    pub recipient_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateWithdrawal {
    pub fn new(amount: i64, recipient_phone: impl Into<String>) -> Self {
        Self {
            amount,
            recipient_phone: recipient_phone.into(),
            recipient_name: None,
            description: None,
        }
    }
}

/// Withdrawals from the merchant balance. Responses are returned as raw JSON.
pub struct Withdrawals<'a> {
    client: &'a SahelPayClient,
}

impl<'a> Withdrawals<'a> {
    pub(crate) fn new(client: &'a SahelPayClient) -> Self {
        Self { client }
    }

    /// Available and pending balance (`available`, `pending`, `currency`).
    pub async fn balance(&self) -> Result<Value, SahelPayError> {
        self.client
            .data(Method::GET, "/v1/withdrawals/balance", &[], None)
            .await
    }

    pub async fn create(&self, req: CreateWithdrawal) -> Result<Value, SahelPayError> {
        let body = serde_json::to_value(&req)
            .map_err(|e| SahelPayError::MalformedPayload(e.to_string()))?;
        self.client
            .data(Method::POST, "/v1/withdrawals", &[], Some(&body))
            .await
    }

    pub async fn list(
        &self,
        limit: u32,
        page: u32,
        status: Option<&str>,
    ) -> Result<Value, SahelPayError> {
        let mut query = super::limit_page(limit, page);
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }
        self.client
            .data(Method::GET, "/v1/withdrawals", &query, None)
            .await
    }

    pub async fn stats(&self) -> Result<Value, SahelPayError> {
        self.client
            .data(Method::GET, "/v1/withdrawals/stats", &[], None)
            .await
    }

    /// Cancel a pending withdrawal.
    pub async fn cancel(&self, withdrawal_id: &str) -> Result<Value, SahelPayError> {
        self.client
            .data(
                Method::PATCH,
                &format!("/v1/withdrawals/{withdrawal_id}/cancel"),
                &[],
                None,
            )
            .await
    }
}
