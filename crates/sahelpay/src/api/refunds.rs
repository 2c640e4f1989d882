use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::Page;
use crate::error::SahelPayError;
use crate::http_client::SahelPayClient;
use crate::resources::Refund;

#[derive(Debug, Clone, Serialize)]
pub struct CreateRefund {
    pub payment_id: String,
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Also return the gateway fees to the customer.
    pub refund_fees: bool,
}

impl CreateRefund {
    pub fn new(payment_id: impl Into<String>, amount: i64) -> Self {
        Self {
            payment_id: payment_id.into(),
            amount,
            reason: None,
            refund_fees: false,
        }
    }
}

pub struct Refunds<'a> {
    client: &'a SahelPayClient,
}

impl<'a> Refunds<'a> {
    pub(crate) fn new(client: &'a SahelPayClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, req: CreateRefund) -> Result<Refund, SahelPayError> {
        let body = serde_json::to_value(&req)
            .map_err(|e| SahelPayError::MalformedPayload(e.to_string()))?;
        self.client
            .data(Method::POST, "/v1/refunds", &[], Some(&body))
            .await
    }

    pub async fn list(&self, limit: u32, offset: u32) -> Result<Page<Refund>, SahelPayError> {
        let data: Value = self
            .client
            .data(Method::GET, "/v1/refunds", &super::limit_offset(limit, offset), None)
            .await?;
        Page::from_data(data, "refunds")
    }
}
