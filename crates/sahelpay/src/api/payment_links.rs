use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::error::SahelPayError;
use crate::http_client::SahelPayClient;
use crate::resources::{PaymentLink, DEFAULT_CURRENCY};

#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentLink {
    pub title: String,
    pub price: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl CreatePaymentLink {
    pub fn new(title: impl Into<String>, price: i64) -> Self {
        Self {
            title: title.into(),
            price,
            currency: DEFAULT_CURRENCY.to_string(),
            redirect_url: None,
        }
    }
}

pub struct PaymentLinks<'a> {
    client: &'a SahelPayClient,
}

impl<'a> PaymentLinks<'a> {
    pub(crate) fn new(client: &'a SahelPayClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, req: CreatePaymentLink) -> Result<PaymentLink, SahelPayError> {
        let body = serde_json::to_value(&req)
            .map_err(|e| SahelPayError::MalformedPayload(e.to_string()))?;
        self.client
            .data(Method::POST, "/v1/payment-links", &[], Some(&body))
            .await
    }

    pub async fn list(&self) -> Result<Vec<PaymentLink>, SahelPayError> {
        self.client.data_list("/v1/payment-links", &[]).await
    }

    pub async fn retrieve(&self, slug: &str) -> Result<PaymentLink, SahelPayError> {
        self.client
            .data(Method::GET, &format!("/v1/payment-links/{slug}"), &[], None)
            .await
    }

    pub async fn activate(&self, link_id: &str) -> Result<PaymentLink, SahelPayError> {
        self.set_active(link_id, "activate").await
    }

    pub async fn deactivate(&self, link_id: &str) -> Result<PaymentLink, SahelPayError> {
        self.set_active(link_id, "deactivate").await
    }

    async fn set_active(&self, link_id: &str, action: &str) -> Result<PaymentLink, SahelPayError> {
        let empty = Value::Object(Default::default());
        self.client
            .data(
                Method::PATCH,
                &format!("/v1/payment-links/{link_id}/{action}"),
                &[],
                Some(&empty),
            )
            .await
    }
}
