use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};

use super::Page;
use crate::constants::CARD_PROVIDERS;
use crate::error::SahelPayError;
use crate::http_client::{decode, envelope, SahelPayClient};
use crate::resources::{Payment, TransactionStatus, DEFAULT_CURRENCY};

/// Upper bound of the polling interval.
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Parameters of `POST /v1/payments`.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePayment {
    pub amount: i64,
    pub currency: String,
    /// `ORANGE_MONEY`, `WAVE`, `MOOV`, or a card provider.
    pub provider: String,
    pub customer_phone: String,
    /// Inferred as `CARD` for card providers when unset.
    pub payment_method: Option<String>,
    pub country: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub return_url: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
    pub client_reference: Option<String>,
    /// `true` shows the SahelPay checkout page, `false` redirects straight to the provider.
    pub hosted_checkout: bool,
    #[serde(skip)]
    pub description: Option<String>,
    #[serde(skip)]
    pub callback_url: Option<String>,
    #[serde(skip)]
    pub metadata: Option<Map<String, Value>>,
}

impl CreatePayment {
    pub fn new(amount: i64, provider: impl Into<String>, customer_phone: impl Into<String>) -> Self {
        Self {
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
            provider: provider.into(),
            customer_phone: customer_phone.into(),
            payment_method: None,
            country: None,
            customer_name: None,
            customer_email: None,
            return_url: None,
            success_url: None,
            cancel_url: None,
            client_reference: None,
            hosted_checkout: true,
            description: None,
            callback_url: None,
            metadata: None,
        }
    }

    fn inferred_payment_method(&self) -> Option<String> {
        match &self.payment_method {
            Some(m) if !m.is_empty() => Some(m.clone()),
            _ if CARD_PROVIDERS.contains(&self.provider.as_str()) => Some("CARD".to_string()),
            _ => None,
        }
    }

    /// Caller metadata with `description` and `callback_url` merged in,
    /// without overriding keys the caller already set.
    fn merged_metadata(&self) -> Map<String, Value> {
        let mut metadata = self.metadata.clone().unwrap_or_default();
        for (key, value) in [
            ("description", &self.description),
            ("callback_url", &self.callback_url),
        ] {
            if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
                metadata
                    .entry(key)
                    .or_insert_with(|| Value::from(v.as_str()));
            }
        }
        metadata
    }
}

/// Card payments need the customer identity up front.
fn validate_card_fields(req: &CreatePayment) -> Result<(), SahelPayError> {
    let missing = |field: &Option<String>| field.as_deref().map_or(true, str::is_empty);
    if missing(&req.customer_name) {
        return Err(SahelPayError::validation(
            "card payments require customer_name",
            "VALIDATION_ERROR",
        ));
    }
    if missing(&req.customer_email) {
        return Err(SahelPayError::validation(
            "card payments require customer_email",
            "VALIDATION_ERROR",
        ));
    }
    if req.customer_phone.is_empty() {
        return Err(SahelPayError::validation(
            "card payments require customer_phone",
            "VALIDATION_ERROR",
        ));
    }
    Ok(())
}

/// Filters for [`Payments::list`].
#[derive(Debug, Clone)]
pub struct ListPayments {
    pub limit: u32,
    pub page: u32,
    /// Overrides `page` when set.
    pub offset: Option<u32>,
    pub status: Option<TransactionStatus>,
}

impl Default for ListPayments {
    fn default() -> Self {
        Self {
            limit: 20,
            page: 1,
            offset: None,
            status: None,
        }
    }
}

/// Result of [`Payments::check_status`].
#[derive(Debug, Clone, PartialEq)]
pub struct StatusCheck {
    pub status: TransactionStatus,
    pub payment: Payment,
}

/// Settings for [`Payments::poll`].
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Give up after this long.
    pub timeout: Duration,
    /// First delay between checks; grows by half after every check, up to 10s.
    pub interval: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            interval: Duration::from_secs(2),
        }
    }
}

pub struct Payments<'a> {
    client: &'a SahelPayClient,
}

impl<'a> Payments<'a> {
    pub(crate) fn new(client: &'a SahelPayClient) -> Self {
        Self { client }
    }

    /// Create a payment.
    ///
    /// Card payments (explicit `payment_method = "CARD"` or a card provider)
    /// are rejected locally unless name, email and phone are present. The
    /// returned record is completed with the request's provider, phone,
    /// method, country and metadata.
    pub async fn create(&self, req: CreatePayment) -> Result<Payment, SahelPayError> {
        let payment_method = req.inferred_payment_method();
        if payment_method.as_deref() == Some("CARD") {
            validate_card_fields(&req)?;
        }
        let metadata = req.merged_metadata();

        let mut body = serde_json::to_value(&req)
            .map_err(|e| SahelPayError::MalformedPayload(e.to_string()))?;
        if let Value::Object(obj) = &mut body {
            obj.insert("payment_method".into(), payment_method.clone().into());
            if !metadata.is_empty() {
                obj.insert("metadata".into(), Value::Object(metadata.clone()));
            }
        }

        let resp = self
            .client
            .request(Method::POST, "/v1/payments", &[], Some(&body))
            .await?;
        let mut data = match envelope(resp, Value::Object(Map::new())) {
            Value::Object(obj) => obj,
            _ => Map::new(),
        };
        data.insert("customer_phone".into(), req.customer_phone.clone().into());
        data.insert("provider".into(), req.provider.clone().into());
        if let Some(method) = payment_method {
            data.insert("payment_method".into(), method.into());
        }
        if let Some(country) = req.country.filter(|c| !c.is_empty()) {
            data.insert("country".into(), country.into());
        }
        if !metadata.is_empty() {
            data.insert("metadata".into(), Value::Object(metadata));
        }

        let payment: Payment = decode(Value::Object(data))?;
        tracing::info!(
            reference_id = %payment.reference_id,
            provider = %payment.provider,
            amount = payment.amount,
            "payment created"
        );
        Ok(payment)
    }

    /// Look a payment up by the merchant's own reference. `None` when the
    /// API has no match.
    pub async fn search(&self, client_reference: &str) -> Result<Option<Payment>, SahelPayError> {
        let resp = self
            .client
            .request(
                Method::GET,
                "/v1/payments/search",
                &[("client_reference", client_reference.to_string())],
                None,
            )
            .await?;
        match envelope(resp, Value::Null) {
            Value::Null => Ok(None),
            Value::Object(obj) if obj.is_empty() => Ok(None),
            data => decode(data).map(Some),
        }
    }

    /// Full payment record including fees, ledger entries and provider events.
    pub async fn details(&self, payment_id: &str) -> Result<Payment, SahelPayError> {
        self.client
            .data(Method::GET, &format!("/v1/payments/{payment_id}/details"), &[], None)
            .await
    }

    /// Ask the gateway to re-check a payment with its provider. Returns the
    /// raw response.
    pub async fn reconcile(&self, payment_id: &str) -> Result<Value, SahelPayError> {
        self.client
            .request(
                Method::POST,
                &format!("/v1/payments/{payment_id}/reconcile"),
                &[],
                None,
            )
            .await
    }

    /// Providers available to the merchant.
    pub async fn providers(&self) -> Result<Vec<Value>, SahelPayError> {
        let resp = self
            .client
            .request(Method::GET, "/v1/payments/providers", &[], None)
            .await?;
        match envelope(resp, Value::Array(Vec::new())) {
            Value::Object(mut obj) => match obj.remove("providers") {
                Some(Value::Array(list)) => Ok(list),
                _ => Ok(Vec::new()),
            },
            Value::Array(list) => Ok(list),
            _ => Ok(Vec::new()),
        }
    }

    /// Suggested provider for a phone number (`provider`, `confidence`).
    pub async fn recommend(&self, phone: &str) -> Result<Value, SahelPayError> {
        self.client
            .data(
                Method::GET,
                "/v1/payments/recommend",
                &[("phone", phone.to_string())],
                None,
            )
            .await
    }

    pub async fn retrieve(&self, reference_id: &str) -> Result<Payment, SahelPayError> {
        self.client
            .data(Method::GET, &format!("/v1/payments/{reference_id}/status"), &[], None)
            .await
    }

    pub async fn check_status(&self, reference_id: &str) -> Result<StatusCheck, SahelPayError> {
        let payment = self.retrieve(reference_id).await?;
        Ok(StatusCheck {
            status: payment.status,
            payment,
        })
    }

    /// Payment history, newest first.
    pub async fn list(&self, filter: ListPayments) -> Result<Page<Payment>, SahelPayError> {
        let offset = filter
            .offset
            .unwrap_or_else(|| filter.page.saturating_sub(1) * filter.limit);
        let mut query = super::limit_offset(filter.limit, offset);
        if let Some(status) = filter.status {
            query.push(("status", status.as_str().to_string()));
        }
        let data: Value = self
            .client
            .data(Method::GET, "/v1/payments/history", &query, None)
            .await?;
        Page::from_data(data, "transactions")
    }

    /// Check `reference_id` until it reaches `SUCCESS`, `FAILED` or
    /// `CANCELLED`, then return it.
    pub async fn poll(
        &self,
        reference_id: &str,
        options: PollOptions,
    ) -> Result<Payment, SahelPayError> {
        self.poll_with(reference_id, options, |_| {}).await
    }

    /// [`poll`](Self::poll), calling `on_status` after every check.
    pub async fn poll_with<F>(
        &self,
        reference_id: &str,
        options: PollOptions,
        mut on_status: F,
    ) -> Result<Payment, SahelPayError>
    where
        F: FnMut(&Payment),
    {
        let started = tokio::time::Instant::now();
        let mut delay = options.interval;

        loop {
            let StatusCheck { status, payment } = self.check_status(reference_id).await?;
            on_status(&payment);

            if status.is_terminal() {
                return Ok(payment);
            }
            if started.elapsed() > options.timeout {
                return Err(SahelPayError::Timeout(format!(
                    "polling {reference_id} timed out after {:?}",
                    options.timeout
                )));
            }

            tracing::debug!(reference_id = %reference_id, status = status.as_str(), delay = ?delay, "payment still pending");
            tokio::time::sleep(delay).await;
            delay = delay.mul_f64(1.5).min(MAX_POLL_INTERVAL);
        }
    }
}
