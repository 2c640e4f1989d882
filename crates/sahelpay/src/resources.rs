//! Typed records returned by the API and carried in webhook events.
//!
//! Decoding is lenient in the same places the gateway is: missing fields fall
//! back to defaults (`XOF`, `PENDING`, empty strings) and amounts may arrive
//! as integers, floats or numeric strings.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Default currency for every SahelPay record.
pub const DEFAULT_CURRENCY: &str = "XOF";

/// Hosted page used when a payment link comes back without a `url`.
pub const PAYMENT_LINK_BASE: &str = "https://pay.sahelpay.ml";

/// Lifecycle status shared by payments, payouts and refunds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Processing,
    Success,
    Completed,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Processing => "PROCESSING",
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Cancelled => "CANCELLED",
            TransactionStatus::Unknown => "UNKNOWN",
        }
    }

    /// Whether a payment in this status will not change any more.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Success | TransactionStatus::Failed | TransactionStatus::Cancelled
        )
    }
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_true() -> bool {
    true
}

fn default_payout_type() -> String {
    "OTHER".to_string()
}

/// Amount in the smallest currency unit. Accepts `5000`, `5000.0` and `"5000"`.
///
/// Fractional values are rounded to the nearest unit, half away from zero:
/// a `fee` of `37.5` decodes as `38`. `null` decodes as `0`.
fn de_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .ok_or_else(|| D::Error::custom(format!("amount out of range: {n}"))),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .or_else(|_| s.parse::<f64>().map(|f| f.round() as i64))
                .map_err(|_| D::Error::custom(format!("invalid amount: {s:?}")))
        }
        other => Err(D::Error::custom(format!("invalid amount: {other}"))),
    }
}

fn de_currency<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_currency))
}

fn de_payout_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_payout_type))
}

fn de_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TransactionStatus, D::Error> {
    Ok(Option::<TransactionStatus>::deserialize(deserializer)?.unwrap_or_default())
}

fn de_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A payment collected from a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PaymentWire")]
pub struct Payment {
    pub id: String,
    pub reference_id: String,
    pub amount: i64,
    pub currency: String,
    pub provider: String,
    pub status: TransactionStatus,
    pub customer_phone: String,
    pub client_reference: Option<String>,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub country: Option<String>,
    pub provider_ref: Option<String>,
    pub redirect_url: Option<String>,
    pub expires_at: Option<String>,
    pub checkout_url: Option<String>,
    pub ussd_code: Option<String>,
    pub metadata: Option<Value>,
    pub fee_calculation: Option<Value>,
    pub ledger_entries: Option<Vec<Value>>,
    pub provider_events: Option<Vec<Value>>,
    pub gateway_used: Option<String>,
    pub routing_reason: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Payment {
    pub fn is_successful(&self) -> bool {
        self.status == TransactionStatus::Success
    }

    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }

    pub fn is_failed(&self) -> bool {
        self.status == TransactionStatus::Failed
    }
}

/// Wire shape of a payment, before field fallbacks are applied.
#[derive(Deserialize)]
struct PaymentWire {
    #[serde(default, deserialize_with = "de_string")]
    id: String,
    reference_id: Option<String>,
    reference: Option<String>,
    #[serde(default, deserialize_with = "de_amount")]
    amount: i64,
    currency: Option<String>,
    provider: Option<String>,
    #[serde(default, deserialize_with = "de_status")]
    status: TransactionStatus,
    customer_phone: Option<String>,
    client_reference: Option<String>,
    description: Option<String>,
    payment_method: Option<String>,
    country: Option<String>,
    provider_ref: Option<String>,
    redirect_url: Option<String>,
    expires_at: Option<String>,
    checkout_url: Option<String>,
    ussd_code: Option<String>,
    metadata: Option<Value>,
    fee_calculation: Option<Value>,
    ledger_entries: Option<Vec<Value>>,
    provider_events: Option<Vec<Value>>,
    gateway_used: Option<String>,
    routing_reason: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

impl From<PaymentWire> for Payment {
    fn from(w: PaymentWire) -> Self {
        let reference_id = non_empty(w.reference_id)
            .or_else(|| non_empty(w.reference))
            .unwrap_or_else(|| w.id.clone());
        let provider = non_empty(w.provider)
            .or_else(|| non_empty(w.payment_method.clone()))
            .unwrap_or_default();
        let metadata_str = |path: &[&str]| {
            let mut node = w.metadata.as_ref()?;
            for key in path {
                node = node.get(*key)?;
            }
            node.as_str().map(str::to_string)
        };
        let customer_phone = non_empty(w.customer_phone)
            .or_else(|| metadata_str(&["customer", "phone"]))
            .unwrap_or_default();
        let description = non_empty(w.description).or_else(|| metadata_str(&["description"]));

        Payment {
            id: w.id,
            reference_id,
            amount: w.amount,
            currency: w.currency.unwrap_or_else(default_currency),
            provider,
            status: w.status,
            customer_phone,
            client_reference: w.client_reference,
            description,
            payment_method: w.payment_method,
            country: w.country,
            provider_ref: w.provider_ref,
            redirect_url: w.redirect_url,
            expires_at: w.expires_at,
            checkout_url: w.checkout_url,
            ussd_code: w.ussd_code,
            metadata: w.metadata,
            fee_calculation: w.fee_calculation,
            ledger_entries: w.ledger_entries,
            provider_events: w.provider_events,
            gateway_used: w.gateway_used,
            routing_reason: w.routing_reason,
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

/// A hosted, reusable payment link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PaymentLinkWire")]
pub struct PaymentLink {
    pub id: String,
    pub title: String,
    pub price: i64,
    pub currency: String,
    pub slug: String,
    pub url: String,
    pub is_active: bool,
    pub redirect_url: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Deserialize)]
struct PaymentLinkWire {
    #[serde(default, deserialize_with = "de_string")]
    id: String,
    #[serde(default, deserialize_with = "de_string")]
    title: String,
    #[serde(default, deserialize_with = "de_amount")]
    price: i64,
    #[serde(default = "default_currency", deserialize_with = "de_currency")]
    currency: String,
    #[serde(default, deserialize_with = "de_string")]
    slug: String,
    url: Option<String>,
    #[serde(default = "default_true")]
    is_active: bool,
    redirect_url: Option<String>,
    created_at: Option<String>,
}

impl From<PaymentLinkWire> for PaymentLink {
    fn from(w: PaymentLinkWire) -> Self {
        let url = match non_empty(w.url) {
            Some(url) => url,
            None if !w.slug.is_empty() => format!("{PAYMENT_LINK_BASE}/{}", w.slug),
            None => String::new(),
        };
        PaymentLink {
            id: w.id,
            title: w.title,
            price: w.price,
            currency: w.currency,
            slug: w.slug,
            url,
            is_active: w.is_active,
            redirect_url: w.redirect_url,
            created_at: w.created_at,
        }
    }
}

/// Money sent from the merchant balance to a mobile wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    #[serde(default, deserialize_with = "de_string")]
    pub id: String,
    #[serde(default, deserialize_with = "de_string")]
    pub reference: String,
    #[serde(default, deserialize_with = "de_amount")]
    pub amount: i64,
    #[serde(default, deserialize_with = "de_amount")]
    pub fee: i64,
    #[serde(default, deserialize_with = "de_amount")]
    pub net_amount: i64,
    #[serde(default = "default_currency", deserialize_with = "de_currency")]
    pub currency: String,
    #[serde(default, deserialize_with = "de_string")]
    pub provider: String,
    #[serde(default, deserialize_with = "de_string")]
    pub recipient_phone: String,
    #[serde(default, deserialize_with = "de_status")]
    pub status: TransactionStatus,
    #[serde(
        rename = "type",
        default = "default_payout_type",
        deserialize_with = "de_payout_type"
    )]
    pub payout_type: String,
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl Payout {
    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }

    /// Alias of [`Payout::is_completed`]; payouts settle as `COMPLETED`.
    pub fn is_successful(&self) -> bool {
        self.is_completed()
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::Pending | TransactionStatus::Processing
        )
    }

    pub fn is_failed(&self) -> bool {
        self.status == TransactionStatus::Failed
    }
}

/// A full or partial refund of a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refund {
    #[serde(default, deserialize_with = "de_string")]
    pub id: String,
    #[serde(default, deserialize_with = "de_string")]
    pub payment_id: String,
    #[serde(default, deserialize_with = "de_amount")]
    pub amount: i64,
    #[serde(default = "default_currency", deserialize_with = "de_currency")]
    pub currency: String,
    #[serde(default, deserialize_with = "de_status")]
    pub status: TransactionStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub client_reference: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Refund {
    pub fn is_successful(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::Success | TransactionStatus::Completed
        )
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::Pending | TransactionStatus::Processing
        )
    }

    pub fn is_failed(&self) -> bool {
        self.status == TransactionStatus::Failed
    }
}

/// Aggregate payout statistics for the merchant account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoutStats {
    pub total: u64,
    pub completed: u64,
    pub failed: u64,
    pub pending: u64,
    pub success_rate: f64,
    #[serde(deserialize_with = "de_amount")]
    pub total_volume: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payment_defaults_from_empty_object() {
        let p: Payment = serde_json::from_value(json!({})).unwrap();
        assert_eq!(p.currency, "XOF");
        assert_eq!(p.status, TransactionStatus::Pending);
        assert_eq!(p.amount, 0);
        assert!(p.is_pending());
        assert!(p.reference_id.is_empty());
    }

    #[test]
    fn test_payment_fallbacks() {
        let p: Payment = serde_json::from_value(json!({
            "id": "pay_1",
            "reference": "REF-1",
            "amount": "5000",
            "payment_method": "WAVE",
            "status": "SUCCESS",
            "metadata": {"customer": {"phone": "+22370000000"}, "description": "Order #12"}
        }))
        .unwrap();
        assert_eq!(p.reference_id, "REF-1");
        assert_eq!(p.provider, "WAVE");
        assert_eq!(p.customer_phone, "+22370000000");
        assert_eq!(p.description.as_deref(), Some("Order #12"));
        assert_eq!(p.amount, 5000);
        assert!(p.is_successful());
    }

    #[test]
    fn test_reference_falls_back_to_id() {
        let p: Payment = serde_json::from_value(json!({"id": "pay_2"})).unwrap();
        assert_eq!(p.reference_id, "pay_2");
    }

    #[test]
    fn test_amount_accepts_floats() {
        let p: Payout = serde_json::from_value(json!({"amount": 2500.0, "fee": 37.5})).unwrap();
        assert_eq!(p.amount, 2500);
        assert_eq!(p.fee, 38);
        assert_eq!(p.payout_type, "OTHER");
    }

    #[test]
    fn test_null_currency_and_type_fall_back() {
        let p: Payout = serde_json::from_value(json!({
            "id": "po_1", "currency": null, "type": null, "status": null
        }))
        .unwrap();
        assert_eq!(p.currency, "XOF");
        assert_eq!(p.payout_type, "OTHER");
        assert_eq!(p.status, TransactionStatus::Pending);

        let r: Refund = serde_json::from_value(json!({"currency": null, "amount": 500})).unwrap();
        assert_eq!(r.currency, "XOF");

        let link: PaymentLink =
            serde_json::from_value(json!({"slug": "pagne", "currency": null})).unwrap();
        assert_eq!(link.currency, "XOF");
    }

    #[test]
    fn test_invalid_amount_is_rejected() {
        assert!(serde_json::from_value::<Refund>(json!({"amount": true})).is_err());
        assert!(serde_json::from_value::<Refund>(json!({"amount": "ten"})).is_err());
    }

    #[test]
    fn test_payout_predicates() {
        let mut p: Payout = serde_json::from_value(json!({"status": "PROCESSING"})).unwrap();
        assert!(p.is_pending());
        p.status = TransactionStatus::Completed;
        assert!(p.is_completed() && p.is_successful());
        p.status = TransactionStatus::Failed;
        assert!(p.is_failed() && !p.is_pending());
    }

    #[test]
    fn test_unknown_status() {
        let r: Refund = serde_json::from_value(json!({"status": "REVERSED"})).unwrap();
        assert_eq!(r.status, TransactionStatus::Unknown);
        assert!(!r.is_successful() && !r.is_pending() && !r.is_failed());
    }

    #[test]
    fn test_payment_link_url_fallback() {
        let link: PaymentLink =
            serde_json::from_value(json!({"id": "pl_1", "slug": "tshirt", "price": 7500})).unwrap();
        assert_eq!(link.url, "https://pay.sahelpay.ml/tshirt");
        assert!(link.is_active);
    }
}
