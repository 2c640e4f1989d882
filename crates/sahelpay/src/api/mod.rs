//! Resource accessors borrowed from [`SahelPayClient`](crate::SahelPayClient).
//!
//! Each accessor is a thin wrapper over the shared HTTP client: it builds the
//! path and body, and decodes the unwrapped `data` into a typed record where
//! the SDK has one, or into a [`serde_json::Value`] otherwise.

mod billing;
mod payment_links;
mod payments;
mod payouts;
mod refunds;

pub use billing::{
    CreateCustomer, CreatePlan, CreatePortalSession, CreateSubscription, Customers, Plans, Portal,
    Subscriptions, UpdateCustomer,
};
pub use payment_links::{CreatePaymentLink, PaymentLinks};
pub use payments::{CreatePayment, ListPayments, Payments, PollOptions, StatusCheck};
pub use payouts::{CreatePayout, CreateWithdrawal, ListPayouts, Payouts, Withdrawals};
pub use refunds::{CreateRefund, Refunds};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::SahelPayError;
use crate::http_client::decode;

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Pagination block as returned by the API (`total`, `limit`, `offset`...).
    pub pagination: Value,
}

impl<T: DeserializeOwned> Page<T> {
    /// Decode `data[items_key]` and `data.pagination`. Missing keys give an
    /// empty page.
    pub(crate) fn from_data(mut data: Value, items_key: &str) -> Result<Self, SahelPayError> {
        let items = match data.get_mut(items_key).map(Value::take) {
            Some(Value::Null) | None => Vec::new(),
            Some(items) => decode(items)?,
        };
        let pagination = match data.get_mut("pagination").map(Value::take) {
            Some(Value::Null) | None => Value::Object(Default::default()),
            Some(p) => p,
        };
        Ok(Self { items, pagination })
    }
}

/// Query pairs for `limit`/`offset` style listing.
fn limit_offset(limit: u32, offset: u32) -> Vec<(&'static str, String)> {
    vec![("limit", limit.to_string()), ("offset", offset.to_string())]
}

/// Query pairs for `limit`/`page` style listing.
fn limit_page(limit: u32, page: u32) -> Vec<(&'static str, String)> {
    vec![("limit", limit.to_string()), ("page", page.to_string())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Refund;
    use serde_json::json;

    #[test]
    fn test_page_from_data() {
        let page: Page<Refund> = Page::from_data(
            json!({"refunds": [{"id": "r1", "amount": "500"}], "pagination": {"total": 1}}),
            "refunds",
        )
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].amount, 500);
        assert_eq!(page.pagination["total"], 1);
    }

    #[test]
    fn test_empty_page() {
        let page: Page<Refund> = Page::from_data(json!({}), "refunds").unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.pagination, json!({}));
    }
}
