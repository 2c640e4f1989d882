//! Subscription billing: plans, subscriptions, customers and the customer
//! portal. These endpoints have no typed records; responses are raw JSON.

use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SahelPayError;
use crate::http_client::SahelPayClient;

fn to_body<T: Serialize>(req: &T) -> Result<Value, SahelPayError> {
    serde_json::to_value(req).map_err(|e| SahelPayError::MalformedPayload(e.to_string()))
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePlan {
    pub name: String,
    pub amount: i64,
    /// `WEEKLY` or `MONTHLY`
    pub interval: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreatePlan {
    pub fn new(name: impl Into<String>, amount: i64) -> Self {
        Self {
            name: name.into(),
            amount,
            interval: "MONTHLY".to_string(),
            description: None,
        }
    }
}

pub struct Plans<'a> {
    client: &'a SahelPayClient,
}

impl<'a> Plans<'a> {
    pub(crate) fn new(client: &'a SahelPayClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, req: CreatePlan) -> Result<Value, SahelPayError> {
        let body = to_body(&req)?;
        self.client
            .data(Method::POST, "/v1/plans", &[], Some(&body))
            .await
    }

    pub async fn list(&self) -> Result<Vec<Value>, SahelPayError> {
        self.client.data_list("/v1/plans", &[]).await
    }

    pub async fn retrieve(&self, plan_id: &str) -> Result<Value, SahelPayError> {
        self.client
            .data(Method::GET, &format!("/v1/plans/{plan_id}"), &[], None)
            .await
    }

    pub async fn deactivate(&self, plan_id: &str) -> Result<Value, SahelPayError> {
        let empty = Value::Object(Map::new());
        self.client
            .data(
                Method::PATCH,
                &format!("/v1/plans/{plan_id}/deactivate"),
                &[],
                Some(&empty),
            )
            .await
    }

    pub async fn delete(&self, plan_id: &str) -> Result<(), SahelPayError> {
        self.client
            .request(Method::DELETE, &format!("/v1/plans/{plan_id}"), &[], None)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSubscription {
    pub plan_id: String,
    pub customer_phone: String,
    /// ISO-8601 date; the API starts immediately when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
}

impl CreateSubscription {
    pub fn new(plan_id: impl Into<String>, customer_phone: impl Into<String>) -> Self {
        Self {
            plan_id: plan_id.into(),
            customer_phone: customer_phone.into(),
            start_date: None,
        }
    }
}

pub struct Subscriptions<'a> {
    client: &'a SahelPayClient,
}

impl<'a> Subscriptions<'a> {
    pub(crate) fn new(client: &'a SahelPayClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, req: CreateSubscription) -> Result<Value, SahelPayError> {
        let body = to_body(&req)?;
        self.client
            .data(Method::POST, "/v1/subscriptions", &[], Some(&body))
            .await
    }

    /// `status` is one of `ACTIVE`, `PAST_DUE`, `CANCELLED`.
    pub async fn list(
        &self,
        plan_id: Option<&str>,
        status: Option<&str>,
        limit: u32,
    ) -> Result<Value, SahelPayError> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(plan_id) = plan_id {
            query.push(("plan_id", plan_id.to_string()));
        }
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }
        self.client
            .data(Method::GET, "/v1/subscriptions", &query, None)
            .await
    }

    pub async fn retrieve(&self, subscription_id: &str) -> Result<Value, SahelPayError> {
        self.client
            .data(
                Method::GET,
                &format!("/v1/subscriptions/{subscription_id}"),
                &[],
                None,
            )
            .await
    }

    /// Cancel a subscription. Returns the full response, envelope included.
    pub async fn cancel(&self, subscription_id: &str) -> Result<Value, SahelPayError> {
        self.client
            .request(
                Method::DELETE,
                &format!("/v1/subscriptions/{subscription_id}"),
                &[],
                None,
            )
            .await
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCustomer {
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl CreateCustomer {
    pub fn new(phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            name: None,
            email: None,
            metadata: None,
        }
    }
}

/// Fields to change; `None` leaves the field as is.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateCustomer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

pub struct Customers<'a> {
    client: &'a SahelPayClient,
}

impl<'a> Customers<'a> {
    pub(crate) fn new(client: &'a SahelPayClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, req: CreateCustomer) -> Result<Value, SahelPayError> {
        let body = to_body(&req)?;
        self.client
            .data(Method::POST, "/v1/customers", &[], Some(&body))
            .await
    }

    pub async fn list(&self, limit: u32, offset: u32) -> Result<Value, SahelPayError> {
        self.client
            .data(
                Method::GET,
                "/v1/customers",
                &super::limit_offset(limit, offset),
                None,
            )
            .await
    }

    pub async fn retrieve(&self, customer_id: &str) -> Result<Value, SahelPayError> {
        self.client
            .data(Method::GET, &format!("/v1/customers/{customer_id}"), &[], None)
            .await
    }

    pub async fn update(
        &self,
        customer_id: &str,
        req: UpdateCustomer,
    ) -> Result<Value, SahelPayError> {
        let body = to_body(&req)?;
        self.client
            .data(
                Method::PATCH,
                &format!("/v1/customers/{customer_id}"),
                &[],
                Some(&body),
            )
            .await
    }

    pub async fn delete(&self, customer_id: &str) -> Result<(), SahelPayError> {
        self.client
            .request(
                Method::DELETE,
                &format!("/v1/customers/{customer_id}"),
                &[],
                None,
            )
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePortalSession {
    pub customer_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    /// Where the portal sends the customer back to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

impl CreatePortalSession {
    pub fn new(customer_phone: impl Into<String>) -> Self {
        Self {
            customer_phone: customer_phone.into(),
            customer_name: None,
            customer_email: None,
            return_url: None,
        }
    }
}

/// Hosted customer portal where customers manage their subscriptions.
pub struct Portal<'a> {
    client: &'a SahelPayClient,
}

impl<'a> Portal<'a> {
    pub(crate) fn new(client: &'a SahelPayClient) -> Self {
        Self { client }
    }

    /// Start a portal session; redirect the customer to the returned `url`.
    pub async fn create_session(&self, req: CreatePortalSession) -> Result<Value, SahelPayError> {
        let body = to_body(&req)?;
        self.client
            .data(Method::POST, "/v1/portal/sessions", &[], Some(&body))
            .await
    }
}
