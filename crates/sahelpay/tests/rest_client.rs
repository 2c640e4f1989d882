use std::time::Duration;

use httpmock::prelude::*;
use httpmock::Method::PATCH;
use sahelpay::{
    ClientConfig, CreatePayment, CreatePayout, CreateRefund, ListPayments, PollOptions,
    SahelPayClient, SahelPayError, TransactionStatus,
};
use serde_json::json;

const KEY: &str = "sk_test_integration";

fn client(server: &MockServer) -> SahelPayClient {
    SahelPayClient::new(
        ClientConfig::new(KEY)
            .base_url(server.base_url())
            .timeout(Duration::from_secs(5)),
    )
    .unwrap()
}

#[tokio::test]
async fn test_create_payment_sends_auth_and_patches_response() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/payments")
                .header("authorization", format!("Bearer {KEY}"))
                .header("content-type", "application/json")
                .json_body(json!({
                    "amount": 5000,
                    "currency": "XOF",
                    "provider": "ORANGE_MONEY",
                    "customer_phone": "+22370000000",
                    "payment_method": null,
                    "country": null,
                    "customer_name": null,
                    "customer_email": null,
                    "return_url": null,
                    "success_url": null,
                    "cancel_url": null,
                    "client_reference": "order-7",
                    "hosted_checkout": true,
                    "metadata": {"description": "Order #7"}
                }));
            then.status(201).json_body(json!({
                "success": true,
                "data": {"id": "pay_1", "reference": "SP-77", "amount": 5000, "status": "PENDING",
                         "checkout_url": "https://pay.sahelpay.ml/c/SP-77"}
            }));
        })
        .await;

    let mut req = CreatePayment::new(5000, "ORANGE_MONEY", "+22370000000");
    req.client_reference = Some("order-7".into());
    req.description = Some("Order #7".into());
    let payment = client(&server).payments().create(req).await.unwrap();

    create.assert_async().await;
    assert_eq!(payment.reference_id, "SP-77");
    assert_eq!(payment.provider, "ORANGE_MONEY");
    assert_eq!(payment.customer_phone, "+22370000000");
    assert_eq!(payment.description.as_deref(), Some("Order #7"));
    assert!(payment.is_pending());
}

#[tokio::test]
async fn test_card_payment_validated_locally() {
    let server = MockServer::start_async().await;
    let any = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(500);
        })
        .await;

    let err = client(&server)
        .payments()
        .create(CreatePayment::new(5000, "VISA", "+22370000000"))
        .await
        .unwrap_err();

    assert!(matches!(err, SahelPayError::Validation { .. }));
    assert_eq!(any.hits_async().await, 0);
}

#[tokio::test]
async fn test_error_statuses_map_to_taxonomy() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/payouts/stats");
            then.status(401)
                .json_body(json!({"error": {"message": "Invalid API key", "code": "INVALID_API_KEY"}}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/payments/SP-404/status");
            then.status(404)
                .json_body(json!({"error": {"message": "Payment not found", "code": "NOT_FOUND"}}));
        })
        .await;

    let client = client(&server);

    let err = client.payouts().stats().await.unwrap_err();
    assert!(matches!(err, SahelPayError::Authentication { status: 401, .. }));
    assert_eq!(err.code(), "INVALID_API_KEY");

    let err = client.payments().retrieve("SP-404").await.unwrap_err();
    assert!(matches!(err, SahelPayError::Api { status: 404, .. }));
    assert_eq!(err.to_string(), "[NOT_FOUND] Payment not found");
}

#[tokio::test]
async fn test_network_failure() {
    let client = SahelPayClient::new(
        ClientConfig::new(KEY)
            .base_url("http://127.0.0.1:1")
            .timeout(Duration::from_secs(2)),
    )
    .unwrap();
    let err = client.payouts().stats().await.unwrap_err();
    assert!(
        matches!(err, SahelPayError::Network(_) | SahelPayError::Timeout(_)),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_payout_out_of_range_never_sent() {
    let server = MockServer::start_async().await;
    let payouts = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/payouts");
            then.status(201).json_body(json!({"data": {}}));
        })
        .await;

    let err = client(&server)
        .payouts()
        .create(CreatePayout::new(50, "WAVE", "+22376000000"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "INVALID_AMOUNT");
    assert_eq!(payouts.hits_async().await, 0);
}

#[tokio::test]
async fn test_payout_with_idempotency_key() {
    let server = MockServer::start_async().await;
    let payouts = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/payouts")
                .json_body_partial(r#"{"idempotency_key":"po-order-1","type":"SUPPLIER_PAYMENT"}"#);
            then.status(201).json_body(json!({"data": {
                "id": "po_1", "reference": "PO-1", "amount": 10000, "fee": 100,
                "net_amount": 9900, "status": "PROCESSING", "type": "SUPPLIER_PAYMENT"
            }}));
        })
        .await;

    let mut req = CreatePayout::new(10_000, "WAVE", "+22376000000");
    req.payout_type = "SUPPLIER_PAYMENT".into();
    req.idempotency_key = Some("po-order-1".into());
    let payout = client(&server).payouts().create(req).await.unwrap();

    payouts.assert_async().await;
    assert_eq!(payout.net_amount, 9900);
    assert!(payout.is_pending());
}

#[tokio::test]
async fn test_payment_history_pagination() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/payments/history")
                .query_param("limit", "10")
                .query_param("offset", "20")
                .query_param("status", "SUCCESS");
            then.status(200).json_body(json!({"data": {
                "transactions": [{"id": "pay_1", "amount": "1500", "status": "SUCCESS"}],
                "pagination": {"total": 21, "limit": 10, "offset": 20}
            }}));
        })
        .await;

    let page = client(&server)
        .payments()
        .list(ListPayments {
            limit: 10,
            page: 3,
            status: Some(TransactionStatus::Success),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].amount, 1500);
    assert_eq!(page.pagination["total"], 21);
}

#[tokio::test]
async fn test_search_without_match() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/payments/search")
                .query_param("client_reference", "order-x");
            then.status(200).json_body(json!({"data": null}));
        })
        .await;

    let found = client(&server).payments().search("order-x").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_poll_until_terminal() {
    let server = MockServer::start_async().await;
    let mut pending = server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/payments/SP-9/status");
            then.status(200)
                .json_body(json!({"data": {"reference_id": "SP-9", "status": "PENDING"}}));
        })
        .await;

    let client = client(&server);
    let payments = client.payments();
    let options = PollOptions {
        timeout: Duration::from_secs(5),
        interval: Duration::from_millis(20),
    };

    let mut seen = Vec::new();
    let payment = {
        let poll = payments.poll_with("SP-9", options, |p| seen.push(p.status));
        tokio::pin!(poll);

        // Let a couple of pending checks through, then settle the payment.
        tokio::select! {
            _ = &mut poll => panic!("payment is still pending"),
            _ = tokio::time::sleep(Duration::from_millis(60)) => {}
        }
        pending.delete_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/payments/SP-9/status");
                then.status(200)
                    .json_body(json!({"data": {"reference_id": "SP-9", "status": "SUCCESS"}}));
            })
            .await;

        poll.await.unwrap()
    };
    assert!(payment.is_successful());
    assert_eq!(seen.last(), Some(&TransactionStatus::Success));
    assert!(seen[..seen.len() - 1]
        .iter()
        .all(|s| *s == TransactionStatus::Pending));
}

#[tokio::test]
async fn test_poll_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/payments/SP-1/status");
            then.status(200)
                .json_body(json!({"data": {"status": "PROCESSING"}}));
        })
        .await;

    let err = client(&server)
        .payments()
        .poll(
            "SP-1",
            PollOptions {
                timeout: Duration::from_millis(30),
                interval: Duration::from_millis(10),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "TIMEOUT");
}

#[tokio::test]
async fn test_refund_and_link_resources() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/refunds")
                .json_body(json!({"payment_id": "pay_1", "amount": 2000, "refund_fees": false}));
            then.status(201)
                .json_body(json!({"data": {"id": "rf_1", "payment_id": "pay_1", "amount": 2000, "status": "COMPLETED"}}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(PATCH).path("/v1/payment-links/lnk_1/deactivate");
            then.status(200)
                .json_body(json!({"data": {"id": "lnk_1", "slug": "boutique", "is_active": false}}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/payment-links");
            then.status(200).json_body(json!({"success": true}));
        })
        .await;

    let client = client(&server);

    let refund = client
        .refunds()
        .create(CreateRefund::new("pay_1", 2000))
        .await
        .unwrap();
    assert!(refund.is_successful());

    let link = client.payment_links().deactivate("lnk_1").await.unwrap();
    assert!(!link.is_active);
    assert_eq!(link.url, "https://pay.sahelpay.ml/boutique");

    assert!(client.payment_links().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_with_empty_body() {
    let server = MockServer::start_async().await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/v1/customers/cus_1");
            then.status(204);
        })
        .await;

    client(&server).customers().delete("cus_1").await.unwrap();
    delete.assert_async().await;
}
