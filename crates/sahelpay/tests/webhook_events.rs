use sahelpay::{
    compute_signature, parse_event, verify_signature, ClientConfig, SahelPayClient,
    SahelPayError, TransactionStatus, WebhookPayload,
};

const SECRET: &str = "whsec_integration";

fn signed(body: &str) -> (String, String) {
    (body.to_string(), compute_signature(body, SECRET))
}

#[test]
fn test_payout_event_routes_to_payout() {
    let (body, sig) = signed(
        r#"{"event":"payout.failed","data":{"id":"po_1","reference":"PO-1","amount":2500,"status":"FAILED","type":"SUPPLIER_PAYMENT"},"timestamp":"2024-06-01T10:00:00Z"}"#,
    );
    let event = parse_event(&body, &sig, SECRET).unwrap();

    assert_eq!(event.event, "payout.failed");
    assert_eq!(event.timestamp, "2024-06-01T10:00:00Z");
    let payout = event.data.as_payout().expect("payout payload");
    assert!(payout.is_failed());
    assert_eq!(payout.payout_type, "SUPPLIER_PAYMENT");
    assert_eq!(payout.amount, 2500);
}

#[test]
fn test_payout_event_with_null_fields() {
    let (body, sig) = signed(
        r#"{"event":"payout.completed","data":{"id":"po_2","amount":1000,"currency":null,"type":null,"status":"COMPLETED"}}"#,
    );
    let event = parse_event(&body, &sig, SECRET).unwrap();

    let payout = event.data.as_payout().expect("payout payload");
    assert_eq!(payout.currency, "XOF");
    assert_eq!(payout.payout_type, "OTHER");
    assert!(payout.is_completed());
}

#[test]
fn test_refund_event_routes_to_refund() {
    let (body, sig) =
        signed(r#"{"event":"refund.created","data":{"id":"rf_1","payment_id":"pay_9","amount":"1000"}}"#);
    let event = parse_event(&body, &sig, SECRET).unwrap();

    let refund = event.data.as_refund().expect("refund payload");
    assert_eq!(refund.payment_id, "pay_9");
    assert_eq!(refund.amount, 1000);
    assert!(refund.is_pending());
    assert_eq!(event.timestamp, "");
}

#[test]
fn test_payment_event_routes_to_payment() {
    let (body, sig) = signed(
        r#"{"event":"payment.success","data":{"id":"pay_1","reference":"SP-1","amount":5000.0,"status":"SUCCESS","payment_method":"WAVE","metadata":{"customer":{"phone":"+22376000000"}}}}"#,
    );
    let event = parse_event(&body, &sig, SECRET).unwrap();

    let payment = event.data.as_payment().expect("payment payload");
    assert!(payment.is_successful());
    assert_eq!(payment.reference_id, "SP-1");
    assert_eq!(payment.provider, "WAVE");
    assert_eq!(payment.customer_phone, "+22376000000");
    assert_eq!(payment.currency, "XOF");
    assert!(event.is_recognized());
}

#[test]
fn test_unknown_event_defaults_to_payment() {
    let (body, sig) = signed(r#"{"event":"account.updated","data":{"id":"acc_1"}}"#);
    let event = parse_event(&body, &sig, SECRET).unwrap();

    assert!(matches!(event.data, WebhookPayload::Payment(_)));
    assert!(!event.is_recognized());
}

#[test]
fn test_missing_data_decodes_defaults() {
    let (body, sig) = signed(r#"{"event":"payment.pending"}"#);
    let event = parse_event(&body, &sig, SECRET).unwrap();
    let payment = event.data.as_payment().unwrap();
    assert_eq!(payment.status, TransactionStatus::Pending);
    assert_eq!(payment.amount, 0);
}

#[test]
fn test_parse_is_idempotent() {
    let (body, sig) = signed(
        r#"{"event":"payment.failed","data":{"id":"pay_2","amount":"750","status":"FAILED"},"timestamp":"t"}"#,
    );
    let first = parse_event(&body, &sig, SECRET).unwrap();
    let second = parse_event(&body, &sig, SECRET).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_tampered_body_is_rejected() {
    let (body, sig) = signed(r#"{"event":"payment.success","data":{"amount":5000}}"#);
    let tampered = body.replace("5000", "50000");

    assert!(!verify_signature(&tampered, &sig, SECRET));
    assert!(matches!(
        parse_event(&tampered, &sig, SECRET),
        Err(SahelPayError::InvalidSignature)
    ));
}

#[test]
fn test_signature_variants_rejected() {
    let (body, sig) = signed(r#"{"event":"payment.success"}"#);
    assert!(verify_signature(&body, &sig, SECRET));
    assert!(!verify_signature(&body, &sig[..32], SECRET));
    assert!(!verify_signature(&body, "zz-not-hex", SECRET));
    assert!(!verify_signature(&body, "", SECRET));
    assert!(!verify_signature(&body, &sig, "other_secret"));
}

#[test]
fn test_malformed_bodies() {
    for body in ["not json", r#"{"data":{}}"#, r#"{"event":42}"#, "[1,2,3]"] {
        let sig = compute_signature(body, SECRET);
        match parse_event(body, &sig, SECRET) {
            Err(SahelPayError::MalformedPayload(_)) => {}
            other => panic!("{body}: expected MalformedPayload, got {other:?}"),
        }
    }
}

#[test]
fn test_client_webhooks_use_configured_secret() {
    let (body, sig) = signed(r#"{"event":"refund.completed","data":{"status":"COMPLETED"}}"#);

    let client =
        SahelPayClient::new(ClientConfig::new("sk_test_x").webhook_secret(SECRET)).unwrap();
    assert!(client.webhooks().verify(&body, &sig));
    assert!(client.webhooks().parse(&body, &sig).unwrap().data.as_refund().unwrap().is_successful());

    let unconfigured = SahelPayClient::new(ClientConfig::new("sk_test_x")).unwrap();
    assert!(!unconfigured.webhooks().verify(&body, &sig));
    assert_eq!(
        unconfigured.webhooks().parse(&body, &sig).unwrap_err().code(),
        "CONFIG_ERROR"
    );
}
