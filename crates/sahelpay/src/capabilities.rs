//! Capability matrix: which features each payment method supports.
//!
//! Routing between the underlying gateways is internal to SahelPay; the
//! client only ever sees payment methods. Lookups are keyed by enums and
//! resolved through exhaustive `match`es, so every method has a flag and a
//! justification for every capability. The string-based helpers fail closed
//! for anything they do not recognise.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SahelPayError;

/// Version of the static matrix shipped with this crate.
pub const CAPABILITY_MATRIX_VERSION: &str = "2024-06";

/// Justification returned for a method or capability the matrix does not know.
pub const NOT_DOCUMENTED: &str = "not documented";

/// Error code carried by [`SahelPayError::CapabilityNotSupported`].
pub const CAPABILITY_NOT_SUPPORTED: &str = "CAPABILITY_NOT_SUPPORTED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    OrangeMoney,
    Wave,
    Moov,
    Card,
    Visa,
    Mastercard,
    GimUemoa,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 7] = [
        PaymentMethod::OrangeMoney,
        PaymentMethod::Wave,
        PaymentMethod::Moov,
        PaymentMethod::Card,
        PaymentMethod::Visa,
        PaymentMethod::Mastercard,
        PaymentMethod::GimUemoa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::OrangeMoney => "ORANGE_MONEY",
            PaymentMethod::Wave => "WAVE",
            PaymentMethod::Moov => "MOOV",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Visa => "VISA",
            PaymentMethod::Mastercard => "MASTERCARD",
            PaymentMethod::GimUemoa => "GIM_UEMOA",
        }
    }

    /// Card-based methods, as opposed to mobile-money wallets.
    pub fn is_card(&self) -> bool {
        matches!(
            self,
            PaymentMethod::Card
                | PaymentMethod::Visa
                | PaymentMethod::Mastercard
                | PaymentMethod::GimUemoa
        )
    }

    pub fn capabilities(&self) -> CapabilitySet {
        capabilities_of(*self)
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities().get(capability)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = SahelPayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                SahelPayError::validation(format!("unknown payment method: {s}"), "UNKNOWN_METHOD")
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Payments,
    PaymentLinks,
    QrCode,
    Payouts,
    Withdrawals,
    /// Request-to-pay.
    Opr,
    Splits,
    CustomerPortal,
}

impl Capability {
    pub const ALL: [Capability; 8] = [
        Capability::Payments,
        Capability::PaymentLinks,
        Capability::QrCode,
        Capability::Payouts,
        Capability::Withdrawals,
        Capability::Opr,
        Capability::Splits,
        Capability::CustomerPortal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Payments => "payments",
            Capability::PaymentLinks => "payment_links",
            Capability::QrCode => "qr_code",
            Capability::Payouts => "payouts",
            Capability::Withdrawals => "withdrawals",
            Capability::Opr => "opr",
            Capability::Splits => "splits",
            Capability::CustomerPortal => "customer_portal",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = SahelPayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                SahelPayError::validation(format!("unknown capability: {s}"), "UNKNOWN_CAPABILITY")
            })
    }
}

/// The eight capability flags of a single payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub payments: bool,
    pub payment_links: bool,
    pub qr_code: bool,
    pub payouts: bool,
    pub withdrawals: bool,
    pub opr: bool,
    pub splits: bool,
    pub customer_portal: bool,
}

impl CapabilitySet {
    pub fn get(&self, capability: Capability) -> bool {
        match capability {
            Capability::Payments => self.payments,
            Capability::PaymentLinks => self.payment_links,
            Capability::QrCode => self.qr_code,
            Capability::Payouts => self.payouts,
            Capability::Withdrawals => self.withdrawals,
            Capability::Opr => self.opr,
            Capability::Splits => self.splits,
            Capability::CustomerPortal => self.customer_portal,
        }
    }
}

const MOBILE_WALLET: CapabilitySet = CapabilitySet {
    payments: true,
    payment_links: true,
    qr_code: false,
    payouts: true,
    withdrawals: true,
    opr: true,
    splits: false,
    customer_portal: false,
};

const CARD_NETWORK: CapabilitySet = CapabilitySet {
    payments: true,
    payment_links: true,
    qr_code: false,
    payouts: false,
    withdrawals: true,
    opr: false,
    splits: true,
    customer_portal: true,
};

fn capabilities_of(method: PaymentMethod) -> CapabilitySet {
    match method {
        PaymentMethod::OrangeMoney | PaymentMethod::Moov => MOBILE_WALLET,
        // Native Wave QR
        PaymentMethod::Wave => CapabilitySet {
            qr_code: true,
            ..MOBILE_WALLET
        },
        PaymentMethod::Card | PaymentMethod::Visa | PaymentMethod::Mastercard => CARD_NETWORK,
        PaymentMethod::GimUemoa => CapabilitySet {
            splits: false,
            customer_portal: false,
            ..CARD_NETWORK
        },
    }
}

fn justification_of(method: PaymentMethod, capability: Capability) -> &'static str {
    use Capability as C;
    use PaymentMethod as M;

    match (method, capability) {
        (M::OrangeMoney, C::Payments) => "Payment via Orange Money",
        (M::Wave, C::Payments) => "Payment via Wave (QR + push)",
        (M::Moov, C::Payments) => "Payment via Moov Money",
        (M::Card, C::Payments) => "Card payment (3-D Secure)",
        (M::Visa, C::Payments) => "VISA card payment",
        (M::Mastercard, C::Payments) => "Mastercard payment",
        (M::GimUemoa, C::Payments) => "GIM-UEMOA card payment",

        (_, C::PaymentLinks) => "SahelPay payment links",

        (M::Wave, C::QrCode) => "Native Wave QR code",
        (M::OrangeMoney | M::Moov, C::QrCode) => "Not available",
        (_, C::QrCode) => "Not applicable",

        (M::OrangeMoney, C::Payouts) => "Money transfer to Orange Money",
        (M::Wave, C::Payouts) => "Money transfer via Wave",
        (M::Moov, C::Payouts) => "Money transfer via Moov",
        (_, C::Payouts) => "Not supported for cards",

        (M::OrangeMoney, C::Withdrawals) => "Withdrawal to Orange Money",
        (M::Wave, C::Withdrawals) => "Withdrawal to Wave",
        (M::Moov, C::Withdrawals) => "Withdrawal to Moov",
        (_, C::Withdrawals) => "Bank transfer",

        (M::OrangeMoney | M::Moov, C::Opr) => "Request-to-pay via USSD push",
        (M::Wave, C::Opr) => "Wave request-to-pay",
        (_, C::Opr) => "Not applicable",

        (M::Card | M::Visa | M::Mastercard, C::Splits) => "Marketplace splits",
        (_, C::Splits) => "Via SahelPay Split",

        (M::Card | M::Visa | M::Mastercard, C::CustomerPortal) => "Card management",
        (_, C::CustomerPortal) => "Not available",
    }
}

/// Whether `method` supports `capability`. Unknown methods or capabilities
/// return `false`.
pub fn has_capability(method: &str, capability: &str) -> bool {
    match (method.parse::<PaymentMethod>(), capability.parse::<Capability>()) {
        (Ok(m), Ok(c)) => m.supports(c),
        _ => false,
    }
}

/// All capability flags for `method`, or `None` if the method is unknown.
pub fn get_capabilities(method: &str) -> Option<CapabilitySet> {
    method.parse::<PaymentMethod>().ok().map(capabilities_of)
}

/// Audit justification for a `(method, capability)` pair.
pub fn justification(method: &str, capability: &str) -> &'static str {
    match (method.parse::<PaymentMethod>(), capability.parse::<Capability>()) {
        (Ok(m), Ok(c)) => justification_of(m, c),
        _ => NOT_DOCUMENTED,
    }
}

/// Fail with [`SahelPayError::CapabilityNotSupported`] unless `method`
/// supports `capability`.
///
/// The error carries the matrix justification so it can be surfaced verbatim
/// to the integrator.
pub fn require_capability(method: &str, capability: &str) -> Result<(), SahelPayError> {
    if has_capability(method, capability) {
        return Ok(());
    }

    let justification = justification(method, capability).to_string();
    tracing::debug!(
        method = %method,
        capability = %capability,
        justification = %justification,
        "capability not supported"
    );

    Err(SahelPayError::CapabilityNotSupported {
        method: method.to_string(),
        capability: capability.to_string(),
        justification,
        code: CAPABILITY_NOT_SUPPORTED,
    })
}

/// Payment methods that support `capability`, in matrix order.
pub fn methods_with_capability(capability: Capability) -> Vec<PaymentMethod> {
    PaymentMethod::ALL
        .into_iter()
        .filter(|m| m.supports(capability))
        .collect()
}
