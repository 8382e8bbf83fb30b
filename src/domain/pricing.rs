use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the parcel reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingOption {
    Courier,
    StorePickup,
}

impl ShippingOption {
    pub fn display_name(self) -> &'static str {
        match self {
            ShippingOption::Courier => "Courier delivery",
            ShippingOption::StorePickup => "Store pickup",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    BankTransfer,
    CashOnDelivery,
    DigitalWallet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BriTransfer,
    BniTransfer,
    CashOnDelivery,
    Dana,
    GoPay,
}

impl PaymentMethod {
    pub fn kind(self) -> PaymentKind {
        match self {
            PaymentMethod::BriTransfer | PaymentMethod::BniTransfer => PaymentKind::BankTransfer,
            PaymentMethod::CashOnDelivery => PaymentKind::CashOnDelivery,
            PaymentMethod::Dana | PaymentMethod::GoPay => PaymentKind::DigitalWallet,
        }
    }

    pub fn is_cash_on_delivery(self) -> bool {
        self.kind() == PaymentKind::CashOnDelivery
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PaymentMethod::BriTransfer => "BRI bank transfer",
            PaymentMethod::BniTransfer => "BNI bank transfer",
            PaymentMethod::CashOnDelivery => "Cash on delivery",
            PaymentMethod::Dana => "DANA",
            PaymentMethod::GoPay => "GoPay",
        }
    }
}

/// Fees charged on top of the item subtotal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tariff {
    pub courier_fee: Decimal,
    pub wallet_fee: Decimal,
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            courier_fee: Decimal::from(15_000),
            wallet_fee: Decimal::from(1_500),
        }
    }
}

impl Tariff {
    pub fn shipping_fee(&self, option: ShippingOption) -> Decimal {
        match option {
            ShippingOption::Courier => self.courier_fee,
            ShippingOption::StorePickup => Decimal::ZERO,
        }
    }

    pub fn payment_fee(&self, method: PaymentMethod) -> Decimal {
        match method.kind() {
            PaymentKind::DigitalWallet => self.wallet_fee,
            PaymentKind::BankTransfer | PaymentKind::CashOnDelivery => Decimal::ZERO,
        }
    }
}
