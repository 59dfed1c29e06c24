//! Order payloads and the field mutations of the negative order scenarios

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use super::cart::OrderLine;
use super::ensure;
use crate::error::E2eResult;

/// Flat delivery fee charged on every order
pub const FREIGHT: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub time: String,
}

impl Default for Recipient {
    fn default() -> Self {
        Self {
            name: "陳大文".to_string(),
            phone: "0912345678".to_string(),
            email: "abc@abc.com".to_string(),
            address: "台北市".to_string(),
            time: "anytime".to_string(),
        }
    }
}

/// The `order` half of a checkout request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub shipping: String,
    pub payment: String,
    pub subtotal: i64,
    pub freight: i64,
    pub total: i64,
    pub recipient: Recipient,
    pub list: Vec<OrderLine>,
}

impl Order {
    /// Home delivery paid by card, totals derived from `lines`
    pub fn from_lines(lines: Vec<OrderLine>) -> Self {
        let subtotal = lines.iter().map(OrderLine::subtotal).sum();
        Self {
            shipping: "delivery".to_string(),
            payment: "credit_card".to_string(),
            subtotal,
            freight: FREIGHT,
            total: subtotal + FREIGHT,
            recipient: Recipient::default(),
            list: lines,
        }
    }

    pub fn expect_total(&self) -> E2eResult<()> {
        ensure(
            self.total == self.subtotal + self.freight,
            "order total",
            format!("total {} is not {} + {}", self.total, self.subtotal, self.freight),
        )
    }
}

/// `{prime, order}` as POSTed to `/order`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prime: Option<String>,
    pub order: Order,
}

impl OrderPayload {
    pub fn new(prime: impl Into<String>, order: Order) -> Self {
        Self {
            prime: Some(prime.into()),
            order,
        }
    }

    pub fn without_prime(order: Order) -> Self {
        Self { prime: None, order }
    }

    pub fn to_json(&self) -> E2eResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Required keys of `order`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderField {
    Shipping,
    Payment,
    Subtotal,
    Freight,
    Total,
    Recipient,
    List,
}

impl OrderField {
    pub const ALL: [OrderField; 7] = [
        OrderField::Shipping,
        OrderField::Payment,
        OrderField::Subtotal,
        OrderField::Freight,
        OrderField::Total,
        OrderField::Recipient,
        OrderField::List,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            OrderField::Shipping => "shipping",
            OrderField::Payment => "payment",
            OrderField::Subtotal => "subtotal",
            OrderField::Freight => "freight",
            OrderField::Total => "total",
            OrderField::Recipient => "recipient",
            OrderField::List => "list",
        }
    }

    pub fn error_message(&self) -> &'static str {
        match self {
            OrderField::Shipping => "Shipping Method is required.",
            OrderField::Payment => "Payment Method is required.",
            OrderField::Subtotal => "Subtotal is incorrect",
            OrderField::Freight => "Freight is required.",
            OrderField::Total => "Total is incorrect",
            OrderField::Recipient => "Recipient is required.",
            OrderField::List => "Order List is required.",
        }
    }
}

/// Required keys of `order.recipient`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecipientField {
    Name,
    Phone,
    Email,
    Address,
    Time,
}

impl RecipientField {
    pub const ALL: [RecipientField; 5] = [
        RecipientField::Name,
        RecipientField::Phone,
        RecipientField::Email,
        RecipientField::Address,
        RecipientField::Time,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            RecipientField::Name => "name",
            RecipientField::Phone => "phone",
            RecipientField::Email => "email",
            RecipientField::Address => "address",
            RecipientField::Time => "time",
        }
    }

    pub fn error_message(&self) -> &'static str {
        match self {
            RecipientField::Name => "Receiver Name is required.",
            RecipientField::Phone => "Mobile is required.",
            RecipientField::Email => "Email is required.",
            RecipientField::Address => "Address is required.",
            RecipientField::Time => "Deliver Time is required.",
        }
    }
}

/// A required field of the payload, at either level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTarget {
    Order(OrderField),
    Recipient(RecipientField),
}

impl FieldTarget {
    pub fn key(&self) -> &'static str {
        match self {
            FieldTarget::Order(field) => field.key(),
            FieldTarget::Recipient(field) => field.key(),
        }
    }

    pub fn error_message(&self) -> &'static str {
        match self {
            FieldTarget::Order(field) => field.error_message(),
            FieldTarget::Recipient(field) => field.error_message(),
        }
    }

    /// Every order field, then every recipient field
    pub fn all() -> impl Iterator<Item = FieldTarget> {
        OrderField::ALL
            .into_iter()
            .map(FieldTarget::Order)
            .chain(RecipientField::ALL.into_iter().map(FieldTarget::Recipient))
    }
}

impl fmt::Display for FieldTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldTarget::Order(field) => write!(f, "order.{}", field.key()),
            FieldTarget::Recipient(field) => write!(f, "order.recipient.{}", field.key()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMutation {
    /// Key removed
    Omit,
    /// Key kept with a null value; the list is emptied instead
    Null,
}

impl FieldMutation {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldMutation::Omit => "omitted",
            FieldMutation::Null => "null",
        }
    }

    /// Apply to a serialized [`OrderPayload`]. Returns false when the
    /// targeted object is missing.
    pub fn apply(&self, payload: &mut Value, target: FieldTarget) -> bool {
        let parent = match target {
            FieldTarget::Order(_) => payload.get_mut("order"),
            FieldTarget::Recipient(_) => payload
                .get_mut("order")
                .and_then(|order| order.get_mut("recipient")),
        };
        let Some(Value::Object(parent)) = parent else {
            return false;
        };

        let key = target.key();
        match self {
            FieldMutation::Omit => {
                parent.remove(key);
            }
            FieldMutation::Null if target == FieldTarget::Order(OrderField::List) => {
                parent.insert(key.to_string(), json!([]));
            }
            FieldMutation::Null => {
                parent.insert(key.to_string(), Value::Null);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stylish_common::Color;
    use test_case::test_case;

    fn order() -> Order {
        Order::from_lines(vec![
            OrderLine {
                id: 201807201824,
                image: "http://stylish.test/assets/201807201824/main.jpg".to_string(),
                name: "前開衩扭結洋裝".to_string(),
                price: 799,
                size: "S".to_string(),
                color: Color {
                    code: "FFFFFF".to_string(),
                    name: "白色".to_string(),
                },
                qty: 2,
            },
            OrderLine {
                id: 201807242211,
                image: "http://stylish.test/assets/201807242211/main.jpg".to_string(),
                name: "純色輕薄百搭襯衫".to_string(),
                price: 1299,
                size: "M".to_string(),
                color: Color {
                    code: "DDFFBB".to_string(),
                    name: "亮綠".to_string(),
                },
                qty: 1,
            },
        ])
    }

    #[test]
    fn test_totals() {
        let order = order();
        assert_eq!(order.subtotal, 2897);
        assert_eq!(order.total, 2927);
        order.expect_total().unwrap();

        let mut wrong = order;
        wrong.total = 2897;
        assert!(wrong.expect_total().unwrap_err().is_assertion());
    }

    #[test]
    fn test_payload_shape() {
        let payload = OrderPayload::new("prime-token", order()).to_json().unwrap();
        assert_eq!(payload["prime"], "prime-token");
        assert_eq!(payload["order"]["recipient"]["time"], "anytime");
        assert_eq!(payload["order"]["list"][0]["color"]["code"], "FFFFFF");
        assert_eq!(payload["order"]["list"][1]["qty"], 1);

        let bare = OrderPayload::without_prime(order()).to_json().unwrap();
        assert!(bare.get("prime").is_none());
    }

    #[test_case(FieldTarget::Order(OrderField::Recipient), FieldMutation::Omit, None; "omit recipient")]
    #[test_case(FieldTarget::Order(OrderField::Freight), FieldMutation::Null, Some(Value::Null); "null freight")]
    #[test_case(FieldTarget::Order(OrderField::List), FieldMutation::Null, Some(json!([])); "null list is empty")]
    fn test_order_mutations(target: FieldTarget, mutation: FieldMutation, expected: Option<Value>) {
        let mut payload = OrderPayload::new("p", order()).to_json().unwrap();
        assert!(mutation.apply(&mut payload, target));
        assert_eq!(payload["order"].get(target.key()).cloned(), expected);
    }

    #[test]
    fn test_recipient_mutations() {
        let mut payload = OrderPayload::new("p", order()).to_json().unwrap();
        let target = FieldTarget::Recipient(RecipientField::Phone);

        assert!(FieldMutation::Null.apply(&mut payload, target));
        assert_eq!(payload["order"]["recipient"]["phone"], Value::Null);
        assert!(FieldMutation::Omit.apply(&mut payload, target));
        assert!(payload["order"]["recipient"].get("phone").is_none());

        FieldMutation::Omit.apply(&mut payload, FieldTarget::Order(OrderField::Recipient));
        assert!(!FieldMutation::Null.apply(&mut payload, target));
    }

    #[test]
    fn test_every_field_has_one_message() {
        let targets: Vec<FieldTarget> = FieldTarget::all().collect();
        assert_eq!(targets.len(), 12);
        assert_eq!(
            FieldTarget::Recipient(RecipientField::Time).error_message(),
            "Deliver Time is required."
        );
        assert_eq!(targets[5].to_string(), "order.recipient");
        assert_eq!(targets[7].to_string(), "order.recipient.name");
    }
}
