//! Orders API payloads of the payment gateway.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Free-form notes attached to an order.
///
/// The callback handlers recover the owning user from `userId`; the gateway
/// is the source of truth for which order a callback refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNotes {
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "userName", default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(rename = "userEmail", default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

impl OrderNotes {
    pub fn for_user(user_id: Uuid, name: &str, email: &str) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            user_name: Some(name.to_owned()),
            user_email: Some(email.to_owned()),
        }
    }

    /// The embedded user id, if present and well formed.
    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id.as_deref().and_then(|s| Uuid::parse_str(s).ok())
    }
}

/// `POST /v1/orders` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGatewayOrder {
    /// Amount in the currency's minor unit.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: OrderNotes,
}

/// An order as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "notes_or_empty")]
    pub notes: Option<OrderNotes>,
}

impl GatewayOrder {
    /// The user this order was created for.
    pub fn user_id(&self) -> Option<Uuid> {
        self.notes.as_ref().and_then(OrderNotes::user_id)
    }
}

/// The gateway renders empty notes as `[]` instead of `{}`.
fn notes_or_empty<'de, D>(deserializer: D) -> Result<Option<OrderNotes>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Object(_) => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}
