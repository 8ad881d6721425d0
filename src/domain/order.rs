use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::line_item::{compute_total, LineItem};
use super::status::OrderStatus;
use crate::error::ValidationError;

/// Represents a customer order as returned by the order service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(rename = "cliente")]
    pub customer_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "itens", default)]
    pub line_items: Vec<LineItem>,
    pub total: f64,
    pub status: OrderStatus,
    #[serde(rename = "data_criacao", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Order {
    /// Total recomputed from the line items, independent of the server-supplied `total`.
    pub fn computed_total(&self) -> f64 {
        compute_total(&self.line_items)
    }

    /// Parses `created_at`. Accepts RFC 3339 and naive ISO timestamps (taken as UTC).
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// The one-line row shown in the order list.
    pub fn summary_line(&self) -> String {
        format!(
            "{} - R$ {:.2} - Status: {}",
            self.customer_name, self.total, self.status
        )
    }
}

pub(crate) fn validate_order_fields(
    customer_name: &str,
    email: &str,
    line_items: &[LineItem],
) -> Result<(), ValidationError> {
    if customer_name.trim().is_empty() {
        return Err(ValidationError::EmptyCustomerName);
    }
    if email.trim().is_empty() {
        return Err(ValidationError::EmptyEmail);
    }
    if line_items.is_empty() {
        return Err(ValidationError::NoLineItems);
    }
    Ok(())
}

/// Payload for creating a new order. New orders always start as `PENDENTE`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDraft {
    #[serde(rename = "cliente")]
    pub customer_name: String,
    pub email: String,
    #[serde(rename = "itens")]
    pub line_items: Vec<LineItem>,
    pub total: f64,
    pub status: OrderStatus,
}

impl OrderDraft {
    pub fn new(
        customer_name: impl Into<String>,
        email: impl Into<String>,
        line_items: Vec<LineItem>,
    ) -> Result<Self, ValidationError> {
        let customer_name = customer_name.into();
        let email = email.into();
        validate_order_fields(&customer_name, &email, &line_items)?;
        let total = compute_total(&line_items);
        Ok(Self {
            customer_name,
            email,
            line_items,
            total,
            status: OrderStatus::Pending,
        })
    }
}

/// Full replacement payload for an existing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderUpdate {
    #[serde(rename = "cliente")]
    pub customer_name: String,
    pub email: String,
    #[serde(rename = "itens")]
    pub line_items: Vec<LineItem>,
    pub total: f64,
}

impl OrderUpdate {
    pub fn new(
        customer_name: impl Into<String>,
        email: impl Into<String>,
        line_items: Vec<LineItem>,
    ) -> Result<Self, ValidationError> {
        let customer_name = customer_name.into();
        let email = email.into();
        validate_order_fields(&customer_name, &email, &line_items)?;
        let total = compute_total(&line_items);
        Ok(Self {
            customer_name,
            email,
            line_items,
            total,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LineItemDraft;

    fn caneca() -> LineItem {
        LineItemDraft::new("Caneca", 2, 10.0).into_line_item().unwrap()
    }

    #[test]
    fn draft_computes_total_and_starts_pending() {
        let draft = OrderDraft::new("Ana", "a@x.com", vec![caneca()]).unwrap();
        assert_eq!(draft.total, 20.0);

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["cliente"], "Ana");
        assert_eq!(json["status"], "PENDENTE");
        assert_eq!(json["total"], 20.0);
        assert_eq!(json["itens"][0]["produto"], "Caneca");
    }

    #[test]
    fn draft_rejects_missing_fields() {
        assert_eq!(
            OrderDraft::new("", "a@x.com", vec![caneca()]),
            Err(ValidationError::EmptyCustomerName)
        );
        assert_eq!(
            OrderDraft::new("Ana", "  ", vec![caneca()]),
            Err(ValidationError::EmptyEmail)
        );
        assert_eq!(
            OrderUpdate::new("Ana", "a@x.com", Vec::new()),
            Err(ValidationError::NoLineItems)
        );
    }

    #[test]
    fn order_tolerates_missing_email_and_items() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "cliente": "Ana",
            "total": 20.0,
            "status": "PENDENTE"
        }))
        .unwrap();
        assert!(order.email.is_empty());
        assert!(order.line_items.is_empty());
        assert_eq!(order.created_at, None);
        assert_eq!(order.summary_line(), "Ana - R$ 20.00 - Status: PENDENTE");
    }

    #[test]
    fn order_rejects_unknown_status() {
        let parsed = serde_json::from_value::<Order>(serde_json::json!({
            "id": "abc",
            "cliente": "Ana",
            "total": 1.0,
            "status": "PERDIDO"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn parses_creation_timestamps() {
        let mut order: Order = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "cliente": "Ana",
            "total": 1.0,
            "status": "ENVIADO",
            "data_criacao": "2024-03-01T12:30:00Z"
        }))
        .unwrap();
        let parsed = order.created_at_utc().unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T12:30:00+00:00");

        order.created_at = Some("2024-03-01T12:30:00.123456".to_string());
        assert!(order.created_at_utc().is_some());

        order.created_at = Some("yesterday".to_string());
        assert_eq!(order.created_at_utc(), None);
    }
}
