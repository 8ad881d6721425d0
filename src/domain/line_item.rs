use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// One product entry within an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    #[serde(rename = "produto")]
    pub product_name: String,
    #[serde(rename = "quantidade")]
    pub quantity: u32,
    #[serde(rename = "preco")]
    pub unit_price: f64,
}

impl LineItem {
    pub fn subtotal(&self) -> f64 {
        f64::from(self.quantity) * self.unit_price
    }
}

/// The item being typed into a form, before it is given an id.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemDraft {
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl Default for LineItemDraft {
    fn default() -> Self {
        Self {
            product_name: String::new(),
            quantity: 1,
            unit_price: 0.0,
        }
    }
}

impl LineItemDraft {
    pub fn new(product_name: impl Into<String>, quantity: u32, unit_price: f64) -> Self {
        Self {
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    /// Seeds a draft from an existing item, used by the nested item editor.
    pub fn from_item(item: &LineItem) -> Self {
        Self::new(item.product_name.clone(), item.quantity, item.unit_price)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        // `!(x > 0.0)` also rejects NaN
        if self.product_name.trim().is_empty() || self.quantity == 0 || !(self.unit_price > 0.0) {
            return Err(ValidationError::InvalidItem);
        }
        Ok(())
    }

    /// Validates the draft and turns it into a line item with a fresh random id.
    pub fn into_line_item(self) -> Result<LineItem, ValidationError> {
        self.into_line_item_with_id(Uuid::new_v4().to_string())
    }

    pub(crate) fn into_line_item_with_id(self, id: String) -> Result<LineItem, ValidationError> {
        self.validate()?;
        Ok(LineItem {
            id,
            product_name: self.product_name,
            quantity: self.quantity,
            unit_price: self.unit_price,
        })
    }
}

/// Parses `NAME:QUANTITY:PRICE`. The name may itself contain colons.
impl FromStr for LineItemDraft {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, ':');
        let (Some(price), Some(quantity), Some(name)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ValidationError::InvalidItem);
        };
        let quantity = quantity
            .trim()
            .parse::<u32>()
            .map_err(|_| ValidationError::InvalidItem)?;
        let unit_price = price
            .trim()
            .parse::<f64>()
            .map_err(|_| ValidationError::InvalidItem)?;
        let draft = Self::new(name.trim(), quantity, unit_price);
        draft.validate()?;
        Ok(draft)
    }
}

/// Sum of `quantity × unit_price` over the items; 0.0 for an empty list.
pub fn compute_total(items: &[LineItem]) -> f64 {
    items.iter().map(LineItem::subtotal).sum()
}
