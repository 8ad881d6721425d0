use std::fmt;

use crate::domain::Order;

/// Read-only rendering of one order.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    order: Order,
}

impl DetailView {
    pub fn new(order: Order) -> Self {
        Self { order }
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    /// Sum of the items; the server total is used when the order came without items.
    pub fn total(&self) -> f64 {
        if self.order.line_items.is_empty() {
            self.order.total
        } else {
            self.order.computed_total()
        }
    }

    pub fn created_at_label(&self) -> String {
        match self.order.created_at_utc() {
            Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            None => "not available".to_string(),
        }
    }
}

impl fmt::Display for DetailView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = &self.order;
        writeln!(f, "Order {}", order.id)?;
        writeln!(f, "  Customer: {}", order.customer_name)?;
        writeln!(f, "  Email:    {}", order.email)?;
        writeln!(f, "  Status:   {}", order.status)?;
        writeln!(f, "  Created:  {}", self.created_at_label())?;
        writeln!(f, "  Items:")?;
        for item in &order.line_items {
            writeln!(
                f,
                "    - {} x{} @ R$ {:.2} = R$ {:.2}",
                item.product_name,
                item.quantity,
                item.unit_price,
                item.subtotal()
            )?;
        }
        write!(f, "  Total:    R$ {:.2}", self.total())
    }
}
