use crate::domain::Order;

/// Yes/no confirmation in front of a delete.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteConfirmation {
    order_id: String,
    summary: String,
}

impl DeleteConfirmation {
    pub fn new(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            summary: order.summary_line(),
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn prompt(&self) -> String {
        format!("Delete order {} ({})?", self.order_id, self.summary)
    }
}
