use crate::domain::{Order, OrderStatus};
use crate::error::ValidationError;

/// Single-field status editor over the fixed set of [`OrderStatus`] values.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusDialog {
    order_id: String,
    current: OrderStatus,
    selected: Option<OrderStatus>,
    loading: bool,
}

impl StatusDialog {
    pub fn new(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            current: order.status,
            selected: Some(order.status),
            loading: false,
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn current(&self) -> OrderStatus {
        self.current
    }

    pub fn selected(&self) -> Option<OrderStatus> {
        self.selected
    }

    pub fn options(&self) -> &'static [OrderStatus] {
        &OrderStatus::ALL
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn select(&mut self, status: Option<OrderStatus>) {
        self.selected = status;
    }

    /// Starts a submission. `Ok(None)` while a request is already in flight.
    pub fn begin_submit(&mut self) -> Result<Option<OrderStatus>, ValidationError> {
        if self.loading {
            return Ok(None);
        }
        let status = self.selected.ok_or(ValidationError::NoStatusSelected)?;
        self.loading = true;
        Ok(Some(status))
    }

    pub fn fail_submit(&mut self) {
        self.loading = false;
    }
}
