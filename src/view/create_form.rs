use tracing::debug;

use super::working_copy::{FormInput, OrderWorkingCopy};
use crate::domain::{LineItem, LineItemDraft, OrderDraft};
use crate::error::ValidationError;

/// The create-order modal. Closing it discards the form, which is how its state is
/// cleared after a successful submit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateOrderForm {
    working: OrderWorkingCopy,
    submitting: bool,
}

impl CreateOrderForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer_name(&self) -> &str {
        &self.working.customer_name
    }

    pub fn email(&self) -> &str {
        &self.working.email
    }

    pub fn items(&self) -> &[LineItem] {
        self.working.items()
    }

    pub fn draft(&self) -> &LineItemDraft {
        &self.working.draft
    }

    /// Client-side total for display; the server recomputes its own.
    pub fn total(&self) -> f64 {
        self.working.total()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn apply(&mut self, input: FormInput) -> Result<(), ValidationError> {
        match input {
            FormInput::CustomerName(name) => self.working.customer_name = name,
            FormInput::Email(email) => self.working.email = email,
            FormInput::Draft(draft) => self.working.draft = draft,
            FormInput::AddItem => self.working.add_item()?,
            FormInput::RemoveItem(id) => {
                if !self.working.remove_item(&id) {
                    return Err(ValidationError::UnknownItem(id));
                }
            }
            other => debug!(input = ?other, "Item editing is not available when creating"),
        }
        Ok(())
    }

    pub fn prepare_submission(&self) -> Result<OrderDraft, ValidationError> {
        OrderDraft::new(
            self.working.customer_name.trim(),
            self.working.email.trim(),
            self.working.items().to_vec(),
        )
    }

    /// Starts a submission. `Ok(None)` means one is already in flight.
    pub fn begin_submit(&mut self) -> Result<Option<OrderDraft>, ValidationError> {
        if self.submitting {
            return Ok(None);
        }
        let draft = self.prepare_submission()?;
        self.submitting = true;
        Ok(Some(draft))
    }

    pub fn fail_submit(&mut self) {
        self.submitting = false;
    }
}
