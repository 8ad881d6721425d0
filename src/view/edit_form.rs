use super::working_copy::{FormInput, OrderWorkingCopy};
use crate::domain::{LineItem, LineItemDraft, Order, OrderUpdate};
use crate::error::ValidationError;

/// The nested dialog editing one existing item in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemEdit {
    pub item_id: String,
    pub draft: LineItemDraft,
}

/// The edit-order modal, working on a copy of the loaded order.
#[derive(Debug, Clone, PartialEq)]
pub struct EditOrderForm {
    order_id: String,
    working: OrderWorkingCopy,
    total: f64,
    item_edit: Option<ItemEdit>,
    submitting: bool,
}

impl EditOrderForm {
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            working: OrderWorkingCopy::new(
                order.customer_name.clone(),
                order.email.clone(),
                order.line_items.clone(),
            ),
            total: order.total,
            item_edit: None,
            submitting: false,
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
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

    pub fn item_edit(&self) -> Option<&ItemEdit> {
        self.item_edit.as_ref()
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn apply(&mut self, input: FormInput) -> Result<(), ValidationError> {
        match input {
            FormInput::CustomerName(name) => self.working.customer_name = name,
            FormInput::Email(email) => self.working.email = email,
            FormInput::Draft(draft) => self.working.draft = draft,
            FormInput::AddItem => {
                self.working.add_item()?;
                self.recompute_total();
            }
            FormInput::RemoveItem(id) => {
                if !self.working.remove_item(&id) {
                    return Err(ValidationError::UnknownItem(id));
                }
                self.recompute_total();
            }
            FormInput::BeginItemEdit(id) => self.begin_item_edit(id)?,
            FormInput::ItemEditDraft(draft) => {
                if let Some(edit) = &mut self.item_edit {
                    edit.draft = draft;
                }
            }
            FormInput::ApplyItemEdit => self.apply_item_edit()?,
            FormInput::CancelItemEdit => self.item_edit = None,
        }
        Ok(())
    }

    fn begin_item_edit(&mut self, id: String) -> Result<(), ValidationError> {
        let item = self
            .working
            .find_item(&id)
            .ok_or_else(|| ValidationError::UnknownItem(id.clone()))?;
        self.item_edit = Some(ItemEdit {
            item_id: item.id.clone(),
            draft: LineItemDraft::from_item(item),
        });
        Ok(())
    }

    /// Replaces the edited item. On a validation failure the nested editor stays
    /// open with its draft.
    fn apply_item_edit(&mut self) -> Result<(), ValidationError> {
        let Some(edit) = &self.item_edit else {
            return Ok(());
        };
        if !self.working.replace_item(&edit.item_id, edit.draft.clone())? {
            return Err(ValidationError::UnknownItem(edit.item_id.clone()));
        }
        self.item_edit = None;
        self.recompute_total();
        Ok(())
    }

    fn recompute_total(&mut self) {
        self.total = self.working.total();
    }

    pub fn prepare_submission(&self) -> Result<OrderUpdate, ValidationError> {
        OrderUpdate::new(
            self.working.customer_name.trim(),
            self.working.email.trim(),
            self.working.items().to_vec(),
        )
    }

    /// Starts a submission. `Ok(None)` means one is already in flight.
    pub fn begin_submit(&mut self) -> Result<Option<OrderUpdate>, ValidationError> {
        if self.submitting {
            return Ok(None);
        }
        let update = self.prepare_submission()?;
        self.submitting = true;
        Ok(Some(update))
    }

    pub fn fail_submit(&mut self) {
        self.submitting = false;
    }
}
