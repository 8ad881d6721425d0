use crate::domain::{compute_total, LineItem, LineItemDraft};
use crate::error::ValidationError;

/// One user edit to an order form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormInput {
    CustomerName(String),
    Email(String),
    /// Replaces the "item being entered".
    Draft(LineItemDraft),
    AddItem,
    RemoveItem(String),
    /// Opens the nested editor for an existing item (edit form only).
    BeginItemEdit(String),
    ItemEditDraft(LineItemDraft),
    ApplyItemEdit,
    CancelItemEdit,
}

/// Local state shared by the create and edit forms: the customer fields, the items
/// assembled so far and the item being typed in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderWorkingCopy {
    pub customer_name: String,
    pub email: String,
    items: Vec<LineItem>,
    pub draft: LineItemDraft,
}

impl OrderWorkingCopy {
    pub fn new(
        customer_name: impl Into<String>,
        email: impl Into<String>,
        items: Vec<LineItem>,
    ) -> Self {
        Self {
            customer_name: customer_name.into(),
            email: email.into(),
            items,
            draft: LineItemDraft::default(),
        }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn total(&self) -> f64 {
        compute_total(&self.items)
    }

    /// Validates the draft and appends it with a fresh id. The list and the draft
    /// are untouched on failure.
    pub fn add_item(&mut self) -> Result<(), ValidationError> {
        let item = self.draft.clone().into_line_item()?;
        self.items.push(item);
        self.draft = LineItemDraft::default();
        Ok(())
    }

    pub fn remove_item(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    pub(crate) fn find_item(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Swaps in a validated replacement for the item with `id`, keeping the id.
    pub(crate) fn replace_item(
        &mut self,
        id: &str,
        draft: LineItemDraft,
    ) -> Result<bool, ValidationError> {
        let Some(slot) = self.items.iter_mut().find(|item| item.id == id) else {
            return Ok(false);
        };
        *slot = draft.into_line_item_with_id(id.to_string())?;
        Ok(true)
    }
}
