use super::create_form::CreateOrderForm;
use super::delete_dialog::DeleteConfirmation;
use super::detail::DetailView;
use super::edit_form::EditOrderForm;
use super::status_dialog::StatusDialog;

/// Identifies one opening of a modal. Completions carry the id of the modal that
/// issued them and are dropped when it no longer matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModalId(pub(crate) u64);

/// Why an order is being fetched before its modal can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPurpose {
    Detail,
    Edit,
}

/// At most one modal is open over the list at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActiveModal {
    #[default]
    None,
    Loading {
        order_id: String,
        purpose: LoadPurpose,
    },
    Detail(DetailView),
    Create(CreateOrderForm),
    Edit(EditOrderForm),
    Status(StatusDialog),
    DeleteConfirm(DeleteConfirmation),
}

impl ActiveModal {
    pub fn is_open(&self) -> bool {
        !matches!(self, ActiveModal::None)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActiveModal::None => "none",
            ActiveModal::Loading { .. } => "loading",
            ActiveModal::Detail(_) => "detail",
            ActiveModal::Create(_) => "create",
            ActiveModal::Edit(_) => "edit",
            ActiveModal::Status(_) => "status",
            ActiveModal::DeleteConfirm(_) => "delete",
        }
    }
}
