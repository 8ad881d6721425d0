//! View state for the order pages: the list service and the modals it hosts.

pub mod create_form;
pub mod delete_dialog;
pub mod detail;
pub mod edit_form;
pub mod modal;
pub mod notification;
pub mod order_list;
pub mod status_dialog;
pub mod working_copy;

pub use create_form::*;
pub use delete_dialog::*;
pub use detail::*;
pub use edit_form::*;
pub use modal::*;
pub use notification::{Notification, Severity, AUTO_HIDE};
pub use order_list::*;
pub use status_dialog::*;
pub use working_copy::*;
