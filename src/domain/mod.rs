pub mod line_item;
pub mod order;
pub mod status;
pub mod user;

pub use line_item::*;
pub use order::*;
pub use status::*;
pub use user::*;
