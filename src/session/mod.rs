//! Authentication: the session context, the identity provider behind it, the
//! route guard and the login/register flows.

pub mod auth_service;
pub mod guard;
pub mod identity;
pub mod provider;
pub mod store;

pub use auth_service::*;
pub use guard::*;
pub use identity::*;
pub use provider::*;
pub use store::*;
