use serde::{Deserialize, Serialize};

/// The signed-in account as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: Option<String>,
}

impl User {
    pub fn new(uid: impl Into<String>, email: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            email,
        }
    }
}
