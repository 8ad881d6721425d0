use thiserror::Error;

/// User input that fails the local checks. Never leaves the form that raised it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Customer name is required")]
    EmptyCustomerName,
    #[error("Email is required")]
    EmptyEmail,
    #[error("Add at least one item to the order")]
    NoLineItems,
    #[error("Fill in the item correctly: product name, quantity above 0 and price above 0")]
    InvalidItem,
    #[error("No item with id {0} in this order")]
    UnknownItem(String),
    #[error("Select a status")]
    NoStatusSelected,
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
    #[error("Password must be at least {min} characters long")]
    PasswordTooShort { min: usize },
}

/// Errors raised by the session provider and the identity service behind it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("No authenticated user")]
    NotSignedIn,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),
    #[error("Identity provider error: {0}")]
    Provider(String),
    #[error("Session storage error: {0}")]
    Storage(String),
}

/// Errors surfaced by the order API client and the login/register flows.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

/// Returned by the order list client once its service task has stopped.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ViewError {
    #[error("Order list view is closed")]
    Closed,
}
