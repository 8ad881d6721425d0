//! # Mock Framework
//!
//! Utilities for testing the view and the session in isolation.
//!
//! Use [`create_mock_api`] to get an [`OrderApi`] and a receiver of the calls made
//! on it. Then use helpers like [`expect_list`] or [`expect_create`] to assert each
//! call and script its reply.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{mpsc, oneshot};

use crate::clients::OrderApi;
use crate::domain::{LineItem, Order, OrderDraft, OrderStatus, OrderUpdate, User};
use crate::error::{AuthError, ClientError};
use crate::session::{Credential, IdentityProvider};
use crate::view::{OrderListClient, OrderListService};

const EXPECT_TIMEOUT: Duration = Duration::from_secs(5);
const QUIET_PERIOD: Duration = Duration::from_millis(100);

pub type Reply<T> = oneshot::Sender<Result<T, ClientError>>;

/// One call made on a [`MockOrderApi`], with the responder the test answers through.
#[derive(Debug)]
pub enum ApiCall {
    List {
        respond_to: Reply<Vec<Order>>,
    },
    Detail {
        id: String,
        respond_to: Reply<Order>,
    },
    Create {
        draft: OrderDraft,
        respond_to: Reply<Order>,
    },
    Update {
        id: String,
        update: OrderUpdate,
        respond_to: Reply<()>,
    },
    Status {
        id: String,
        status: OrderStatus,
        respond_to: Reply<()>,
    },
    Delete {
        id: String,
        respond_to: Reply<()>,
    },
}

/// An [`OrderApi`] whose calls are answered by the test.
///
/// Instead of standing up an HTTP server for view tests, every call is forwarded
/// over a channel the test controls, so replies (success, failure, delays and
/// their order) are fully deterministic.
pub struct MockOrderApi {
    sender: mpsc::Sender<ApiCall>,
}

impl MockOrderApi {
    async fn call<T>(&self, build: impl FnOnce(Reply<T>) -> ApiCall) -> Result<T, ClientError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| ClientError::Network("mock API closed".into()))?;
        response
            .await
            .map_err(|_| ClientError::Network("mock reply dropped".into()))?
    }
}

#[async_trait]
impl OrderApi for MockOrderApi {
    async fn list(&self) -> Result<Vec<Order>, ClientError> {
        self.call(|respond_to| ApiCall::List { respond_to }).await
    }

    async fn get_detail(&self, id: &str) -> Result<Order, ClientError> {
        let id = id.to_string();
        self.call(|respond_to| ApiCall::Detail { id, respond_to }).await
    }

    async fn create(&self, draft: &OrderDraft) -> Result<Order, ClientError> {
        let draft = draft.clone();
        self.call(|respond_to| ApiCall::Create { draft, respond_to })
            .await
    }

    async fn update(&self, id: &str, update: &OrderUpdate) -> Result<(), ClientError> {
        let (id, update) = (id.to_string(), update.clone());
        self.call(|respond_to| ApiCall::Update {
            id,
            update,
            respond_to,
        })
        .await
    }

    async fn set_status(&self, id: &str, status: OrderStatus) -> Result<(), ClientError> {
        let id = id.to_string();
        self.call(|respond_to| ApiCall::Status {
            id,
            status,
            respond_to,
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let id = id.to_string();
        self.call(|respond_to| ApiCall::Delete { id, respond_to }).await
    }
}

/// Creates a mock API and a receiver for asserting the calls made on it.
pub fn create_mock_api(buffer_size: usize) -> (Arc<MockOrderApi>, mpsc::Receiver<ApiCall>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (Arc::new(MockOrderApi { sender }), receiver)
}

async fn next_call(receiver: &mut mpsc::Receiver<ApiCall>) -> Option<ApiCall> {
    tokio::time::timeout(EXPECT_TIMEOUT, receiver.recv())
        .await
        .ok()
        .flatten()
}

/// Helper to verify that the next call is a List request
pub async fn expect_list(receiver: &mut mpsc::Receiver<ApiCall>) -> Option<Reply<Vec<Order>>> {
    match next_call(receiver).await {
        Some(ApiCall::List { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next call is a Detail request
pub async fn expect_detail(
    receiver: &mut mpsc::Receiver<ApiCall>,
) -> Option<(String, Reply<Order>)> {
    match next_call(receiver).await {
        Some(ApiCall::Detail { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is a Create request
pub async fn expect_create(
    receiver: &mut mpsc::Receiver<ApiCall>,
) -> Option<(OrderDraft, Reply<Order>)> {
    match next_call(receiver).await {
        Some(ApiCall::Create { draft, respond_to }) => Some((draft, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is an Update request
pub async fn expect_update(
    receiver: &mut mpsc::Receiver<ApiCall>,
) -> Option<(String, OrderUpdate, Reply<()>)> {
    match next_call(receiver).await {
        Some(ApiCall::Update {
            id,
            update,
            respond_to,
        }) => Some((id, update, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is a Status request
pub async fn expect_status(
    receiver: &mut mpsc::Receiver<ApiCall>,
) -> Option<(String, OrderStatus, Reply<()>)> {
    match next_call(receiver).await {
        Some(ApiCall::Status {
            id,
            status,
            respond_to,
        }) => Some((id, status, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is a Delete request
pub async fn expect_delete(receiver: &mut mpsc::Receiver<ApiCall>) -> Option<(String, Reply<()>)> {
    match next_call(receiver).await {
        Some(ApiCall::Delete { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// True when no call arrives within a short quiet period.
pub async fn expect_no_call(receiver: &mut mpsc::Receiver<ApiCall>) -> bool {
    tokio::time::timeout(QUIET_PERIOD, receiver.recv())
        .await
        .is_err()
}

/// Mounts a list view over a mock API and answers its first fetch with `orders`.
pub async fn mount_view(orders: Vec<Order>) -> (OrderListClient, mpsc::Receiver<ApiCall>) {
    let (api, mut calls) = create_mock_api(16);
    let (service, client) = OrderListService::new(16, api);
    tokio::spawn(service.run());

    let reply = expect_list(&mut calls)
        .await
        .expect("Expected the mount fetch");
    reply.send(Ok(orders)).expect("view dropped the mount fetch");
    client.settle().await.expect("view closed during mount");
    (client, calls)
}

pub fn sample_order(id: &str, status: OrderStatus) -> Order {
    Order {
        id: id.to_string(),
        customer_name: "Ana".to_string(),
        email: "a@x.com".to_string(),
        line_items: vec![LineItem {
            id: format!("{id}-item"),
            product_name: "Caneca".to_string(),
            quantity: 2,
            unit_price: 10.0,
        }],
        total: 20.0,
        status,
        created_at: Some("2024-03-01T12:30:00Z".to_string()),
    }
}

/// Identity provider that accepts any custom token as the configured user.
pub struct StaticIdentity {
    uid: String,
    refreshes: AtomicUsize,
}

impl StaticIdentity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            refreshes: AtomicUsize::new(0),
        }
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn sign_in_with_custom_token(&self, _token: &str) -> Result<Credential, AuthError> {
        Ok(credential_for(&self.uid, chrono::Duration::hours(1)))
    }

    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError> {
        let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Credential {
            user: credential.user.clone(),
            id_token: format!("id-token-refreshed-{n}"),
            refresh_token: format!("refresh-{n}"),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        })
    }
}

/// A credential for `uid` whose ID token expires after `ttl`.
pub fn credential_for(uid: &str, ttl: chrono::Duration) -> Credential {
    Credential {
        user: User::new(uid, Some(format!("{uid}@example.com"))),
        id_token: format!("id-token-{uid}"),
        refresh_token: format!("refresh-{uid}"),
        expires_at: Utc::now() + ttl,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_api() {
        let (api, mut receiver) = create_mock_api(10);

        let delete_task = tokio::spawn(async move { api.delete("abc").await });

        let (id, responder) = expect_delete(&mut receiver)
            .await
            .expect("Expected Delete request");
        assert_eq!(id, "abc");
        responder.send(Ok(())).unwrap();

        let result = delete_task.await.unwrap();
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn wrong_call_is_not_matched() {
        let (api, mut receiver) = create_mock_api(10);
        let _task = tokio::spawn(async move { api.list().await });
        assert!(expect_delete(&mut receiver).await.is_none());
    }
}
