use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::{ApiConfig, StatusMethod};
use crate::domain::{LineItem, Order, OrderDraft, OrderStatus, OrderUpdate, StatusUpdate};
use crate::error::ClientError;
use crate::session::SessionProvider;

/// Remote order service. Every call either succeeds or reports a recoverable error.
#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Order>, ClientError>;
    async fn get_detail(&self, id: &str) -> Result<Order, ClientError>;
    async fn create(&self, draft: &OrderDraft) -> Result<Order, ClientError>;
    async fn update(&self, id: &str, update: &OrderUpdate) -> Result<(), ClientError>;
    async fn set_status(&self, id: &str, status: OrderStatus) -> Result<(), ClientError>;
    async fn delete(&self, id: &str) -> Result<(), ClientError>;
}

/// Client for the order service over HTTP.
///
/// When built with a session, every request carries a bearer ID token fetched from
/// the session right before sending, so rotated tokens are picked up.
#[derive(Clone)]
pub struct HttpOrderApi {
    http: reqwest::Client,
    endpoints: ApiConfig,
    session: Option<SessionProvider>,
}

impl HttpOrderApi {
    pub fn new(
        endpoints: ApiConfig,
        session: Option<SessionProvider>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(endpoints.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            endpoints,
            session,
        })
    }

    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, ClientError> {
        let mut request = self.http.request(method, url);
        if let Some(session) = &self.session {
            let token = session.current_id_token().await?;
            request = request.bearer_auth(token);
        }
        Ok(request)
    }
}

/// Appends `segments` to `base`, percent-encoding each one.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = Url::parse(base)
        .map_err(|e| ClientError::Network(format!("invalid order service URL {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| ClientError::Network(format!("{base} cannot take a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn ensure_success(response: Response, operation: &str) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        warn!(%status, operation, "Order service returned an error");
        Err(ClientError::Network(format!("{operation} failed with status {status}")))
    }
}

/// The create endpoint may answer with the full order or only its id.
#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
    cliente: Option<String>,
    email: Option<String>,
    itens: Option<Vec<LineItem>>,
    total: Option<f64>,
    status: Option<OrderStatus>,
    data_criacao: Option<String>,
}

impl CreateOrderResponse {
    fn into_order(self, draft: &OrderDraft) -> Order {
        Order {
            id: self.id,
            customer_name: self.cliente.unwrap_or_else(|| draft.customer_name.clone()),
            email: self.email.unwrap_or_else(|| draft.email.clone()),
            line_items: self.itens.unwrap_or_else(|| draft.line_items.clone()),
            total: self.total.unwrap_or(draft.total),
            status: self.status.unwrap_or(draft.status),
            created_at: self.data_criacao,
        }
    }
}

#[async_trait]
impl OrderApi for HttpOrderApi {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Order>, ClientError> {
        debug!("Sending request");
        let url = endpoint(&self.endpoints.list_url, &["listar_pedidos"])?;
        let response = self.request(Method::GET, url).await?.send().await?;
        let orders: Vec<Order> = ensure_success(response, "list orders")?.json().await?;
        debug!(count = orders.len(), "Orders received");
        Ok(orders)
    }

    #[instrument(skip(self))]
    async fn get_detail(&self, id: &str) -> Result<Order, ClientError> {
        debug!("Sending request");
        let url = endpoint(&self.endpoints.detail_url, &[id])?;
        let response = self.request(Method::GET, url).await?.send().await?;
        if !response.status().is_success() {
            warn!(status = %response.status(), "Order detail unavailable");
            return Err(ClientError::NotFound(id.to_string()));
        }
        Ok(response.json().await?)
    }

    #[instrument(skip(self, draft), fields(customer = %draft.customer_name, total = draft.total))]
    async fn create(&self, draft: &OrderDraft) -> Result<Order, ClientError> {
        debug!("Sending request");
        let url = endpoint(&self.endpoints.create_url, &["salvar_pedido"])?;
        let response = self
            .request(Method::POST, url)
            .await?
            .json(draft)
            .send()
            .await?;
        let created: CreateOrderResponse = ensure_success(response, "create order")?.json().await?;
        Ok(created.into_order(draft))
    }

    #[instrument(skip(self, update), fields(total = update.total))]
    async fn update(&self, id: &str, update: &OrderUpdate) -> Result<(), ClientError> {
        debug!("Sending request");
        let url = endpoint(&self.endpoints.update_url, &["pedidos", id])?;
        let response = self
            .request(Method::PUT, url)
            .await?
            .json(update)
            .send()
            .await?;
        ensure_success(response, "update order")?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_status(&self, id: &str, status: OrderStatus) -> Result<(), ClientError> {
        debug!("Sending request");
        let method = match self.endpoints.status_method {
            StatusMethod::Patch => Method::PATCH,
            StatusMethod::Put => Method::PUT,
        };
        let url = endpoint(&self.endpoints.status_url, &[id])?;
        let response = self
            .request(method, url)
            .await?
            .json(&StatusUpdate { status })
            .send()
            .await?;
        ensure_success(response, "update order status")?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        debug!("Sending request");
        let url = endpoint(&self.endpoints.delete_url, &[id])?;
        let response = self.request(Method::DELETE, url).await?.send().await?;
        ensure_success(response, "delete order")?;
        Ok(())
    }
}
