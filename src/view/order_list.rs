//! The order list view.
//!
//! [`OrderListService`] is a single task that owns every piece of view state: the
//! orders, the open modal and the notifications. [`OrderListClient`] is the cheap,
//! cloneable handle a front end uses to feed it user events. Network calls run as
//! separate tasks and report back through the same channel, so state is only ever
//! touched by the service task.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn, Instrument};

use super::create_form::CreateOrderForm;
use super::delete_dialog::DeleteConfirmation;
use super::detail::DetailView;
use super::edit_form::EditOrderForm;
use super::modal::{ActiveModal, LoadPurpose, ModalId};
use super::notification::{Notification, Notifications, Severity};
use super::status_dialog::StatusDialog;
use super::working_copy::FormInput;
use crate::clients::OrderApi;
use crate::domain::{Order, OrderDraft, OrderStatus, OrderUpdate};
use crate::error::{ClientError, ViewError};

/// Everything a user can do to the list view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Refresh,
    OpenCreate,
    OpenDetail(String),
    OpenEdit(String),
    OpenStatus(String),
    OpenDelete(String),
    Close,
    Form(FormInput),
    SelectStatus(Option<OrderStatus>),
    Submit,
    ConfirmDelete(bool),
    DismissNotifications,
}

/// What the view currently shows. Published after every handled event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewSnapshot {
    pub orders: Vec<Order>,
    pub modal: ActiveModal,
    pub notifications: Vec<Notification>,
    /// A list fetch is in flight.
    pub loading: bool,
    /// Requests of any kind still in flight.
    pub in_flight: usize,
    pub revision: u64,
}

impl ViewSnapshot {
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn order(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|order| order.id == id)
    }

    pub fn has_notification(&self, severity: Severity) -> bool {
        self.notifications.iter().any(|n| n.severity == severity)
    }
}

#[derive(Debug)]
enum Completion {
    Listed {
        generation: u64,
        result: Result<Vec<Order>, ClientError>,
    },
    Loaded {
        modal: ModalId,
        purpose: LoadPurpose,
        result: Result<Order, ClientError>,
    },
    Created {
        modal: ModalId,
        result: Result<Order, ClientError>,
    },
    Updated {
        modal: ModalId,
        order_id: String,
        result: Result<(), ClientError>,
    },
    StatusChanged {
        modal: ModalId,
        order_id: String,
        status: OrderStatus,
        result: Result<(), ClientError>,
    },
    Deleted {
        order_id: String,
        result: Result<(), ClientError>,
    },
}

enum ViewMessage {
    Event(ViewEvent),
    Completed(Completion),
    Sync(oneshot::Sender<ViewSnapshot>),
}

enum Submission {
    Create(OrderDraft),
    Update(String, OrderUpdate),
    Status(String, OrderStatus),
}

pub struct OrderListService {
    receiver: mpsc::Receiver<ViewMessage>,
    // weak, so the service stops once every client is gone
    sender: mpsc::WeakSender<ViewMessage>,
    api: Arc<dyn OrderApi>,
    snapshots: watch::Sender<ViewSnapshot>,
    orders: Vec<Order>,
    modal: ActiveModal,
    modal_id: ModalId,
    next_modal_id: u64,
    notifications: Notifications,
    list_generation: u64,
    applied_generation: u64,
    pending_lists: usize,
    in_flight: usize,
    revision: u64,
}

impl OrderListService {
    pub fn new(buffer_size: usize, api: Arc<dyn OrderApi>) -> (Self, OrderListClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        // the mount fetch has not been issued yet, but the view starts out loading
        let (snapshots, snapshot_rx) = watch::channel(ViewSnapshot {
            loading: true,
            in_flight: 1,
            ..ViewSnapshot::default()
        });
        let service = Self {
            receiver,
            sender: sender.downgrade(),
            api,
            snapshots,
            orders: Vec::new(),
            modal: ActiveModal::None,
            modal_id: ModalId::default(),
            next_modal_id: 0,
            notifications: Notifications::default(),
            list_generation: 0,
            applied_generation: 0,
            pending_lists: 0,
            in_flight: 0,
            revision: 0,
        };
        let client = OrderListClient {
            sender,
            snapshots: snapshot_rx,
        };
        (service, client)
    }

    pub async fn run(mut self) {
        info!("Order list mounted");
        self.fetch_orders();
        self.publish();

        loop {
            let expiry = self.notifications.next_expiry();
            tokio::select! {
                message = self.receiver.recv() => match message {
                    Some(message) => self.handle_message(message),
                    None => break,
                },
                _ = wait_until(expiry) => {
                    if self.notifications.prune(Instant::now()) {
                        self.publish();
                    }
                }
            }
        }
        info!("Order list unmounted");
    }

    fn handle_message(&mut self, message: ViewMessage) {
        match message {
            ViewMessage::Event(event) => self.handle_event(event),
            ViewMessage::Completed(completion) => self.handle_completion(completion),
            ViewMessage::Sync(respond_to) => {
                let _ = respond_to.send(self.snapshot());
                return;
            }
        }
        self.publish();
    }

    #[instrument(skip(self), fields(modal = self.modal.name()))]
    fn handle_event(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Refresh => self.fetch_orders(),
            ViewEvent::OpenCreate => {
                self.open(ActiveModal::Create(CreateOrderForm::new()));
            }
            ViewEvent::OpenDetail(order_id) => self.open_loading(order_id, LoadPurpose::Detail),
            ViewEvent::OpenEdit(order_id) => self.open_loading(order_id, LoadPurpose::Edit),
            ViewEvent::OpenStatus(order_id) => match self.find(&order_id).map(StatusDialog::new) {
                Some(dialog) => {
                    self.open(ActiveModal::Status(dialog));
                }
                None => self.order_missing(&order_id),
            },
            ViewEvent::OpenDelete(order_id) => {
                match self.find(&order_id).map(DeleteConfirmation::new) {
                    Some(dialog) => {
                        self.open(ActiveModal::DeleteConfirm(dialog));
                    }
                    None => self.order_missing(&order_id),
                }
            }
            ViewEvent::Close => self.close(),
            ViewEvent::Form(input) => self.apply_form_input(input),
            ViewEvent::SelectStatus(status) => match &mut self.modal {
                ActiveModal::Status(dialog) => dialog.select(status),
                _ => debug!("No status dialog open, selection ignored"),
            },
            ViewEvent::Submit => self.submit(),
            ViewEvent::ConfirmDelete(confirmed) => self.confirm_delete(confirmed),
            ViewEvent::DismissNotifications => self.notifications.clear(),
        }
    }

    fn find(&self, order_id: &str) -> Option<&Order> {
        self.orders.iter().find(|order| order.id == order_id)
    }

    fn order_missing(&mut self, order_id: &str) {
        warn!(order_id, "Order is not in the list");
        self.notify(Severity::Warning, format!("Order {order_id} not found"));
    }

    fn open(&mut self, modal: ActiveModal) -> ModalId {
        self.next_modal_id += 1;
        self.modal_id = ModalId(self.next_modal_id);
        debug!(modal = modal.name(), id = self.modal_id.0, "Opening modal");
        self.modal = modal;
        self.modal_id
    }

    fn close(&mut self) {
        if self.modal.is_open() {
            debug!(modal = self.modal.name(), "Closing modal");
        }
        self.next_modal_id += 1;
        self.modal_id = ModalId(self.next_modal_id);
        self.modal = ActiveModal::None;
    }

    fn is_current(&self, modal: ModalId) -> bool {
        self.modal.is_open() && self.modal_id == modal
    }

    fn open_loading(&mut self, order_id: String, purpose: LoadPurpose) {
        let modal = self.open(ActiveModal::Loading {
            order_id: order_id.clone(),
            purpose,
        });
        self.spawn_request(move |api| async move {
            let result = api.get_detail(&order_id).await;
            Completion::Loaded {
                modal,
                purpose,
                result,
            }
        });
    }

    fn apply_form_input(&mut self, input: FormInput) {
        let result = match &mut self.modal {
            ActiveModal::Create(form) => form.apply(input),
            ActiveModal::Edit(form) => form.apply(input),
            _ => {
                debug!("No form open, input ignored");
                return;
            }
        };
        if let Err(e) = result {
            self.notify(Severity::Warning, e.to_string());
        }
    }

    fn submit(&mut self) {
        let submission = match &mut self.modal {
            ActiveModal::Create(form) => form
                .begin_submit()
                .map(|draft| draft.map(Submission::Create)),
            ActiveModal::Edit(form) => {
                let order_id = form.order_id().to_string();
                form.begin_submit()
                    .map(|update| update.map(|update| Submission::Update(order_id, update)))
            }
            ActiveModal::Status(dialog) => {
                let order_id = dialog.order_id().to_string();
                dialog
                    .begin_submit()
                    .map(|status| status.map(|status| Submission::Status(order_id, status)))
            }
            _ => {
                debug!("Nothing to submit");
                return;
            }
        };

        match submission {
            Err(e) => self.notify(Severity::Warning, e.to_string()),
            Ok(None) => debug!("Submission already in flight"),
            Ok(Some(submission)) => self.send_submission(submission),
        }
    }

    fn send_submission(&mut self, submission: Submission) {
        let modal = self.modal_id;
        match submission {
            Submission::Create(draft) => {
                info!(customer = %draft.customer_name, total = draft.total, "Creating order");
                self.spawn_request(move |api| async move {
                    let result = api.create(&draft).await;
                    Completion::Created { modal, result }
                });
            }
            Submission::Update(order_id, update) => {
                info!(%order_id, total = update.total, "Updating order");
                self.spawn_request(move |api| async move {
                    let result = api.update(&order_id, &update).await;
                    Completion::Updated {
                        modal,
                        order_id,
                        result,
                    }
                });
            }
            Submission::Status(order_id, status) => {
                info!(%order_id, %status, "Changing order status");
                self.spawn_request(move |api| async move {
                    let result = api.set_status(&order_id, status).await;
                    Completion::StatusChanged {
                        modal,
                        order_id,
                        status,
                        result,
                    }
                });
            }
        }
    }

    /// Closes the confirmation whatever the answer; "yes" then fires the delete.
    fn confirm_delete(&mut self, confirmed: bool) {
        let ActiveModal::DeleteConfirm(dialog) = &self.modal else {
            debug!("No delete confirmation open");
            return;
        };
        let order_id = dialog.order_id().to_string();
        self.close();
        if !confirmed {
            debug!(%order_id, "Delete canceled");
            self.notify(Severity::Info, "Delete canceled");
            return;
        }

        info!(%order_id, "Deleting order");
        self.spawn_request(move |api| async move {
            let result = api.delete(&order_id).await;
            Completion::Deleted { order_id, result }
        });
    }

    fn fetch_orders(&mut self) {
        self.list_generation += 1;
        self.pending_lists += 1;
        let generation = self.list_generation;
        debug!(generation, "Fetching orders");
        self.spawn_request(move |api| async move {
            let result = api.list().await;
            Completion::Listed { generation, result }
        });
    }

    fn spawn_request<F, Fut>(&mut self, request: F)
    where
        F: FnOnce(Arc<dyn OrderApi>) -> Fut,
        Fut: Future<Output = Completion> + Send + 'static,
    {
        self.in_flight += 1;
        let sender = self.sender.clone();
        let request = request(Arc::clone(&self.api));
        tokio::spawn(
            async move {
                let completion = request.await;
                match sender.upgrade() {
                    Some(sender) => {
                        let _ = sender.send(ViewMessage::Completed(completion)).await;
                    }
                    None => debug!("View closed before the request completed"),
                }
            }
            .in_current_span(),
        );
    }

    fn handle_completion(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion {
            Completion::Listed { generation, result } => self.on_listed(generation, result),
            Completion::Loaded {
                modal,
                purpose,
                result,
            } => self.on_loaded(modal, purpose, result),
            Completion::Created { modal, result } => self.on_created(modal, result),
            Completion::Updated {
                modal,
                order_id,
                result,
            } => self.on_updated(modal, order_id, result),
            Completion::StatusChanged {
                modal,
                order_id,
                status,
                result,
            } => self.on_status_changed(modal, order_id, status, result),
            Completion::Deleted { order_id, result } => self.on_deleted(order_id, result),
        }
    }

    fn on_listed(&mut self, generation: u64, result: Result<Vec<Order>, ClientError>) {
        self.pending_lists = self.pending_lists.saturating_sub(1);
        match result {
            Ok(orders) if generation > self.applied_generation => {
                info!(count = orders.len(), "Orders loaded");
                self.applied_generation = generation;
                self.orders = orders;
                self.notify(Severity::Success, "Orders loaded");
            }
            Ok(_) => debug!(generation, "Dropping an out-of-date order list"),
            Err(e) if generation <= self.applied_generation => {
                debug!(generation, error = %e, "Dropping a failure from an out-of-date fetch");
            }
            Err(e) => {
                warn!(error = %e, "Failed to load orders");
                self.notify(Severity::Error, format!("Failed to load orders: {e}"));
            }
        }
    }

    fn on_loaded(
        &mut self,
        modal: ModalId,
        purpose: LoadPurpose,
        result: Result<Order, ClientError>,
    ) {
        if !self.is_current(modal) {
            debug!(?purpose, "Discarding order load for a closed modal");
            return;
        }
        match result {
            Ok(order) => {
                self.modal = match purpose {
                    LoadPurpose::Detail => ActiveModal::Detail(DetailView::new(order)),
                    LoadPurpose::Edit => ActiveModal::Edit(EditOrderForm::from_order(&order)),
                };
            }
            Err(e) => {
                warn!(error = %e, "Failed to load order");
                self.close();
                self.notify(Severity::Error, format!("Failed to load order: {e}"));
            }
        }
    }

    fn on_created(&mut self, modal: ModalId, result: Result<Order, ClientError>) {
        match result {
            Ok(order) => {
                info!(order_id = %order.id, "Order created");
                if self.find(&order.id).is_none() {
                    self.orders.push(order);
                }
                self.finish_mutation(modal, "Order created");
            }
            Err(e) => self.mutation_failed(modal, "create order", &e),
        }
    }

    fn on_updated(&mut self, modal: ModalId, order_id: String, result: Result<(), ClientError>) {
        match result {
            Ok(()) => {
                info!(%order_id, "Order updated");
                self.finish_mutation(modal, "Order updated");
            }
            Err(e) => self.mutation_failed(modal, "update order", &e),
        }
    }

    fn on_status_changed(
        &mut self,
        modal: ModalId,
        order_id: String,
        status: OrderStatus,
        result: Result<(), ClientError>,
    ) {
        match result {
            Ok(()) => {
                info!(%order_id, %status, "Order status changed");
                if let Some(order) = self.orders.iter_mut().find(|order| order.id == order_id) {
                    order.status = status;
                }
                self.finish_mutation(modal, &format!("Status updated to {status}"));
            }
            Err(e) => self.mutation_failed(modal, "update status", &e),
        }
    }

    fn on_deleted(&mut self, order_id: String, result: Result<(), ClientError>) {
        match result {
            Ok(()) => {
                info!(%order_id, "Order deleted");
                self.orders.retain(|order| order.id != order_id);
                self.notify(Severity::Success, "Order deleted");
                self.fetch_orders();
            }
            Err(e) => {
                warn!(%order_id, error = %e, "Failed to delete order");
                self.notify(Severity::Error, format!("Failed to delete order: {e}"));
            }
        }
    }

    /// The server changed, so the list is refreshed even when the modal that asked
    /// for the change has since been closed.
    fn finish_mutation(&mut self, modal: ModalId, message: &str) {
        if self.is_current(modal) {
            self.close();
            self.notify(Severity::Success, message);
        } else {
            debug!("Mutation finished after its modal closed");
        }
        self.fetch_orders();
    }

    /// Returns the submitting modal to its open state so the user can retry. A
    /// modal closed in the meantime is left alone but the failure is still shown.
    fn mutation_failed(&mut self, modal: ModalId, action: &str, error: &ClientError) {
        if self.is_current(modal) {
            match &mut self.modal {
                ActiveModal::Create(form) => form.fail_submit(),
                ActiveModal::Edit(form) => form.fail_submit(),
                ActiveModal::Status(dialog) => dialog.fail_submit(),
                _ => {}
            }
        } else {
            debug!(action, "Failure arrived after its modal closed");
        }
        warn!(%error, action, "Request failed");
        self.notify(Severity::Error, format!("Failed to {action}: {error}"));
    }

    fn notify(&mut self, severity: Severity, message: impl Into<String>) {
        self.notifications
            .push(Notification::new(severity, message), Instant::now());
    }

    fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            orders: self.orders.clone(),
            modal: self.modal.clone(),
            notifications: self.notifications.visible(),
            loading: self.pending_lists > 0,
            in_flight: self.in_flight,
            revision: self.revision,
        }
    }

    fn publish(&mut self) {
        self.revision += 1;
        self.snapshots.send_replace(self.snapshot());
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Handle to a running [`OrderListService`].
#[derive(Clone)]
pub struct OrderListClient {
    sender: mpsc::Sender<ViewMessage>,
    snapshots: watch::Receiver<ViewSnapshot>,
}

macro_rules! event_method {
    (
        fn $method:ident($($param:ident: $param_type:ty),*)
            => ViewEvent::$variant:ident $(($($arg:expr),*))?
    ) => {
        impl OrderListClient {
            #[instrument(skip(self))]
            pub async fn $method(&self, $($param: $param_type),*) -> Result<(), ViewError> {
                debug!("Sending event");
                self.send(ViewEvent::$variant $(($($arg),*))?).await
            }
        }
    };
}

impl OrderListClient {
    pub async fn send(&self, event: ViewEvent) -> Result<(), ViewError> {
        self.sender
            .send(ViewMessage::Event(event))
            .await
            .map_err(|_| ViewError::Closed)
    }

    /// The last published snapshot.
    pub fn snapshot(&self) -> ViewSnapshot {
        self.snapshots.borrow().clone()
    }

    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&ViewSnapshot) -> bool,
    ) -> Result<ViewSnapshot, ViewError> {
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .map_err(|_| ViewError::Closed)?
            .clone();
        Ok(snapshot)
    }

    /// Waits until every event sent so far has been handled and no request is in
    /// flight.
    pub async fn settle(&self) -> Result<ViewSnapshot, ViewError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ViewMessage::Sync(respond_to))
            .await
            .map_err(|_| ViewError::Closed)?;
        response.await.map_err(|_| ViewError::Closed)?;
        self.wait_for(|snapshot| !snapshot.is_busy()).await
    }
}

event_method!(fn refresh() => ViewEvent::Refresh);
event_method!(fn open_create() => ViewEvent::OpenCreate);
event_method!(fn open_detail(order_id: String) => ViewEvent::OpenDetail(order_id));
event_method!(fn open_edit(order_id: String) => ViewEvent::OpenEdit(order_id));
event_method!(fn open_status(order_id: String) => ViewEvent::OpenStatus(order_id));
event_method!(fn open_delete(order_id: String) => ViewEvent::OpenDelete(order_id));
event_method!(fn close() => ViewEvent::Close);
event_method!(fn input(input: FormInput) => ViewEvent::Form(input));
event_method!(fn select_status(status: Option<OrderStatus>) => ViewEvent::SelectStatus(status));
event_method!(fn submit() => ViewEvent::Submit);
event_method!(fn confirm_delete(confirmed: bool) => ViewEvent::ConfirmDelete(confirmed));
event_method!(fn dismiss_notifications() => ViewEvent::DismissNotifications);
