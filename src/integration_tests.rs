#[cfg(test)]
mod tests {
    use crate::domain::{LineItemDraft, Order, OrderStatus};
    use crate::error::{ClientError, ValidationError};
    use crate::mock_framework::{
        expect_create, expect_delete, expect_detail, expect_list, expect_no_call, expect_status,
        expect_update, mount_view, sample_order,
    };
    use crate::view::{ActiveModal, FormInput, Severity};

    #[tokio::test]
    async fn test_order_creation_flow() {
        // 1. Mount the list over an empty order service
        let (client, mut calls) = mount_view(Vec::new()).await;

        // 2. Fill in the create form
        client.open_create().await.unwrap();
        client.input(FormInput::CustomerName("Ana".into())).await.unwrap();
        client.input(FormInput::Email("a@x.com".into())).await.unwrap();
        client
            .input(FormInput::Draft(LineItemDraft::new("Caneca", 2, 10.0)))
            .await
            .unwrap();
        client.input(FormInput::AddItem).await.unwrap();
        client.submit().await.unwrap();

        // 3. The payload carries the client total and the initial status
        let (draft, responder) = expect_create(&mut calls).await.expect("Expected Create");
        assert_eq!(draft.total, 20.0);
        let payload = serde_json::to_value(&draft).unwrap();
        assert_eq!(payload["status"], "PENDENTE");
        assert_eq!(payload["cliente"], "Ana");
        assert_eq!(payload["itens"][0]["produto"], "Caneca");
        assert_eq!(payload["itens"][0]["quantidade"], 2);

        // the server answers with the id only
        let created = Order {
            id: "abc".into(),
            customer_name: draft.customer_name.clone(),
            email: draft.email.clone(),
            line_items: draft.line_items.clone(),
            total: draft.total,
            status: draft.status,
            created_at: None,
        };
        responder.send(Ok(created.clone())).unwrap();

        // 4. The form closes and the list refetches
        let refetch = expect_list(&mut calls).await.expect("Expected refetch after create");
        let snapshot = client.wait_for(|s| s.order("abc").is_some()).await.unwrap();
        assert_eq!(snapshot.modal, ActiveModal::None);
        refetch.send(Ok(vec![created])).unwrap();

        let snapshot = client.settle().await.unwrap();
        let order = snapshot.order("abc").expect("order abc listed");
        assert_eq!(format!("{:.2}", order.total), "20.00");
        assert_eq!(snapshot.orders.len(), 1);
        assert!(snapshot
            .notifications
            .iter()
            .any(|n| n.severity == Severity::Success && n.message == "Order created"));
    }

    #[tokio::test]
    async fn test_invalid_create_never_calls_api() {
        let (client, mut calls) = mount_view(Vec::new()).await;

        client.open_create().await.unwrap();
        client.input(FormInput::Email("a@x.com".into())).await.unwrap();
        client
            .input(FormInput::Draft(LineItemDraft::new("Caneca", 1, 10.0)))
            .await
            .unwrap();
        client.input(FormInput::AddItem).await.unwrap();
        client.submit().await.unwrap();

        let snapshot = client.settle().await.unwrap();
        assert!(expect_no_call(&mut calls).await);
        assert!(matches!(snapshot.modal, ActiveModal::Create(_)));
        assert!(snapshot.notifications.iter().any(|n| {
            n.severity == Severity::Warning
                && n.message == ValidationError::EmptyCustomerName.to_string()
        }));
    }

    #[tokio::test]
    async fn test_invalid_item_warns_and_keeps_list() {
        let (client, mut calls) = mount_view(Vec::new()).await;

        client.open_create().await.unwrap();
        client
            .input(FormInput::Draft(LineItemDraft::new("Caneca", 1, 0.0)))
            .await
            .unwrap();
        client.input(FormInput::AddItem).await.unwrap();

        let snapshot = client.settle().await.unwrap();
        let ActiveModal::Create(form) = &snapshot.modal else {
            panic!("Expected the create form");
        };
        assert!(form.items().is_empty());
        assert!(snapshot.has_notification(Severity::Warning));
        assert!(expect_no_call(&mut calls).await);
    }

    #[tokio::test]
    async fn test_status_change_patches_row_before_refetch() {
        let (client, mut calls) = mount_view(vec![sample_order("abc", OrderStatus::Pending)]).await;

        client.open_status("abc".into()).await.unwrap();
        let snapshot = client.settle().await.unwrap();
        let ActiveModal::Status(dialog) = &snapshot.modal else {
            panic!("Expected the status dialog");
        };
        assert_eq!(dialog.selected(), Some(OrderStatus::Pending));

        client.select_status(Some(OrderStatus::Shipped)).await.unwrap();
        client.submit().await.unwrap();

        let (id, status, responder) = expect_status(&mut calls).await.expect("Expected Status");
        assert_eq!(id, "abc");
        assert_eq!(status.as_wire(), "ENVIADO");
        responder.send(Ok(())).unwrap();

        // the row is patched while the refetch is still outstanding
        let refetch = expect_list(&mut calls).await.expect("Expected refetch");
        let snapshot = client
            .wait_for(|s| s.order("abc").map(|o| o.status) == Some(OrderStatus::Shipped))
            .await
            .unwrap();
        assert_eq!(snapshot.modal, ActiveModal::None);
        assert!(snapshot.loading);

        refetch
            .send(Ok(vec![sample_order("abc", OrderStatus::Shipped)]))
            .unwrap();
        let snapshot = client.settle().await.unwrap();
        assert_eq!(snapshot.order("abc").unwrap().status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_failed_delete_closes_dialog_and_keeps_row() {
        let (client, mut calls) = mount_view(vec![sample_order("abc", OrderStatus::Pending)]).await;

        client.open_delete("abc".into()).await.unwrap();
        client.confirm_delete(true).await.unwrap();

        let (id, responder) = expect_delete(&mut calls).await.expect("Expected Delete");
        assert_eq!(id, "abc");
        assert_eq!(client.snapshot().modal, ActiveModal::None);
        responder
            .send(Err(ClientError::Network("delete order failed with status 500".into())))
            .unwrap();

        let snapshot = client.settle().await.unwrap();
        assert_eq!(snapshot.modal, ActiveModal::None);
        assert!(snapshot.order("abc").is_some());
        assert!(snapshot
            .notifications
            .iter()
            .any(|n| n.severity == Severity::Error && n.message.contains("500")));
        assert!(expect_no_call(&mut calls).await, "no refetch after a failed delete");
    }

    #[tokio::test]
    async fn test_successful_delete_removes_row() {
        let (client, mut calls) = mount_view(vec![
            sample_order("abc", OrderStatus::Pending),
            sample_order("def", OrderStatus::Canceled),
        ])
        .await;

        client.open_delete("abc".into()).await.unwrap();
        client.confirm_delete(true).await.unwrap();
        let (_, responder) = expect_delete(&mut calls).await.expect("Expected Delete");
        responder.send(Ok(())).unwrap();

        let refetch = expect_list(&mut calls).await.expect("Expected refetch");
        let snapshot = client.wait_for(|s| s.order("abc").is_none()).await.unwrap();
        assert!(snapshot.order("def").is_some());
        refetch
            .send(Ok(vec![sample_order("def", OrderStatus::Canceled)]))
            .unwrap();

        let snapshot = client.settle().await.unwrap();
        assert!(snapshot.order("abc").is_none());
    }

    #[tokio::test]
    async fn test_edit_flow_sends_full_replacement() {
        let (client, mut calls) = mount_view(vec![sample_order("abc", OrderStatus::Pending)]).await;

        client.open_edit("abc".into()).await.unwrap();
        let (id, responder) = expect_detail(&mut calls).await.expect("Expected Detail");
        assert_eq!(id, "abc");
        responder.send(Ok(sample_order("abc", OrderStatus::Pending))).unwrap();
        client.settle().await.unwrap();

        client
            .input(FormInput::BeginItemEdit("abc-item".into()))
            .await
            .unwrap();
        client
            .input(FormInput::ItemEditDraft(LineItemDraft::new("Caneca", 3, 10.0)))
            .await
            .unwrap();
        client.input(FormInput::ApplyItemEdit).await.unwrap();
        client
            .input(FormInput::Draft(LineItemDraft::new("Camiseta", 1, 35.5)))
            .await
            .unwrap();
        client.input(FormInput::AddItem).await.unwrap();

        let snapshot = client.settle().await.unwrap();
        let ActiveModal::Edit(form) = &snapshot.modal else {
            panic!("Expected the edit form");
        };
        assert_eq!(form.total(), 65.5);

        client.submit().await.unwrap();
        let (id, update, responder) = expect_update(&mut calls).await.expect("Expected Update");
        assert_eq!(id, "abc");
        assert_eq!(update.total, 65.5);
        assert_eq!(update.line_items.len(), 2);
        assert_eq!(update.line_items[0].id, "abc-item");
        responder.send(Ok(())).unwrap();

        let refetch = expect_list(&mut calls).await.expect("Expected refetch");
        refetch
            .send(Ok(vec![sample_order("abc", OrderStatus::Pending)]))
            .unwrap();
        let snapshot = client.settle().await.unwrap();
        assert_eq!(snapshot.modal, ActiveModal::None);
        assert!(snapshot.has_notification(Severity::Success));
    }

    #[tokio::test]
    async fn test_edit_failure_allows_retry() {
        let (client, mut calls) = mount_view(vec![sample_order("abc", OrderStatus::Pending)]).await;

        client.open_edit("abc".into()).await.unwrap();
        let (_, responder) = expect_detail(&mut calls).await.expect("Expected Detail");
        responder.send(Ok(sample_order("abc", OrderStatus::Pending))).unwrap();
        client.settle().await.unwrap();

        client.submit().await.unwrap();
        let (_, _, responder) = expect_update(&mut calls).await.expect("Expected Update");
        responder
            .send(Err(ClientError::Network("update order failed with status 502".into())))
            .unwrap();
        let snapshot = client.settle().await.unwrap();
        assert!(matches!(&snapshot.modal, ActiveModal::Edit(form) if !form.is_submitting()));

        client.submit().await.unwrap();
        let (_, _, responder) = expect_update(&mut calls).await.expect("Expected retry");
        responder.send(Ok(())).unwrap();
        let refetch = expect_list(&mut calls).await.expect("Expected refetch");
        refetch
            .send(Ok(vec![sample_order("abc", OrderStatus::Pending)]))
            .unwrap();
        assert_eq!(client.settle().await.unwrap().modal, ActiveModal::None);
    }

    #[tokio::test]
    async fn test_mutation_for_closed_modal_still_refreshes() {
        let (client, mut calls) = mount_view(vec![sample_order("abc", OrderStatus::Pending)]).await;

        client.open_status("abc".into()).await.unwrap();
        client.select_status(Some(OrderStatus::Canceled)).await.unwrap();
        client.submit().await.unwrap();
        let (_, _, responder) = expect_status(&mut calls).await.expect("Expected Status");

        // user closes the dialog and opens another one before the reply lands
        client.close().await.unwrap();
        client.open_create().await.unwrap();
        responder.send(Ok(())).unwrap();

        let refetch = expect_list(&mut calls).await.expect("Expected refetch");
        refetch
            .send(Ok(vec![sample_order("abc", OrderStatus::Canceled)]))
            .unwrap();
        let snapshot = client.settle().await.unwrap();
        assert!(matches!(snapshot.modal, ActiveModal::Create(_)), "unrelated modal untouched");
        assert_eq!(snapshot.order("abc").unwrap().status, OrderStatus::Canceled);
    }
}
