//! Integration tests for the service layer: checkout, the fulfillment
//! pipeline with missing-item handling, returns, inventory operations and
//! reporting — all against an in-memory SQLite database.

use chrono::Utc;
use uuid::Uuid;

use mercado_core::{
    BundleOffer, Channel, CoreError, ExpenseCategory, FulfillmentStatus, MovementType,
    OrderStatus, Product, StockMovement,
};
use mercado_engine::{
    CartSession, CheckoutService, EngineError, FulfillmentService, InventoryService,
    ReportingService,
};
use mercado_store::{Database, StoreConfig};

// =============================================================================
// Fixtures
// =============================================================================

async fn test_db() -> Database {
    Database::new(StoreConfig::in_memory()).await.unwrap()
}

fn product(id: &str, price_cents: i64) -> Product {
    let now = Utc::now();
    Product {
        id: id.to_string(),
        name: format!("Product {id}"),
        description: None,
        category: "Despensa".to_string(),
        weight: None,
        image_url: None,
        tags: vec![],
        price_cents,
        cost_cents: Some(price_cents * 7 / 10),
        discount_bps: None,
        bundle_offers: vec![],
        stock: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

async fn seed_product(db: &Database, p: &Product, opening_stock: i64) {
    db.products().insert(p).await.unwrap();
    let movement = StockMovement::new(
        Uuid::new_v4().to_string(),
        p.id.clone(),
        opening_stock,
        MovementType::Reception,
        Some("Inventario inicial".to_string()),
        Utc::now(),
    );
    db.ledger().record_movement(&movement).await.unwrap();
}

fn address() -> mercado_core::Address {
    mercado_core::Address {
        id: "addr-1".to_string(),
        user_id: "user-1".to_string(),
        street: "Av. Ballivián 123".to_string(),
        city: "Cochabamba".to_string(),
        reference: "Portón azul".to_string(),
        lat: None,
        lng: None,
    }
}

/// Seeds a catalog, fills a cart and places an online order.
async fn placed_order(db: &Database) -> mercado_core::Order {
    let p1 = product("P001", 1000);
    let p2 = product("P002", 2500);
    seed_product(db, &p1, 50).await;
    seed_product(db, &p2, 50).await;

    let session = CartSession::new();
    session.with_cart_mut(|cart| cart.add_item(&p1)).unwrap();
    session.with_cart_mut(|cart| cart.add_item(&p1)).unwrap();
    session.with_cart_mut(|cart| cart.add_item(&p2)).unwrap();

    CheckoutService::new(db.clone())
        .place_order("user-1", &session, Some(address()))
        .await
        .unwrap()
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn checkout_places_order_and_clears_cart() {
    let db = test_db().await;
    let p = product("P001", 20000);
    seed_product(&db, &p, 10).await;

    let session = CartSession::new();
    session.with_cart_mut(|cart| cart.add_item(&p)).unwrap();
    session
        .with_cart_mut(|cart| cart.apply_promo_code("PROMO10"))
        .unwrap();

    let checkout = CheckoutService::new(db.clone());
    let order = checkout
        .place_order("user-1", &session, Some(address()))
        .await
        .unwrap();

    // 200.00 + 10.00 delivery + 4.00 service − 20.00 promo
    assert_eq!(order.subtotal_cents, 20000);
    assert_eq!(order.delivery_fee_cents, 1000);
    assert_eq!(order.service_fee_cents, 400);
    assert_eq!(order.total_cents, 19400);
    assert!(order.totals_consistent());
    assert_eq!(order.status, OrderStatus::Recibido);
    assert_eq!(order.fulfillment_status, FulfillmentStatus::NoPreparado);
    assert_eq!(order.channel, Channel::Online);
    assert_eq!(order.delivery_notes.as_deref(), Some("Portón azul"));

    // Cart cleared only after the durable commit.
    assert!(session.with_cart(|cart| cart.is_empty()));

    // One sale-online movement per line; stock and ledger agree.
    let movements = db.ledger().movements_for_product("P001").await.unwrap();
    assert!(movements
        .iter()
        .any(|m| m.movement_type == MovementType::SaleOnline && m.quantity == -1));
    let (cached, derived) = db.ledger().reconcile("P001").await.unwrap();
    assert_eq!(cached, 9);
    assert_eq!(cached, derived);
}

#[tokio::test]
async fn checkout_rejects_empty_cart() {
    let db = test_db().await;
    let session = CartSession::new();

    let err = CheckoutService::new(db.clone())
        .place_order("user-1", &session, Some(address()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::EmptyCart)));

    let (_, total) = db.orders().list_page(1, 10).await.unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn checkout_rejects_missing_address_and_keeps_cart() {
    let db = test_db().await;
    let p = product("P001", 1000);
    seed_product(&db, &p, 10).await;

    let session = CartSession::new();
    session.with_cart_mut(|cart| cart.add_item(&p)).unwrap();

    let err = CheckoutService::new(db.clone())
        .place_order("user-1", &session, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::MissingDeliveryAddress)
    ));

    // Nothing applied: cart intact, no order, no stock movement.
    assert_eq!(session.with_cart(|cart| cart.item_count()), 1);
    assert_eq!(db.ledger().current_stock("P001").await.unwrap(), 10);
}

// =============================================================================
// Fulfillment Pipeline
// =============================================================================

#[tokio::test]
async fn full_pipeline_without_missing_items() {
    let db = test_db().await;
    let order = placed_order(&db).await;
    let fulfillment = FulfillmentService::new(db.clone());

    let order = fulfillment
        .assign_to_dispatcher(&order.id, "disp-1")
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Recibido);
    assert_eq!(order.fulfillment_status, FulfillmentStatus::EnPreparacion);
    assert_eq!(order.despachador_id.as_deref(), Some("disp-1"));
    assert!(order.assigned_at.is_some());

    let order = fulfillment.complete_picking(&order.id, &[]).await.unwrap();
    assert_eq!(order.status, OrderStatus::ListoParaRecoger);
    assert_eq!(order.fulfillment_status, FulfillmentStatus::ListoParaDespacho);

    let order = fulfillment
        .assign_to_rider(&order.id, "rider-1")
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::EnCamino);
    assert_eq!(order.fulfillment_status, FulfillmentStatus::EnRuta);
    assert_eq!(order.repartidor_id.as_deref(), Some("rider-1"));
    assert!(order.picked_up_at.is_some());

    let order = fulfillment.mark_delivered(&order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Entregado);
    assert_eq!(order.fulfillment_status, FulfillmentStatus::Entregado);
    assert!(order.delivered_at.is_some());
}

#[tokio::test]
async fn missing_items_mark_faltantes_and_adjust_stock() {
    let db = test_db().await;
    let order = placed_order(&db).await;
    let fulfillment = FulfillmentService::new(db.clone());

    fulfillment
        .assign_to_dispatcher(&order.id, "disp-1")
        .await
        .unwrap();

    // P001 (quantity 2 in the order) could not be found on the shelves.
    let stock_before = db.ledger().current_stock("P001").await.unwrap();
    let order = fulfillment
        .complete_picking(&order.id, &["P001".to_string()])
        .await
        .unwrap();

    assert_eq!(order.fulfillment_status, FulfillmentStatus::ListoConFaltantes);
    // Still presented as ready to the customer.
    assert_eq!(order.status, OrderStatus::ListoParaRecoger);

    // Shortfall recorded as a negative adjustment referencing the order.
    let movements = db.ledger().movements_for_product("P001").await.unwrap();
    let shortfall = movements
        .iter()
        .find(|m| m.movement_type == MovementType::Adjustment)
        .unwrap();
    assert_eq!(shortfall.quantity, -2);
    assert!(shortfall.reason.as_deref().unwrap().contains("Faltante"));
    assert_eq!(
        db.ledger().current_stock("P001").await.unwrap(),
        stock_before - 2
    );

    // A partially-fulfillable order still goes out for delivery.
    fulfillment
        .assign_to_rider(&order.id, "rider-1")
        .await
        .unwrap();
}

#[tokio::test]
async fn rider_assignment_rejected_until_picked() {
    let db = test_db().await;
    let order = placed_order(&db).await;
    let fulfillment = FulfillmentService::new(db.clone());

    let err = fulfillment
        .assign_to_rider(&order.id, "rider-1")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::InvalidTransition { .. })
    ));

    // The rejected transition left the order completely unchanged.
    let unchanged = fulfillment.get_order(&order.id).await.unwrap();
    assert_eq!(unchanged.status, OrderStatus::Recibido);
    assert_eq!(unchanged.fulfillment_status, FulfillmentStatus::NoPreparado);
    assert!(unchanged.repartidor_id.is_none());
    assert!(unchanged.picked_up_at.is_none());
}

#[tokio::test]
async fn transition_on_unknown_order_is_not_found() {
    let db = test_db().await;
    let fulfillment = FulfillmentService::new(db);

    let err = fulfillment
        .assign_to_dispatcher("order-404", "disp-1")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OrderNotFound(_)));
}

#[tokio::test]
async fn cancel_is_rejected_on_terminal_orders() {
    let db = test_db().await;
    let order = placed_order(&db).await;
    let fulfillment = FulfillmentService::new(db.clone());

    fulfillment.cancel_order(&order.id).await.unwrap();

    let err = fulfillment.cancel_order(&order.id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::InvalidTransition { .. })
    ));
}

// =============================================================================
// Returns
// =============================================================================

/// Walks an order with a bundle-priced line through to delivery, so returns
/// have something to refund.
async fn delivered_bundle_order(db: &Database) -> mercado_core::Order {
    let mut p = product("P007", 2000);
    p.bundle_offers = vec![BundleOffer {
        quantity: 3,
        price_cents: 4500,
    }];
    seed_product(db, &p, 30).await;

    let session = CartSession::new();
    session.with_cart_mut(|cart| cart.add_item(&p)).unwrap();
    session.with_cart_mut(|cart| cart.set_quantity("P007", 3)).unwrap();

    let order = CheckoutService::new(db.clone())
        .place_order("user-1", &session, Some(address()))
        .await
        .unwrap();
    // Three units charged as one bundle block.
    assert_eq!(order.subtotal_cents, 4500);

    let fulfillment = FulfillmentService::new(db.clone());
    fulfillment
        .assign_to_dispatcher(&order.id, "disp-1")
        .await
        .unwrap();
    fulfillment.complete_picking(&order.id, &[]).await.unwrap();
    fulfillment
        .assign_to_rider(&order.id, "rider-1")
        .await
        .unwrap();
    fulfillment.mark_delivered(&order.id).await.unwrap()
}

#[tokio::test]
async fn return_refund_is_pro_rated_from_bundle_price() {
    let db = test_db().await;
    let order = delivered_bundle_order(&db).await;
    let fulfillment = FulfillmentService::new(db.clone());

    let stock_before = db.ledger().current_stock("P007").await.unwrap();

    let record = fulfillment
        .process_return(
            &order.id,
            &[("P007".to_string(), 1)],
            "Producto dañado",
            true,
        )
        .await
        .unwrap();

    // One third of the 45.00 actually charged — not the 20.00 unit price.
    assert_eq!(record.refund_cents, 1500);
    assert!(record.restocked);
    assert_eq!(record.items.len(), 1);
    assert_eq!(record.items[0].quantity, 1);

    // Restocked: positive return movement.
    assert_eq!(
        db.ledger().current_stock("P007").await.unwrap(),
        stock_before + 1
    );

    let returned = fulfillment.get_order(&order.id).await.unwrap();
    assert_eq!(returned.status, OrderStatus::Devuelto);

    // Persisted in the financial ledger.
    let records = db.financial().returns_for_order(&order.id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].refund_cents, 1500);
}

#[tokio::test]
async fn damaged_return_writes_negative_adjustment() {
    let db = test_db().await;
    let order = delivered_bundle_order(&db).await;
    let fulfillment = FulfillmentService::new(db.clone());

    let stock_before = db.ledger().current_stock("P007").await.unwrap();

    fulfillment
        .process_return(
            &order.id,
            &[("P007".to_string(), 2)],
            "Producto dañado",
            false,
        )
        .await
        .unwrap();

    // Not restocked: the units leave inventory as a negative adjustment.
    assert_eq!(
        db.ledger().current_stock("P007").await.unwrap(),
        stock_before - 2
    );
    let movements = db.ledger().movements_for_product("P007").await.unwrap();
    assert!(movements
        .iter()
        .any(|m| m.movement_type == MovementType::Adjustment
            && m.quantity == -2
            && m.reason.as_deref().unwrap().contains("Devolución")));
}

#[tokio::test]
async fn return_cannot_exceed_purchased_quantity() {
    let db = test_db().await;
    let order = delivered_bundle_order(&db).await;
    let fulfillment = FulfillmentService::new(db.clone());

    let err = fulfillment
        .process_return(&order.id, &[("P007".to_string(), 4)], "Otro", true)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::ReturnExceedsPurchase { .. })
    ));

    // No-op: order status and stock untouched.
    let unchanged = fulfillment.get_order(&order.id).await.unwrap();
    assert_eq!(unchanged.status, OrderStatus::Entregado);
    assert!(db
        .financial()
        .returns_for_order(&order.id)
        .await
        .unwrap()
        .is_empty());
}

// =============================================================================
// Inventory & Reports
// =============================================================================

#[tokio::test]
async fn inventory_operations_keep_ledger_consistent() {
    let db = test_db().await;
    let p = product("P001", 1000);
    seed_product(&db, &p, 10).await;

    let inventory = InventoryService::new(db.clone());

    inventory
        .receive_stock("P001", 20, Some("Factura #123"))
        .await
        .unwrap();
    inventory
        .make_adjustment("P001", -4, "Expirado")
        .await
        .unwrap();

    let (cached, derived) = inventory.reconcile("P001").await.unwrap();
    assert_eq!(cached, 26);
    assert_eq!(cached, derived);

    let history = inventory.movements_for_product("P001").await.unwrap();
    assert_eq!(history.len(), 3);

    // Zero-quantity adjustments and blank reasons are rejected.
    assert!(inventory.make_adjustment("P001", 0, "Recuento").await.is_err());
    assert!(inventory.make_adjustment("P001", -1, "   ").await.is_err());

    // Unknown product is a distinct not-found failure.
    let err = inventory
        .receive_stock("P404", 5, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ProductNotFound(_)));
}

#[tokio::test]
async fn reports_aggregate_orders_expenses_and_spoilage() {
    let db = test_db().await;
    let order = placed_order(&db).await;
    // subtotal 4500 (2×1000 + 2500), cost snapshots 70% → 3150

    db.financial()
        .add_expense(500, ExpenseCategory::Servicios, "Luz")
        .await
        .unwrap();

    let inventory = InventoryService::new(db.clone());
    inventory
        .make_adjustment("P001", -3, "Expirado")
        .await
        .unwrap();

    let reports = ReportingService::new(db.clone());

    let summary = reports.financial_summary().await.unwrap();
    assert_eq!(summary.total_revenue_cents, order.total_cents);
    assert_eq!(summary.total_cost_of_goods_cents, 3150);
    assert_eq!(
        summary.gross_profit_cents,
        summary.total_revenue_cents - 3150
    );
    assert_eq!(summary.total_expenses_cents, 500);
    assert_eq!(
        summary.net_profit_cents,
        summary.gross_profit_cents - 500
    );

    let spoilage = reports.spoilage_report().await.unwrap();
    assert_eq!(spoilage.details.len(), 1);
    // 3 units at cost 700 each.
    assert_eq!(spoilage.total_cost_cents, 2100);
    assert_eq!(spoilage.details[0].product_name, "Product P001");
}
