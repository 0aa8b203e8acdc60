// tests/http_tests.rs
mod common;
use actix_web::{http::StatusCode, test, web, App};
use bazaar::{CheckoutSession, Order, OrderStatus, PaymentStatus, PaymentUpdateResponse, Product, Role, User};
use bazaar_server::payments::signature;
use bazaar_server::web::configure_app_routes;
use common::*;
use serde_json::{json, Value};
use uuid::Uuid;

macro_rules! fetch_order {
  ($app:expr, $order_id:expr) => {{
    let resp = test::call_service(
      $app,
      test::TestRequest::get()
        .uri(&format!("/api/orders/{}", $order_id))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let order: Order = test::read_body_json(resp).await;
    order
  }};
}

macro_rules! app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state))
        .configure(configure_app_routes),
    )
    .await
  };
}

#[actix_web::test]
async fn health_check_responds() {
  let db = TestDb::new().await;
  let (state, _) = app_state(&db);
  let app = app!(state);
  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn signup_then_login() {
  let db = TestDb::new().await;
  let (state, _) = app_state(&db);
  let app = app!(state);

  let signup = json!({ "email": "Ana@Example.com", "name": "Ana", "password": "s3cret!", "role": "seller" });
  let resp = test::call_service(
    &app,
    test::TestRequest::post().uri("/api/auth/signup").set_json(&signup).to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let user: User = test::read_body_json(resp).await;
  assert_eq!(user.email, "ana@example.com");
  assert_eq!(user.role, Role::Seller);

  let resp = test::call_service(
    &app,
    test::TestRequest::post().uri("/api/auth/signup").set_json(&signup).to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/auth/login")
      .set_json(json!({ "email": "ana@example.com", "password": "s3cret!" }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let raw: Value = test::read_body_json(resp).await;
  assert!(raw.get("passwordHash").is_none() && raw.get("password_hash").is_none());
  assert_eq!(raw["id"], user.id.to_string());

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/auth/login")
      .set_json(json!({ "email": "ana@example.com", "password": "wrong!!" }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/auth/login")
      .set_json(json!({ "email": "nobody@example.com", "password": "whatever" }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["error"].is_string());
}

#[actix_web::test]
async fn malformed_json_gets_a_json_error() {
  let db = TestDb::new().await;
  let (state, _) = app_state(&db);
  let app = app!(state);
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/orders")
      .insert_header(("content-type", "application/json"))
      .set_payload("{ not json")
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["error"].is_string());
}

#[actix_web::test]
async fn product_management_is_owner_gated() {
  let db = TestDb::new().await;
  let seller = db.user("seller@test", Role::Seller).await;
  let rival = db.user("rival@test", Role::Seller).await;
  let buyer = db.user("buyer@test", Role::Buyer).await;
  let (state, _) = app_state(&db);
  let app = app!(state);

  let new_product = json!({ "name": "Lamp", "price": 2500, "stockAmount": 4 });
  let resp = test::call_service(
    &app,
    test::TestRequest::post().uri("/api/products").set_json(&new_product).to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/products")
      .insert_header(("X-User-ID", buyer.id.to_string()))
      .set_json(&new_product)
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/products")
      .insert_header(("X-User-ID", seller.id.to_string()))
      .set_json(&new_product)
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let product: Product = test::read_body_json(resp).await;
  assert_eq!(product.seller_id, seller.id);
  assert_eq!(product.stock_amount, 4);

  let resp = test::call_service(
    &app,
    test::TestRequest::patch()
      .uri("/api/products/stock")
      .insert_header(("X-User-ID", rival.id.to_string()))
      .set_json(json!({ "productId": product.id, "stockAmount": 100 }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let resp = test::call_service(
    &app,
    test::TestRequest::patch()
      .uri("/api/products/stock")
      .insert_header(("X-User-ID", seller.id.to_string()))
      .set_json(json!({ "productId": product.id, "stockAmount": -1 }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = test::call_service(
    &app,
    test::TestRequest::patch()
      .uri("/api/products/stock")
      .insert_header(("X-User-ID", seller.id.to_string()))
      .set_json(json!({ "productId": product.id, "stockAmount": 9 }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let restocked: Product = test::read_body_json(resp).await;
  assert_eq!(restocked.stock_amount, 9);

  let resp = test::call_service(
    &app,
    test::TestRequest::patch()
      .uri(&format!("/api/products/{}", product.id))
      .insert_header(("X-User-ID", seller.id.to_string()))
      .set_json(json!({ "name": "Desk Lamp" }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let renamed: Product = test::read_body_json(resp).await;
  assert_eq!(renamed.name, "Desk Lamp");
  assert_eq!(renamed.price, 2500);

  let resp = test::call_service(
    &app,
    test::TestRequest::get()
      .uri(&format!("/api/products?sellerId={}", rival.id))
      .to_request(),
  )
  .await;
  let rivals: Vec<Product> = test::read_body_json(resp).await;
  assert!(rivals.is_empty());

  let resp = test::call_service(
    &app,
    test::TestRequest::delete()
      .uri(&format!("/api/products/{}", product.id))
      .insert_header(("X-User-ID", rival.id.to_string()))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let resp = test::call_service(
    &app,
    test::TestRequest::delete()
      .uri(&format!("/api/products/{}", product.id))
      .insert_header(("X-User-ID", seller.id.to_string()))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  let resp = test::call_service(
    &app,
    test::TestRequest::get()
      .uri(&format!("/api/products/{}", product.id))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn orders_over_http() {
  let db = TestDb::new().await;
  let seller = db.user("seller@test", Role::Seller).await;
  let buyer = db.user("buyer@test", Role::Buyer).await;
  let lamp = db.product(&seller, "Lamp", 2500, 3).await;
  let (state, _) = app_state(&db);
  let app = app!(state);

  let create = |quantity: i32| {
    test::TestRequest::post()
      .uri("/api/orders")
      .set_json(json!({
        "buyerId": buyer.id,
        "sellerId": seller.id,
        "items": [{ "productId": lamp.id, "quantity": quantity }],
      }))
      .to_request()
  };

  let resp = test::call_service(&app, create(2)).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let order: Order = test::read_body_json(resp).await;
  assert_eq!(order.total, 5000);

  let resp = test::call_service(&app, create(2)).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["error"].as_str().unwrap().contains(&lamp.id.to_string()));
  assert_eq!(db.stock_of(&lamp).await, 1);

  let resp = test::call_service(
    &app,
    test::TestRequest::get()
      .uri(&format!("/api/orders?buyerId={}", buyer.id))
      .to_request(),
  )
  .await;
  let orders: Vec<Order> = test::read_body_json(resp).await;
  assert_eq!(orders.len(), 1);
  assert_eq!(orders[0].items[0].quantity, 2);

  let resp = test::call_service(
    &app,
    test::TestRequest::get().uri(&format!("/api/orders/{}", order.id)).to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  let resp = test::call_service(
    &app,
    test::TestRequest::get()
      .uri(&format!("/api/orders/{}", Uuid::new_v4()))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let patch_status = |status: &str, actor: Uuid| {
    test::TestRequest::patch()
      .uri(&format!("/api/orders/{}", order.id))
      .insert_header(("X-User-ID", actor.to_string()))
      .set_json(json!({ "status": status }))
      .to_request()
  };
  let resp = test::call_service(&app, patch_status("shipped", seller.id)).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let resp = test::call_service(&app, patch_status("paid", seller.id)).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let resp = test::call_service(&app, patch_status("delivered", buyer.id)).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  let resp = test::call_service(&app, patch_status("delivered", seller.id)).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let updated: Order = test::read_body_json(resp).await;
  assert_eq!(updated.status, OrderStatus::Delivered);
  // Backwards is allowed too.
  let resp = test::call_service(&app, patch_status("pending", seller.id)).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn bulk_payment_update() {
  let db = TestDb::new().await;
  let seller = db.user("seller@test", Role::Seller).await;
  let buyer = db.user("buyer@test", Role::Buyer).await;
  let lamp = db.product(&seller, "Lamp", 2500, 3).await;
  let (state, _) = app_state(&db);
  let app = app!(state);

  for _ in 0..2 {
    let resp = test::call_service(
      &app,
      test::TestRequest::post()
        .uri("/api/orders")
        .set_json(json!({ "buyerId": buyer.id, "sellerId": seller.id, "items": [{ "productId": lamp.id, "quantity": 1 }] }))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
  }

  let pay = |status: &str| {
    test::TestRequest::post()
      .uri("/api/orders/payment")
      .set_json(json!({ "userId": buyer.id, "status": status }))
      .to_request()
  };
  let resp = test::call_service(&app, pay("refunded")).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = test::call_service(&app, pay("paid")).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: PaymentUpdateResponse = test::read_body_json(resp).await;
  assert!(body.success);
  assert_eq!(body.updated_count, 2);

  let resp = test::call_service(&app, pay("paid")).await;
  let body: PaymentUpdateResponse = test::read_body_json(resp).await;
  assert_eq!(body.updated_count, 0);
}

#[actix_web::test]
async fn checkout_and_signed_webhook_mark_orders_paid() {
  let db = TestDb::new().await;
  let seller = db.user("seller@test", Role::Seller).await;
  let buyer = db.user("buyer@test", Role::Buyer).await;
  let intruder = db.user("intruder@test", Role::Buyer).await;
  let lamp = db.product(&seller, "Lamp", 2500, 5).await;
  let (state, gateway) = app_state(&db);
  let app = app!(state);

  let mut order_ids = Vec::new();
  for _ in 0..2 {
    let resp = test::call_service(
      &app,
      test::TestRequest::post()
        .uri("/api/orders")
        .set_json(json!({ "buyerId": buyer.id, "sellerId": seller.id, "items": [{ "productId": lamp.id, "quantity": 1 }] }))
        .to_request(),
    )
    .await;
    let order: Order = test::read_body_json(resp).await;
    order_ids.push(order.id);
  }

  // Someone else's orders cannot be checked out.
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/checkout")
      .set_json(json!({ "buyerId": intruder.id, "orderIds": order_ids }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/checkout")
      .set_json(json!({ "buyerId": buyer.id, "orderIds": [order_ids[0]] }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let session: CheckoutSession = test::read_body_json(resp).await;
  let recorded = gateway.sessions();
  assert_eq!(recorded.len(), 1);
  assert_eq!(recorded[0].request.order_ids, vec![order_ids[0]]);
  assert_eq!(recorded[0].request.amount(), 2500);
  assert_eq!(recorded[0].request.cancel_url, "http://shop.test/payment/cancel");

  let (payload, header) = gateway.completed_event(&session.session_id, "pi_42").unwrap();

  // Tampered signature: rejected, nothing changes.
  let forged = signature::sign_payload(&payload, "whsec_wrong", chrono::Utc::now().timestamp()).unwrap();
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/webhook/payment")
      .insert_header(("Stripe-Signature", forged))
      .set_payload(payload.clone())
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/webhook/payment")
      .set_payload(payload.clone())
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let unpaid = fetch_order!(&app, order_ids[0]);
  assert_eq!(unpaid.payment_status, PaymentStatus::Unpaid);

  let deliver = || {
    test::TestRequest::post()
      .uri("/api/webhook/payment")
      .insert_header(("Stripe-Signature", header.clone()))
      .set_payload(payload.clone())
      .to_request()
  };
  let resp = test::call_service(&app, deliver()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["updatedCount"], 1);

  let paid = fetch_order!(&app, order_ids[0]);
  assert_eq!(paid.payment_status, PaymentStatus::Paid);
  assert_eq!(paid.payment_reference.as_deref(), Some("pi_42"));
  assert_eq!(paid.status, OrderStatus::Pending);
  let other = fetch_order!(&app, order_ids[1]);
  assert_eq!(other.payment_status, PaymentStatus::Unpaid);

  // Redelivery is harmless.
  let resp = test::call_service(&app, deliver()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["updatedCount"], 0);

  // A paid order is no longer payable.
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/checkout")
      .set_json(json!({ "buyerId": buyer.id, "orderIds": [order_ids[0]] }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unrelated_webhook_events_are_acknowledged() {
  let db = TestDb::new().await;
  let (state, _) = app_state(&db);
  let app = app!(state);
  let payload = br#"{"type":"payment_intent.created","data":{"object":{}}}"#.to_vec();
  let header = signature::sign_payload(&payload, WEBHOOK_SECRET, chrono::Utc::now().timestamp()).unwrap();
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/webhook/payment")
      .insert_header(("Stripe-Signature", header))
      .set_payload(payload)
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn webhook_records_payment_after_the_seller_accepted() {
  let db = TestDb::new().await;
  let seller = db.user("seller@test", Role::Seller).await;
  let buyer = db.user("buyer@test", Role::Buyer).await;
  let lamp = db.product(&seller, "Lamp", 2500, 5).await;
  let (state, gateway) = app_state(&db);
  let app = app!(state);

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/orders")
      .set_json(json!({ "buyerId": buyer.id, "sellerId": seller.id, "items": [{ "productId": lamp.id, "quantity": 1 }] }))
      .to_request(),
  )
  .await;
  let placed: Order = test::read_body_json(resp).await;

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/checkout")
      .set_json(json!({ "buyerId": buyer.id, "orderIds": [placed.id] }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let session: CheckoutSession = test::read_body_json(resp).await;

  // The seller moves the order on while the buyer is still on the payment page.
  let resp = test::call_service(
    &app,
    test::TestRequest::patch()
      .uri(&format!("/api/orders/{}", placed.id))
      .insert_header(("X-User-ID", seller.id.to_string()))
      .set_json(json!({ "status": "accepted" }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  let (payload, header) = gateway.completed_event(&session.session_id, "pi_late").unwrap();
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/webhook/payment")
      .insert_header(("Stripe-Signature", header))
      .set_payload(payload)
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["updatedCount"], 1);

  let paid = fetch_order!(&app, placed.id);
  assert_eq!(paid.payment_status, PaymentStatus::Paid);
  assert_eq!(paid.status, OrderStatus::Accepted);
  assert_eq!(paid.payment_reference.as_deref(), Some("pi_late"));
}

#[actix_web::test]
async fn webhook_store_failure_is_a_server_error() {
  let db = TestDb::new().await;
  let seller = db.user("seller@test", Role::Seller).await;
  let buyer = db.user("buyer@test", Role::Buyer).await;
  let lamp = db.product(&seller, "Lamp", 2500, 5).await;
  let (state, gateway) = app_state(&db);
  let app = app!(state);

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/orders")
      .set_json(json!({ "buyerId": buyer.id, "sellerId": seller.id, "items": [{ "productId": lamp.id, "quantity": 1 }] }))
      .to_request(),
  )
  .await;
  let placed: Order = test::read_body_json(resp).await;
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/checkout")
      .set_json(json!({ "buyerId": buyer.id, "orderIds": [placed.id] }))
      .to_request(),
  )
  .await;
  let session: CheckoutSession = test::read_body_json(resp).await;
  let (payload, header) = gateway.completed_event(&session.session_id, "pi_lost").unwrap();

  db.pool.close().await;

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/webhook/payment")
      .insert_header(("Stripe-Signature", header))
      .set_payload(payload)
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["error"].is_string());
}
