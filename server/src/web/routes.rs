// bazaar/server/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{auth_handlers, checkout_handlers, order_handlers, product_handlers, webhook_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(super::json_config())
    .app_data(super::query_config())
    .app_data(super::path_config())
    .service(
      web::scope("/api")
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/auth")
            .route("/signup", web::post().to(auth_handlers::signup_handler))
            .route("/login", web::post().to(auth_handlers::login_handler)),
        )
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list_products_handler))
            .route("", web::post().to(product_handlers::create_product_handler))
            // Must precede /{product_id}.
            .route("/stock", web::patch().to(product_handlers::update_stock_handler))
            .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
            .route("/{product_id}", web::patch().to(product_handlers::update_product_handler))
            .route("/{product_id}", web::delete().to(product_handlers::delete_product_handler)),
        )
        .service(
          web::scope("/orders")
            .route("", web::get().to(order_handlers::list_orders_handler))
            .route("", web::post().to(order_handlers::create_order_handler))
            .route("/payment", web::post().to(order_handlers::update_payment_handler))
            .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
            .route("/{order_id}", web::patch().to(order_handlers::update_order_status_handler)),
        )
        .route("/checkout", web::post().to(checkout_handlers::start_checkout_handler))
        .route("/webhook/payment", web::post().to(webhook_handlers::payment_webhook_handler)),
    );
}
