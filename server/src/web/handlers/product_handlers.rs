// bazaar/server/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use bazaar::{NewProduct, ProductPatch, StockUpdate};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::catalog_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
  pub seller_id: Option<Uuid>,
}

#[instrument(name = "handler::list_products", skip(app_state, query_params), fields(seller_id = ?query_params.seller_id))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query_params: web::Query<ListProductsQuery>,
) -> Result<HttpResponse, AppError> {
  let products = catalog_service::list_products(&app_state.db_pool, query_params.seller_id)
    .await
    .map_err(|e| {
      error!("Failed to fetch products: {}", e);
      e
    })?;
  info!("Fetched {} products.", products.len());
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product = catalog_service::get_product(&app_state.db_pool, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::create_product", skip(app_state, auth_user, req_payload), fields(user_id = %auth_user.user_id))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<NewProduct>,
) -> Result<HttpResponse, AppError> {
  let product = catalog_service::create_product(&app_state.db_pool, auth_user.user_id, &req_payload).await?;
  Ok(HttpResponse::Created().json(product))
}

#[instrument(name = "handler::update_product", skip(app_state, auth_user, path, req_payload), fields(user_id = %auth_user.user_id, product_id = %path.as_ref()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<ProductPatch>,
) -> Result<HttpResponse, AppError> {
  let product =
    catalog_service::update_product(&app_state.db_pool, auth_user.user_id, path.into_inner(), &req_payload).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::update_stock", skip(app_state, auth_user, req_payload), fields(user_id = %auth_user.user_id, product_id = %req_payload.product_id))]
pub async fn update_stock_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<StockUpdate>,
) -> Result<HttpResponse, AppError> {
  let product = catalog_service::update_stock(&app_state.db_pool, auth_user.user_id, &req_payload).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::delete_product", skip(app_state, auth_user, path), fields(user_id = %auth_user.user_id, product_id = %path.as_ref()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  catalog_service::delete_product(&app_state.db_pool, auth_user.user_id, product_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "deleted": product_id })))
}
