// tests/common/mod.rs
#![allow(dead_code)] // Not every test file uses every helper

use async_trait::async_trait;
use bazaar::{
  BazaarError, BazaarResult, CheckoutRequest, CheckoutSession, CreateOrderRequest, LoginRequest, MarketplaceApi,
  NewProduct, Order, OrderFilter, OrderLine, OrderStatus, PaymentStatus, Product, ProductPatch, Role, SignupRequest,
  StockUpdate, User,
};
use chrono::Utc;
use parking_lot::Mutex;
use tracing::Level;
use uuid::Uuid;

// --- In-memory stand-in for the HTTP server ---
#[derive(Default)]
pub struct FakeServer {
  pub users: Vec<(User, String)>,
  pub products: Vec<Product>,
  pub orders: Vec<Order>,
  pub order_requests: Vec<CreateOrderRequest>,
  pub checkout_requests: Vec<CheckoutRequest>,
  /// Orders for this seller are refused, to exercise partial failures.
  pub reject_seller: Option<Uuid>,
}

#[derive(Default)]
pub struct FakeApi {
  pub server: Mutex<FakeServer>,
}

fn api_error(status: u16, message: impl Into<String>) -> BazaarError {
  BazaarError::Api {
    status,
    message: message.into(),
  }
}

impl FakeApi {
  pub fn add_user(&self, email: &str, password: &str, role: Role) -> User {
    let user = User {
      id: Uuid::new_v4(),
      email: email.to_string(),
      name: email.split('@').next().unwrap_or("user").to_string(),
      role,
      created_at: Utc::now(),
    };
    self.server.lock().users.push((user.clone(), password.to_string()));
    user
  }

  pub fn add_product(&self, seller_id: Uuid, name: &str, price: i64, stock: i32) -> Product {
    let product = product(seller_id, name, price, stock);
    self.server.lock().products.push(product.clone());
    product
  }

  pub fn stock_of(&self, product_id: Uuid) -> i32 {
    self
      .server
      .lock()
      .products
      .iter()
      .find(|p| p.id == product_id)
      .map(|p| p.stock_amount)
      .unwrap_or_default()
  }

  /// Changes server-side stock without the client knowing, making its cache stale.
  pub fn set_stock_behind_the_clients_back(&self, product_id: Uuid, stock: i32) {
    if let Some(p) = self.server.lock().products.iter_mut().find(|p| p.id == product_id) {
      p.stock_amount = stock;
    }
  }
}

#[async_trait]
impl MarketplaceApi for FakeApi {
  async fn signup(&self, req: &SignupRequest) -> BazaarResult<User> {
    if self.server.lock().users.iter().any(|(u, _)| u.email == req.email) {
      return Err(api_error(400, "Email already registered"));
    }
    let user = self.add_user(&req.email, &req.password, req.role);
    Ok(user)
  }

  async fn login(&self, req: &LoginRequest) -> BazaarResult<User> {
    let server = self.server.lock();
    let (user, password) = server
      .users
      .iter()
      .find(|(u, _)| u.email == req.email)
      .ok_or_else(|| api_error(404, "User not found"))?;
    if *password != req.password {
      return Err(api_error(401, "Invalid password"));
    }
    Ok(user.clone())
  }

  async fn list_products(&self, seller_id: Option<Uuid>) -> BazaarResult<Vec<Product>> {
    let server = self.server.lock();
    Ok(
      server
        .products
        .iter()
        .filter(|p| seller_id.map_or(true, |s| p.seller_id == s))
        .cloned()
        .collect(),
    )
  }

  async fn create_product(&self, actor: Uuid, new: &NewProduct) -> BazaarResult<Product> {
    Ok(self.add_product(actor, &new.name, new.price, new.stock_amount))
  }

  async fn update_product(&self, actor: Uuid, product_id: Uuid, patch: &ProductPatch) -> BazaarResult<Product> {
    let mut server = self.server.lock();
    let product = server
      .products
      .iter_mut()
      .find(|p| p.id == product_id)
      .ok_or_else(|| api_error(404, "Product not found"))?;
    if product.seller_id != actor {
      return Err(api_error(401, "Not your product"));
    }
    if let Some(name) = &patch.name {
      product.name = name.clone();
    }
    if let Some(price) = patch.price {
      product.price = price;
    }
    Ok(product.clone())
  }

  async fn update_stock(&self, actor: Uuid, update: &StockUpdate) -> BazaarResult<Product> {
    let mut server = self.server.lock();
    let product = server
      .products
      .iter_mut()
      .find(|p| p.id == update.product_id)
      .ok_or_else(|| api_error(404, "Product not found"))?;
    if product.seller_id != actor {
      return Err(api_error(401, "Not your product"));
    }
    product.stock_amount = update.stock_amount;
    Ok(product.clone())
  }

  async fn delete_product(&self, actor: Uuid, product_id: Uuid) -> BazaarResult<()> {
    let mut server = self.server.lock();
    let before = server.products.len();
    server.products.retain(|p| !(p.id == product_id && p.seller_id == actor));
    if server.products.len() == before {
      return Err(api_error(404, "Product not found"));
    }
    Ok(())
  }

  async fn list_orders(&self, filter: &OrderFilter) -> BazaarResult<Vec<Order>> {
    let server = self.server.lock();
    Ok(
      server
        .orders
        .iter()
        .filter(|o| filter.buyer_id.map_or(true, |b| o.buyer_id == b))
        .filter(|o| filter.seller_id.map_or(true, |s| o.seller_id == s))
        .cloned()
        .collect(),
    )
  }

  async fn create_order(&self, req: &CreateOrderRequest) -> BazaarResult<Order> {
    let mut server = self.server.lock();
    server.order_requests.push(req.clone());
    if server.reject_seller == Some(req.seller_id) {
      return Err(api_error(500, "Seller unavailable"));
    }
    for item in &req.items {
      let product = server
        .products
        .iter()
        .find(|p| p.id == item.product_id)
        .ok_or_else(|| api_error(404, format!("Product {} not found", item.product_id)))?;
      if product.stock_amount < item.quantity {
        return Err(api_error(400, format!("Insufficient stock for product {}", item.product_id)));
      }
    }
    let mut lines = Vec::new();
    for item in &req.items {
      let product = server
        .products
        .iter_mut()
        .find(|p| p.id == item.product_id)
        .expect("checked above");
      product.stock_amount -= item.quantity;
      lines.push(OrderLine {
        product_id: product.id,
        product_name: product.name.clone(),
        unit_price: product.price,
        quantity: item.quantity,
      });
    }
    let now = Utc::now();
    let order = Order {
      id: Uuid::new_v4(),
      buyer_id: req.buyer_id,
      seller_id: req.seller_id,
      status: OrderStatus::Pending,
      payment_status: PaymentStatus::Unpaid,
      payment_reference: None,
      total: bazaar::order_total(&lines).expect("no overflow in tests"),
      created_at: now,
      updated_at: now,
      items: lines,
      buyer: None,
      seller: None,
    };
    server.orders.push(order.clone());
    Ok(order)
  }

  async fn update_order_status(&self, actor: Uuid, order_id: Uuid, status: OrderStatus) -> BazaarResult<Order> {
    let mut server = self.server.lock();
    let order = server
      .orders
      .iter_mut()
      .find(|o| o.id == order_id)
      .ok_or_else(|| api_error(404, "Order not found"))?;
    if order.seller_id != actor {
      return Err(api_error(401, "Not your order"));
    }
    order.status = status;
    Ok(order.clone())
  }

  async fn create_checkout(&self, req: &CheckoutRequest) -> BazaarResult<CheckoutSession> {
    self.server.lock().checkout_requests.push(req.clone());
    Ok(CheckoutSession {
      session_id: format!("cs_test_{}", Uuid::new_v4().simple()),
      url: None,
    })
  }
}

// --- Builders ---
pub fn product(seller_id: Uuid, name: &str, price: i64, stock: i32) -> Product {
  let now = Utc::now();
  Product {
    id: Uuid::new_v4(),
    seller_id,
    name: name.to_string(),
    description: String::new(),
    price,
    image_url: None,
    stock_amount: stock,
    created_at: now,
    updated_at: now,
  }
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
