// bazaar/core/src/storefront.rs

//! Client application state.
//!
//! A [`Storefront`] is an explicit state object handed to whatever UI code needs it.
//! The server is the source of truth: every mutating action goes through the
//! [`MarketplaceApi`] first and the local cache is updated from the response.
//! There is no cross-instance synchronisation; callers invoke [`Storefront::refresh`]
//! when a view regains focus.

use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::api::{
  CheckoutRequest, CheckoutSession, CreateOrderRequest, LoginRequest, MarketplaceApi, NewProduct, OrderFilter,
  ProductPatch, SignupRequest, StockUpdate,
};
use crate::cart::Cart;
use crate::error::{BazaarError, BazaarResult};
use crate::model::{Order, OrderStatus, Product, Role, User};

#[derive(Debug, Clone, Default)]
pub struct StoreState {
  pub current_user: Option<User>,
  pub products: Vec<Product>,
  pub orders: Vec<Order>,
  pub cart: Cart,
}

impl StoreState {
  pub fn product(&self, product_id: Uuid) -> Option<&Product> {
    self.products.iter().find(|p| p.id == product_id)
  }

  pub fn order(&self, order_id: Uuid) -> Option<&Order> {
    self.orders.iter().find(|o| o.id == order_id)
  }

  fn upsert_product(&mut self, product: Product) {
    match self.products.iter_mut().find(|p| p.id == product.id) {
      Some(existing) => *existing = product,
      None => self.products.push(product),
    }
  }

  fn upsert_order(&mut self, order: Order) {
    match self.orders.iter_mut().find(|o| o.id == order.id) {
      Some(existing) => *existing = order,
      None => self.orders.insert(0, order),
    }
  }
}

/// The part of the client state that outlives a restart: who is signed in and what is in the cart.
/// Products and orders are always reloaded from the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSession {
  pub current_user: Option<User>,
  pub cart: Cart,
}

/// Shared handle over the client state. Cloning is cheap and every clone sees the same state.
///
/// Lock guards returned by [`Storefront::read`] are blocking and must not be held across `.await`.
pub struct Storefront<A: MarketplaceApi> {
  api: Arc<A>,
  state: Arc<RwLock<StoreState>>,
}

impl<A: MarketplaceApi> Clone for Storefront<A> {
  fn clone(&self) -> Self {
    Storefront {
      api: Arc::clone(&self.api),
      state: Arc::clone(&self.state),
    }
  }
}

impl<A: MarketplaceApi> Storefront<A> {
  pub fn new(api: A) -> Self {
    Storefront {
      api: Arc::new(api),
      state: Arc::new(RwLock::new(StoreState::default())),
    }
  }

  pub fn api(&self) -> &A {
    &self.api
  }

  pub fn read(&self) -> RwLockReadGuard<'_, StoreState> {
    self.state.read()
  }

  pub fn snapshot(&self) -> StoreState {
    self.state.read().clone()
  }

  pub fn current_user(&self) -> Option<User> {
    self.state.read().current_user.clone()
  }

  fn require_user(&self) -> BazaarResult<User> {
    self.current_user().ok_or(BazaarError::NotSignedIn)
  }

  fn require_role(&self, role: Role) -> BazaarResult<User> {
    let user = self.require_user()?;
    if user.role != role {
      return Err(BazaarError::WrongRole {
        required: role.as_str(),
      });
    }
    Ok(user)
  }

  // --- Session ---

  #[instrument(name = "storefront::signup", skip(self, req), fields(email = %req.email))]
  pub async fn signup(&self, req: SignupRequest) -> BazaarResult<User> {
    let user = self.api.signup(&req).await?;
    info!("Account {} created with role {}.", user.id, user.role);
    Ok(user)
  }

  /// Signs in and loads the products and the user's orders.
  #[instrument(name = "storefront::login", skip(self, password))]
  pub async fn login(&self, email: &str, password: &str) -> BazaarResult<User> {
    let req = LoginRequest {
      email: email.to_string(),
      password: password.to_string(),
    };
    let user = self.api.login(&req).await?;
    {
      let mut state = self.state.write();
      let same_user = state.current_user.as_ref().map(|u| u.id) == Some(user.id);
      if !same_user && !state.cart.is_empty() {
        debug!("Dropping {} cart lines left by the previous session.", state.cart.len());
        state.cart.clear();
      }
      state.current_user = Some(user.clone());
      state.orders.clear();
    }
    info!("Signed in as {} ({}).", user.id, user.role);
    self.refresh().await?;
    Ok(user)
  }

  pub fn logout(&self) {
    let mut state = self.state.write();
    state.current_user = None;
    state.orders.clear();
    state.cart.clear();
    debug!("Signed out; cart and orders cleared.");
  }

  // --- Persistence ---

  pub fn save_session(&self) -> SavedSession {
    let state = self.state.read();
    SavedSession {
      current_user: state.current_user.clone(),
      cart: state.cart.clone(),
    }
  }

  /// Puts back a session saved by [`Storefront::save_session`], then reloads products and orders.
  ///
  /// The restored cart is not re-checked against stock; `place_orders` does that.
  pub async fn restore_session(&self, saved: SavedSession) -> BazaarResult<()> {
    {
      let mut state = self.state.write();
      state.current_user = saved.current_user;
      state.cart = saved.cart;
      state.orders.clear();
    }
    info!("Restored session with {} cart lines.", self.state.read().cart.len());
    self.refresh().await
  }

  // --- Cache refresh ---

  pub async fn refresh_products(&self) -> BazaarResult<()> {
    let products = self.api.list_products(None).await?;
    debug!("Refreshed {} products.", products.len());
    self.state.write().products = products;
    Ok(())
  }

  /// Buyers see the orders they placed, sellers the orders placed with them.
  pub async fn refresh_orders(&self) -> BazaarResult<()> {
    let user = self.require_user()?;
    let filter = match user.role {
      Role::Buyer => OrderFilter::for_buyer(user.id),
      Role::Seller => OrderFilter::for_seller(user.id),
    };
    let orders = self.api.list_orders(&filter).await?;
    debug!("Refreshed {} orders for {}.", orders.len(), user.id);
    self.state.write().orders = orders;
    Ok(())
  }

  /// Reloads everything the current view may show.
  pub async fn refresh(&self) -> BazaarResult<()> {
    self.refresh_products().await?;
    if self.current_user().is_some() {
      self.refresh_orders().await?;
    }
    Ok(())
  }

  // --- Cart ---

  /// Adds to the cart after checking the cached stock, counting what is already in the cart.
  pub fn add_to_cart(&self, product_id: Uuid, quantity: i32) -> BazaarResult<()> {
    let mut state = self.state.write();
    let available = state
      .product(product_id)
      .map(|p| p.stock_amount)
      .ok_or(BazaarError::UnknownProduct(product_id))?;
    let wanted = state.cart.quantity_of(product_id).saturating_add(quantity);
    if quantity > 0 && wanted > available {
      return Err(BazaarError::InsufficientStock {
        product_id,
        requested: wanted,
        available,
      });
    }
    state.cart.add(product_id, quantity)
  }

  pub fn remove_from_cart(&self, product_id: Uuid) -> bool {
    self.state.write().cart.remove(product_id)
  }

  pub fn update_cart_quantity(&self, product_id: Uuid, quantity: i32) -> BazaarResult<()> {
    let mut state = self.state.write();
    if quantity > 0 {
      if let Some(product) = state.product(product_id) {
        if product.stock_amount < quantity {
          return Err(BazaarError::InsufficientStock {
            product_id,
            requested: quantity,
            available: product.stock_amount,
          });
        }
      }
    }
    state.cart.update_quantity(product_id, quantity)
  }

  pub fn clear_cart(&self) {
    self.state.write().cart.clear();
  }

  pub fn cart_total(&self) -> i64 {
    let state = self.state.read();
    state.cart.total(&state.products)
  }

  // --- Orders ---

  /// Turns the cart into one order per seller.
  ///
  /// Lines of every order the server accepted are removed from the cart. On the first
  /// rejection the remaining groups are not attempted, the rejected lines stay in the
  /// cart and the error is returned. Product stock is reloaded either way.
  #[instrument(name = "storefront::place_orders", skip(self))]
  pub async fn place_orders(&self) -> BazaarResult<Vec<Order>> {
    let buyer = self.require_role(Role::Buyer)?;
    let groups = {
      let state = self.state.read();
      if state.cart.is_empty() {
        return Err(BazaarError::EmptyCart);
      }
      state.cart.check_stock(&state.products)?;
      state.cart.split_by_seller(&state.products)?
    };

    let mut placed = Vec::with_capacity(groups.len());
    let mut failure = None;
    for (seller_id, items) in groups {
      let req = CreateOrderRequest {
        buyer_id: buyer.id,
        seller_id,
        items,
      };
      match self.api.create_order(&req).await {
        Ok(order) => {
          info!("Order {} placed with seller {} for total {}.", order.id, seller_id, order.total);
          {
            let mut state = self.state.write();
            for line in &req.items {
              state.cart.remove(line.product_id);
            }
            state.upsert_order(order.clone());
          }
          placed.push(order);
        }
        Err(e) => {
          warn!("Order with seller {} was rejected: {}", seller_id, e);
          failure = Some(e);
          break;
        }
      }
    }

    if let Err(e) = self.refresh_products().await {
      warn!("Could not reload products after placing orders: {}", e);
    }

    match failure {
      Some(e) => Err(e),
      None => Ok(placed),
    }
  }

  /// Opens a hosted payment session for the buyer's pending, unpaid orders.
  #[instrument(name = "storefront::start_checkout", skip(self))]
  pub async fn start_checkout(&self) -> BazaarResult<CheckoutSession> {
    let buyer = self.require_role(Role::Buyer)?;
    let order_ids: Vec<Uuid> = {
      let state = self.state.read();
      state
        .orders
        .iter()
        .filter(|o| o.buyer_id == buyer.id && o.is_awaiting_payment())
        .map(|o| o.id)
        .collect()
    };
    if order_ids.is_empty() {
      return Err(BazaarError::NothingToPay);
    }
    let session = self
      .api
      .create_checkout(&CheckoutRequest {
        buyer_id: buyer.id,
        order_ids,
      })
      .await?;
    info!("Checkout session {} opened.", session.session_id);
    Ok(session)
  }

  pub async fn update_order_status(&self, order_id: Uuid, status: OrderStatus) -> BazaarResult<Order> {
    let seller = self.require_role(Role::Seller)?;
    let order = self.api.update_order_status(seller.id, order_id, status).await?;
    self.state.write().upsert_order(order.clone());
    Ok(order)
  }

  /// Moves a cached order one step along pending → accepted → shipping → delivered.
  pub async fn advance_order(&self, order_id: Uuid) -> BazaarResult<Order> {
    let current = {
      let state = self.state.read();
      state.order(order_id).map(|o| o.status).ok_or(BazaarError::UnknownOrder(order_id))?
    };
    let next = current.next().ok_or(BazaarError::FinalStatus(order_id))?;
    self.update_order_status(order_id, next).await
  }

  // --- Seller catalogue ---

  pub async fn add_product(&self, product: NewProduct) -> BazaarResult<Product> {
    let seller = self.require_role(Role::Seller)?;
    let created = self.api.create_product(seller.id, &product).await?;
    self.state.write().upsert_product(created.clone());
    Ok(created)
  }

  pub async fn update_product(&self, product_id: Uuid, patch: ProductPatch) -> BazaarResult<Product> {
    let seller = self.require_role(Role::Seller)?;
    let updated = self.api.update_product(seller.id, product_id, &patch).await?;
    self.state.write().upsert_product(updated.clone());
    Ok(updated)
  }

  pub async fn update_stock(&self, product_id: Uuid, stock_amount: i32) -> BazaarResult<Product> {
    let seller = self.require_role(Role::Seller)?;
    let update = StockUpdate {
      product_id,
      stock_amount,
    };
    let updated = self.api.update_stock(seller.id, &update).await?;
    self.state.write().upsert_product(updated.clone());
    Ok(updated)
  }

  pub async fn delete_product(&self, product_id: Uuid) -> BazaarResult<()> {
    let seller = self.require_role(Role::Seller)?;
    self.api.delete_product(seller.id, product_id).await?;
    let mut state = self.state.write();
    state.products.retain(|p| p.id != product_id);
    state.cart.remove(product_id);
    Ok(())
  }
}
