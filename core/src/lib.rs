// bazaar/core/src/lib.rs

//! Bazaar: the domain core of a small buyer/seller marketplace.
//!
//! This crate holds everything that is independent of HTTP and storage:
//!  - The data model (users, products, orders and their captured line prices).
//!  - The order-status state machine and the separate payment status.
//!  - Line-item arithmetic (`order_total`, `merge_line_items`).
//!  - The client-side [`Cart`] and the [`Storefront`] application-state object.
//!  - The [`MarketplaceApi`] trait through which the storefront reaches the server.
//!
//! Enable the `sqlx` feature to derive row and enum mappings for the server's store.

pub mod api;
pub mod cart;
pub mod error;
pub mod model;
pub mod storefront;

pub use crate::api::{
  CheckoutRequest, CheckoutSession, CreateOrderRequest, ErrorBody, LoginRequest, MarketplaceApi, NewProduct,
  OrderFilter, PaymentUpdateRequest, PaymentUpdateResponse, ProductPatch, SignupRequest, StatusUpdate, StockUpdate,
};
pub use crate::cart::{Cart, CartItem};
pub use crate::error::{BazaarError, BazaarResult};
pub use crate::model::{
  merge_line_items, order_total, LineItem, Order, OrderLine, OrderParty, OrderStatus, PaymentStatus, Product, Role, User,
};
pub use crate::storefront::{SavedSession, StoreState, Storefront};
