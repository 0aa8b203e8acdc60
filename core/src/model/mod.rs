// bazaar/core/src/model/mod.rs

//! Data structures shared by the server, its store and the client.

pub mod order;
pub mod product;
pub mod user;

pub use order::{merge_line_items, order_total, LineItem, Order, OrderLine, OrderParty, OrderStatus, PaymentStatus};
pub use product::Product;
pub use user::{Role, User};
