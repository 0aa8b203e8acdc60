// bazaar/core/src/cart.rs

//! Client-held cart. Nothing here talks to the server; stock checks run against
//! whatever product list the caller has cached, which may be stale.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BazaarError, BazaarResult};
use crate::model::{LineItem, Product};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
  pub product_id: Uuid,
  pub quantity: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
  items: Vec<CartItem>,
}

impl Cart {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds `quantity` of a product, merging into an existing line if there is one.
  pub fn add(&mut self, product_id: Uuid, quantity: i32) -> BazaarResult<()> {
    if quantity <= 0 {
      return Err(BazaarError::InvalidQuantity { product_id, quantity });
    }
    match self.items.iter_mut().find(|item| item.product_id == product_id) {
      Some(item) => item.quantity = item.quantity.saturating_add(quantity),
      None => self.items.push(CartItem { product_id, quantity }),
    }
    Ok(())
  }

  /// Returns `true` if a line was removed.
  pub fn remove(&mut self, product_id: Uuid) -> bool {
    let before = self.items.len();
    self.items.retain(|item| item.product_id != product_id);
    self.items.len() != before
  }

  /// Sets the quantity of an existing line. Zero removes the line.
  pub fn update_quantity(&mut self, product_id: Uuid, quantity: i32) -> BazaarResult<()> {
    if quantity < 0 {
      return Err(BazaarError::InvalidQuantity { product_id, quantity });
    }
    if quantity == 0 {
      return if self.remove(product_id) {
        Ok(())
      } else {
        Err(BazaarError::NotInCart(product_id))
      };
    }
    let item = self
      .items
      .iter_mut()
      .find(|item| item.product_id == product_id)
      .ok_or(BazaarError::NotInCart(product_id))?;
    item.quantity = quantity;
    Ok(())
  }

  pub fn clear(&mut self) {
    self.items.clear();
  }

  pub fn items(&self) -> &[CartItem] {
    &self.items
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn quantity_of(&self, product_id: Uuid) -> i32 {
    self
      .items
      .iter()
      .find(|item| item.product_id == product_id)
      .map(|item| item.quantity)
      .unwrap_or(0)
  }

  pub fn line_items(&self) -> Vec<LineItem> {
    self
      .items
      .iter()
      .map(|item| LineItem::new(item.product_id, item.quantity))
      .collect()
  }

  /// Sum of cached price times quantity. Lines whose product is not cached count as zero.
  pub fn total(&self, products: &[Product]) -> i64 {
    self
      .items
      .iter()
      .filter_map(|item| {
        find_product(products, item.product_id).map(|p| p.price.saturating_mul(i64::from(item.quantity)))
      })
      .fold(0i64, i64::saturating_add)
  }

  /// Checks every line against the cached stock. The first offending line is reported.
  pub fn check_stock(&self, products: &[Product]) -> BazaarResult<()> {
    for item in &self.items {
      let product = find_product(products, item.product_id).ok_or(BazaarError::UnknownProduct(item.product_id))?;
      if product.stock_amount < item.quantity {
        return Err(BazaarError::InsufficientStock {
          product_id: item.product_id,
          requested: item.quantity,
          available: product.stock_amount,
        });
      }
    }
    Ok(())
  }

  /// Groups the lines by the seller of each cached product, keeping cart order within
  /// a group and first-seen order between groups.
  pub fn split_by_seller(&self, products: &[Product]) -> BazaarResult<Vec<(Uuid, Vec<LineItem>)>> {
    let mut groups: Vec<(Uuid, Vec<LineItem>)> = Vec::new();
    for item in &self.items {
      let product = find_product(products, item.product_id).ok_or(BazaarError::UnknownProduct(item.product_id))?;
      let line = LineItem::new(item.product_id, item.quantity);
      match groups.iter_mut().find(|(seller, _)| *seller == product.seller_id) {
        Some((_, lines)) => lines.push(line),
        None => groups.push((product.seller_id, vec![line])),
      }
    }
    Ok(groups)
  }
}

fn find_product(products: &[Product], product_id: Uuid) -> Option<&Product> {
  products.iter().find(|p| p.id == product_id)
}
