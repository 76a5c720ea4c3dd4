//! State stores for the cart and the favorites collection.
//!
//! Each store exclusively owns its data and persists through the shared
//! [`TieredStore`](crate::storage::TieredStore). Consumers read through
//! snapshots and subscribe for change notifications instead of keeping
//! their own copies of the state.

pub mod cart;
pub mod favorites;

pub use cart::{CartChanged, CartItem, CartLineView, CartStore, CartView};
pub use favorites::{FavoritesChanged, FavoritesStore};
