//! Services Layer
//!
//! This module contains pure business logic extracted from HTTP handlers.

pub mod recipe_service;
pub mod shopping_list;
pub mod subscription_service;
pub mod toggle_service;
pub mod user_service;

// Re-export for convenience
pub use shopping_list::{SHOPPING_LIST_FILENAME, ShoppingItem, build_shopping_list, render_shopping_list};
pub use subscription_service::{SubscriptionError, SubscriptionProfile, subscribe, unsubscribe};
pub use toggle_service::{ToggleError, toggle_add, toggle_remove};
