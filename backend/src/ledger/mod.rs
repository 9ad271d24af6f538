//! Stock ledger and order settlement engine
//!
//! Every function here takes an open [`LedgerStore`](crate::store::LedgerStore)
//! and leaves committing to the caller, so a multi-step operation either lands
//! whole or not at all.

pub mod menu;
pub mod purchase;
pub mod settlement;
pub mod stock;

pub use menu::{
    create_menu_item, update_menu_item, MenuIngredientInput, NewMenuItemRequest,
    UpdateMenuItemRequest,
};
pub use purchase::{create_purchase, NewPurchaseRequest};
pub use settlement::{
    apply_captured_payment, apply_payment, create_order, reverse_payment,
    reverse_refunded_payment, update_order, NewOrderRequest, UpdateOrderRequest,
};
pub use stock::{
    adjust_stock, create_item, deactivate_item, list_low_stock, list_movements, record_movement,
    resolve_or_create_item, AdjustStockRequest, CreateItemRequest, RecordMovement, ResolveItem,
};
