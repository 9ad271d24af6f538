//! HTTP request handlers

pub mod auth;
pub mod business;
pub mod health;
pub mod inventory;
pub mod menu;
pub mod orders;
pub mod payments;
pub mod purchases;
pub mod reporting;
pub mod role;
pub mod staff;

pub use auth::*;
pub use business::*;
pub use health::*;
pub use inventory::*;
pub use menu::*;
pub use orders::*;
pub use payments::*;
pub use purchases::*;
pub use reporting::*;
pub use role::*;
pub use staff::*;
