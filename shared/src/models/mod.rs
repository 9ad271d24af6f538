//! Domain models for the catering operations platform

mod business;
mod inventory;
mod menu;
mod order;
mod payment;
mod purchase;
mod report;
mod user;

pub use business::*;
pub use inventory::*;
pub use menu::*;
pub use order::*;
pub use payment::*;
pub use purchase::*;
pub use report::*;
pub use user::*;
