//! Business logic services for the catering operations platform

pub mod auth;
pub mod business;
pub mod inventory;
pub mod menu;
pub mod orders;
pub mod payments;
pub mod purchasing;
pub mod reporting;
pub mod role;
pub mod staff;

pub use auth::AuthService;
pub use business::BusinessService;
pub use inventory::InventoryService;
pub use menu::MenuService;
pub use orders::OrderService;
pub use payments::PaymentService;
pub use purchasing::PurchasingService;
pub use reporting::ReportingService;
pub use role::RoleService;
pub use staff::StaffService;
