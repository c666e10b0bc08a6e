//! Domain models for the marketplace.
//!
//! These types represent validated domain objects separate from database row
//! types; repositories convert rows into them at the boundary.

pub mod business;
pub mod product;
pub mod user;

pub use business::Business;
pub use product::Product;
pub use user::User;
