pub mod client;
pub mod dto;
pub mod handlers;
#[cfg(test)]
pub mod scripted;

pub use client::{AuthHeaders, CalorieLookup, HttpCalorieClient};
pub use dto::{CalorieRequest, CalorieResult};
pub use handlers::nutrition_routes;
