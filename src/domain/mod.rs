// Domain module: entities, expressions, value objects and the adapter contract

pub mod error;
pub mod expression;
pub mod models;
pub mod solver_service;
pub mod value_objects;

pub use error::*;
pub use expression::*;
pub use models::*;
pub use solver_service::*;
pub use value_objects::*;
