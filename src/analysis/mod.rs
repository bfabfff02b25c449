//! Analysis module - closed-form results used to check simulations.

mod theory;

pub use theory::*;
