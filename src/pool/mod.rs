//! Pool module - parallel trial execution.

mod worker;

pub use worker::*;
