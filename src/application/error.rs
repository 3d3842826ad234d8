use thiserror::Error;

use crate::domain::OrderStatus;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Insufficient stock for {product}: {requested} requested, {available} available")]
    InsufficientStock {
        product: String,
        available: u32,
        requested: u32,
    },

    #[error("Order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("An account with email {0} already exists")]
    DuplicateEmail(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid admin PIN")]
    InvalidAdminPin,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}
