use async_trait::async_trait;
use thiserror::Error;

use crate::{
    data_types::{MenuItem, Order, OrderId, OrderStatus},
    order_objects::{Credentials, LoginResult, NewAccount, NewOrderRequest},
};

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The server rejected the access token. Please sign in again.")]
    Unauthorized,
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Could not deserialize JSON: {0}")]
    Json(String),
    #[error("Request rejected. Error {status}. {message}")]
    Rejected { status: u16, message: String },
}

impl ApiError {
    /// The text to show a customer: the server's own message when it supplied one, a generic message otherwise.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected { message, .. } if !message.trim().is_empty() => message.clone(),
            ApiError::Unauthorized => self.to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// The `StorefrontApi` trait defines the request/response contract with the remote order service.
///
/// Every authenticated call takes the bearer token explicitly. Implementations must map a rejected credential to
/// [`ApiError::Unauthorized`] so that callers can force the customer to sign in again. No call is retried at this
/// layer.
#[async_trait]
pub trait StorefrontApi: Send + Sync + 'static {
    /// Fetches the full menu.
    async fn fetch_menu(&self) -> Result<Vec<MenuItem>, ApiError>;

    /// Creates a new customer account. This does not sign the customer in.
    async fn register(&self, account: &NewAccount) -> Result<(), ApiError>;

    async fn login(&self, credentials: &Credentials) -> Result<LoginResult, ApiError>;

    /// Fetches every order the customer has placed.
    async fn order_history(&self, token: &str) -> Result<Vec<Order>, ApiError>;

    /// Submits a new order. The returned order, as assigned by the server, is the only source of truth for the new
    /// order's id, timestamps and totals.
    async fn create_order(&self, token: &str, request: &NewOrderRequest) -> Result<Order, ApiError>;

    /// Sets the status of an order. The response body is ignored.
    async fn update_order_status(&self, token: &str, order_id: &OrderId, status: OrderStatus) -> Result<(), ApiError>;
}
