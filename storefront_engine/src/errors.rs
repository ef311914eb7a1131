use thiserror::Error;

use crate::traits::{ApiError, SessionError};

#[derive(Debug, Error)]
pub enum OrderFlowError {
    #[error("You need to sign in before you can do that.")]
    Unauthenticated,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Signed in, but the session could not be saved. {0}")]
    Session(#[from] SessionError),
}

impl OrderFlowError {
    /// True if the customer must sign in (again) before retrying.
    pub fn requires_sign_in(&self) -> bool {
        match self {
            OrderFlowError::Unauthenticated => true,
            OrderFlowError::Api(e) => e.is_unauthorized(),
            OrderFlowError::Session(_) => false,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            OrderFlowError::Api(e) => e.user_message(),
            e => e.to_string(),
        }
    }
}
