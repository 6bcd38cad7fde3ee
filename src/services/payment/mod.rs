pub mod paystack;

use async_trait::async_trait;

use crate::models::{ChargeRequest, ChargeSession, Verification};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The provider answered and said no. `message` is the provider's own.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("{0}")]
    Unreachable(String),

    #[error("{0}")]
    UnexpectedResponse(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a charge session and returns where to send the guest.
    async fn initialize(&self, request: &ChargeRequest) -> Result<ChargeSession, GatewayError>;

    /// Current provider status of a previously initialized charge.
    async fn verify(&self, reference: &str) -> Result<Verification, GatewayError>;
}
