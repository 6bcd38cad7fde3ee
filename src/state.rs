use crate::config::AppConfig;
use crate::db::BookingStore;
use crate::errors::AppError;
use crate::services::payment::PaymentGateway;
use crate::services::session::SessionSigner;

pub struct AppState {
    pub store: BookingStore,
    pub config: AppConfig,
    pub sessions: SessionSigner,
    /// `None` when no gateway secret is configured.
    pub gateway: Option<Box<dyn PaymentGateway>>,
}

impl AppState {
    pub fn gateway(&self) -> Result<&dyn PaymentGateway, AppError> {
        self.gateway.as_deref().ok_or_else(|| {
            AppError::Config("Paystack configuration error. Please contact support.".to_string())
        })
    }
}
