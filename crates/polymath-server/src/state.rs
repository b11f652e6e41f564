//! Server state management

use polymath_core::{PolymathConfig, QuestionAnswering};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QuestionAnswering>,
}

impl AppState {
    pub fn new(service: QuestionAnswering) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Build the service from configuration
    pub fn from_config(config: &PolymathConfig) -> polymath_core::Result<Self> {
        Ok(Self::new(QuestionAnswering::from_config(config)?))
    }
}
