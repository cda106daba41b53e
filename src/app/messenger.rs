use std::sync::Arc;

use async_trait::async_trait;

use super::{
    coordinator::Coordinator,
    errors::AppError,
    message::{Request, Response},
};

/// Request/response channel between a surface and the coordinator.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, AppError>;
}

/// Coordinator living in the same process.
pub struct LocalMessenger {
    coordinator: Arc<Coordinator>,
}

impl LocalMessenger {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }
}

#[async_trait]
impl Messenger for LocalMessenger {
    async fn send(&self, request: Request) -> Result<Response, AppError> {
        Ok(self.coordinator.dispatch(request).await)
    }
}
