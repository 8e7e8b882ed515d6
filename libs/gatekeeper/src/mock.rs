//! In-memory control-plane write API for testing and development.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use crate::error::SubmitError;
use crate::install::GatekeeperApi;
use crate::types::Gatekeeper;

/// How the mock responds to `create`.
#[derive(Debug, Clone, Default)]
pub enum MockResponse {
    /// Accept every resource.
    #[default]
    Accept,

    /// Report that the resource already exists.
    AlreadyExists,

    /// Reject with a status code and message.
    Reject { code: u16, message: String },
}

/// Records every submitted resource.
#[derive(Debug, Default)]
pub struct MockGatekeeperApi {
    response: MockResponse,
    created: Mutex<Vec<Gatekeeper>>,
}

impl MockGatekeeperApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn responding(response: MockResponse) -> Self {
        Self {
            response,
            created: Mutex::new(Vec::new()),
        }
    }

    /// Resources passed to `create`, in call order.
    pub fn created(&self) -> Vec<Gatekeeper> {
        self.created
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl GatekeeperApi for MockGatekeeperApi {
    async fn create(&self, gatekeeper: &Gatekeeper) -> Result<(), SubmitError> {
        info!(
            name = %gatekeeper.name(),
            namespace = ?gatekeeper.namespace(),
            "[MOCK] Creating Gatekeeper"
        );
        self.created
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(gatekeeper.clone());

        match &self.response {
            MockResponse::Accept => Ok(()),
            MockResponse::AlreadyExists => {
                Err(SubmitError::AlreadyExists(gatekeeper.name().to_string()))
            }
            MockResponse::Reject { code, message } => Err(SubmitError::Rejected {
                name: gatekeeper.name().to_string(),
                code: *code,
                message: message.clone(),
            }),
        }
    }
}
