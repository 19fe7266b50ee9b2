//! HTTP transport to the UI Designer migration endpoints.

use std::time::Duration;

use crate::error::MigrationError;

/// Status code and body of a migration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactResponse {
    pub status: u16,
    pub body: String,
}

/// Issues the body-less `PUT` that asks the UI Designer to migrate an artifact.
pub trait ArtifactMigrationClient: Send + Sync {
    fn put(&self, uri: &str) -> Result<ArtifactResponse, MigrationError>;
}

/// Blocking `reqwest` client.
///
/// A client is built per call: blocking clients must not be created or
/// dropped on an async runtime thread, and steps run on blocking workers.
#[derive(Debug, Clone)]
pub struct HttpArtifactClient {
    timeout: Duration,
}

impl HttpArtifactClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpArtifactClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl ArtifactMigrationClient for HttpArtifactClient {
    fn put(&self, uri: &str) -> Result<ArtifactResponse, MigrationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| MigrationError::Http(e.to_string()))?;
        let response = client
            .put(uri)
            .send()
            .map_err(|e| MigrationError::Http(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| MigrationError::Http(e.to_string()))?;
        Ok(ArtifactResponse { status, body })
    }
}
