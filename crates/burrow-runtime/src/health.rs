//! HTTP health probe for supervised servers.
//!
//! Only an exact `200 OK` counts as healthy. Each response is dropped right
//! after its status is read so no connection outlives the probe.

use std::time::Duration;

use async_trait::async_trait;
use burrow_core::{HealthError, HealthProbe};
use reqwest::{Client, StatusCode};
use tracing::debug;

/// Single-shot HTTP GET probe with a client-side timeout.
#[derive(Debug, Clone)]
pub struct HttpHealthProbe {
    client: Client,
}

impl HttpHealthProbe {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, url: &str) -> Result<(), HealthError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            debug!(url, error = %e, "Health probe failed");
            HealthError::Unreachable(e.to_string())
        })?;

        let status = response.status();
        drop(response);

        if status == StatusCode::OK {
            Ok(())
        } else {
            debug!(url, %status, "Health probe returned non-200 status");
            Err(HealthError::UnexpectedStatus(status.as_u16()))
        }
    }
}
