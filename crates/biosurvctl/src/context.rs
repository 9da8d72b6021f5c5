//! Composition root
//!
//! Builds the provider client, backend client and planner once from config
//! and hands them to commands. Nothing is global.

use anyhow::{Context, Result};
use std::sync::Arc;

use biosurv_common::ai_client::GeminiClient;
use biosurv_common::{ActionPlanner, BackendClient, BiosurvConfig, Retrier};

pub struct AppContext {
    pub config: BiosurvConfig,
}

impl AppContext {
    pub fn new(config: BiosurvConfig) -> Self {
        Self { config }
    }

    pub fn backend(&self) -> Result<BackendClient> {
        BackendClient::new(&self.config.backend).context("Failed to set up backend client")
    }

    pub fn planner(&self) -> Result<ActionPlanner> {
        let client = GeminiClient::from_config(&self.config.ai)
            .context("Failed to set up AI client")?;
        Ok(ActionPlanner::new(
            Arc::new(client),
            Retrier::new(self.config.retry.clone()),
            self.config.ai.model.clone(),
        ))
    }
}
