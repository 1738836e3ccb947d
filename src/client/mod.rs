//! HTTP client for the task REST API.
//!
//! The `taskd ui` subcommand uses this to talk to a running `taskd serve`
//! instance. Reconciliation of responses into the locally held list lives
//! in [`state`].

pub mod state;

use anyhow::{Context as _, Result};
use serde_json::Value;
use std::time::Duration;

use crate::tasks::{Task, TaskStatus};

/// The mutable fields submitted on create and (full) update.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TaskInput {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
}

/// A thin reqwest wrapper around the five task operations.
///
/// Every call uses a 5-second timeout. Failures carry the server's
/// `{"error": ...}` message when one is present.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list(&self) -> Result<Vec<Task>> {
        let resp = self
            .http
            .get(format!("{}/tasks", self.base_url))
            .send()
            .await
            .context("could not reach task server")?;
        Self::decode(resp).await
    }

    pub async fn get(&self, id: i64) -> Result<Task> {
        let resp = self
            .http
            .get(format!("{}/tasks/{id}", self.base_url))
            .send()
            .await
            .context("could not reach task server")?;
        Self::decode(resp).await
    }

    pub async fn create(&self, input: &TaskInput) -> Result<Task> {
        let resp = self
            .http
            .post(format!("{}/tasks", self.base_url))
            .json(input)
            .send()
            .await
            .context("could not reach task server")?;
        Self::decode(resp).await
    }

    pub async fn update(&self, id: i64, input: &TaskInput) -> Result<Task> {
        let resp = self
            .http
            .put(format!("{}/tasks/{id}", self.base_url))
            .json(input)
            .send()
            .await
            .context("could not reach task server")?;
        Self::decode(resp).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let resp = self
            .http
            .delete(format!("{}/tasks/{id}", self.base_url))
            .send()
            .await
            .context("could not reach task server")?;
        let _: Value = Self::decode(resp).await?;
        Ok(())
    }

    /// Decode a success body, or surface the server's error message.
    async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if status.is_success() {
            return resp.json::<T>().await.context("invalid response body");
        }
        let message = resp
            .json::<Value>()
            .await
            .ok()
            .and_then(|v| v["error"].as_str().map(ToOwned::to_owned))
            .unwrap_or_else(|| format!("request failed with status {status}"));
        anyhow::bail!("{message}")
    }
}
