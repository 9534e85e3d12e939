//! COMET quality estimation client.
//!
//! COMET is a neural model served out of process. One request scores a whole
//! batch and returns both segment scores and the system score.

use crate::corpus::ParallelSample;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Output of one COMET prediction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CometOutput {
    /// One score per submitted segment, in submission order
    pub scores: Vec<f64>,
    pub system_score: f64,
}

/// Reference-based semantic quality model.
pub trait CometModel: Send + Sync {
    fn predict(
        &self,
        samples: &[ParallelSample],
        batch_size: usize,
    ) -> impl Future<Output = Result<CometOutput>> + Send;
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    model: &'a str,
    data: &'a [ParallelSample],
    batch_size: usize,
    gpus: u32,
}

pub struct HttpCometModel {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    use_gpu: bool,
}

impl HttpCometModel {
    pub const DEFAULT_MODEL: &'static str = "Unbabel/wmt22-comet-da";

    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        api_key: Option<String>,
        use_gpu: bool,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key,
            model: Self::DEFAULT_MODEL.to_string(),
            use_gpu,
        }
    }
}

impl CometModel for HttpCometModel {
    async fn predict(&self, samples: &[ParallelSample], batch_size: usize) -> Result<CometOutput> {
        let request = PredictRequest {
            model: &self.model,
            data: samples,
            batch_size,
            gpus: u32::from(self.use_gpu),
        };

        let mut builder = self.client.post(&self.api_url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(PipelineError::ModelService {
                service: "comet",
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<CometOutput>().await?)
    }
}
