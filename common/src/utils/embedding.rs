use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;

/// Converts text into the fixed-length vector used for similarity ranking.
///
/// The `Http` backend talks to the deployment's embedding endpoint; the
/// `Hashed` backend is a deterministic, dependency-free stand-in used by
/// tests and local development.
#[derive(Clone)]
pub struct EmbeddingProvider {
    inner: EmbeddingInner,
}

#[derive(Clone)]
enum EmbeddingInner {
    Http {
        client: reqwest::Client,
        endpoint: String,
    },
    Hashed {
        dimension: usize,
    },
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Option<Vec<f32>>,
}

#[derive(Deserialize, Default)]
struct UpstreamErrorPayload {
    error: Option<UpstreamErrorBody>,
}

#[derive(Deserialize, Default)]
struct UpstreamErrorBody {
    message: Option<String>,
}

impl EmbeddingProvider {
    pub fn new_http(endpoint: String, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| {
                AppError::EmbeddingService(format!("failed to build HTTP client: {err}"))
            })?;

        Ok(EmbeddingProvider {
            inner: EmbeddingInner::Http { client, endpoint },
        })
    }

    pub fn new_hashed(dimension: usize) -> Self {
        EmbeddingProvider {
            inner: EmbeddingInner::Hashed {
                dimension: dimension.max(1),
            },
        }
    }

    pub fn backend_label(&self) -> &'static str {
        match self.inner {
            EmbeddingInner::Http { .. } => "http",
            EmbeddingInner::Hashed { .. } => "hashed",
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        match &self.inner {
            EmbeddingInner::Hashed { dimension } => Ok(hashed_embedding(text, *dimension)),
            EmbeddingInner::Http { client, endpoint } => {
                let response = client
                    .post(endpoint)
                    .json(&EmbeddingRequest { input: text })
                    .send()
                    .await
                    .map_err(|err| {
                        AppError::EmbeddingService(format!(
                            "request to embedding service failed: {err}"
                        ))
                    })?;

                let status = response.status();
                if !status.is_success() {
                    let payload: UpstreamErrorPayload = response.json().await.unwrap_or_default();
                    let message = payload
                        .error
                        .and_then(|e| e.message)
                        .unwrap_or_else(|| format!("embedding service returned {status}"));
                    return Err(AppError::EmbeddingService(message));
                }

                let payload: EmbeddingResponse = response.json().await.map_err(|err| {
                    AppError::MalformedResponse(format!(
                        "embedding service returned unparseable body: {err}"
                    ))
                })?;

                let embedding = payload.embedding.ok_or_else(|| {
                    AppError::MalformedResponse(
                        "embedding service response missing 'embedding' field".to_string(),
                    )
                })?;

                debug!(dimension = embedding.len(), "Received embedding");
                Ok(embedding)
            }
        }
    }
}

// Helper functions for hashed embeddings
fn hashed_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let dim = dimension.max(1);
    let mut vector = vec![0.0f32; dim];
    if text.is_empty() {
        return vector;
    }

    for token in tokens(text) {
        let idx = bucket(&token, dim);
        vector[idx] += 1.0;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }

    vector
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn bucket(token: &str, dimension: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    (hasher.finish() as usize) % dimension
}
