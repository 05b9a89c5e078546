use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::application::services::PipelineConfig;

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr + Copy>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub google: GoogleSettings,
    pub llm: LlmSettings,
    pub sampling: SamplingSettings,
    pub routing: RoutingSettings,
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleSettings {
    pub access_token: String,
    pub staging_bucket: String,
    pub progress_sheet_id: Option<String>,
    pub progress_cell: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub project_id: String,
    pub location: String,
    pub model_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplingSettings {
    pub first_pages: usize,
    pub last_pages: usize,
    pub detect_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingSettings {
    pub k_top: usize,
    pub min_cover: usize,
    pub chunk_cap: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    pub pages_per_chunk: usize,
    pub small_doc_threshold: usize,
    pub throttle_ms: u64,
    pub map_concurrency: usize,
    /// JSON object mapping visa type (lowercased) to a base-prompt doc id,
    /// with a "default" entry.
    pub base_prompt_ids: HashMap<String, String>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            server: ServerSettings {
                host: env_or("SERVER_HOST", "0.0.0.0"),
                port: env_parse("SERVER_PORT", 8080),
            },
            google: GoogleSettings {
                access_token: env_or("GOOGLE_ACCESS_TOKEN", ""),
                staging_bucket: env_or("PDF_STAGING_BUCKET", ""),
                progress_sheet_id: std::env::var("PROGRESS_SHEET_ID").ok(),
                progress_cell: env_or("PROGRESS_CELL", "A1"),
            },
            llm: LlmSettings {
                project_id: env_or("GCP_PROJECT_ID", ""),
                location: env_or("GCP_LOCATION", "us-central1"),
                model_id: env_or("VERTEX_MODEL_ID", "gemini-2.5-flash"),
            },
            sampling: SamplingSettings {
                first_pages: env_parse("BACKQ_FIRST_PAGES_DEFAULT", 40),
                last_pages: env_parse("BACKQ_LAST_PAGES_DEFAULT", 40),
                detect_limit: env_parse("BACKQ_DETECT_LIMIT", 50),
            },
            routing: RoutingSettings {
                k_top: env_parse("BACKQ_K_TOP_CHUNKS", 3),
                min_cover: env_parse("BACKQ_MIN_COVER", 2),
                chunk_cap: env_parse("BACKQ_CHUNK_CAP", 20),
            },
            pipeline: PipelineSettings {
                pages_per_chunk: env_parse("PDF_MAX_PAGES_PER_CHUNK", 60),
                small_doc_threshold: env_parse("BACKQ_SMALL_DOC_THRESHOLD", 80),
                throttle_ms: env_parse("BACKQ_THROTTLE_MS", 1000),
                map_concurrency: env_parse("BACKQ_MAP_CONCURRENCY", 2),
                base_prompt_ids: parse_base_prompt_ids(
                    std::env::var("BASE_PROMPT_IDS_JSON").ok().as_deref(),
                ),
            },
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            sampling_first_pages: self.sampling.first_pages,
            sampling_last_pages: self.sampling.last_pages,
            detect_limit: self.sampling.detect_limit,
            pages_per_chunk: self.pipeline.pages_per_chunk,
            small_doc_threshold: self.pipeline.small_doc_threshold,
            k_top: self.routing.k_top,
            min_cover: self.routing.min_cover,
            chunk_cap: self.routing.chunk_cap,
            throttle: Duration::from_millis(self.pipeline.throttle_ms),
            concurrency: self.pipeline.map_concurrency,
            staging_bucket: self.google.staging_bucket.clone(),
            base_prompt_ids: self.pipeline.base_prompt_ids.clone(),
        }
    }
}

/// Visa-type mapping from env JSON; invalid or absent JSON yields an empty
/// map rather than a startup failure.
pub fn parse_base_prompt_ids(raw: Option<&str>) -> HashMap<String, String> {
    let Some(raw) = raw else {
        return HashMap::new();
    };
    match serde_json::from_str::<HashMap<String, String>>(raw) {
        Ok(map) => map
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect(),
        Err(error) => {
            tracing::warn!(error = %error, "invalid BASE_PROMPT_IDS_JSON, ignoring");
            HashMap::new()
        }
    }
}
