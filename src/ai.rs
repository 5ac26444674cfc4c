mod generate;

use crate::config;
use crate::errors::AppError;
use crate::logging::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::result::Result;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:11434/api";
const DEFAULT_MODEL: &str = "gemma3:12b";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelName(String);

impl std::fmt::Display for ModelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// テキスト生成モデルの呼び出し口。オーケストレーション層はこの trait 越しに使う。
/// リトライはしない。失敗はそのまま Upstream エラーとして返す。
#[async_trait]
pub trait TextModel {
    async fn generate(&self, prompt: String) -> Result<String, AppError>;
}

/// 外部の生成モデルへの HTTP クライアント。
/// reqwest::Client を共有するだけで可変状態は持たないので、
/// 複数ワーカーから同時に呼んで構わない。
pub struct AiClient {
    model: ModelName,
    base_url: String,
    client: reqwest::Client,
}

impl AiClient {
    pub fn new(model: ModelName, base_url: String, timeout: Duration) -> Result<AiClient, AppError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(AiClient {
            model,
            base_url,
            client,
        })
    }

    pub fn new_default() -> Result<AiClient, AppError> {
        let model = ModelName(config::get("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()));
        let base_url =
            config::get("LLM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        // 上流呼び出しは無制限にしない。応答しないモデルにワーカーを掴ませない
        let timeout = config::get("LLM_TIMEOUT")
            .ok()
            .and_then(|v| humantime::parse_duration(&v).ok())
            .unwrap_or(DEFAULT_TIMEOUT);
        AiClient::new(model, base_url, timeout)
    }
}

#[async_trait]
impl TextModel for AiClient {
    async fn generate(&self, prompt: String) -> Result<String, AppError> {
        let log = DEFAULT.new(o!(
            "function" => "generate",
            "model" => format!("{}", self.model),
        ));
        info!(log, "calling model");
        let response =
            generate::generate(&self.client, &self.base_url, self.model.clone(), prompt).await?;
        Ok(response.response)
    }
}
