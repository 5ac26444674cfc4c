#[cfg(test)]
mod tests;

use super::ModelName;
use crate::errors::AppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub model: ModelName,
    pub prompt: String,
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub model: ModelName,
    pub response: String,
    pub done: bool,
}

pub async fn generate(
    client: &reqwest::Client,
    base_url: &str,
    model: ModelName,
    prompt: String,
) -> Result<Response, AppError> {
    let request = Request {
        model,
        prompt,
        stream: false,
    };
    let url = format!("{}/generate", base_url);
    let response = client.post(&url).json(&request).send().await?;
    let response: Response = response.json().await?;
    Ok(response)
}
