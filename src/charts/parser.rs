#[cfg(test)]
mod tests;

use crate::errors::AppError;

/// モデル応答の構造区切り。前文・チャート定義・分析結論の3パートを分ける。
pub const SECTION_DELIMITER: &str = "【【【【【";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSections {
    pub chart: String,
    pub conclusion: String,
}

/// 応答を区切りで分割する。3パート未満はパース失敗。
/// パート0（前文）は捨て、残り2つは前後の空白を落として返す。
pub fn parse_reply(raw: &str) -> Result<GeneratedSections, AppError> {
    let parts: Vec<&str> = raw.split(SECTION_DELIMITER).collect();
    if parts.len() < 3 {
        return Err(AppError::Parse(format!(
            "expected 3 delimited sections, got {}",
            parts.len()
        )));
    }
    Ok(GeneratedSections {
        chart: parts[1].trim().to_string(),
        conclusion: parts[2].trim().to_string(),
    })
}
