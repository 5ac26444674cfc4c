pub mod parser;
pub mod prompt;

use crate::errors::AppError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 生成タスクの状態。wait → running → {succeeded | failed}。
/// terminal 状態からは遷移しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartStatus {
    Wait,
    Running,
    Succeeded,
    Failed,
}

impl ChartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartStatus::Wait => "wait",
            ChartStatus::Running => "running",
            ChartStatus::Succeeded => "succeeded",
            ChartStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ChartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChartStatus {
    type Err = AppError;

    // ストア上の未知の文字列は黙ってデフォルトに落とさずエラーにする
    fn from_str(s: &str) -> Result<ChartStatus, AppError> {
        match s {
            "wait" => Ok(ChartStatus::Wait),
            "running" => Ok(ChartStatus::Running),
            "succeeded" => Ok(ChartStatus::Succeeded),
            "failed" => Ok(ChartStatus::Failed),
            other => Err(AppError::Persistence(format!(
                "unknown chart status: {other}"
            ))),
        }
    }
}

/// 新規タスクの作成パラメータ。ストアが id と時刻を付与する。
#[derive(Debug, Clone)]
pub struct NewChart {
    pub user_id: i64,
    pub goal: String,
    pub name: Option<String>,
    pub chart_type: Option<String>,
    pub chart_data: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartRecord {
    pub id: i64,
    pub user_id: i64,
    pub goal: String,
    pub name: Option<String>,
    pub chart_type: Option<String>,
    pub chart_data: String,
    pub status: ChartStatus,
    pub gen_chart: Option<String>,
    pub gen_result: Option<String>,
    pub exec_message: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            ChartStatus::Wait,
            ChartStatus::Running,
            ChartStatus::Succeeded,
            ChartStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<ChartStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_is_an_error() {
        assert!("succeed".parse::<ChartStatus>().is_err());
        assert!("".parse::<ChartStatus>().is_err());
    }
}
