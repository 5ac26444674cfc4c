use thiserror::Error;

/// サービス全体のエラー分類。
/// 非同期ジョブ内で発生したものはタスクの terminal 状態に吸収され、
/// リクエスト経路のものはそのまま呼び出し元へ返る。
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("forbidden")]
    Forbidden,
    #[error("chart not found: {0}")]
    NotFound(i64),
    #[error("rate limit exceeded")]
    RateLimitExceeded,
    #[error("invalid file: {0}")]
    InvalidFile(String),
    #[error("upstream model error: {0}")]
    Upstream(String),
    #[error("malformed model reply: {0}")]
    Parse(String),
    #[error("task backlog is full")]
    QueueFull,
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> AppError {
        AppError::Upstream(e.to_string())
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(e: diesel::result::Error) -> AppError {
        AppError::Persistence(e.to_string())
    }
}

impl From<deadpool_diesel::InteractError> for AppError {
    fn from(e: deadpool_diesel::InteractError) -> AppError {
        AppError::Persistence(e.to_string())
    }
}

impl From<deadpool::managed::PoolError<deadpool_diesel::Error>> for AppError {
    fn from(e: deadpool::managed::PoolError<deadpool_diesel::Error>) -> AppError {
        AppError::Persistence(e.to_string())
    }
}
