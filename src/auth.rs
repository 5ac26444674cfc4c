//! 呼び出しユーザの解決。セッション機構は前段のゲートウェイに任せ、
//! ここでは付与済みヘッダを信頼して読むだけ。

use crate::errors::AppError;
use axum::http::HeaderMap;

const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: i64,
    pub role: Role,
}

impl Caller {
    /// 本人または管理者のみ更新・削除できる
    pub fn can_modify(&self, owner_id: i64) -> bool {
        self.user_id == owner_id || self.role == Role::Admin
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub fn resolve_caller(headers: &HeaderMap) -> Result<Caller, AppError> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or(AppError::Unauthenticated)?;
    let role = match headers.get(USER_ROLE_HEADER).and_then(|v| v.to_str().ok()) {
        Some("admin") => Role::Admin,
        _ => Role::User,
    };
    Ok(Caller { user_id, role })
}
