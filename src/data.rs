//! アップロードされた表データの検証と正規化。

use crate::errors::AppError;
use std::path::Path;

/// アップロード上限 1MiB
pub const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

const VALID_EXTENSIONS: [&str; 2] = ["csv", "txt"];
const MAX_NAME_CHARS: usize = 100;

/// サイズ・拡張子・UTF-8 を検証してから区切りテキストへ正規化する。
pub fn normalize_upload(filename: &str, bytes: &[u8]) -> Result<String, AppError> {
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::InvalidFile(format!(
            "file exceeds {MAX_UPLOAD_BYTES} bytes"
        )));
    }
    let suffix = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if !VALID_EXTENSIONS.contains(&suffix.as_str()) {
        return Err(AppError::InvalidFile(format!(
            "unsupported file extension: {filename}"
        )));
    }
    let text = std::str::from_utf8(bytes)
        .map_err(|_| AppError::InvalidFile("file is not valid UTF-8".to_string()))?;
    Ok(normalize_delimited(text))
}

/// 改行を LF に揃え、空行を捨て、セル前後の空白を落とす。
pub fn normalize_delimited(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split(',')
                .map(str::trim)
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 生成リクエスト共通の検証。タスク作成より前に弾く。
pub fn validate_request(goal: &str, name: Option<&str>) -> Result<(), AppError> {
    if goal.trim().is_empty() {
        return Err(AppError::Validation("goal must not be blank".to_string()));
    }
    if let Some(name) = name {
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(AppError::Validation(format!(
                "name exceeds {MAX_NAME_CHARS} characters"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_blank_lines_and_cell_padding() {
        let raw = "date , users\r\n1, 10\r\n\r\n2 ,20\n";
        assert_eq!(normalize_delimited(raw), "date,users\n1,10\n2,20");
    }

    #[test]
    fn test_upload_size_limit() {
        let big = vec![b'a'; MAX_UPLOAD_BYTES + 1];
        assert!(matches!(
            normalize_upload("data.csv", &big),
            Err(AppError::InvalidFile(_))
        ));
    }

    #[test]
    fn test_upload_extension_allow_list() {
        assert!(normalize_upload("data.csv", b"a,b").is_ok());
        assert!(normalize_upload("DATA.CSV", b"a,b").is_ok());
        assert!(normalize_upload("data.xlsx", b"a,b").is_err());
        assert!(normalize_upload("data", b"a,b").is_err());
    }

    #[test]
    fn test_upload_must_be_utf8() {
        assert!(matches!(
            normalize_upload("data.csv", &[0xff, 0xfe, 0x00]),
            Err(AppError::InvalidFile(_))
        ));
    }

    #[test]
    fn test_blank_goal_is_rejected() {
        assert!(matches!(
            validate_request("  ", None),
            Err(AppError::Validation(_))
        ));
        assert!(validate_request("growth trend", None).is_ok());
    }

    #[test]
    fn test_long_name_is_rejected() {
        let long = "あ".repeat(101);
        assert!(validate_request("goal", Some(&long)).is_err());
        let ok = "あ".repeat(100);
        assert!(validate_request("goal", Some(&ok)).is_ok());
    }
}
