use super::*;
use proptest::prelude::*;

#[test]
fn test_parse_two_sections() {
    let raw = "preamble【【【【【 {spec} 【【【【【 {summary}";
    let sections = parse_reply(raw).unwrap();
    assert_eq!(sections.chart, "{spec}");
    assert_eq!(sections.conclusion, "{summary}");
}

#[test]
fn test_parse_empty_preamble() {
    let raw = "【【【【【\n{\"series\": []}\n【【【【【\nユーザ数は単調増加。";
    let sections = parse_reply(raw).unwrap();
    assert_eq!(sections.chart, "{\"series\": []}");
    assert_eq!(sections.conclusion, "ユーザ数は単調増加。");
}

#[test]
fn test_single_delimiter_fails() {
    let raw = "preamble【【【【【 only one";
    let err = parse_reply(raw).unwrap_err();
    assert!(matches!(err, AppError::Parse(_)));
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_no_delimiter_fails() {
    assert!(parse_reply("plain text").is_err());
    assert!(parse_reply("").is_err());
}

#[test]
fn test_extra_sections_take_first_two() {
    let raw = "a【【【【【b【【【【【c【【【【【d";
    let sections = parse_reply(raw).unwrap();
    assert_eq!(sections.chart, "b");
    assert_eq!(sections.conclusion, "c");
}

proptest! {
    // 区切りを含まない入力は何であれ成功しない
    #[test]
    fn test_never_succeeds_without_delimiter(raw in "[^【]*") {
        prop_assert!(parse_reply(&raw).is_err());
    }
}
