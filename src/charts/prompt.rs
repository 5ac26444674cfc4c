//! モデルへ渡す入力の組み立て。
//! 応答フォーマット（区切り付き2セクション）は上流モデルとの既定の取り決めで、
//! 文面は中国語のまま固定している。

/// 指示文。出力を区切り2つの固定フォーマットに制約する。
const INSTRUCTION: &str = "你是一个数据分析师和前端开发专家，接下来我会按照以下固定格式给你提供内容：\n\
分析需求：\n\
{数据分析的需求或者目标}\n\
原始数据：\n\
{csv格式的原始数据，用,作为分隔符}\n\
请根据这两部分内容，按照以下指定格式生成内容（此外不要输出任何多余的开头、结尾、注释）\n\
【【【【【\n\
{前端 Echarts V5 的 option 配置对象js代码，合理地将数据进行可视化，不要生成任何多余的内容，比如注释}\n\
【【【【【\n\
{明确的数据分析结论、越详细越好，不要生成多余的注释}\n";

pub fn build_prompt(goal: &str, chart_type: Option<&str>, chart_data: &str) -> String {
    let mut input = String::from(INSTRUCTION);
    input.push_str("分析需求：\n");
    match chart_type {
        Some(chart_type) if !chart_type.trim().is_empty() => {
            input.push_str(goal);
            input.push_str("，请使用");
            input.push_str(chart_type);
            input.push('\n');
        }
        _ => {
            input.push_str(goal);
            input.push('\n');
        }
    }
    input.push_str("原始数据：\n");
    input.push_str(chart_data);
    input.push('\n');
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertables::assert_contains;

    #[test]
    fn test_prompt_contains_goal_and_data() {
        let prompt = build_prompt("growth trend", None, "date,users\n1,10");
        assert_contains!(prompt, "分析需求：\ngrowth trend\n");
        assert_contains!(prompt, "原始数据：\ndate,users\n1,10\n");
    }

    #[test]
    fn test_chart_type_is_appended_to_goal() {
        let prompt = build_prompt("growth trend", Some("折线图"), "a,b");
        assert_contains!(prompt, "growth trend，请使用折线图\n");
    }

    #[test]
    fn test_blank_chart_type_is_ignored() {
        let prompt = build_prompt("growth trend", Some("  "), "a,b");
        assert_contains!(prompt, "分析需求：\ngrowth trend\n");
    }
}
