//! 围栏代码块保护
//!
//! Shield：抽出全部围栏代码块存入按下标索引的列表，原位替换为占位符；
//! Unshield：按占位符内嵌下标原样放回，下标越界的占位符视为普通文本保留。
//!
//! 占位符由私有使用区哨兵字符包裹十进制下标构成，不含任何定界符字符
//! （星号、下划线、反引号、冒号、空白），因此任何重写规则都无法命中
//! 它的任何部分，至多整体包裹在强调标记内，还原不受影响。
//!
//! 文档本身若已含有占位符样式的文本，同样被抽出存入列表并替换为新占位符：
//! 屏蔽后的文本中每个占位符样式序列都对应本次生成的下标，还原时不会把
//! 文档原有的字面序列误认成代码块。

use lazy_static::lazy_static;
use regex::Regex;

/// 占位符起始哨兵
const TOKEN_OPEN: char = '\u{E000}';
/// 占位符结束哨兵
const TOKEN_CLOSE: char = '\u{E001}';

lazy_static! {
    /// 受保护片段：围栏代码块（非贪婪，遇到第一个闭合围栏即结束；无闭合
    /// 围栏则不匹配），以及文档原有的占位符样式文本
    static ref PROTECTED: Regex = Regex::new(r"(?s)```.*?```|\x{E000}\d+\x{E001}")
        .expect("shield pattern should compile");
    /// 占位符（捕获组 1 为抽取下标）
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\x{E000}(\d+)\x{E001}").expect("placeholder pattern should compile");
}

/// 抽出全部受保护片段（围栏代码块与字面占位符样式文本）
///
/// 返回（屏蔽后文本, 按抽取顺序排列的片段列表）
pub(crate) fn shield_code_blocks(text: &str) -> (String, Vec<String>) {
    let mut blocks: Vec<String> = Vec::new();
    let shielded = PROTECTED
        .replace_all(text, |caps: &regex::Captures| {
            let token = format!("{}{}{}", TOKEN_OPEN, blocks.len(), TOKEN_CLOSE);
            blocks.push(caps[0].to_string());
            token
        })
        .into_owned();
    (shielded, blocks)
}

/// 按下标放回代码块，逐字节还原
///
/// 下标解析失败或越界的占位符是文档本身的文字，原样保留
pub(crate) fn restore_code_blocks(text: &str, blocks: &[String]) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &regex::Captures| match caps[1].parse::<usize>() {
            Ok(idx) if idx < blocks.len() => blocks[idx].clone(),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shield_and_restore_roundtrip() {
        let doc = "前文\n```rust\nlet x = 1;\n```\n后文";
        let (shielded, blocks) = shield_code_blocks(doc);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0], "```rust\nlet x = 1;\n```");
        assert!(!shielded.contains("```"));
        assert!(shielded.contains('\u{E000}'));

        assert_eq!(restore_code_blocks(&shielded, &blocks), doc);
    }

    #[test]
    fn test_multiple_blocks_indexed_in_order() {
        let doc = "```a```中间```b```";
        let (shielded, blocks) = shield_code_blocks(doc);

        assert_eq!(blocks, vec!["```a```".to_string(), "```b```".to_string()]);
        assert_eq!(shielded, "\u{E000}0\u{E001}中间\u{E000}1\u{E001}");
        assert_eq!(restore_code_blocks(&shielded, &blocks), doc);
    }

    #[test]
    fn test_unterminated_fence_not_shielded() {
        let doc = "开头\n```\n没有闭合围栏";
        let (shielded, blocks) = shield_code_blocks(doc);

        assert!(blocks.is_empty());
        assert_eq!(shielded, doc);
    }

    #[test]
    fn test_no_fence_document_passthrough() {
        let doc = "没有代码块的普通文档";
        let (shielded, blocks) = shield_code_blocks(doc);

        assert!(blocks.is_empty());
        assert_eq!(shielded, doc);
        assert_eq!(restore_code_blocks(&shielded, &blocks), doc);
    }

    #[test]
    fn test_out_of_bounds_token_left_untouched() {
        // 文档本身含有形如占位符的文本，下标无对应代码块时原样保留
        let text = "残留 \u{E000}7\u{E001} 文本";
        let blocks = vec!["```x```".to_string()];

        assert_eq!(restore_code_blocks(text, &blocks), text);
    }

    #[test]
    fn test_literal_placeholder_text_not_confused_with_blocks() {
        // 文档原有的占位符样式文本也被抽出，还原后逐字节保留，
        // 不会被替换成同下标的代码块
        let doc = "前面 \u{E000}0\u{E001} 文本\n```\nfenced\n```\n";
        let (shielded, blocks) = shield_code_blocks(doc);

        assert_eq!(
            blocks,
            vec![
                "\u{E000}0\u{E001}".to_string(),
                "```\nfenced\n```".to_string()
            ]
        );
        assert_eq!(restore_code_blocks(&shielded, &blocks), doc);
    }

    #[test]
    fn test_literal_placeholder_with_colliding_index() {
        // 字面序列的下标指向后抽取的围栏也不会串位
        let doc = "\u{E000}1\u{E001} 之后\n```x```";
        let (shielded, blocks) = shield_code_blocks(doc);

        assert_eq!(blocks[0], "\u{E000}1\u{E001}");
        assert_eq!(blocks[1], "```x```");
        assert_eq!(restore_code_blocks(&shielded, &blocks), doc);
    }

    #[test]
    fn test_fence_content_byte_identical() {
        // 围栏内的强调样式、尾随空格全部逐字节保留
        let block = "```\n*fake: * 和 `value ` 以及 **bad: **\n```";
        let (shielded, blocks) = shield_code_blocks(block);

        assert_eq!(blocks[0], block);
        assert_eq!(restore_code_blocks(&shielded, &blocks), block);
    }
}
