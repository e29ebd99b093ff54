//! 修复引擎类型定义

use serde::{Deserialize, Serialize};

/// 重写规则类别
///
/// 按执行优先级排列：双星号规则必须先于单星号规则执行，
/// 否则 "**已加粗: **" 会被单星号规则二次命中（见 engine 测试）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleKind {
    /// 粗体带冒号（如 "**标签: **" → "**标签:**"）
    BoldColon,
    /// 粗体不带冒号（如 "**标签 **" → "**标签**"）
    Bold,
    /// 单星号斜体带冒号（如 "*标签: *" → "**标签:**"，统一为粗体）
    ItalicStarColon,
    /// 单星号斜体不带冒号（如 "*标签 *" → "**标签**"）
    ItalicStar,
    /// 下划线斜体带冒号（如 "_标签: _" → "**标签:**"，统一为粗体）
    ItalicUnderscoreColon,
    /// 下划线斜体不带冒号（如 "_标签 _" → "**标签**"）
    ItalicUnderscore,
    /// 行内代码带冒号（如 "`值: `" → "`值:`"）
    InlineCodeColon,
    /// 行内代码不带冒号（如 "`值 `" → "`值`"）
    InlineCode,
}

impl RuleKind {
    /// 获取规则的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            RuleKind::BoldColon => "粗体冒号空格",
            RuleKind::Bold => "粗体尾部空格",
            RuleKind::ItalicStarColon => "星号斜体冒号转粗体",
            RuleKind::ItalicStar => "星号斜体转粗体",
            RuleKind::ItalicUnderscoreColon => "下划线斜体冒号转粗体",
            RuleKind::ItalicUnderscore => "下划线斜体转粗体",
            RuleKind::InlineCodeColon => "行内代码冒号空格",
            RuleKind::InlineCode => "行内代码尾部空格",
        }
    }
}

/// 单次修复记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedFix {
    /// 命中的原始文本
    pub original: String,
    /// 替换后文本
    pub replaced: String,
    /// 命中的规则
    pub rule: RuleKind,
}

/// 修复结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixResult {
    /// 修复后的文本
    pub text: String,
    /// 修复次数（每个匹配计一次，跨全部规则累加）
    pub count: usize,
    /// 逐项修复记录（长度恒等于 count）
    pub applied: Vec<AppliedFix>,
}

impl FixResult {
    /// 创建无修改的结果
    pub fn unchanged(text: String) -> Self {
        Self {
            text,
            count: 0,
            applied: Vec::new(),
        }
    }
}
