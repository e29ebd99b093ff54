//! 重写规则表
//!
//! 八条规则覆盖三类定界符（`*` / `_` / 反引号）的「闭合定界符前多余空格」
//! 与「斜体统一为粗体」两类问题。表内顺序即执行顺序：
//! 1. 粗体（**）最先——按出现顺序成对配对 `**` 记号，闭合定界符一经配对
//!    即被消耗，不会再被当作后续匹配的开启定界符（自由正则扫描会把前一个
//!    跨度的闭合 `**` 与下一个跨度的开启 `**` 误配成一对）
//! 2. 单星号（*）——需排除与相邻星号构成 ** 的候选（regex 不支持环视）
//! 3. 下划线（_）
//! 4. 行内代码（`）
//!
//! 每对规则中带冒号变体在前。保留定界符的带冒号变体（粗体、行内代码）
//! 要求冒号后至少一个空格，规范化输出才不会再次触发；改换定界符的
//! 带冒号变体（单星号、下划线）允许零个空格，"*标签:*" 同样统一为粗体。

use regex::Regex;

use crate::fixer::types::RuleKind;

/// 单个修复点
///
/// 先收集全部修复点，再统一拼接渲染（查找与计数/渲染分离）
#[derive(Debug)]
pub(crate) struct FixSite {
    /// 匹配区间起点（字节下标）
    pub start: usize,
    /// 匹配区间终点（字节下标）
    pub end: usize,
    /// 规范化后的替换文本
    pub replacement: String,
    /// 命中的规则
    pub kind: RuleKind,
}

/// 重写规则
pub(crate) enum RewriteRule {
    /// 粗体配对扫描（覆盖带冒号与无冒号两个变体）
    PairedBold,
    /// 正则驱动的单定界符规则（预编译）
    Pattern(PatternRule),
}

impl RewriteRule {
    /// 构建完整规则表（表内顺序即执行顺序）
    pub(crate) fn table() -> Vec<RewriteRule> {
        vec![
            RewriteRule::PairedBold,
            RewriteRule::Pattern(PatternRule::new(
                RuleKind::ItalicStarColon,
                r"\*([^*\n]+?):[ \t]*\*",
                "**",
                true,
                true,
            )),
            RewriteRule::Pattern(PatternRule::new(
                RuleKind::ItalicStar,
                r"\*([^*:\n]+?)[ \t]+\*",
                "**",
                false,
                true,
            )),
            RewriteRule::Pattern(PatternRule::new(
                RuleKind::ItalicUnderscoreColon,
                r"_([^_\n]+?):[ \t]*_",
                "**",
                true,
                false,
            )),
            RewriteRule::Pattern(PatternRule::new(
                RuleKind::ItalicUnderscore,
                r"_([^_:\n]+?)[ \t]+_",
                "**",
                false,
                false,
            )),
            RewriteRule::Pattern(PatternRule::new(
                RuleKind::InlineCodeColon,
                r"`([^`\n]+?):[ \t]+`",
                "`",
                true,
                false,
            )),
            RewriteRule::Pattern(PatternRule::new(
                RuleKind::InlineCode,
                r"`([^`:\n]+?)[ \t]+`",
                "`",
                false,
                false,
            )),
        ]
    }

    /// 扫描全文，收集本规则的所有修复点
    pub(crate) fn find_sites(&self, text: &str) -> Vec<FixSite> {
        match self {
            RewriteRule::PairedBold => paired_bold_sites(text),
            RewriteRule::Pattern(rule) => rule.find_sites(text),
        }
    }
}

/// 正则驱动的单定界符规则
pub(crate) struct PatternRule {
    /// 规则类别
    kind: RuleKind,
    /// 触发模式（捕获组 1 为内部文本；内部文本排除换行与本规则定界符）
    pattern: Regex,
    /// 规范化输出的包裹定界符
    delimiter: &'static str,
    /// 内部文本后是否保留冒号
    keep_colon: bool,
    /// 是否排除与相邻星号构成 ** 的候选
    exclude_adjacent_star: bool,
}

impl PatternRule {
    fn new(
        kind: RuleKind,
        pattern: &str,
        delimiter: &'static str,
        keep_colon: bool,
        exclude_adjacent_star: bool,
    ) -> Self {
        Self {
            kind,
            pattern: Regex::new(pattern).expect("rule pattern should compile"),
            delimiter,
            keep_colon,
            exclude_adjacent_star,
        }
    }

    /// 扫描全文，收集本规则的所有修复点
    ///
    /// 手动推进扫描位置：被星号排除的候选仅跳过其起始定界符（+1），
    /// 与被排除候选重叠的后续合法匹配仍能被找到，等价于环视语义
    fn find_sites(&self, text: &str) -> Vec<FixSite> {
        let mut sites = Vec::new();
        let mut pos = 0;

        while let Some(caps) = self.pattern.captures_at(text, pos) {
            let Some(m) = caps.get(0) else { break };
            let Some(inner) = caps.get(1) else { break };

            if self.exclude_adjacent_star && touches_adjacent_star(text, m.start(), m.end()) {
                // 定界符为 ASCII，+1 必为合法字符边界
                pos = m.start() + 1;
                continue;
            }

            sites.push(FixSite {
                start: m.start(),
                end: m.end(),
                replacement: self.render(inner.as_str()),
                kind: self.kind,
            });
            pos = m.end();
        }

        sites
    }

    /// 渲染规范化输出
    fn render(&self, inner: &str) -> String {
        if self.keep_colon {
            format!("{}{}:{}", self.delimiter, inner, self.delimiter)
        } else {
            format!("{}{}{}", self.delimiter, inner, self.delimiter)
        }
    }
}

/// 成对扫描 `**`，收集两条粗体规则的修复点
///
/// 先按出现顺序枚举全部 `**` 记号。紧跟非空白非星号字符的记号才算开启
/// 定界符；为开启记号寻找闭合时跳过同样像开启记号的 `**`（"**a: **b:**"
/// 中 b 的开启记号不得闭合 a）。内部含星号或换行的配对无效，从下一个
/// 记号重新扫描；配对成立后两个记号一并消耗，闭合记号不会再被复用。
fn paired_bold_sites(text: &str) -> Vec<FixSite> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut k = 0;
    while k + 1 < bytes.len() {
        if bytes[k] == b'*' && bytes[k + 1] == b'*' {
            tokens.push(k);
            k += 2;
        } else {
            k += 1;
        }
    }

    // 记号后紧跟非空白非星号字节时视为开启定界符（多字节字符首字节 >= 0x80）
    let opens = |start: usize| match bytes.get(start + 2) {
        Some(&c) => !matches!(c, b' ' | b'\t' | b'\n' | b'*'),
        None => false,
    };

    let mut sites = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if !opens(tokens[i]) {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < tokens.len() && opens(tokens[j]) {
            j += 1;
        }
        if j == tokens.len() {
            // 无可用闭合记号，下一个记号可能才是真正的开启定界符
            i += 1;
            continue;
        }
        let inner = &text[tokens[i] + 2..tokens[j]];
        if inner.contains('*') || inner.contains('\n') {
            i += 1;
            continue;
        }
        if let Some((kind, replacement)) = normalize_bold_inner(inner) {
            sites.push(FixSite {
                start: tokens[i],
                end: tokens[j] + 2,
                replacement,
                kind,
            });
        }
        i = j + 1;
    }

    sites
}

/// 规范化粗体配对的内部文本
///
/// 带冒号变体：内部以「冒号 + 至少一个空格」结尾；
/// 无冒号变体：内部不含冒号且以空格结尾。
/// 冒号在中间（如 "**a: b **"）不属于任何规则，保持原样
fn normalize_bold_inner(inner: &str) -> Option<(RuleKind, String)> {
    let core = inner.trim_end_matches(|c| c == ' ' || c == '\t');
    if core.len() == inner.len() || core.is_empty() {
        return None;
    }
    if let Some(label) = core.strip_suffix(':') {
        if label.is_empty() {
            return None;
        }
        Some((RuleKind::BoldColon, format!("**{}:**", label)))
    } else if !core.contains(':') {
        Some((RuleKind::Bold, format!("**{}**", core)))
    } else {
        None
    }
}

/// 判断匹配区间是否与相邻星号构成 ** 序列
///
/// start/end 来自正则匹配，必为字符边界；`*` 为单字节 ASCII，
/// 直接按字节比较即可
fn touches_adjacent_star(text: &str, start: usize, end: usize) -> bool {
    let bytes = text.as_bytes();
    let star_before = start > 0 && bytes[start - 1] == b'*';
    let star_after = end < bytes.len() && bytes[end] == b'*';
    star_before || star_after
}
