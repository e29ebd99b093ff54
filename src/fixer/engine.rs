//! 修复主引擎
//!
//! 组合三段流水线：屏蔽代码块 → 顺序应用重写规则 → 还原代码块

use crate::fixer::rules::RewriteRule;
use crate::fixer::shield::{restore_code_blocks, shield_code_blocks};
use crate::fixer::types::{AppliedFix, FixResult};

lazy_static::lazy_static! {
    /// 进程级共享引擎
    ///
    /// 规则表只编译一次；引擎无内部可变状态，可跨线程只读共享
    static ref SHARED_ENGINE: FixEngine = FixEngine::new();
}

/// 使用进程级共享引擎修复文本
///
/// 与 `FixEngine::fix_patterns` 等价，适合无需自持引擎的调用方
pub fn fix_patterns(text: &str) -> FixResult {
    SHARED_ENGINE.fix_patterns(text)
}

/// 修复引擎（可复用，预编译规则）
pub struct FixEngine {
    /// 重写规则表（顺序即执行顺序）
    rules: Vec<RewriteRule>,
}

impl FixEngine {
    /// 创建修复引擎
    pub fn new() -> Self {
        Self {
            rules: RewriteRule::table(),
        }
    }

    /// 修复 Markdown 格式问题
    ///
    /// 纯函数，不可失败：任何输入（空文本、未闭合围栏、病态空白）
    /// 都产生确定的结果；围栏代码块内容逐字节保留
    ///
    /// # Arguments
    /// * `text` - 完整的 Markdown 文档文本
    ///
    /// # Returns
    /// * 修复后的文本、修复计数与逐项修复记录
    pub fn fix_patterns(&self, text: &str) -> FixResult {
        if text.is_empty() {
            return FixResult::unchanged(String::new());
        }

        // 1. 屏蔽代码块
        let (shielded, blocks) = shield_code_blocks(text);

        // 2. 按优先级顺序应用规则，每条规则在上一条的输出上扫描
        let mut current = shielded;
        let mut applied = Vec::new();
        for rule in &self.rules {
            let (next, fixes) = apply_rule(&current, rule);
            current = next;
            applied.extend(fixes);
        }

        // 3. 还原代码块
        let restored = restore_code_blocks(&current, &blocks);

        FixResult {
            text: restored,
            count: applied.len(),
            applied,
        }
    }
}

impl Default for FixEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 应用单条规则
///
/// 先收集全部修复点，再按游标一次性拼接输出与记录
fn apply_rule(text: &str, rule: &RewriteRule) -> (String, Vec<AppliedFix>) {
    let sites = rule.find_sites(text);
    if sites.is_empty() {
        return (text.to_string(), Vec::new());
    }

    let mut result = String::with_capacity(text.len());
    let mut fixes = Vec::with_capacity(sites.len());
    let mut last_end = 0;

    for site in sites {
        // 添加修复点之前的文本
        result.push_str(&text[last_end..site.start]);
        result.push_str(&site.replacement);
        fixes.push(AppliedFix {
            original: text[site.start..site.end].to_string(),
            replaced: site.replacement,
            rule: site.kind,
        });
        last_end = site.end;
    }

    // 添加剩余文本
    result.push_str(&text[last_end..]);

    (result, fixes)
}
