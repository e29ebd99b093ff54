//! Markdown 格式修复层
//!
//! 确定性修复 Markdown 强调与行内代码的错误空格，处理流程：
//! 1. 屏蔽围栏代码块（替换为带索引的占位符）
//! 2. 按固定优先级顺序应用重写规则（粗体 → 斜体 → 行内代码）
//! 3. 还原代码块（逐字节恢复原始内容）
//!
//! 整条流水线为纯函数：相同输入永远产生相同输出，失败不可能发生

mod engine;
mod rules;
mod shield;
mod types;

pub use engine::{fix_patterns, FixEngine};
pub use types::{AppliedFix, FixResult, RuleKind};
