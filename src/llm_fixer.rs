// src/llm_fixer.rs
//
// LLM 修复策略模块
//
// 基于 Claude 客户端，把整篇文档交给模型重写
// 与本地规则引擎同名同契约（fix_patterns），调用方可二选一

use crate::claude_client::{ClaudeClient, ClaudeClientConfig, FixError};
use crate::config::AppConfig;

/// 修复指令（沿用线上部署的韩文提示词，不做本地化）
pub const FIX_SYSTEM_PROMPT: &str = "옵시디안에서 읽을 마크다운 문서를 깔끔하게 정리해주세요.

문제: 볼드(**)나 이탤릭(*)처리에서 띄어쓰기가 잘못 들어가 서식이 제대로 작동하지 않습니다.
해결: 닫는 기호 앞의 불필요한 공백을 제거하고, 이탤릭은 볼드로 통일해주세요.

수정된 마크다운만 출력하세요. 설명 없이, 줄 구조 그대로 유지.";

/// LLM 修复器
///
/// 失败时调用方保留原文档，不做部分写入
#[derive(Clone)]
pub struct LlmFixer {
    client: ClaudeClient,
    config: AppConfig,
}

impl LlmFixer {
    /// 创建新的修复器实例
    pub fn new(config: AppConfig) -> Self {
        let client_config = ClaudeClientConfig::new(
            &config.endpoint,
            &config.api_key,
            &config.model,
            config.max_tokens,
        );
        let client = ClaudeClient::new(client_config);

        Self { client, config }
    }

    /// 修复 Markdown 格式问题
    ///
    /// 校验在任何网络活动之前完成：配置缺失或输入为空直接返回错误
    ///
    /// # Arguments
    /// * `text` - 完整的 Markdown 文档文本
    ///
    /// # Returns
    /// * 模型重写后的文档全文
    pub async fn fix_patterns(&self, text: &str) -> Result<String, FixError> {
        if !self.config.is_valid() {
            return Err(FixError::MissingApiKey);
        }
        if text.trim().is_empty() {
            return Err(FixError::EmptyInput);
        }

        tracing::info!(
            "LLM 修复请求: model={}, 文档长度={}",
            self.config.model,
            text.len()
        );

        let completion = self.client.complete(FIX_SYSTEM_PROMPT, text).await?;
        Ok(completion.text)
    }
}
