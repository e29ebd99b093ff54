// src/claude_client.rs
//
// Anthropic Messages API 客户端
//
// 提供单轮文本补全调用，响应在网络边界一次性解码为类型化结构，
// 错误按类别返回（上层据此保证失败时原文档不变）

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// 常量
// ============================================================================

/// Anthropic Messages API 默认端点
pub const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// API 版本号（随请求头发送）
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// 默认模型
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

// ============================================================================
// 错误类型定义
// ============================================================================

/// 修复请求错误分类
#[derive(Debug, thiserror::Error)]
pub enum FixError {
    /// 未配置 API Key
    #[error("未配置 API Key，请先通过 config --api-key 设置")]
    MissingApiKey,
    /// 输入文档为空
    #[error("输入文档为空，没有可修复的内容")]
    EmptyInput,
    /// 网络传输失败（连接、超时、DNS 等）
    #[error("网络请求失败: {0}")]
    Transport(#[from] reqwest::Error),
    /// 服务端返回非成功状态
    #[error("API 请求失败 ({status}): {message}")]
    Upstream { status: u16, message: String },
    /// 响应体无法按预期结构解析
    #[error("API 返回格式不可解析: {0}")]
    MalformedResponse(String),
}

// ============================================================================
// 请求 / 响应结构
// ============================================================================

/// 成功响应中的内容块
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// token 用量统计
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UsageStats {
    /// 输入 token 数
    #[serde(default)]
    pub input_tokens: u64,
    /// 输出 token 数
    #[serde(default)]
    pub output_tokens: u64,
}

/// Messages API 成功响应体
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<UsageStats>,
}

/// Messages API 错误响应体
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type", default)]
    error_type: String,
    #[serde(default)]
    message: String,
}

/// 一次补全调用的结果
#[derive(Debug, Clone)]
pub struct Completion {
    /// 模型输出文本
    pub text: String,
    /// token 用量（服务端未返回时为 None）
    pub usage: Option<UsageStats>,
}

// ============================================================================
// 客户端配置
// ============================================================================

/// Claude API 客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeClientConfig {
    /// API 端点
    pub endpoint: String,
    /// API Key
    pub api_key: String,
    /// 模型名称
    pub model: String,
    /// 最大生成 token 数
    pub max_tokens: u32,
}

impl ClaudeClientConfig {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
        }
    }
}

// ============================================================================
// Claude 客户端
// ============================================================================

/// Anthropic Messages API 客户端
#[derive(Clone)]
pub struct ClaudeClient {
    config: ClaudeClientConfig,
    client: Client,
}

impl ClaudeClient {
    /// 创建新的客户端实例
    pub fn new(config: ClaudeClientConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .no_proxy()
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    /// 单轮文本补全
    ///
    /// # Arguments
    /// * `system_prompt` - 系统指令
    /// * `user_message` - 用户消息（待处理的文档全文）
    ///
    /// # Returns
    /// * 模型输出文本与 token 用量
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<Completion, FixError> {
        let request_body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "system": system_prompt,
            "messages": [
                { "role": "user", "content": user_message }
            ]
        });

        tracing::debug!(
            "Claude 请求: endpoint={}, model={}, max_tokens={}",
            self.config.endpoint,
            self.config.model,
            self.config.max_tokens
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        decode_response(status, &body)
    }
}

/// 在网络边界一次性解码响应
fn decode_response(status: u16, body: &str) -> Result<Completion, FixError> {
    if !(200..300).contains(&status) {
        return Err(upstream_error(status, body));
    }

    let payload: MessagesResponse =
        serde_json::from_str(body).map_err(|e| FixError::MalformedResponse(e.to_string()))?;

    let text = payload
        .content
        .iter()
        .find(|block| block.block_type == "text")
        .and_then(|block| block.text.as_deref());

    match text {
        Some(text) => Ok(Completion {
            text: text.to_string(),
            usage: payload.usage,
        }),
        None => Err(FixError::MalformedResponse(
            "响应 content 中没有 text 块".to_string(),
        )),
    }
}

/// 将非成功响应映射为上游错误
///
/// 优先提取结构化错误消息，提取不到时退回原始响应体
fn upstream_error(status: u16, body: &str) -> FixError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| format!("{}: {}", b.error.error_type, b.error.message))
        .unwrap_or_else(|_| body.trim().to_string());

    FixError::Upstream { status, message }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn test_config_creation() {
        let config = ClaudeClientConfig::new(
            CLAUDE_API_URL,
            "sk-ant-xxx",
            DEFAULT_MODEL,
            4096,
        );
        assert_eq!(config.endpoint, "https://api.anthropic.com/v1/messages");
        assert_eq!(config.api_key, "sk-ant-xxx");
        assert_eq!(config.model, "claude-3-haiku-20240307");
        assert_eq!(config.max_tokens, 4096);
    }

    #[test]
    fn test_decode_success_response() {
        let body = r#"{
            "content": [{"type": "text", "text": "**修复:** 完成"}],
            "usage": {"input_tokens": 120, "output_tokens": 45}
        }"#;

        let completion = decode_response(200, body).expect("should decode");
        assert_eq!(completion.text, "**修复:** 完成");
        let usage = completion.usage.expect("usage present");
        assert_eq!(usage.input_tokens, 120);
        assert_eq!(usage.output_tokens, 45);
    }

    #[test]
    fn test_decode_response_without_usage() {
        let body = r#"{"content": [{"type": "text", "text": "ok"}]}"#;

        let completion = decode_response(200, body).expect("should decode");
        assert_eq!(completion.text, "ok");
        assert!(completion.usage.is_none());
    }

    #[test]
    fn test_decode_missing_text_block() {
        let body = r#"{"content": [{"type": "tool_use"}]}"#;

        let err = decode_response(200, body).expect_err("should fail");
        assert!(matches!(err, FixError::MalformedResponse(_)));
    }

    #[test]
    fn test_decode_invalid_json() {
        let err = decode_response(200, "not json at all").expect_err("should fail");
        assert!(matches!(err, FixError::MalformedResponse(_)));
    }

    #[test]
    fn test_upstream_error_with_structured_body() {
        let body = r#"{"error": {"type": "invalid_request_error", "message": "max_tokens required"}}"#;

        let err = decode_response(400, body).expect_err("should fail");
        match err {
            FixError::Upstream { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("invalid_request_error"));
                assert!(message.contains("max_tokens required"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_upstream_error_with_raw_body() {
        let err = decode_response(502, "Bad Gateway\n").expect_err("should fail");
        match err {
            FixError::Upstream { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    /// 启动一次性本地 HTTP 服务，返回固定响应后关闭连接
    async fn spawn_one_shot_server(status_line: &'static str, body: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind local listener");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_complete_success_roundtrip() {
        let endpoint = spawn_one_shot_server(
            "200 OK",
            r#"{"content": [{"type": "text", "text": "fixed"}], "usage": {"input_tokens": 3, "output_tokens": 1}}"#,
        )
        .await;

        let client = ClaudeClient::new(ClaudeClientConfig::new(endpoint, "test-key", DEFAULT_MODEL, 64));
        let completion = client
            .complete("prompt", "document")
            .await
            .expect("should succeed");
        assert_eq!(completion.text, "fixed");
    }

    #[tokio::test]
    async fn test_complete_server_error_is_upstream() {
        let endpoint = spawn_one_shot_server(
            "500 Internal Server Error",
            r#"{"error": {"type": "api_error", "message": "overloaded"}}"#,
        )
        .await;

        let client = ClaudeClient::new(ClaudeClientConfig::new(endpoint, "test-key", DEFAULT_MODEL, 64));
        let err = client
            .complete("prompt", "document")
            .await
            .expect_err("should fail");
        match err {
            FixError::Upstream { status, message } => {
                assert_eq!(status, 500);
                assert!(message.contains("overloaded"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_connection_refused_is_transport() {
        // 绑定后立即释放端口，保证连接被拒绝
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind local listener");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let client = ClaudeClient::new(ClaudeClientConfig::new(
            format!("http://{}", addr),
            "test-key",
            DEFAULT_MODEL,
            64,
        ));
        let err = client
            .complete("prompt", "document")
            .await
            .expect_err("should fail");
        assert!(matches!(err, FixError::Transport(_)));
    }
}
