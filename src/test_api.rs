// API 测试工具 - 独立测试 Claude 修复接口
use anyhow::Result;

use markdown_format_fixer_lib::claude_client::{ClaudeClient, ClaudeClientConfig};
use markdown_format_fixer_lib::config::AppConfig;
use markdown_format_fixer_lib::fixer::fix_patterns;
use markdown_format_fixer_lib::llm_fixer::FIX_SYSTEM_PROMPT;

/// 内置示例文档（覆盖各类格式错误与围栏代码块）
const SAMPLE_DOCUMENT: &str = "# 格式测试

*标题: * 示例文档
**状态: ** 草稿
_作者: _ 匿名
`版本 ` 0.1

```
*围栏内: * 保持原样
```

正文中的 *强调 * 与 `代码: ` 混排。
";

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt::init();

    println!("=== Claude 修复 API 测试工具 ===\n");

    // 1. 获取 API Key：环境变量 → 配置文件 → 手动输入
    let mut config = AppConfig::load()?;
    if let Ok(key) = std::env::var("CLAUDE_API_KEY") {
        if !key.trim().is_empty() {
            config.api_key = key.trim().to_string();
        }
    }
    if !config.is_valid() {
        println!("请输入 Anthropic API Key:");
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        config.api_key = input.trim().to_string();
    }
    if !config.is_valid() {
        anyhow::bail!("API Key 不能为空");
    }

    println!("✓ API Key: {}\n", config.masked_api_key());

    // 2. 获取测试文档
    println!("请输入 Markdown 文件路径 (留空使用内置示例):");
    let mut path_input = String::new();
    std::io::stdin().read_line(&mut path_input)?;
    let path_input = path_input.trim();

    let document = if path_input.is_empty() {
        println!("✓ 使用内置示例文档\n");
        SAMPLE_DOCUMENT.to_string()
    } else {
        let content = tokio::fs::read_to_string(path_input).await?;
        println!("✓ 文件大小: {} 字符\n", content.chars().count());
        content
    };

    // 3. 发送请求
    println!("正在调用 Claude API (model={})...", config.model);
    let client = ClaudeClient::new(ClaudeClientConfig::new(
        &config.endpoint,
        &config.api_key,
        &config.model,
        config.max_tokens,
    ));
    let completion = client.complete(FIX_SYSTEM_PROMPT, &document).await?;
    println!("✓ 调用成功\n");

    // 4. 输出修复结果
    println!("📝 修复结果:");
    println!("─────────────────────────────────");
    println!("{}", completion.text);
    println!("─────────────────────────────────\n");

    // 5. 与本地规则引擎对比
    let local = fix_patterns(&document);
    if completion.text.trim() == local.text.trim() {
        println!("✅ 与本地规则引擎结果一致 (本地修复 {} 处)", local.count);
    } else {
        println!("⚠️ 与本地规则引擎结果不一致 (本地修复 {} 处)", local.count);
        println!(
            "   LLM 输出 {} 行, 本地输出 {} 行",
            completion.text.trim().lines().count(),
            local.text.trim().lines().count()
        );
    }

    // 6. token 用量
    if let Some(usage) = completion.usage {
        println!("\n📈 token 用量:");
        println!("   输入: {}", usage.input_tokens);
        println!("   输出: {}", usage.output_tokens);
    }

    Ok(())
}
