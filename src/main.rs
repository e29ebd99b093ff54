// src/main.rs
//
// markdown-format-fixer 命令行入口
//
// fix：修复文件 / stdin / 剪贴板中的 Markdown 格式
// config：查看或修改持久化配置

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use arboard::Clipboard;
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use markdown_format_fixer_lib::config::AppConfig;
use markdown_format_fixer_lib::fixer::fix_patterns;
use markdown_format_fixer_lib::llm_fixer::LlmFixer;

#[derive(Debug, Parser)]
#[command(name = "markdown-format-fixer", version, about = "Markdown 强调格式修复工具")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 修复文档中的强调与行内代码格式
    Fix(FixCommand),
    /// 查看或修改配置
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
struct FixCommand {
    /// 输入文件（省略时从 stdin 读取）
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    file: Option<PathBuf>,
    /// 将结果写回输入文件（默认输出到 stdout）
    #[arg(long, action = ArgAction::SetTrue, requires = "file")]
    write: bool,
    /// 从剪贴板读取并将结果写回剪贴板
    #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["file", "write"])]
    clipboard: bool,
    /// 使用 LLM 修复（默认使用本地规则引擎）
    #[arg(long, action = ArgAction::SetTrue)]
    llm: bool,
    /// 输出每处修复的明细
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct ConfigCommand {
    /// 设置 Anthropic API Key
    #[arg(long = "api-key", value_name = "KEY")]
    api_key: Option<String>,
    /// 设置模型名称
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,
    /// 显示当前配置（API Key 掩码显示）
    #[arg(long, action = ArgAction::SetTrue)]
    show: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Fix(cmd) => handle_fix(cmd).await,
        Command::Config(cmd) => handle_config(cmd),
    }
}

async fn handle_fix(cmd: FixCommand) -> Result<()> {
    let input = read_input(&cmd)?;

    let output = if cmd.llm {
        let config = AppConfig::load()?;
        let fixer = LlmFixer::new(config);
        match fixer.fix_patterns(&input).await {
            Ok(text) => {
                eprintln!("✓ LLM 修复完成");
                text
            }
            Err(e) => {
                // 任何失败都不产生输出，原文档保持不变
                anyhow::bail!("LLM 修复失败，文档未修改: {}", e);
            }
        }
    } else {
        let result = fix_patterns(&input);
        if result.count > 0 {
            eprintln!("✓ 修复了 {} 处格式问题", result.count);
        } else {
            eprintln!("没有需要修复的内容");
        }
        if cmd.verbose {
            for fix in &result.applied {
                eprintln!(
                    "  [{}] {:?} -> {:?}",
                    fix.rule.display_name(),
                    fix.original,
                    fix.replaced
                );
            }
        }
        result.text
    };

    write_output(&cmd, &output)
}

/// 按优先级读取输入：剪贴板 → 文件 → stdin
fn read_input(cmd: &FixCommand) -> Result<String> {
    if cmd.clipboard {
        let mut clipboard = Clipboard::new().context("打开剪贴板失败")?;
        return clipboard.get_text().context("读取剪贴板文本失败");
    }

    match &cmd.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("读取 {} 失败", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("从 stdin 读取失败")?;
            Ok(buf)
        }
    }
}

fn write_output(cmd: &FixCommand, output: &str) -> Result<()> {
    if cmd.clipboard {
        let mut clipboard = Clipboard::new().context("打开剪贴板失败")?;
        clipboard
            .set_text(output.to_string())
            .context("写入剪贴板失败")?;
        eprintln!("✓ 结果已写回剪贴板");
        return Ok(());
    }

    match (&cmd.file, cmd.write) {
        (Some(path), true) => {
            std::fs::write(path, output)
                .with_context(|| format!("写入 {} 失败", path.display()))?;
            eprintln!("✓ 结果已写回 {}", path.display());
        }
        _ => {
            // 文档自带换行结构，按原样输出
            print!("{}", output);
        }
    }
    Ok(())
}

fn handle_config(cmd: ConfigCommand) -> Result<()> {
    let mut config = AppConfig::load()?;
    let mut changed = false;

    if let Some(api_key) = cmd.api_key {
        config.api_key = api_key.trim().to_string();
        changed = true;
    }
    if let Some(model) = cmd.model {
        config.model = model.trim().to_string();
        changed = true;
    }

    if changed {
        config.save()?;
        eprintln!("✓ 配置已保存");
    }

    if cmd.show || !changed {
        println!("api_key: {}", config.masked_api_key());
        println!("model: {}", config.model);
        println!("max_tokens: {}", config.max_tokens);
        println!("endpoint: {}", config.endpoint);
    }
    Ok(())
}
