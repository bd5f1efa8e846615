use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use dialoguer::{Confirm, console::Term};
use tracing::debug;

mod client;
mod render;

use client::AdminClient;

#[derive(Parser)]
#[command(name = "soulnote-admin", about = "星语心笺管理员控制台", disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[arg(long, env = "ADMIN_KEY", hide_env_values = true)]
    admin_key: Option<String>,

    #[arg(long, env = "PORT", default_value_t = 4000)]
    port: u16,

    /// Overrides `http://localhost:{PORT}/api/admin`.
    #[arg(long, env = "SOULNOTE_ADMIN_URL")]
    url: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// 获取系统统计信息
    Stats,
    /// 列出所有邀请码
    ListCodes,
    /// 生成新邀请码
    GenerateCode {
        prefix: Option<String>,
        max_uses: Option<String>,
    },
    /// 删除邀请码
    DeleteCode { code: Option<String> },
    /// 获取事件统计
    EventStats,
    /// 显示帮助信息
    Help,
}

/// Parse one interactive line the same way as the command line.
fn parse_line(line: &str) -> Result<Command, clap::Error> {
    let words = std::iter::once("soulnote-admin").chain(line.split_whitespace());
    Cli::try_parse_from(words)?
        .command
        .ok_or_else(|| clap::Error::new(clap::error::ErrorKind::MissingSubcommand))
}

/// `parseInt`-style: leading digits, else the default of 100.
fn max_uses_arg(raw: Option<&str>) -> i64 {
    raw.map(|r| r.chars().take_while(char::is_ascii_digit).collect::<String>())
        .and_then(|digits| digits.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(100)
}

async fn run(client: &AdminClient, command: Command, interactive: bool) {
    let result = match command {
        Command::Stats => client.dashboard().await.map(|d| render::dashboard(&d)),
        Command::ListCodes => client
            .dashboard()
            .await
            .map(|d| render::codes(&d.invite_code_stats)),
        Command::GenerateCode { prefix, max_uses } => client
            .generate_code(prefix.as_deref(), max_uses_arg(max_uses.as_deref()))
            .await
            .map(|code| format!("\n邀请码生成成功: {code}")),
        Command::DeleteCode { code: None } => Ok("请提供要删除的邀请码".to_string()),
        Command::DeleteCode { code: Some(code) } => {
            if interactive && !confirm_delete(&code).await {
                return;
            }
            client
                .delete_code(&code)
                .await
                .map(|()| format!("\n邀请码 {code} 删除成功"))
        }
        Command::EventStats => client.event_analytics().await.map(|a| render::analytics(&a)),
        Command::Help => Ok(render::HELP.to_string()),
    };
    match result {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("操作失败: {e}"),
    }
}

async fn confirm_delete(code: &str) -> bool {
    let prompt = format!("确定删除邀请码 {code}?");
    tokio::task::spawn_blocking(move || Confirm::new().with_prompt(prompt).default(false).interact())
        .await
        .ok()
        .and_then(Result::ok)
        .unwrap_or(false)
}

async fn read_line() -> Option<String> {
    tokio::task::spawn_blocking(|| {
        let term = Term::stdout();
        term.write_str("\n> ").ok()?;
        term.read_line().ok()
    })
    .await
    .ok()
    .flatten()
}

async fn interactive(client: &AdminClient) {
    println!("欢迎使用星语心笺管理员控制台 (输入\"help\"获取帮助，\"exit\"退出)");
    while let Some(line) = read_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line.to_lowercase().as_str(), "exit" | "quit") {
            println!("再见！");
            break;
        }
        match parse_line(line) {
            Ok(command) => run(client, command, true).await,
            Err(e) => {
                debug!(error = %e, "Unrecognised command");
                println!("未知命令: {}，输入\"help\"获取帮助", line.split_whitespace().next().unwrap_or(line));
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    utils::logging::init(false, Some("warn"));

    let Some(admin_key) = cli.admin_key.filter(|k| !k.is_empty()) else {
        bail!("错误: 未设置管理员密钥(ADMIN_KEY)");
    };
    let base_url = cli
        .url
        .unwrap_or_else(|| format!("http://localhost:{}/api/admin", cli.port));
    let client = AdminClient::new(base_url, admin_key).context("failed to build HTTP client")?;

    match cli.command {
        Some(command) => run(&client, command, false).await,
        None => interactive(&client).await,
    }
    Ok(())
}
