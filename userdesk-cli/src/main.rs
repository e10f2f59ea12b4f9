mod client;
mod ops;

use clap::{Parser, Subcommand};
use ops::{
    change_password, create_user, delete_user, get_user, list_users, login, update_user,
    ListOptions, OutputFormat,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI wrapper around the Userdesk HTTP API.
#[derive(Parser)]
#[command(name = "userdesk-cli", author, version, about = "CLI for Userdesk API")]
struct Cli {
    /// API base url (including the /api prefix)
    #[arg(long, env = "UD_API_BASE", default_value = "http://127.0.0.1:8080/api")]
    api_base: String,

    /// Bearer token for authentication
    #[arg(long, env = "UD_TOKEN")]
    token: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    // ==================== 认证 ====================
    /// 登录，获取 token
    Login {
        #[arg(long, short)]
        email: String,
        #[arg(long, short)]
        password: String,
    },

    // ==================== 用户管理 ====================
    /// 用户管理命令
    #[command(subcommand)]
    User(UserCommands),
}

#[derive(Subcommand)]
enum UserCommands {
    /// 分页列出用户
    List {
        #[arg(long)]
        page_number: Option<u64>,
        #[arg(long)]
        page_size: Option<u64>,
        /// 排序，格式 field:asc|desc（field: id, name, email）
        #[arg(long)]
        sort: Option<String>,
        /// 搜索，格式 field:term；只写 term 时按 email 搜索
        #[arg(long)]
        search: Option<String>,
    },
    /// 获取用户详情
    Get { id: String },
    /// 创建用户
    Create {
        #[arg(long, short)]
        name: String,
        #[arg(long, short)]
        email: String,
        #[arg(long, short)]
        password: String,
    },
    /// 更新用户资料
    Update {
        id: String,
        #[arg(long, short)]
        name: String,
        #[arg(long, short)]
        email: String,
    },
    /// 删除用户
    Delete { id: String },
    /// 修改密码
    Password {
        id: String,
        /// 当前密码
        #[arg(long)]
        old: String,
        /// 新密码
        #[arg(long)]
        new: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载 .env 文件（如果存在），忽略错误
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = Cli::parse();
    let client = client::build_client(&cli.token)?;
    let base = cli.api_base.trim_end_matches('/');

    match cli.command {
        Commands::Login { email, password } => {
            login(&client, base, &email, &password, cli.output).await?;
        }
        Commands::User(user_cmd) => match user_cmd {
            UserCommands::List {
                page_number,
                page_size,
                sort,
                search,
            } => {
                let options = ListOptions {
                    page_number,
                    page_size,
                    sort,
                    search,
                };
                list_users(&client, base, &options, cli.output).await?
            }
            UserCommands::Get { id } => get_user(&client, base, &id, cli.output).await?,
            UserCommands::Create {
                name,
                email,
                password,
            } => create_user(&client, base, &name, &email, &password, cli.output).await?,
            UserCommands::Update { id, name, email } => {
                update_user(&client, base, &id, &name, &email, cli.output).await?
            }
            UserCommands::Delete { id } => delete_user(&client, base, &id, cli.output).await?,
            UserCommands::Password { id, old, new } => {
                change_password(&client, base, &id, &old, &new, cli.output).await?
            }
        },
    }

    Ok(())
}

fn init_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clap_parses_user_list_flags() {
        let cli = Cli::parse_from([
            "ud",
            "--output",
            "json",
            "user",
            "list",
            "--page-number",
            "2",
            "--sort",
            "email:desc",
        ]);
        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::User(UserCommands::List {
                page_number, sort, ..
            }) => {
                assert_eq!(page_number, Some(2));
                assert_eq!(sort.as_deref(), Some("email:desc"));
            }
            _ => panic!("expected user list"),
        }
    }

    #[test]
    fn clap_parses_login() {
        let cli = Cli::parse_from(["ud", "login", "-e", "acep@test.com", "-p", "secret123"]);
        assert!(matches!(cli.command, Commands::Login { .. }));
    }
}
