mod app;

use app::{app_router, AppState, RateLimiter};
use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use userdesk_core::{
    Authenticator, BcryptHasher, CredentialStore, FileStore, JwtIssuer, MemoryAttemptTracker,
    MemoryStore, PasswordHasher, TokenIssuer, UserManager, WriteOutcome,
};

/// 启动时写入的初始账号
#[derive(Debug, Clone)]
struct AdminSeed {
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Clone)]
struct ApiConfig {
    bind: SocketAddr,
    /// 为空时使用内存存储
    data_dir: Option<PathBuf>,
    /// JWT 签名密钥
    jwt_secret: String,
    /// JWT iss
    jwt_issuer: String,
    /// JWT aud
    jwt_audience: String,
    token_ttl_secs: i64,
    bcrypt_cost: Option<u32>,
    login_max_attempts: u32,
    login_window_secs: i64,
    login_ip_limit: usize,
    /// 只有部署在反向代理之后才应开启，否则客户端可伪造 IP 绕过限流
    trust_proxy_headers: bool,
    /// CORS 允许的来源列表（空则允许所有）
    cors_origins: Vec<String>,
    admin: Option<AdminSeed>,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl ApiConfig {
    fn from_env() -> Self {
        let bind = env_parse("UD_BIND")
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));

        let data_dir = env_non_empty("UD_DATA_DIR").map(PathBuf::from);

        let jwt_secret = env_non_empty("UD_JWT_SECRET").unwrap_or_else(|| {
            info!("UD_JWT_SECRET not set; generating a random secret for this run");
            uuid::Uuid::new_v4().to_string()
        });
        let jwt_issuer = env::var("UD_JWT_ISSUER").unwrap_or_else(|_| "userdesk-api".into());
        let jwt_audience =
            env::var("UD_JWT_AUDIENCE").unwrap_or_else(|_| "userdesk-clients".into());

        // CORS 允许的来源，逗号分隔；空或 "*" 表示允许所有
        let cors_origins = env::var("UD_CORS_ORIGINS")
            .ok()
            .map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() || trimmed == "*" {
                    vec![]
                } else {
                    trimmed
                        .split(',')
                        .filter(|t| !t.trim().is_empty())
                        .map(|t| t.trim().to_string())
                        .collect()
                }
            })
            .unwrap_or_default();

        let admin = match (
            env_non_empty("UD_ADMIN_EMAIL"),
            env_non_empty("UD_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: env_non_empty("UD_ADMIN_NAME").unwrap_or_else(|| "Admin".into()),
                email,
                password,
            }),
            _ => None,
        };

        Self {
            bind,
            data_dir,
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            token_ttl_secs: env_parse("UD_TOKEN_TTL_SECS").unwrap_or(24 * 3600),
            bcrypt_cost: env_parse("UD_BCRYPT_COST"),
            login_max_attempts: env_parse("UD_LOGIN_MAX_ATTEMPTS").unwrap_or(5),
            login_window_secs: env_parse("UD_LOGIN_WINDOW_SECS").unwrap_or(30 * 60),
            login_ip_limit: env_parse("UD_LOGIN_IP_LIMIT").unwrap_or(30),
            trust_proxy_headers: env_non_empty("UD_TRUST_PROXY_HEADERS")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            cors_origins,
            admin,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 优先读取 .env（若存在）
    let _ = dotenv();
    init_tracing();

    let config = ApiConfig::from_env();
    info!("starting API on {}", config.bind);

    let store: Arc<dyn CredentialStore> = match &config.data_dir {
        Some(dir) => {
            let store = FileStore::new(dir);
            store.ensure_dirs()?;
            info!(data_dir = %dir.display(), "using file store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("UD_DATA_DIR not set; users are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let hasher: Arc<dyn PasswordHasher> = Arc::new(match config.bcrypt_cost {
        Some(cost) => BcryptHasher::with_cost(cost),
        None => BcryptHasher::default(),
    });

    let tokens: Arc<dyn TokenIssuer> = Arc::new(
        JwtIssuer::new(config.jwt_secret.clone())
            .with_claims_context(config.jwt_issuer.clone(), config.jwt_audience.clone())
            .with_ttl(config.token_ttl_secs),
    );

    let attempts = Arc::new(MemoryAttemptTracker::new(chrono::Duration::seconds(
        config.login_window_secs,
    )));

    let users = Arc::new(UserManager::new(store.clone(), hasher.clone()));
    let auth = Arc::new(
        Authenticator::new(store, hasher, tokens.clone(), attempts)
            .with_max_attempts(config.login_max_attempts),
    );

    if let Some(admin) = &config.admin {
        seed_admin(&users, admin).await?;
    }

    let login_limiter = Arc::new(RateLimiter::new(
        config.login_ip_limit,
        Duration::from_secs(60),
    ));

    let state = AppState {
        users,
        auth,
        tokens,
        login_limiter,
        trust_proxy_headers: config.trust_proxy_headers,
    };

    let app = app_router(state, config.cors_origins.clone());
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// 初始账号不存在时创建
async fn seed_admin(users: &UserManager, admin: &AdminSeed) -> anyhow::Result<()> {
    if users.email_is_registered(&admin.email).await? {
        info!(email = %admin.email, "admin account already present");
        return Ok(());
    }

    match users
        .create_user(&admin.name, &admin.email, &admin.password)
        .await?
    {
        WriteOutcome::Written(user) => {
            info!(user_id = %user.id, email = %user.email, "seeded admin account")
        }
        WriteOutcome::NotFound | WriteOutcome::Failed => {
            anyhow::bail!("failed to seed admin account {}", admin.email)
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

fn init_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
