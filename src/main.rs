//! SMARTBASH 客户端命令行入口
//! 登录、登出、查看会话、手动刷新以及发送带认证的 GET 请求

use smartbash_client::{
    auth::TracingNavigator,
    client::ApiClient,
    config::ClientConfig,
    models::LoginRequest,
    services::AuthService,
    session::{CookieSessionStore, SessionStore},
    telemetry,
};
use std::sync::Arc;

/// 默认会话文件
const DEFAULT_SESSION_FILE: &str = ".smartbash/session.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    let command = match args.get(1).map(String::as_str) {
        None | Some("--help") => {
            print_help();
            return Ok(());
        }
        Some("--version") => {
            println!("smartbash-client {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(cmd) => cmd.to_string(),
    };

    // 加载 .env 文件（开发环境）
    // 按优先级加载：.env.local > .env.development > .env
    if let Ok(env) = std::env::var("SMARTBASH_ENV") {
        dotenv::from_filename(format!(".env.{}", env)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::from_filename(".env.development").ok();
        dotenv::dotenv().ok();
    }

    // 1. 加载配置
    let config = ClientConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config);

    // 3. 会话与客户端
    let session_file = config
        .session
        .file
        .clone()
        .unwrap_or_else(|| DEFAULT_SESSION_FILE.to_string());
    let session = Arc::new(CookieSessionStore::persistent(&session_file)?);
    let client = Arc::new(ApiClient::from_config(
        &config,
        session.clone(),
        Arc::new(TracingNavigator),
    )?);
    let auth = AuthService::new(client.clone());

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        api_base = client.base_url(),
        "smartbash-client starting"
    );

    // 4. 执行命令
    match command.as_str() {
        "login" => {
            let (Some(email), Some(password)) = (args.get(2), args.get(3)) else {
                anyhow::bail!("用法: smartbash-client login <email> <password>");
            };
            let req = LoginRequest {
                email: email.clone(),
                password: password.clone(),
            };
            match auth.login(&req).await {
                Ok(login) => {
                    println!("{}", login.message.as_deref().unwrap_or("Login successful"));
                    println!("role: {}", login.role);
                    println!("home: {}", login.role.landing_path());
                }
                Err(e) => anyhow::bail!(e.user_message()),
            }
        }
        "logout" => {
            if let Err(e) = auth.logout().await {
                tracing::warn!(error = %e, "Logout request failed, local session cleared");
            }
            println!("Logged out");
        }
        "whoami" => match auth.current_user() {
            Some(user) => {
                println!("role: {}", user.role);
                println!("home: {}", user.role.landing_path());
            }
            None => println!("Not signed in"),
        },
        "refresh" => {
            let outcome = client.refresh().await;
            println!("refresh: {}", outcome.label());
            if outcome.is_rejected() {
                println!("Session expired, sign in again: {}", client.login_path());
            }
            if outcome.token().is_none() {
                std::process::exit(1);
            }
        }
        "get" => {
            let Some(path) = args.get(2) else {
                anyhow::bail!("用法: smartbash-client get <path>");
            };
            let response = client.get(path).await?;
            println!("{}", response.text());
            if !response.is_success() {
                eprintln!("HTTP {}", response.status());
                std::process::exit(1);
            }
        }
        "cookies" => {
            for header in session.set_cookie_headers() {
                println!("Set-Cookie: {}", header);
            }
        }
        other => {
            eprintln!("未知命令: {}", other);
            print_help();
            std::process::exit(1);
        }
    }

    tracing::debug!(authenticated = session.access_token().is_some(), "Done");
    Ok(())
}

/// 打印帮助信息
fn print_help() {
    println!("smartbash-client {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: smartbash-client <命令> [参数]");
    println!();
    println!("命令:");
    println!("  login <email> <password>   登录并保存会话");
    println!("  logout                     登出并清空会话");
    println!("  whoami                     显示当前角色");
    println!("  refresh                    使用刷新令牌换取新的访问令牌");
    println!("  get <path>                 发送带认证的 GET 请求");
    println!("  cookies                    打印会话 cookie");
    println!();
    println!("选项:");
    println!("  --version                  打印版本信息并退出");
    println!("  --help                     打印此帮助信息并退出");
    println!();
    println!("环境变量:");
    println!("  SMARTBASH_API__BASE_URL    API 基础地址");
    println!("  SMARTBASH_API__PAGE_HOST   页面主机名（未设置基础地址时使用）");
    println!("  SMARTBASH_SESSION__FILE    会话文件路径");
    println!("  可用选项请参考 .env.example");
}
