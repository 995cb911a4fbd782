//! login-code 命令行工具
//!
//! ```bash
//! # 请求验证码（默认按生产环境投递）
//! login-code request-code ana@example.com
//!
//! # 开发环境：发往本地 MailHog，投递失败仍报告成功
//! login-code --app-env development request-code ana@example.com
//!
//! # 使用验证码登录
//! login-code verify-code ana@example.com 123456
//!
//! # 提升为管理员
//! login-code make-admin ana@example.com
//!
//! # 按身份 ID 查询
//! login-code whoami 0123456789abcdef01234567
//! ```

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use login_code::delivery::{DeliveryChannel, LogDelivery, SmtpDelivery};
use login_code::store::{IdentityStore, RoleChange, SqliteIdentityStore};
use login_code::{LoginCodeConfig, LoginCodeService, MailerConfig};

#[derive(Parser)]
#[command(name = "login-code", version)]
#[command(about = "Passwordless email-code login", long_about = None)]
struct Cli {
    /// Database URL
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite://login-code.db?mode=rwc",
        global = true
    )]
    database_url: String,

    /// Runtime environment; only an explicit `development` enables MailHog and lenient delivery
    #[arg(long, env = "APP_ENV", default_value = "production", global = true)]
    app_env: String,

    /// SMTP host
    #[arg(long, env = "EMAIL_HOST", global = true)]
    email_host: Option<String>,

    /// SMTP port
    #[arg(long, env = "EMAIL_PORT", global = true)]
    email_port: Option<u16>,

    /// Sender address
    #[arg(long, env = "EMAIL_FROM", global = true)]
    email_from: Option<String>,

    /// Resend API key, used as the SMTP password
    #[arg(long, env = "RESEND_API_KEY", hide_env_values = true, global = true)]
    resend_api_key: Option<String>,

    /// Only log codes instead of sending email
    #[arg(long, global = true)]
    log_only: bool,

    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a login code and deliver it by email
    RequestCode {
        /// Email address
        email: String,
    },
    /// Verify a login code
    VerifyCode {
        /// Email address
        email: String,
        /// Six-digit code
        code: String,
    },
    /// Promote an identity to admin
    MakeAdmin {
        /// Email address
        email: String,
    },
    /// Look up an identity by id
    Whoami {
        /// Identity id
        id: String,
    },
}

impl Cli {
    fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }

    fn login_config(&self) -> LoginCodeConfig {
        if self.is_development() {
            LoginCodeConfig::development()
        } else {
            LoginCodeConfig::default()
        }
    }

    fn delivery(&self, config: &LoginCodeConfig) -> Result<Arc<dyn DeliveryChannel>> {
        if self.log_only {
            return Ok(Arc::new(LogDelivery::new()));
        }

        let mailer = MailerConfig::for_environment(
            self.is_development(),
            self.email_host.as_deref(),
            self.email_port,
            self.email_from.as_deref(),
            self.resend_api_key.as_deref(),
        );
        let smtp = SmtpDelivery::new(&mailer, config).context("invalid mail configuration")?;
        Ok(Arc::new(smtp))
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with(fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.login_config();

    let store = Arc::new(
        SqliteIdentityStore::connect(&cli.database_url)
            .await
            .with_context(|| format!("failed to connect to {}", cli.database_url))?,
    );
    store.open().await.context("failed to prepare database")?;

    let outcome = run(&cli, store.clone(), config).await;
    store.close().await?;
    outcome
}

async fn run(cli: &Cli, store: Arc<SqliteIdentityStore>, config: LoginCodeConfig) -> Result<()> {
    let channel: Arc<dyn DeliveryChannel> = match cli.command {
        Commands::RequestCode { .. } => cli.delivery(&config)?,
        _ => Arc::new(LogDelivery::new()),
    };
    let service = LoginCodeService::new(store, channel).with_config(config);

    match &cli.command {
        Commands::RequestCode { email } => {
            let response = service.request_login_code(email).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.success {
                bail!("code request failed");
            }
        }
        Commands::VerifyCode { email, code } => {
            let response = service.verify_login_code(email, code).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.success {
                bail!("verification failed");
            }
        }
        Commands::MakeAdmin { email } => match service.promote_to_admin(email).await? {
            RoleChange::Changed => println!("✓ {} is now admin", email),
            RoleChange::Unchanged => println!("{} is already admin", email),
            RoleChange::NotFound => bail!("no identity for {}", email),
        },
        Commands::Whoami { id } => match service.restore_identity(id).await? {
            Some(identity) => println!("{}", serde_json::to_string_pretty(&identity)?),
            None => bail!("no identity with id {}", id),
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_default_environment_is_strict() {
        // 忽略运行测试时外部设置的 APP_ENV，只看默认值
        let command = Cli::command().mut_arg("app_env", |arg| arg.env(None::<&'static str>));
        let matches = command
            .try_get_matches_from(["login-code", "request-code", "a@b.c"])
            .unwrap();
        let cli = Cli::from_arg_matches(&matches).unwrap();
        assert_eq!(cli.app_env, "production");
        assert!(!cli.is_development());
        assert!(!cli.login_config().lenient_delivery);
    }

    #[test]
    fn test_explicit_development_is_lenient() {
        let cli = parse(&["login-code", "--app-env", "development", "request-code", "a@b.c"]);
        assert!(cli.is_development());
        assert!(cli.login_config().lenient_delivery);

        let cli = parse(&["login-code", "request-code", "a@b.c", "--app-env", "Development"]);
        assert!(cli.login_config().lenient_delivery);
    }

    #[test]
    fn test_unknown_environment_is_strict() {
        let cli = parse(&["login-code", "--app-env", "staging", "whoami", "abc"]);
        assert!(!cli.login_config().lenient_delivery);
    }
}
