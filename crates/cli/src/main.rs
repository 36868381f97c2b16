//! orgsync command-line tool.
//!
//! Exports the WeCom organization directory as flat department and user
//! records, and provides helpers for generating and validating the
//! configuration file.

mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use orgsync_core::assembler::build_user_record;
use orgsync_core::transliterate::PinyinTransliterator;
use orgsync_core::wecom::WeComUser;
use orgsync_core::{AppConfig, AssemblySettings, RecordAssembler, WeComClient};

use output::OutputFormat;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// orgsync command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "orgsync",
    version,
    about = "Export WeCom departments and users as directory records"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "./orgsync.toml")]
    config: PathBuf,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./orgsync.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,

    /// List departments.
    Departments {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// List users of every department with derived fields.
    Users {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show the fields derived for a single user without calling the API.
    Derive {
        /// Display name.
        #[arg(long)]
        name: String,

        /// Mobile number.
        #[arg(long, default_value = "")]
        mobile: String,

        /// Personal email.
        #[arg(long, default_value = "")]
        email: String,

        /// Business email.
        #[arg(long, default_value = "")]
        biz_mail: String,

        /// WeCom user ID.
        #[arg(long, default_value = "")]
        userid: String,

        /// Comma-separated department IDs.
        #[arg(long, value_delimiter = ',')]
        departments: Vec<i64>,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { output } => {
            init_tracing(cli.log_level.as_deref(), "warn");
            cmd_init(&output)
        }
        Commands::Validate => {
            init_tracing(cli.log_level.as_deref(), "warn");
            cmd_validate(&cli.config)
        }
        Commands::Derive {
            name,
            mobile,
            email,
            biz_mail,
            userid,
            departments,
        } => {
            init_tracing(cli.log_level.as_deref(), "warn");
            let settings = settings_or_default(&cli.config)?;
            let user = WeComUser {
                name,
                mobile,
                email,
                biz_mail,
                userid,
                department: departments,
                ..Default::default()
            };
            cmd_derive(&user, &settings)
        }
        Commands::Departments { format } => {
            let config = load_config(&cli.config)?;
            init_tracing(cli.log_level.as_deref(), &config.logging.level);
            let assembler = build_assembler(&config)?;
            let records = assembler
                .departments()
                .await
                .context("failed to list departments")?;
            output::print_departments(&records, format)
        }
        Commands::Users { format } => {
            let config = load_config(&cli.config)?;
            init_tracing(cli.log_level.as_deref(), &config.logging.level);
            let assembler = build_assembler(&config)?;
            let records = assembler.users().await.context("failed to list users")?;
            output::print_users(&records, format)
        }
    }
}

/// Logs go to stderr so JSON on stdout can be piped.
fn init_tracing(override_level: Option<&str>, configured: &str) {
    let level = override_level.unwrap_or(configured);
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_config(path: &Path) -> Result<AppConfig> {
    AppConfig::load_and_resolve(path).context("failed to load configuration")
}

/// Use the config file's settings when there is one, compiled-in defaults
/// otherwise.
fn settings_or_default(path: &Path) -> Result<AssemblySettings> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using default settings");
        return Ok(AssemblySettings::default());
    }
    let config = AppConfig::load_from_file(path).context("failed to parse configuration")?;
    config
        .validate()
        .context("configuration validation failed")?;
    Ok(config.assembly_settings())
}

fn build_assembler(config: &AppConfig) -> Result<RecordAssembler<WeComClient>> {
    let client = WeComClient::from_config(&config.wecom).context("failed to create WeCom client")?;
    info!(corp_id = %config.wecom.corp_id, flag = %config.wecom.flag, "connected");
    Ok(RecordAssembler::with_pinyin(
        client,
        config.assembly_settings(),
    ))
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_init(output: &Path) -> Result<()> {
    let default_config = r#"# orgsync configuration

[wecom]
api_url = "https://qyapi.weixin.qq.com"
corp_id = "ww0000000000000000"
corp_secret_env = "WECOM_CORP_SECRET"
# Prefix for namespaced department IDs (<flag>_<id>).
flag = "wecom"
timeout_secs = 30

[email]
# Used to build <mobile or userid>@<domain> when a source address is malformed.
personal_fallback_domain = "example.com"
biz_fallback_domain = "biz.example.com"

[logging]
level = "info"
"#;

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, default_config).context("failed to write config file")?;

    println!("Default configuration written to {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. Set corp_id and the fallback domains for your tenant");
    println!("  2. Export the corp secret: export WECOM_CORP_SECRET=...");
    println!(
        "  3. Validate with: orgsync validate --config {}",
        output.display()
    );
    println!(
        "  4. Export users: orgsync users --format json --config {}",
        output.display()
    );

    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let mut config =
        AppConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    config.resolve_env_vars()?;
    println!("  [OK] Environment variable references processed");

    match config.validate() {
        Ok(()) => println!("  [OK] All required fields are valid"),
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    println!();
    println!("Configuration summary:");
    println!("  API URL         : {}", config.wecom.api_url);
    println!("  Corp ID         : {}", config.wecom.corp_id);
    println!(
        "  Corp secret     : {}",
        if config.wecom.corp_secret.is_some() {
            "set"
        } else {
            "NOT SET"
        }
    );
    println!("  Department flag : {}", config.wecom.flag);
    println!("  Timeout         : {}s", config.wecom.timeout_secs);
    println!(
        "  Email fallback  : {}",
        config.email.personal_fallback_domain
    );
    println!("  Biz fallback    : {}", config.email.biz_fallback_domain);
    println!();
    println!("Configuration is valid.");

    Ok(())
}

fn cmd_derive(user: &WeComUser, settings: &AssemblySettings) -> Result<()> {
    let record = build_user_record(user, &PinyinTransliterator, settings);
    let json = serde_json::to_string_pretty(&record).context("failed to serialize record")?;
    println!("{}", json);
    Ok(())
}
