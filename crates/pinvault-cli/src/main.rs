//! pinvault: publish files to content-addressed storage, optionally sealed
//! under a password
//!
//! Commands:
//!   upload <file>              - store a file (add --encrypt to seal it first)
//!   retrieve <address|url>     - fetch a file (add --decrypt to open it)
//!   health                     - check the configured store is reachable
//!   config show                - display current configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pinvault_core::config::PinvaultConfig;
use pinvault_core::{ContentAddress, LogicalFile};
use pinvault_crypto::{default_provider, is_encrypted_name, EnvelopeScheme, KdfParams, Vault};
use pinvault_pipeline::{PasswordPolicy, RetrievalError, RetrievalPipeline, UploadPipeline};
use pinvault_storage::{ContentStore, PinataAuth, StoreCredentials};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "pinvault",
    version,
    about = "Password-sealed uploads to content-addressed storage",
    long_about = "pinvault: upload files to Pinata/IPFS (or an S3/local BLAKE3 store), \
                  optionally encrypted with a password, and retrieve them by address"
)]
struct Cli {
    /// Path to pinvault.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "PINVAULT_CONFIG",
        default_value = "~/.config/pinvault/pinvault.toml"
    )]
    config: PathBuf,

    /// Log level or filter directive (overrides [log] level)
    #[arg(long, env = "PINVAULT_LOG")]
    log: Option<String>,

    /// Log format (overrides [log] format)
    #[arg(long, env = "PINVAULT_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a local file
    ///
    /// Store credentials come from the environment: PINATA_JWT, or
    /// PINATA_API_KEY + PINATA_API_SECRET; AWS_ACCESS_KEY_ID +
    /// AWS_SECRET_ACCESS_KEY for the s3 backend.
    Upload {
        /// Local file to upload
        file: PathBuf,
        /// Seal the file under a password before uploading
        #[arg(long, short = 'e')]
        encrypt: bool,
        /// Read the password from this environment variable instead of prompting
        #[arg(long, value_name = "VAR")]
        password_env: Option<String>,
        /// Envelope layout (overrides [crypto] scheme)
        #[arg(long)]
        scheme: Option<EnvelopeScheme>,
    },

    /// Retrieve a file by address or gateway URL
    Retrieve {
        /// Content address, or a URL containing `/ipfs/<address>`
        reference: String,
        /// Decrypt the retrieved envelope with a password
        #[arg(long, short = 'd')]
        decrypt: bool,
        /// Read the password from this environment variable instead of prompting
        #[arg(long, value_name = "VAR")]
        password_env: Option<String>,
        /// Envelope layout the file was written with (overrides [crypto] scheme)
        #[arg(long)]
        scheme: Option<EnvelopeScheme>,
        /// Output path (default: recovered filename in the current directory)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Overwrite the output file if it exists
        #[arg(long)]
        force: bool,
    },

    /// Check that the configured store is reachable and credentials work
    Health,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);
    let config = load_config(&config_path)?;

    let filter = log_filter(
        cli.log.as_deref(),
        std::env::var("RUST_LOG").ok(),
        &config.log.level,
    );
    let format = cli.log_format.clone().unwrap_or(match config.log.format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });
    init_logging(filter, &format);

    match cli.command {
        Commands::Upload {
            file,
            encrypt,
            password_env,
            scheme,
        } => cmd_upload(&config, &file, encrypt, password_env.as_deref(), scheme).await,
        Commands::Retrieve {
            reference,
            decrypt,
            password_env,
            scheme,
            output,
            force,
        } => {
            cmd_retrieve(
                &config,
                &reference,
                decrypt,
                password_env.as_deref(),
                scheme,
                output.as_deref(),
                force,
            )
            .await
        }
        Commands::Health => cmd_health(&config).await,
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &config_path),
    }
}

/// `--log` / `PINVAULT_LOG` first, then `RUST_LOG`, then `[log] level`.
fn log_filter(explicit: Option<&str>, rust_log: Option<String>, config_level: &str) -> EnvFilter {
    match (explicit, rust_log) {
        (Some(directives), _) => EnvFilter::new(directives),
        (None, Some(directives)) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(config_level),
    }
}

fn init_logging(filter: EnvFilter, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

    // Logs go to stderr so stdout stays clean for command output
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

fn load_config(path: &Path) -> Result<PinvaultConfig> {
    PinvaultConfig::load(path).with_context(|| format!("loading config: {}", path.display()))
}

// ── Store, vault and pipelines from config + environment ──────────────────────

/// Read store credentials from the standard environment variables.
///
/// `PINATA_JWT` wins over the API key pair when both are set.
fn credentials_from_env() -> StoreCredentials {
    let pinata = match std::env::var("PINATA_JWT") {
        Ok(jwt) if !jwt.is_empty() => Some(PinataAuth::Jwt(SecretString::from(jwt))),
        _ => match (
            std::env::var("PINATA_API_KEY"),
            std::env::var("PINATA_API_SECRET"),
        ) {
            (Ok(key), Ok(secret)) => Some(PinataAuth::ApiKey {
                key,
                secret: SecretString::from(secret),
            }),
            _ => None,
        },
    };

    let s3 = match (
        std::env::var("AWS_ACCESS_KEY_ID"),
        std::env::var("AWS_SECRET_ACCESS_KEY"),
    ) {
        (Ok(access), Ok(secret)) => Some((access, secret)),
        _ => None,
    };

    StoreCredentials { pinata, s3 }
}

fn build_store(config: &PinvaultConfig) -> Result<Arc<dyn ContentStore>> {
    let mut storage = config.storage.clone();
    storage.fs_root = expand_tilde(&storage.fs_root);
    pinvault_storage::build_store(&storage, credentials_from_env()).context("building store")
}

fn build_vault(config: &PinvaultConfig, scheme: Option<EnvelopeScheme>) -> Result<Vault> {
    let scheme = match scheme {
        Some(scheme) => scheme,
        None => config
            .crypto
            .scheme
            .parse::<EnvelopeScheme>()
            .map_err(anyhow::Error::msg)
            .context("invalid crypto.scheme in config")?,
    };
    if config.crypto.pbkdf2_iterations == 0 {
        anyhow::bail!("crypto.pbkdf2_iterations must be greater than zero");
    }
    Ok(Vault::new(
        default_provider(),
        KdfParams {
            iterations: config.crypto.pbkdf2_iterations,
        },
        scheme,
    ))
}

/// Password from `$VAR` if named, otherwise an interactive prompt.
fn read_password(env_var: Option<&str>, confirm: bool) -> Result<SecretString> {
    if let Some(var) = env_var {
        let value = std::env::var(var)
            .with_context(|| format!("password environment variable {var} is not set"))?;
        return Ok(SecretString::from(value));
    }

    let first = rpassword::prompt_password("Password: ").context("reading password")?;
    if confirm {
        let second =
            rpassword::prompt_password("Confirm password: ").context("reading password")?;
        if first != second {
            anyhow::bail!("passwords do not match");
        }
    }
    Ok(SecretString::from(first))
}

/// Expand `~` in path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(home).join(rest)
    } else {
        path.to_path_buf()
    }
}

// ── `pinvault upload` ─────────────────────────────────────────────────────────

async fn cmd_upload(
    config: &PinvaultConfig,
    path: &Path,
    encrypt: bool,
    password_env: Option<&str>,
    scheme: Option<EnvelopeScheme>,
) -> Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("not a file path: {}", path.display()))?;
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    let mut file = LogicalFile::new(name, content);
    if let Some(mime) = mime_guess::from_path(&file.name).first() {
        file = file.with_mime_hint(mime.essence_str());
    }

    let password = if encrypt {
        Some(read_password(password_env, true)?)
    } else {
        None
    };

    let store = build_store(config)?;
    let vault = build_vault(config, scheme)?;
    let pipeline = UploadPipeline::new(store.clone(), vault)
        .with_policy(PasswordPolicy::from(&config.crypto));

    let size = file.len() as u64;
    println!("Uploading {} → {}", path.display(), store.describe());

    let address = pipeline
        .upload(file, password)
        .await
        .with_context(|| format!("uploading {}", path.display()))?;

    println!("  address:  {address}");
    println!("  bytes:    {}", fmt_bytes(size));
    if encrypt {
        let scheme = match scheme {
            Some(s) => s.to_string(),
            None => config.crypto.scheme.clone(),
        };
        println!("  sealed:   yes ({scheme})");
    }
    if let Some(url) = store.share_url(&address) {
        println!("  url:      {url}");
    }

    Ok(())
}

// ── `pinvault retrieve` ───────────────────────────────────────────────────────

async fn cmd_retrieve(
    config: &PinvaultConfig,
    reference: &str,
    decrypt: bool,
    password_env: Option<&str>,
    scheme: Option<EnvelopeScheme>,
    output: Option<&Path>,
    force: bool,
) -> Result<()> {
    let address = ContentAddress::from_reference(reference)
        .with_context(|| format!("parsing address: {reference}"))?;

    // Fail before any network or KDF work if the output is taken
    if let Some(out) = output {
        ensure_writable(out, force)?;
    }

    let password = if decrypt {
        Some(read_password(password_env, false)?)
    } else {
        None
    };

    let store = build_store(config)?;
    let vault = build_vault(config, scheme)?;
    let effective_scheme = vault.scheme();
    let pipeline = RetrievalPipeline::new(store.clone(), vault)
        .with_policy(PasswordPolicy::from(&config.crypto));

    println!("Retrieving {address} ← {}", store.describe());

    let file = match pipeline.retrieve(&address, password).await {
        Ok(file) => file,
        Err(e) => {
            if let Some(hint) = scheme_hint(&e, scheme, effective_scheme) {
                eprintln!("  hint:     {hint}");
            }
            let message = e.user_message();
            return Err(anyhow::Error::new(e).context(message));
        }
    };

    let local_path = match output {
        Some(out) => out.to_path_buf(),
        None => {
            let path = PathBuf::from(sanitize_file_name(&file.name, address.as_str()));
            ensure_writable(&path, force)?;
            path
        }
    };

    write_atomic(&local_path, &file.content).await?;

    info!(%address, path = %local_path.display(), bytes = file.len(), "wrote retrieved file");
    println!("  local:    {}", local_path.display());
    println!("  bytes:    {}", fmt_bytes(file.len() as u64));
    if let Some(mime) = &file.mime_hint {
        println!("  type:     {mime}");
    }
    if !decrypt && is_encrypted_name(&file.name) {
        println!("  note:     file looks encrypted, rerun with --decrypt to open it");
    }

    Ok(())
}

/// Suggest the other envelope scheme when opening failed under the
/// configured one. Silent when `--scheme` was given explicitly.
fn scheme_hint(
    err: &RetrievalError,
    flag: Option<EnvelopeScheme>,
    effective: EnvelopeScheme,
) -> Option<String> {
    if flag.is_some() {
        return None;
    }
    if !matches!(
        err,
        RetrievalError::Decryption | RetrievalError::MalformedEnvelope(_)
    ) {
        return None;
    }
    let other = match effective {
        EnvelopeScheme::Salted => EnvelopeScheme::Legacy,
        EnvelopeScheme::Legacy => EnvelopeScheme::Salted,
    };
    let older = if other == EnvelopeScheme::Legacy {
        "older envelopes use the fixed-salt format, "
    } else {
        ""
    };
    Some(format!(
        "configured scheme is {effective}; {older}try --scheme {other}"
    ))
}

fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    Ok(())
}

/// Reduce a store-provided name to a plain basename safe to create in the
/// current directory. Falls back to `fallback` when nothing usable is left.
fn sanitize_file_name(name: &str, fallback: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        return fallback.to_string();
    }
    base.to_string()
}

async fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating dir: {}", parent.display()))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".pinvault_tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, content)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("renaming {} → {}", tmp.display(), path.display()))?;
    Ok(())
}

// ── `pinvault health` ─────────────────────────────────────────────────────────

async fn cmd_health(config: &PinvaultConfig) -> Result<()> {
    let store = build_store(config)?;
    pinvault_storage::check_health(store.as_ref()).await?;
    println!("ok: {}", store.describe());
    Ok(())
}

// ── `pinvault config show` ────────────────────────────────────────────────────

fn cmd_config_show(config: &PinvaultConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!(
            "# Configuration: defaults (no file at {})",
            config_path.display()
        );
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── Utilities ─────────────────────────────────────────────────────────────────

fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
