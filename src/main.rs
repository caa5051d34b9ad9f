//! harbor-installer CLI - installs the Harbor registry onto Kubernetes with Helm

use anyhow::{Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use harbor_installer::commands::install::InstallOptions;
use harbor_installer::commands::uninstall::UninstallOptions;
use harbor_installer::config::settings::{CleanupPolicy, LOCAL_CONFIG_FILE, Overrides, Settings};
use harbor_installer::utils::errors::{InstallerError, display_error_and_exit, enhance_error};
use harbor_installer::utils::{CommonPrereqs, Prerequisite, dryrun, logger};
use harbor_installer::{log_error, log_info};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "harbor-installer")]
#[command(author, version, about = "Install the Harbor registry onto a Kubernetes cluster with Helm", long_about = None)]
struct Cli {
    /// Verbose output (can be used multiple times: -v, -vv)
    /// default: INFO, -v: DEBUG, -vv: TRACE
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Dry-run mode: show what would be done without making changes
    #[arg(long, global = true)]
    dry_run: bool,

    /// Path to config file
    #[arg(short, long, global = true, env = "HARBOR_INSTALLER_CONFIG")]
    config: Option<PathBuf>,

    /// Path to kubeconfig file
    #[arg(short, long, global = true, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    #[command(flatten)]
    overrides: OverrideArgs,

    /// Defaults to `install`
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Default)]
struct OverrideArgs {
    /// Harbor hostname (overrides harbor.domain)
    #[arg(long, global = true)]
    domain: Option<String>,

    /// Target namespace (overrides harbor.namespace)
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    /// Harbor admin password (overrides harbor.admin_password)
    #[arg(long, global = true, env = "HARBOR_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install Harbor (the default when no command is given)
    Install {
        /// Skip cluster preflight checks
        #[arg(long)]
        skip_preflight: bool,

        /// What to do with tls.key/tls.crt afterwards: ask, always or never
        #[arg(long, value_name = "POLICY")]
        cleanup_certs: Option<CleanupPolicy>,
    },

    /// Show release, pods, ingress and access instructions
    Status {
        /// Query Harbor's health endpoint through the ingress
        #[arg(long)]
        probe: bool,
    },

    /// Remove the Harbor release and its TLS secret
    Uninstall {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Also delete the namespace (and the persistent volume claims in it)
        #[arg(long)]
        delete_namespace: bool,
    },

    /// Render the Helm values file without installing
    Render {
        /// Output path (default: behavior.values_file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print to stdout instead of writing a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },

    /// Check prerequisites
    Check,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write an example config file
    Init {
        /// Destination (default: .harbor-installer.toml)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective settings
    Show,
}

fn main() {
    let cli = Cli::parse();

    logger::init(cli.verbose);

    if let Err(err) = run(cli) {
        display_error_and_exit(enhance_error(err));
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.dry_run {
        dryrun::set_dry_run(true);
        log_info!("DRY RUN MODE: No changes will be made");
    }

    let command = cli.command.unwrap_or(Commands::Install {
        skip_preflight: false,
        cleanup_certs: None,
    });

    let mut overrides = Overrides {
        domain: cli.overrides.domain,
        namespace: cli.overrides.namespace,
        admin_password: cli.overrides.admin_password,
        cleanup_certificates: None,
    };
    let config = cli.config.as_deref();
    let kubeconfig = cli.kubeconfig;

    match command {
        Commands::Install {
            skip_preflight,
            cleanup_certs,
        } => {
            overrides.cleanup_certificates = cleanup_certs;
            harbor_installer::commands::install::install(InstallOptions {
                settings: load_settings(config, &overrides)?,
                kubeconfig,
                skip_preflight,
            })
        }
        Commands::Status { probe } => {
            let settings = load_settings(config, &overrides)?;
            harbor_installer::commands::status::show(&settings, kubeconfig.as_deref(), probe)
        }
        Commands::Uninstall {
            yes,
            delete_namespace,
        } => harbor_installer::commands::uninstall::uninstall(UninstallOptions {
            settings: load_settings(config, &overrides)?,
            kubeconfig,
            yes,
            delete_namespace,
        }),
        Commands::Render { output, stdout } => {
            let settings = load_settings(config, &overrides)?;
            harbor_installer::commands::render::render(&settings, output, stdout)
        }
        Commands::Check => handle_check_command(),
        Commands::Config { command } => handle_config_command(command, config, &overrides),
        Commands::Completion { shell } => handle_completion_command(shell),
        Commands::Version => handle_version_command(),
    }
}

/// Load, override and validate settings before any external command runs
fn load_settings(config: Option<&Path>, overrides: &Overrides) -> Result<Settings> {
    let mut settings = Settings::load(config)?;
    settings.apply(overrides);
    settings
        .validate()
        .map_err(|e| InstallerError::invalid_setting(&e.to_string()))?;
    Ok(settings)
}

fn handle_check_command() -> Result<()> {
    log_info!("Checking prerequisites...");

    let tools = CommonPrereqs::install_tools();
    let prereqs: Vec<&dyn Prerequisite> = tools.iter().map(|t| t as &dyn Prerequisite).collect();

    let (found, missing) = CommonPrereqs::check_all(&prereqs);
    for name in &found {
        println!("  ✓ {}", name);
    }
    for (name, hint) in &missing {
        println!("  ✗ {} ({})", name, hint);
    }

    if missing.is_empty() {
        log_info!("✓ All prerequisites satisfied!");
        Ok(())
    } else {
        Err(InstallerError::missing_prerequisites(&missing).into())
    }
}

fn handle_config_command(
    command: ConfigCommands,
    config: Option<&Path>,
    overrides: &Overrides,
) -> Result<()> {
    match command {
        ConfigCommands::Init { path, force } => {
            let path = path.unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));

            if path.exists() && !force {
                log_error!("{} already exists", path.display());
                bail!("Refusing to overwrite {} (use --force)", path.display());
            }

            dryrun::exec_unless_dry_run(&format!("write {}", path.display()), || {
                std::fs::write(&path, Settings::example_config()?)?;
                log_info!("Wrote example configuration to {}", path.display());
                Ok(())
            })
        }
        ConfigCommands::Show => {
            let mut settings = Settings::load(config)?;
            settings.apply(overrides);
            print!("{}", settings.to_display_toml()?);

            if let Err(e) = settings.validate() {
                return Err(InstallerError::invalid_setting(&e.to_string()).into());
            }
            Ok(())
        }
    }
}

fn handle_completion_command(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "harbor-installer", &mut io::stdout());
    Ok(())
}

fn handle_version_command() -> Result<()> {
    println!("harbor-installer {}", env!("CARGO_PKG_VERSION"));
    println!("Installs the Harbor registry onto Kubernetes with Helm");
    Ok(())
}
