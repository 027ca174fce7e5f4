//! Binder CLI - install and inspect scoped bindings

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

use binder::installer::BindingInstaller;
use binder::{
    ArchiveContext, BinderError, BindingsConfig, DeploymentContext, EnvContext, FixSuggestion,
    NameRegistry, Scope, ScopeConfig, StaticContext,
};

#[derive(Parser)]
#[command(name = "binder")]
#[command(about = "Binder - scoped name registry with dependency-ordered bindings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install bindings for one deployment and print their lookups
    Install {
        /// Bindings file (defaults to the built-in global/app bindings)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Application id (otherwise --module or BINDER_APP_ID)
        #[arg(short, long, conflicts_with = "module")]
        app_id: Option<String>,

        /// Deployment module identifier, e.g. deployment.shop.war
        #[arg(short, long)]
        module: Option<String>,

        /// Keep the application scope pending until after install
        #[arg(long)]
        defer_app: bool,
    },

    /// Validate a bindings file (parse only)
    Validate {
        /// Path to the bindings file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Install {
            config,
            app_id,
            module,
            defer_app,
        } => run_install(config, app_id, module, defer_app).await,
        Commands::Validate { file } => validate_bindings(&file),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

async fn run_install(
    config: Option<PathBuf>,
    app_id: Option<String>,
    module: Option<String>,
    defer_app: bool,
) -> Result<(), BinderError> {
    let config = match config {
        Some(path) => BindingsConfig::load(path)?,
        None => BindingsConfig::defaults(),
    };

    let registry = NameRegistry::new();
    registry.create_scope(Scope::Global, ScopeConfig::ready())?;

    let ctx: Box<dyn DeploymentContext> = match (app_id, module) {
        (Some(id), _) => Box::new(StaticContext::new(id, registry.clone())),
        (None, Some(module)) => Box::new(ArchiveContext::new(module, registry.clone())),
        (None, None) => Box::new(EnvContext::new(registry.clone())),
    };

    let application_id = ctx.resolve_application_id()?;
    let app_config = if defer_app {
        ScopeConfig::deferred()
    } else {
        ScopeConfig::ready()
    };
    let app_scope = registry.create_scope(Scope::application(application_id.as_str()), app_config)?;

    let report = BindingInstaller::new(config).install(ctx.as_ref())?;

    println!(
        "{} Installed {} binding(s) for application '{}'",
        "→".cyan(),
        report.bindings().len(),
        report.application_id().cyan().bold()
    );
    for handle in report.bindings() {
        println!("  {} {} [{}]", handle.scope(), handle.name(), handle.state());
    }

    if defer_app {
        let activated = app_scope.mark_ready();
        println!(
            "{} Scope '{}' ready, {} binding(s) activated",
            "→".cyan(),
            app_scope.scope(),
            activated
        );
    }

    report.wait_active().await?;

    println!("{}", "Lookups:".cyan().bold());
    for handle in report.bindings() {
        let value = registry.lookup(handle.name(), handle.scope())?;
        let shown = value
            .as_str()
            .map(str::to_owned)
            .unwrap_or_else(|| value.to_string());
        println!(
            "  {} {}/{} = {}",
            "✓".green(),
            handle.scope(),
            handle.name(),
            shown
        );
    }

    Ok(())
}

fn validate_bindings(file: &Path) -> Result<(), BinderError> {
    let config = BindingsConfig::load(file)?;

    println!("{} Bindings file '{}' is valid", "✓".green(), file.display());
    println!("  Schema: {}", config.schema);
    println!("  Bindings: {}", config.bindings.len());
    for spec in config.ordered() {
        println!("    {:?} {} = {}", spec.scope, spec.name, spec.value);
    }
    match config.startup_timeout() {
        Some(timeout) => println!("  Startup timeout: {:?}", timeout),
        None => println!("  Startup timeout: none (wait indefinitely)"),
    }

    Ok(())
}
