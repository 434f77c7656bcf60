//! ark-launcher - main entry point

use anyhow::{Context, Result};
use ark_launcher::cli::{exit_code, Cli, Commands};
use ark_launcher::descriptor::{strip_html, FailurePolicy, StepCommand};
use ark_launcher::{catalog, process_guard};
use ark_launcher::{DescriptorId, Href, Launcher, LauncherConfig, OpenOutcome, ProcessGuard};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize logging; `RUST_LOG` overrides the default `info` level
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();

    if let Err(e) = process_guard::init_signal_handlers() {
        warn!("Failed to initialize signal handlers: {}", e);
    }
    let _guard = ProcessGuard::new();

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    let result = dispatch(cli);
    if let Err(e) = &result {
        error!("{:#}", e);
        eprintln!("✗ {:#}", e);
    }
    let code = exit_code(&result);
    if code != 0 {
        std::process::exit(code);
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    if let Some(Commands::Validate { config }) = &cli.command {
        info!("Validating configuration file: {:?}", config);
        let loaded = LauncherConfig::load_from_file(config)?;
        loaded.validate()?;
        println!("✓ Configuration file is valid: {:?}", config);
        return Ok(());
    }

    let launcher = Launcher::new(cli.load_config()?);

    match cli.command {
        Some(Commands::Menu { json }) => print_menu(&launcher, json),
        None => print_menu(&launcher, false),
        Some(Commands::Open { href }) => {
            let href: Href = href.parse()?;
            open(&launcher, &href)
        }
        Some(Commands::Run { descriptor }) => {
            let href = Href::Descriptor(descriptor);
            open(&launcher, &href)
        }
        Some(Commands::Show { descriptor, json }) => show(&launcher, &descriptor, json),
        Some(Commands::Validate { .. }) => Ok(()),
    }
}

fn print_menu(launcher: &Launcher, json: bool) -> Result<()> {
    let items = launcher.menu();
    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    println!("{}", catalog::APP_TITLE);
    for (i, item) in items.iter().enumerate() {
        println!("  {}. {:<20} {}", i + 1, item.label(), item.href);
    }
    Ok(())
}

fn open(launcher: &Launcher, href: &Href) -> Result<()> {
    let mut host = launcher.system_host();
    match launcher.open_with(href, &mut host)? {
        OpenOutcome::Ran(report) => {
            for record in report.tolerated() {
                println!("! step {} ({}) failed but was allowed to", record.index + 1, record.method);
            }
            println!("✓ {} finished ({} steps)", report.descriptor, report.executed());
        }
        OpenOutcome::OpenedFolder(path) => {
            println!("✓ Opened {}", path.display());
        }
    }
    Ok(())
}

fn show(launcher: &Launcher, name: &str, json: bool) -> Result<()> {
    let id: DescriptorId = name.parse()?;
    let descriptor = catalog::lookup(id)?;
    let menu = descriptor.menu.then(|| launcher.menu());

    if json {
        let wire = descriptor
            .to_wire(menu.as_deref())
            .context("Failed to render descriptor")?;
        println!("{}", serde_json::to_string_pretty(&wire)?);
        return Ok(());
    }

    println!("{}", descriptor.name);
    if let Some(title) = &descriptor.title {
        println!("  title: {}", title);
    }
    if let Some(items) = &menu {
        println!("  menu:");
        for item in items {
            println!("    - {} -> {}", item.label(), item.href);
        }
    }
    if !descriptor.steps().is_empty() {
        println!("  run:");
    }
    for (i, step) in descriptor.steps().iter().enumerate() {
        let text = match &step.command {
            StepCommand::ShellRun { message } => message.clone(),
            StepCommand::Notify { html } => strip_html(html),
        };
        let policy = match step.on_failure {
            FailurePolicy::Abort => "",
            FailurePolicy::Continue => " (may fail)",
        };
        println!("    {}. {} {}{}", i + 1, step.command.method(), text, policy);
    }
    Ok(())
}
