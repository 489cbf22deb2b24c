use colored::Colorize;
use tracing::info;

use cmr_server::{BootstrapOutcome, CmrServer, ServerConfig, ServiceFactory};
use cmr_store::RepositoryInfo;
use cmr_types::CallContext;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Init(args) => cmd_init(args, &cli.format),
        Command::Serve(args) => cmd_serve(args),
    }
}

/// The config file if given, with `-p` overrides applied on top.
fn load_config(args: &BootstrapArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    for (key, value) in &args.params {
        config.set_parameter(key, value);
    }
    Ok(config)
}

fn cmd_init(args: InitArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let config = load_config(&args.bootstrap)?;
    let (services, outcome) = ServiceFactory::init(&config.bootstrap_parameters())?;
    let infos = services
        .repository_service()
        .repository_infos(&CallContext::anonymous())?;

    match format {
        OutputFormat::Json => {
            let repositories = infos
                .iter()
                .map(|info| {
                    let objects = services.registry().object_store(&info.id)?.object_count()?;
                    Ok(serde_json::json!({ "info": info, "object_count": objects }))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            let report = serde_json::json!({ "outcome": outcome, "repositories": repositories });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            print_outcome(&outcome);
            for info in &infos {
                let objects = services.registry().object_store(&info.id)?.object_count()?;
                print_repository(info, objects);
            }
        }
    }
    Ok(())
}

fn print_outcome(outcome: &BootstrapOutcome) {
    match &outcome.created {
        Some(id) => println!("{} Created repository {}", "✓".green().bold(), id.bold()),
        None if outcome.initialized.is_empty() => println!("No repository configured."),
        None => {}
    }
    for id in &outcome.initialized {
        println!("{} Initialized repository {}", "✓".green(), id.bold());
    }
    if let Some(summary) = &outcome.filled {
        println!(
            "  Filled: {} folders, {} documents, {} content bytes",
            summary.folders.to_string().cyan(),
            summary.documents.to_string().cyan(),
            summary.content_bytes
        );
    }
    if let Some(err) = &outcome.fill_error {
        println!("  {} filler failed: {}", "!".yellow().bold(), err);
    }
}

fn print_repository(info: &RepositoryInfo, objects: usize) {
    println!("{}  {}", info.id.yellow().bold(), info.description.dimmed());
    println!("  Root folder: {}", info.root_folder_id.to_string().cyan());
    println!("  Objects: {}", objects);
    println!("  Product: {} {}", info.product_name, info.product_version);
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_config(&args.bootstrap)?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    let (server, outcome) = CmrServer::bootstrap(config)?;
    print_outcome(&outcome);
    info!(bind = %server.config().bind_addr, "starting server");
    println!("cmr server on {}", server.config().bind_addr.to_string().bold());
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}
