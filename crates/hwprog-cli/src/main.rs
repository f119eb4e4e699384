mod catalog;
mod config;
mod forms;

use std::path::PathBuf;

use catalog::ServerCatalog;
use clap::{Parser, Subcommand};
use config::CliConfig;
use forms::FlashSteps;
use hwprog_stream::{
    default_client, FormData, NoopHandler, RecordHandler, Shared, StdoutSink, StreamConsumer,
    StreamSummary,
};
use hwprog_telemetry as telemetry;
use hwprog_tree::{TreeContainer, TreeRecordHandler};
use hwprog_util::{expand_user, join_url};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "hwprog", version, about = "Program FPGAs and flash through a programming server")]
struct Cli {
    /// Programming server base url (default: HWPROG_BASE_URL or saved config)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Hardware server, as a catalog name or host:port (remembered for next time)
    #[arg(long, global = true)]
    server: Option<String>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Program an FPGA with a bitstream and stream the job log
    Fpga {
        #[arg(long)]
        bitfile: PathBuf,
        /// Debug probes file
        #[arg(long)]
        ltxfile: Option<PathBuf>,
    },
    /// Program configuration flash and stream the job log
    Flash {
        #[arg(long)]
        binfile: PathBuf,
        #[arg(long)]
        blank_check: bool,
        #[arg(long)]
        erase: bool,
        #[arg(long)]
        cfg_program: bool,
        #[arg(long)]
        verify: bool,
    },
    /// List targets and devices on the hardware server
    ListHw {
        /// Write an interactive page with the collapsible tree
        #[arg(long)]
        html: Option<PathBuf>,
        /// Expand the node with this label before printing (repeatable)
        #[arg(long)]
        expand: Vec<String>,
    },
    /// Show the hardware server catalog
    Servers,
}

impl Cmd {
    fn name(&self) -> &'static str {
        match self {
            Cmd::Fpga { .. } => "fpga",
            Cmd::Flash { .. } => "flash",
            Cmd::ListHw { .. } => "list-hw",
            Cmd::Servers => "servers",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    hwprog_util::init_tracing()?;
    let cli = Cli::parse();
    hwprog_util::init_cli_telemetry("hwprog-cli", env!("CARGO_PKG_VERSION"), cli.cmd.name());

    let result = run(cli).await;
    telemetry::shutdown();
    result
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = CliConfig::load();
    let catalog_path = expand_user(&cfg.servers_file);
    let catalog = match ServerCatalog::load(&catalog_path) {
        Ok(catalog) => catalog,
        Err(err) => {
            warn!("Failed to load {}: {err}", catalog_path.display());
            ServerCatalog::default()
        }
    };

    if let Cmd::Servers = cli.cmd {
        print_servers(&catalog, &catalog_path);
        return Ok(());
    }

    let server = select_server(cli.server.as_deref(), &catalog, &mut cfg)?;
    let base_url = cli.base_url.clone().unwrap_or_else(|| cfg.base_url.clone());

    match cli.cmd {
        Cmd::Fpga { bitfile, ltxfile } => {
            log_catalog_targets(&catalog, &server);
            let mut form = forms::fpga_form(bitfile, ltxfile);
            forms::select_server([&mut form], &server);
            run_stream(join_url(&base_url, &cfg.fpga_endpoint), &form, NoopHandler).await?;
        }
        Cmd::Flash {
            binfile,
            blank_check,
            erase,
            cfg_program,
            verify,
        } => {
            log_catalog_targets(&catalog, &server);
            let steps = FlashSteps {
                blank_check,
                erase,
                cfg_program,
                verify,
            };
            let mut form = forms::flash_form(binfile, steps);
            forms::select_server([&mut form], &server);
            run_stream(join_url(&base_url, &cfg.flash_endpoint), &form, NoopHandler).await?;
        }
        Cmd::ListHw { html, expand } => {
            let mut form = forms::list_hw_form();
            forms::select_server([&mut form], &server);
            let container = Shared::new(TreeContainer::new("hw-tree"));
            let handler = TreeRecordHandler::new(container.clone());
            run_stream(join_url(&base_url, &cfg.list_hw_endpoint), &form, handler).await?;

            let mut container = container.lock();
            if container.view().is_none() {
                warn!(server = %server, "server sent no hardware tree");
                return Ok(());
            }
            for label in &expand {
                match container.handle_for(label) {
                    Some(handle) => {
                        if let Err(err) = container.toggle(handle) {
                            warn!("cannot expand {label:?}: {err}");
                        }
                    }
                    None => warn!("no node labelled {label:?}"),
                }
            }
            println!();
            print!("{}", container.outline());
            if let Some(path) = html {
                std::fs::write(&path, container.page(&format!("Hardware on {server}")))?;
                println!("wrote {}", path.display());
            }
        }
        Cmd::Servers => {}
    }

    Ok(())
}

fn select_server(
    selection: Option<&str>,
    catalog: &ServerCatalog,
    cfg: &mut CliConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    match selection {
        Some(selection) => {
            let address = catalog.resolve(selection);
            if address != cfg.last_hw_server {
                cfg.last_hw_server = address.clone();
                if let Err(err) = cfg.save() {
                    warn!("Failed to save config: {err}");
                }
            }
            Ok(address)
        }
        None if !cfg.last_hw_server.is_empty() => Ok(cfg.last_hw_server.clone()),
        None => Err("no hardware server selected; pass --server <name|host:port>".into()),
    }
}

fn log_catalog_targets(catalog: &ServerCatalog, server: &str) {
    let targets = catalog.targets_for(server);
    if targets.is_empty() {
        warn!(server, "no targets listed for this hardware server in the catalog");
    } else {
        info!(server, targets = targets.len(), "catalog targets");
    }
}

async fn run_stream<H: RecordHandler>(
    endpoint: String,
    form: &FormData,
    handler: H,
) -> Result<StreamSummary, Box<dyn std::error::Error>> {
    let consumer = StreamConsumer::with_client(default_client()?, endpoint.clone());
    match consumer.submit(form, StdoutSink::stdout(), handler).await {
        Ok(summary) => {
            telemetry::event(
                "stream.finish",
                &[
                    ("endpoint", endpoint.as_str()),
                    ("records", summary.records.to_string().as_str()),
                    ("fallback_records", summary.fallback_records.to_string().as_str()),
                ],
            );
            Ok(summary)
        }
        Err(err) => {
            eprintln!("\nstream error: {err}");
            telemetry::event("stream.error", &[("endpoint", endpoint.as_str())]);
            Err(err.into())
        }
    }
}

fn print_servers(catalog: &ServerCatalog, path: &std::path::Path) {
    let mut any = false;
    for (family, server) in catalog.servers() {
        any = true;
        println!("{family}\t{}\t{}", server.name, server.address);
        for target in &server.targets {
            match &target.device {
                Some(device) => println!("\t{}\t{device}", target.target),
                None => println!("\t{}", target.target),
            }
        }
    }
    if !any {
        println!("no servers configured in {}", path.display());
    }
}
