//! netcup-ddns - Dynamic DNS client for the netcup DNS API.

use clap::Parser;
use netcup_ddns::config::Config;
use netcup_ddns::containers::ContainerRestarter;
use netcup_ddns::detector::gateway;
use netcup_ddns::notify::MailNotifier;
use netcup_ddns::{
    logging, ApiClient, DdnsError, HttpTransport, IpCache, IpDetector, RunConfig, Updater,
};
use std::path::PathBuf;
use std::process::ExitCode;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "netcup-ddns")]
#[command(about = "Dynamic DNS client for the netcup DNS API")]
#[command(version, disable_version_flag = true)]
struct Cli {
    /// Don't output notices, only warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Manually provide the IPv4 address to set
    #[arg(short = '4', long = "ipv4", value_name = "ADDR")]
    ipv4: Option<String>,

    /// Manually provide the IPv6 address to set
    #[arg(short = '6', long = "ipv6", value_name = "ADDR")]
    ipv6: Option<String>,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print an example config file and exit
    #[arg(long)]
    print_config: bool,

    /// Print version
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.print_config {
        return match toml::to_string_pretty(&Config::example()) {
            Ok(example) => {
                print!("{}", example);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to render example config: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let config = Config::load_from(&Config::locate(cli.config.clone()));

    let notifier = config.as_ref().ok().and_then(|config| {
        config
            .notify
            .mail_recipient
            .as_ref()
            .map(|recipient| MailNotifier::new(recipient.clone(), &config.domain))
    });
    if let Err(e) = logging::init(cli.quiet, notifier) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<DdnsError>() {
                Some(err) => logging::report_fatal(err),
                None => tracing::error!("{:#}. Exiting.", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, config: netcup_ddns::Result<Config>) -> anyhow::Result<()> {
    let config = config?;

    let mut run_config = RunConfig::from_config(&config);
    if let Some(raw) = &cli.ipv4 {
        run_config = run_config.with_manual_ipv4(raw)?;
    }
    if let Some(raw) = &cli.ipv6 {
        run_config = run_config.with_manual_ipv6(raw)?;
    }

    tracing::info!("=============================================");
    tracing::info!("Running dynamic DNS client for netcup {}", VERSION);
    tracing::info!("This client is not affiliated with netcup.");
    tracing::info!("=============================================");

    let mut detector = IpDetector::new()?;
    if let Some(gateway) = &config.ipv4.gateway {
        detector = detector.with_gateway_url(gateway::control_url(gateway));
    }

    let api = ApiClient::new(HttpTransport::new()?, config.credentials());
    let cache = IpCache::new(
        config
            .cache_file
            .clone()
            .unwrap_or_else(IpCache::default_path),
    );

    let outcome = Updater::new(run_config, detector, api, cache).run().await?;

    if outcome.changed() && config.containers.restart {
        let restarter = ContainerRestarter::new(config.containers.names.clone());
        if let Err(e) = restarter.restart().await {
            tracing::warn!("Failed to restart containers: {}", e);
        }
    }

    Ok(())
}
