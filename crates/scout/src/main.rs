//! Scout command-line client.
//!
//! Exposes the discovery operations as subcommands: service type
//! enumeration, instance and record walks, TXT and TLSA lookups, and
//! the DNSSEC chain check.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use scout_discovery::{DiscoveryConfig, ServiceDiscovery, StatusObserver};
use scout_proto::{CompoundLabel, Fqdn, TlsaPrefix};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Scout - DNS-SD service discovery with DNSSEC and DANE
#[derive(Parser, Debug)]
#[command(name = "scout")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// DNS server to query (IP or IP:port); system resolvers if unset
    #[arg(short, long, global = true, value_name = "SERVER")]
    server: Option<String>,

    /// DNSSEC trust anchor file (DNSKEY presentation form)
    #[arg(long, global = true, value_name = "FILE")]
    anchor_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Print per-query progress
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the service types advertised under a domain
    Types {
        /// Browsing domain
        domain: String,

        /// Require an authenticated DNSSEC chain
        #[arg(long)]
        secure: bool,
    },

    /// List the service instances of a type
    Instances {
        /// Browsing domain
        domain: String,

        /// Service type, plain or compound (`type[:subtype][:proto]`)
        service_type: String,

        /// Require an authenticated DNSSEC chain
        #[arg(long)]
        secure: bool,
    },

    /// List the service (SRV) records of a type
    Records {
        /// Browsing domain
        domain: String,

        /// Service type, plain or compound (`type[:subtype][:proto]`)
        service_type: String,

        /// Require an authenticated DNSSEC chain
        #[arg(long)]
        secure: bool,
    },

    /// List the text (TXT) records published under a label
    Texts {
        /// Browsing domain
        domain: String,

        /// Label to look up
        label: String,

        /// Require an authenticated DNSSEC chain
        #[arg(long)]
        secure: bool,
    },

    /// List the certificate-association (TLSA) records of a domain
    Tlsa {
        /// Browsing domain
        domain: String,

        /// TLSA prefix as `port[:protocol]`
        #[arg(default_value = "")]
        prefix: String,

        /// Require an authenticated DNSSEC chain
        #[arg(long)]
        secure: bool,
    },

    /// Check whether a domain sits behind a valid DNSSEC chain
    Check {
        /// Domain to probe; the configured default if omitted
        domain: Option<String>,
    },
}

/// Observer printing per-query progress to stderr.
struct ConsoleObserver;

impl StatusObserver for ConsoleObserver {
    fn status_change(&self, message: &str) {
        eprintln!("{}", style(message).dim());
    }
}

fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn init_logging(cli_level: Option<&str>) {
    let level = cli_level.map(parse_log_level).unwrap_or(Level::WARN);
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

/// Accepts `IP` or `IP:port`, defaulting the port to 53.
fn parse_server(server: &str) -> Result<SocketAddr> {
    if let Ok(addr) = SocketAddr::from_str(server) {
        return Ok(addr);
    }
    if let Ok(ip) = IpAddr::from_str(server) {
        return Ok(SocketAddr::new(ip, 53));
    }
    bail!("invalid server address: [{server}]");
}

/// Resolves a plain or compound service type argument to the type
/// token the walk queries with.
fn parse_service_type(raw: &str) -> Result<String> {
    if CompoundLabel::is_compound(raw)? {
        let label = CompoundLabel::from_str(raw)?;
        Ok(label.service_type().to_string())
    } else {
        Ok(raw.to_string())
    }
}

fn build_config(cli: &Cli) -> Result<DiscoveryConfig> {
    let dns_server = cli
        .server
        .as_deref()
        .map(parse_server)
        .transpose()
        .context("unable to parse --server")?;

    let trust_anchor = cli
        .anchor_file
        .as_deref()
        .map(std::fs::read_to_string)
        .transpose()
        .context("unable to read --anchor-file")?;

    Ok(DiscoveryConfig {
        dns_server,
        trust_anchor,
        ..DiscoveryConfig::default()
    })
}

fn print_heading(what: &str, target: &str) {
    eprintln!("{} {}", style(what).bold().cyan(), style(target).bold());
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let config = build_config(&cli)?;
    let mut engine = ServiceDiscovery::new(config)?;
    if cli.verbose {
        engine.add_observer(Arc::new(ConsoleObserver));
    }

    match &cli.command {
        Commands::Types { domain, secure } => {
            let domain = Fqdn::parse(domain)?;
            print_heading("service types @", &domain.fqdn());
            let types = engine.list_service_types(&domain, *secure).await?;
            if types.is_empty() {
                eprintln!("{}", style("no service types found").yellow());
            }
            for service_type in types {
                println!("{service_type}");
            }
        }

        Commands::Instances {
            domain,
            service_type,
            secure,
        } => {
            let domain = Fqdn::parse(domain)?;
            let service_type = parse_service_type(service_type)?;
            print_heading("instances @", &domain.fqdn_with_prefix(&service_type));
            let instances = engine
                .list_service_instances(&domain, &service_type, *secure)
                .await?;
            if instances.is_empty() {
                eprintln!("{}", style("no instances found").yellow());
            }
            for instance in instances {
                println!("{instance}");
            }
        }

        Commands::Records {
            domain,
            service_type,
            secure,
        } => {
            let domain = Fqdn::parse(domain)?;
            let service_type = parse_service_type(service_type)?;
            print_heading("service records @", &domain.fqdn_with_prefix(&service_type));
            let records = engine
                .list_service_records(&domain, &service_type, *secure)
                .await?;
            if records.is_empty() {
                eprintln!("{}", style("no service records found").yellow());
            }
            for record in records {
                println!("{record}");
            }
        }

        Commands::Texts {
            domain,
            label,
            secure,
        } => {
            let domain = Fqdn::parse(domain)?;
            print_heading("text records @", &domain.fqdn_with_prefix(label));
            let texts = engine.list_text_records(&domain, label, *secure).await?;
            if texts.is_empty() {
                eprintln!("{}", style("no text records found").yellow());
            }
            for text in texts {
                println!("{text}");
            }
        }

        Commands::Tlsa {
            domain,
            prefix,
            secure,
        } => {
            let domain = Fqdn::parse(domain)?;
            let prefix = TlsaPrefix::from_str(prefix)?;
            print_heading("tlsa records @", &format!("{prefix}.{}", domain.fqdn()));
            let certs = engine.list_tlsa_records(&domain, &prefix, *secure).await?;
            if certs.is_empty() {
                eprintln!("{}", style("no TLSA records found").yellow());
            }
            for cert in certs {
                println!("{cert}");
            }
        }

        Commands::Check { domain } => {
            let probe = domain.as_deref().map(Fqdn::parse).transpose()?;
            let valid = engine.is_dnssec_valid(probe.as_ref()).await?;
            if valid {
                println!("{}", style("DNSSEC chain is valid").green().bold());
            } else {
                println!("{}", style("DNSSEC chain could not be validated").red().bold());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
