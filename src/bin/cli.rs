use clap::Parser;
use env_logger::Env;
use serde_json::json;
use spf_resolver::{Options, evaluate_policy};

#[derive(Parser)]
struct Cli {
    /// Sending domain to check (optional if --sender is given)
    #[arg(short, long)]
    domain: Option<String>,

    /// Envelope sender address; the domain is derived from it
    #[arg(short, long)]
    sender: Option<String>,

    /// Client IP address to evaluate for
    #[arg(short, long)]
    ip: String,

    /// DNS resolver target URL, optionally with {domain}/{type} placeholders
    #[arg(long)]
    resolver: Option<String>,

    /// Maximum DNS lookups for the whole evaluation
    #[arg(long)]
    max_lookups: Option<u32>,

    /// Maximum void (empty or failed) DNS lookups
    #[arg(long)]
    max_void: Option<u32>,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    // Require at least --domain or --sender
    if cli.domain.is_none() && cli.sender.is_none() {
        eprintln!("Error: You must provide either --domain <domain> or --sender <address>.");
        std::process::exit(1);
    }

    // A bare domain passes through option defaulting as postmaster@domain.
    let sender = cli.sender.or(cli.domain);

    let options = Options {
        ip: cli.ip,
        sender,
        dns_resolver_host: cli.resolver,
        max_resolve_count: cli.max_lookups,
        max_void_count: cli.max_void,
        ..Default::default()
    };

    match evaluate_policy(options).await {
        Ok(outcome) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("SPF policy resolved:");
                println!("  Lookups: {}", outcome.resolve_count);
                println!("  Void lookups: {}", outcome.void_count);
                println!("  Records:");
                for record in &outcome.records {
                    println!("    {record}");
                }
            }
            Ok(())
        }
        Err(e) => {
            if cli.json {
                let output = json!({
                    "kind": e.kind(),
                    "message": e.message(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                eprintln!("{e}");
            }
            std::process::exit(1);
        }
    }
}
