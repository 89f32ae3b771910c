use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use wakeonlan::wol;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// MAC addresses to wake, e.g. 00:11:22:33:44:55. Each one is sent concurrently.
    #[arg(required = true)]
    mac_addrs: Vec<String>,

    /// JSON file with send options. Flags take precedence over it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// IPv4 or IPv6 address to send to. Defaults to 255.255.255.255.
    #[arg(long, env = "WOL_DESTINATION")]
    destination: Option<String>,

    /// UDP port to send to. Defaults to 9.
    #[arg(long, env = "WOL_PORT")]
    port: Option<u16>,

    /// Number of packets to send per address.
    #[arg(long, env = "WOL_REPETITION", allow_negative_numbers = true)]
    repetition: Option<i32>,

    /// Milliseconds to wait between packets.
    #[arg(long, env = "WOL_WAIT")]
    wait: Option<u64>,

    /// If true, log the packets instead of sending them.
    #[arg(long)]
    use_fake_socket: bool,
}

fn load_config(args: &Args) -> Result<wol::SendConfig, Box<dyn std::error::Error>> {
    let mut config: wol::SendConfig = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => wol::SendConfig::default(),
    };
    if let Some(destination) = &args.destination {
        config.destination = destination.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(repetition) = args.repetition {
        config.repetition = repetition;
    }
    if let Some(wait) = args.wait {
        config.wait_ms = wait;
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("INFO"))
        .format_timestamp(Some(env_logger::fmt::TimestampPrecision::Millis))
        .init();

    let config = load_config(&args)?;
    let sender = if args.use_fake_socket {
        wol::Sender::new(Arc::new(wol::noop::LogOnlyFactory))
    } else {
        wol::Sender::default()
    };

    let (tx, rx) = mpsc::channel();
    for mac_addr in &args.mac_addrs {
        let tx = tx.clone();
        let name = mac_addr.clone();
        sender.send(mac_addr, &config, move |result| {
            let _ = tx.send((name, result));
        });
    }
    drop(tx);

    let mut failures = 0;
    for (mac_addr, result) in rx {
        match result {
            Ok(()) => info!("{}: sent {} packet(s)", mac_addr, config.repetition.max(1)),
            Err(err) => {
                error!("{}: {}", mac_addr, err);
                failures += 1;
            }
        }
    }
    if failures > 0 {
        let total = args.mac_addrs.len();
        return Err(format!("{} of {} wake requests failed", failures, total).into());
    }
    Ok(())
}
