use std::env;
use std::path::PathBuf;

use crate::config::SimulatorConfig;

/// Command-line options. Anything given here overrides both the TOML file
/// and the environment.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub seed: Option<u64>,
    pub device_url: Option<String>,
}

impl CliOptions {
    pub fn apply(&self, cfg: &mut SimulatorConfig) {
        if let Some(bind) = &self.bind {
            cfg.server.bind = bind.clone();
        }
        if let Some(port) = self.port {
            cfg.server.port = port;
        }
        if let Some(seed) = self.seed {
            cfg.simulation.seed = Some(seed);
        }
        if let Some(url) = &self.device_url {
            cfg.device.forward_url = (!url.is_empty()).then(|| url.clone());
        }
    }
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions::default();

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                if opts.config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--bind" => {
                i += 1;
                let addr = args.next_or_err(i, "missing value for --bind (expected an IP address)")?;
                if opts.bind.replace(addr.to_string()).is_some() {
                    return Err("--bind provided more than once".to_string());
                }
            }
            "--port" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --port (expected a port number)")?;
                let port = raw
                    .parse::<u16>()
                    .map_err(|_| format!("invalid value for --port: {raw}"))?;
                if opts.port.replace(port).is_some() {
                    return Err("--port provided more than once".to_string());
                }
            }
            "--seed" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --seed (expected an unsigned integer)")?;
                let seed = raw
                    .parse::<u64>()
                    .map_err(|_| format!("invalid value for --seed: {raw}"))?;
                if opts.seed.replace(seed).is_some() {
                    return Err("--seed provided more than once".to_string());
                }
            }
            "--device-url" => {
                i += 1;
                let url = args.next_or_err(i, "missing value for --device-url (expected a base URL)")?;
                if opts.device_url.replace(url.to_string()).is_some() {
                    return Err("--device-url provided more than once".to_string());
                }
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    Ok(opts)
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  meter-light-sim [--config <path>] [--bind <ip>] [--port <n>] [--seed <n>] [--device-url <url>]"
    );
    eprintln!();
    eprintln!("Environment: SHELLY_DEVICE_URL, PORT, SIM_SEED, RUST_LOG");
}
