//! redpack CLI - inspect the durable client state
//!
//!   redpack session              → persisted connect intent
//!   redpack stats <address>      → cached stats entry + derived values
//!   redpack clear [address]      → drop the intent, or one cache entry
//!   redpack purge                → drop expired cache entries
//!   redpack format-eth <value>   → "0.5000"
//!   redpack format-count <n>     → "2.5k"
//!
//! Output format:
//!   --json     Output raw JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use anyhow::{anyhow, bail, Context, Result};
use redpack::config::StatsConfig;
use redpack::core::keys::session as session_keys;
use redpack::format::{format_count, format_eth, format_eth_decimal, short_address};
use redpack::logging::init_logging;
use redpack::stats::{now_ms, StatsCache};
use redpack::storage::{DurableStorage, FileStorage};
use redpack::wallet::address;
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::debug;

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("redpack {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("session") => cmd_session(&opts),
        Some("stats") => cmd_stats(&opts),
        Some("clear") => cmd_clear(&opts),
        Some("purge") => cmd_purge(&opts),
        Some("format-eth") => cmd_format_eth(&opts),
        Some("format-count") => cmd_format_count(&opts),
        Some(cmd) => Err(anyhow!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = !opts.json && (opts.pretty || std::io::stdout().is_terminal());
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": format!("{:#}", e)}), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    arg: Option<String>,
    data_dir: Option<String>,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--data-dir" | "-d" => {
                    if i + 1 < args.len() {
                        opts.data_dir = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                // Negative amounts for format-eth
                _ if !arg.starts_with('-') || arg.parse::<f64>().is_ok() => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        let mut positional = positional.into_iter();
        opts.command = positional.next();
        opts.arg = positional.next();
        opts
    }

    fn storage(&self) -> Result<Arc<dyn DurableStorage>> {
        let storage = match &self.data_dir {
            Some(dir) => FileStorage::open(dir),
            None => FileStorage::open_default(),
        }
        .context("opening storage")?;
        debug!(path = %storage.path().display(), "using storage");
        Ok(Arc::new(storage))
    }
}

fn print_usage() {
    println!(
        r#"redpack - red packet client state

USAGE:
    redpack <command> [arg] [options]

COMMANDS:
    session                 Show the persisted wallet connect intent
    stats <address>         Show cached stats for an address
    clear [address]         Clear the connect intent, or one address's cache
    purge                   Remove expired stats cache entries
    format-eth <value>      Format an ether amount
    format-count <n>        Abbreviate a count

OPTIONS:
    --data-dir, -d <path>   Storage directory (env: REDPACK_DATA_DIR)
    --json                  Raw JSON output
    --pretty                Pretty-print JSON
    --version, -V           Print version

ENVIRONMENT:
    RUST_LOG                Log filter (default: info)
    REDPACK_LOG_JSON=1      JSON log lines on stderr

EXAMPLES:
    redpack session
    redpack stats 0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed --json | jq .stats.totalReceived
    redpack format-eth 0.00005
"#
    );
}

fn required_address(opts: &ParsedArgs, usage: &str) -> Result<String> {
    let value = opts.arg.clone().ok_or_else(|| anyhow!("Address required: {}", usage))?;
    if !address::is_valid(&value) {
        bail!("Invalid address: {}", value);
    }
    Ok(value)
}

fn cmd_session(opts: &ParsedArgs) -> Result<Value> {
    let storage = opts.storage()?;
    let connected = storage.get_item(session_keys::CONNECTED)?;
    let saved = storage.get_item(session_keys::ADDRESS)?;
    Ok(json!({
        "connected": connected.as_deref() == Some(session_keys::CONNECTED_TRUE),
        "address": saved,
        "short": saved.as_deref().map(short_address),
    }))
}

fn cmd_stats(opts: &ParsedArgs) -> Result<Value> {
    let target = required_address(opts, "redpack stats <address>")?;
    let cache = StatsCache::new(opts.storage()?, StatsConfig::default().cache_duration);
    let entry = cache.peek(&target).ok_or_else(|| anyhow!("No cached stats for {}", target))?;

    let now = now_ms();
    let stats = &entry.stats;
    Ok(json!({
        "address": entry.address,
        "ageMs": entry.age_ms(now),
        "valid": entry.is_valid_for(&target, now, cache.duration()),
        "stats": stats,
        "derived": {
            "netAmount": stats.net_amount(),
            "avgReceived": stats.avg_received(),
            "avgSent": stats.avg_sent(),
            "successRate": stats.success_rate(),
        },
        "display": {
            "walletBalance": format_eth_decimal(stats.wallet_balance),
            "totalReceived": format_eth_decimal(stats.total_received),
            "totalSent": format_eth_decimal(stats.total_sent),
            "receivedCount": format_count(stats.received_count),
            "sentCount": format_count(stats.sent_count),
        },
    }))
}

fn cmd_clear(opts: &ParsedArgs) -> Result<Value> {
    let storage = opts.storage()?;
    match &opts.arg {
        Some(_) => {
            let target = required_address(opts, "redpack clear [address]")?;
            StatsCache::new(storage, StatsConfig::default().cache_duration).remove(&target);
            Ok(json!({"cleared": "stats", "address": target}))
        }
        None => {
            for &key in session_keys::ALL {
                storage.remove_item(key)?;
            }
            Ok(json!({"cleared": "session"}))
        }
    }
}

fn cmd_purge(opts: &ParsedArgs) -> Result<Value> {
    let cache = StatsCache::new(opts.storage()?, StatsConfig::default().cache_duration);
    Ok(json!({"removed": cache.purge_expired(now_ms())}))
}

fn cmd_format_eth(opts: &ParsedArgs) -> Result<Value> {
    let value = opts.arg.as_deref().ok_or_else(|| anyhow!("Value required: redpack format-eth <value>"))?;
    Ok(json!(format_eth(value)))
}

fn cmd_format_count(opts: &ParsedArgs) -> Result<Value> {
    let raw = opts.arg.as_deref().ok_or_else(|| anyhow!("Count required: redpack format-count <n>"))?;
    let value: u64 = raw.trim().parse().with_context(|| format!("Invalid count: {}", raw))?;
    Ok(json!(format_count(value)))
}
