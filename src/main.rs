//! Line-oriented control console for a pepvisor supervisor.
//!
//! Reads one command per line on stdin and answers with one JSON object per line on
//! stdout. Logs go to stderr.
//!
//! ```text
//! status                      {"B": {"status": "running", "msg": "proxy running"}, ...}
//! start | stop | restart [N]  {"success": true}
//! config                      {"B": {"self_ip": ..., "self_port": ..., ...}, ...}
//! config set <json>           {"success": true} | {"success": false, "error": "..."}
//! quit
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use pepvisor::{
    DEFAULT_CONFIG_FILE, DEFAULT_TAG_PREFIX, EndpointBook, EndpointStore, LogWriter,
    MnexecLauncher, NodeSpec, PgrepLocator, Subscribe, Supervisor, SupervisorConfig,
    wait_for_shutdown_signal,
};

#[derive(Parser, Debug)]
#[command(name = "pepvisor", version, about = "Start, stop and watch PEP proxies inside emulated nodes")]
struct Cli {
    /// Endpoint config file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config_file: PathBuf,

    /// Managed node as KEY=SCRIPT; repeat for each node. Defaults to B and C.
    #[arg(long = "node", value_name = "KEY=SCRIPT", value_parser = NodeSpec::parse_assignment)]
    nodes: Vec<NodeSpec>,

    /// Program used to enter a node's namespaces.
    #[arg(long, default_value = "mnexec")]
    mnexec: String,

    /// Program used to find a node's anchoring process.
    #[arg(long, default_value = "pgrep")]
    pgrep: String,

    /// Command-line pattern `pkill -f` matches to stop a proxy.
    #[arg(long)]
    proxy_pattern: Option<String>,

    /// Process-table tag preceding the node name.
    #[arg(long, default_value = DEFAULT_TAG_PREFIX)]
    tag_prefix: String,

    /// Seconds to wait for in-flight operations on exit (0 = do not wait).
    #[arg(long, default_value_t = 10)]
    grace_secs: u64,

    /// Stop every proxy before exiting.
    #[arg(long)]
    stop_on_exit: bool,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,
}

/// One parsed console line.
#[derive(Debug, PartialEq)]
enum Command {
    Status,
    Start(Option<String>),
    Stop(Option<String>),
    Restart(Option<String>),
    Config,
    ConfigSet(String),
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((v, r)) => (v, r.trim()),
            None => (line, ""),
        };
        let node = || (!rest.is_empty()).then(|| rest.to_string());

        let cmd = match verb {
            "status" => Command::Status,
            "start" => Command::Start(node()),
            "stop" => Command::Stop(node()),
            "restart" => Command::Restart(node()),
            "config" if rest.is_empty() => Command::Config,
            "config" => match rest.split_once(char::is_whitespace) {
                Some(("set", body)) => Command::ConfigSet(body.trim().to_string()),
                _ => return Err(format!("unknown config subcommand: {rest}")),
            },
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command: {other}")),
        };
        Ok(Some(cmd))
    }
}

fn success() -> Value {
    json!({ "success": true })
}

fn failure(error: impl std::fmt::Display) -> Value {
    json!({ "success": false, "error": error.to_string() })
}

fn to_reply(value: &impl serde::Serialize) -> Value {
    serde_json::to_value(value).unwrap_or_else(failure)
}

struct Console {
    sup: Arc<Supervisor>,
    book: EndpointBook,
}

impl Console {
    async fn handle(&self, cmd: Command) -> Value {
        match cmd {
            Command::Status => to_reply(&self.sup.snapshot()),
            Command::Start(None) => {
                self.sup.start_all();
                success()
            }
            Command::Start(Some(node)) => match self.sup.start(&node) {
                Ok(_) => success(),
                Err(e) => failure(e),
            },
            Command::Stop(None) => {
                self.sup.stop_all().await;
                success()
            }
            Command::Stop(Some(node)) => match self.sup.stop(&node).await {
                Ok(()) => success(),
                Err(e) => failure(e),
            },
            Command::Restart(None) => {
                self.sup.restart_all().await;
                success()
            }
            Command::Restart(Some(node)) => match self.sup.restart(&node).await {
                Ok(()) => success(),
                Err(e) => failure(e),
            },
            Command::Config => to_reply(&self.book.get()),
            Command::ConfigSet(body) => {
                let update: Value = match serde_json::from_str(&body) {
                    Ok(v) => v,
                    Err(e) => return failure(format!("malformed config: {e}")),
                };
                match self.book.replace(&update).await {
                    Ok(()) => success(),
                    Err(e) => {
                        warn!(label = e.as_label(), error = %e, "config rejected");
                        failure(e)
                    }
                }
            }
            Command::Quit => success(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli).await
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("pepvisor=debug")
    } else {
        EnvFilter::new("pepvisor=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut cfg = SupervisorConfig {
        grace: Duration::from_secs(cli.grace_secs),
        ..SupervisorConfig::default()
    };
    if !cli.nodes.is_empty() {
        cfg.nodes = cli.nodes;
    }
    if let Some(pattern) = cli.proxy_pattern {
        cfg.nodes = cfg
            .nodes
            .into_iter()
            .map(|spec| spec.with_proxy_pattern(pattern.clone()))
            .collect();
    }

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
    let sup = Supervisor::builder(cfg)
        .with_subscribers(subs)
        .with_locator(Arc::new(PgrepLocator::new(cli.pgrep, cli.tag_prefix)))
        .with_launcher(Arc::new(MnexecLauncher::new(cli.mnexec)))
        .build();

    let book = EndpointBook::open(EndpointStore::new(&cli.config_file), sup.nodes()).await;
    info!(
        nodes = ?sup.nodes(),
        config = %book.store().path().display(),
        grace = ?sup.config().grace,
        "console ready"
    );

    let console = Arc::new(Console {
        sup: sup.clone(),
        book,
    });
    let mut pending = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let signal = wait_for_shutdown_signal();
    tokio::pin!(signal);
    let mut signals_armed = true;

    loop {
        tokio::select! {
            sig = &mut signal, if signals_armed => match sig {
                Ok(sig) => {
                    info!(signal = %sig, "shutdown requested");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "signal handling unavailable; use quit");
                    signals_armed = false;
                }
            },
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else { break };
                match Command::parse(&line) {
                    Ok(None) => {}
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(cmd)) => {
                        let console = console.clone();
                        pending.spawn(async move {
                            println!("{}", console.handle(cmd).await);
                        });
                    }
                    Err(e) => println!("{}", failure(e)),
                }
            }
        }
        while pending.try_join_next().is_some() {}
    }

    while pending.join_next().await.is_some() {}
    if cli.stop_on_exit {
        sup.stop_all().await;
    }
    sup.shutdown().await.context("shutting down supervisor")?;
    info!("bye");
    Ok(())
}
