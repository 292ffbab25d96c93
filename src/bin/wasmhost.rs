//! wasmhost - run a WASI preview1 guest module on the host
//!
//! Usage:
//!   wasmhost [--entry NAME] [--no-shell] [--trace FILE] <module.wasm> [ARGS]...

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use std::path::PathBuf;
use wasmhost::host::{HostConfig, Runner, Syscall, TRACE_BUFFER_SIZE, load_file};

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Guest module to run
    module: PathBuf,

    /// Arguments forwarded to the guest after its program name
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,

    /// Exported function to call
    #[arg(long, default_value = "_start")]
    entry: String,

    /// Make path_readlink answer ENOSYS instead of running host commands
    #[arg(long)]
    no_shell: bool,

    /// Write a JSON syscall trace to this file when the guest finishes
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Number of syscalls kept in the trace
    #[arg(long, default_value_t = TRACE_BUFFER_SIZE)]
    trace_capacity: usize,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            log::error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<i32> {
    let bytes = load_file(&args.module, &args.entry)
        .with_context(|| format!("failed to load {}", args.module.display()))?;

    let mut builder = HostConfig::builder()
        .entry(&args.entry)
        .arg(&args.module.to_string_lossy())
        .args(args.args.iter().cloned())
        .inherit_env()
        .shell(!args.no_shell);
    if args.trace.is_some() {
        builder = builder.trace(args.trace_capacity);
    }

    let report = Runner::new(builder.build())
        .run(&bytes)
        .with_context(|| format!("failed to run {}", args.module.display()))?;

    if let (Some(path), Some(trace)) = (&args.trace, &report.trace) {
        trace
            .write_json(path)
            .with_context(|| format!("failed to write trace to {}", path.display()))?;
        log::info!("wrote {} syscalls to {}", trace.total_calls(), path.display());
        for syscall in Syscall::ALL {
            if let Some(c) = trace.stats(syscall) {
                log::info!(
                    "  {:<22} {:>6} calls {:>4} errors {:>10.1} us avg",
                    syscall.name(),
                    c.calls(),
                    c.errors,
                    c.avg_us()
                );
            }
        }
    }

    Ok(report.outcome.exit_code)
}
