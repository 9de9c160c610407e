use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use mosync_ioctl::{LoggerConfig, ShimConfigReader, DESCRIPTORS};
use mosync_nls::Encoding;

use script::Script;

mod script;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON script of syscalls to replay
    #[clap(required_unless_present = "list")]
    script: Option<PathBuf>,
    /// Shim configuration; defaults apply when the file is missing
    #[clap(short, long, default_value = "mosync.json")]
    config: PathBuf,
    /// Overrides the configured string encoding
    #[clap(short, long)]
    encoding: Option<String>,
    /// Print the syscall table and exit
    #[clap(short, long)]
    list: bool,
}

fn init_logger(config: &LoggerConfig) {
    env_logger::Builder::new()
        .filter_level(config.level_filter)
        .filter_module("mosync_ioctl", config.app_level_filter)
        .filter_module("mosync_runner", config.app_level_filter)
        .parse_default_env()
        .init();
}

fn run(args: Args) -> Result<()> {
    let mut config = ShimConfigReader::read_or_default(&args.config)?;
    init_logger(&config.logger_config.clone().unwrap_or_default());

    if args.list {
        println!("{}", serde_json::to_string_pretty(&DESCRIPTORS[..])?);
        return Ok(());
    }

    if let Some(encoding) = &args.encoding {
        config.string_encoding = encoding.parse::<Encoding>()?;
    }

    let Some(path) = args.script else {
        anyhow::bail!("no script given");
    };
    let script = Script::read(&path)?;
    log::info!("replaying {} calls from {path:?}", script.calls.len());

    for outcome in script.run(&config)? {
        println!("{}", serde_json::to_string(&outcome)?);
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}
