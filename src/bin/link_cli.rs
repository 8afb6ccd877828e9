//! Manual link harness
//!
//! Command-line tool to poke a running simulator endpoint by hand: read and
//! write datarefs, fire command phases, and watch the wire traffic at debug
//! level.
//!
//! Usage:
//!   cargo run --bin link_cli -- get sim/cockpit2/gauges/indicators/airspeed_kts_pilot
//!   cargo run --bin link_cli -- set sim/cockpit/autopilot/heading_mag float 270
//!   cargo run --bin link_cli -- hold sim/starters/engage_starter_1 2000

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::Level;
use xplane_link::codec;
use xplane_link::{DataRef, DataRefType, Link, LinkConfig};

#[derive(Parser)]
#[command(name = "link_cli")]
#[command(about = "Manual harness for the X-Plane voice link endpoint")]
struct Args {
    /// Socket path of the simulator endpoint
    #[arg(short, long, default_value = xplane_link::DEFAULT_SOCKET_PATH)]
    socket: String,

    /// Connect timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    connect_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read one dataref
    Get { name: String },
    /// Write one dataref; TYPE is int, float, double, float-array, int-array or data
    Set {
        name: String,
        #[arg(value_name = "TYPE")]
        data_type: String,
        value: String,
    },
    /// Start holding one or more ;-separated commands
    Begin { commands: String },
    /// Release one or more ;-separated commands
    End { commands: String },
    /// Fire one or more ;-separated commands once
    Once { commands: String },
    /// Hold one or more ;-separated commands for a duration
    Hold { commands: String, duration_ms: u32 },
}

fn parse_data_type(raw: &str) -> anyhow::Result<DataRefType> {
    match raw {
        "int" => Ok(DataRefType::Int),
        "float" => Ok(DataRefType::Float),
        "double" => Ok(DataRefType::Double),
        "float-array" => Ok(DataRefType::FloatArray),
        "int-array" => Ok(DataRefType::IntArray),
        "data" => Ok(DataRefType::Data),
        other => bail!("unknown dataref type: {}", other),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    let config = LinkConfig::default()
        .with_socket_path(&args.socket)
        .with_connect_timeout_ms(args.connect_timeout_ms);
    config.validate()?;
    let mut link = Link::new(config);

    let ok = match args.command {
        Command::Get { name } => match link
            .get_dataref(&name)
            .await
            .context("get request failed")?
        {
            Some(dataref) => {
                println!("{}", codec::encode_dataref(&dataref));
                true
            }
            None => {
                println!("{}", codec::SENTINEL_INVALID_DATAREF);
                false
            }
        },
        Command::Set {
            name,
            data_type,
            value,
        } => {
            let data_type = parse_data_type(&data_type)?;
            let value = codec::parse_wire_value(data_type, &value)
                .with_context(|| format!("cannot parse {:?} as {:?}", value, data_type))?;
            link.set_dataref(&DataRef::new(name, value))
                .await
                .context("set request failed")?
        }
        Command::Begin { commands } => link
            .begin_command(&commands)
            .await
            .context("begin request failed")?,
        Command::End { commands } => link
            .end_command(&commands)
            .await
            .context("end request failed")?,
        Command::Once { commands } => link
            .once_command(&commands)
            .await
            .context("once request failed")?,
        Command::Hold {
            commands,
            duration_ms,
        } => link
            .hold_command(&commands, duration_ms)
            .await
            .context("hold request failed")?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
