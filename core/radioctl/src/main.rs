//! radioctl: command-line client for radiod.
//!
//! ## Subcommands
//!
//! - `health`: Daemon status and per-radio tracker snapshots
//! - `list`: Every registered radio with its current state
//! - `state` / `tri-state`: Query one radio
//! - `toggle`: Flip one radio
//! - `event`: Inject a hardware broadcast (JSON payload)

mod daemon_client;
mod logging;

use clap::{Parser, Subcommand, ValueEnum};
use radio_protocol::{HardwareEvent, RadioKind};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "radioctl")]
#[command(about = "Query and toggle radios managed by radiod")]
#[command(version)]
struct Cli {
    /// Print compact JSON instead of pretty-printed output
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show daemon health
    Health,

    /// List all registered radios
    List,

    /// Show the five-state value of a radio
    State {
        #[arg(value_enum)]
        radio: RadioArg,
    },

    /// Show the enabled/disabled/intermediate value of a radio
    TriState {
        #[arg(value_enum)]
        radio: RadioArg,
    },

    /// Toggle a radio
    Toggle {
        #[arg(value_enum)]
        radio: RadioArg,
    },

    /// Inject a hardware broadcast, e.g. '{"action":"usb_state_changed","connected":true}'
    Event {
        #[arg(value_name = "JSON")]
        payload: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RadioArg {
    Wifi,
    WifiAp,
    Bluetooth,
    Wimax,
    UsbTether,
}

impl From<RadioArg> for RadioKind {
    fn from(arg: RadioArg) -> Self {
        match arg {
            RadioArg::Wifi => RadioKind::Wifi,
            RadioArg::WifiAp => RadioKind::WifiAp,
            RadioArg::Bluetooth => RadioKind::Bluetooth,
            RadioArg::Wimax => RadioKind::Wimax,
            RadioArg::UsbTether => RadioKind::UsbTether,
        }
    }
}

fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(data) => print_value(&data, cli.compact),
        Err(err) => {
            tracing::error!(error = %err, "radioctl command failed");
            eprintln!("radioctl: {}", err);
            std::process::exit(1);
        }
    }
}

fn run(command: Commands) -> daemon_client::Result<Value> {
    match command {
        Commands::Health => daemon_client::health(),
        Commands::List => daemon_client::list_radios(),
        Commands::State { radio } => daemon_client::get_state(radio.into()),
        Commands::TriState { radio } => daemon_client::get_tri_state(radio.into()),
        Commands::Toggle { radio } => {
            let radio: RadioKind = radio.into();
            tracing::info!(radio = %radio, "Toggling radio");
            daemon_client::toggle(radio)
        }
        Commands::Event { payload } => {
            let event: HardwareEvent = serde_json::from_str(&payload)?;
            tracing::info!(action = event.action(), "Injecting hardware event");
            daemon_client::send_event(&event)
        }
    }
}

fn print_value(value: &Value, compact: bool) {
    let rendered = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    match rendered {
        Ok(text) => println!("{}", text),
        Err(err) => eprintln!("radioctl: failed to render response: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn radio_args_use_protocol_ids() {
        let cli = Cli::try_parse_from(["radioctl", "toggle", "usb-tether"]).unwrap();
        match cli.command {
            Commands::Toggle { radio } => {
                assert_eq!(RadioKind::from(radio), RadioKind::UsbTether)
            }
            _ => panic!("expected toggle"),
        }

        assert!(Cli::try_parse_from(["radioctl", "state", "nfc"]).is_err());
    }

    #[test]
    fn event_payload_must_be_a_known_broadcast() {
        let err = run(Commands::Event {
            payload: r#"{"action":"nfc_state_changed"}"#.to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, daemon_client::ClientError::Json(_)));
    }
}
