// sim900-cli -- command-line tool for exercising a SIM900 modem against
// real hardware or a scripted mock transport.
//
// Usage:
//   sim900-cli --port /dev/ttyUSB0 status
//   sim900-cli --port /dev/ttyUSB0 provider
//   sim900-cli --port /dev/ttyUSB0 send 0901484041 "bonjour mon ami"
//   sim900-cli --port /dev/ttyUSB0 list
//   sim900-cli --port /dev/ttyUSB0 --baud 9600 delete-read
//   sim900-cli --mock list

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sim900::protocol::provider_from_line;
use sim900::{commands, Sim900, Sim900Builder, SimStatus, Timing};
use sim900_test_harness::MockTransport;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// sim900-cli -- talks to a SIM900 GSM modem from the command line.
#[derive(Parser)]
#[command(name = "sim900-cli", version, about)]
struct Cli {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3). Required unless --mock is used.
    #[arg(long)]
    port: Option<String>,

    /// Baud rate of the modem UART.
    #[arg(long, default_value_t = sim900::builder::DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Log filter used when RUST_LOG is not set (e.g. info, debug, sim900=trace).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Multiply every settle delay by this factor (slow networks need > 1).
    #[arg(long, default_value_t = 1.0)]
    timing_scale: f64,

    /// Use a scripted mock modem instead of a real serial port.
    /// Useful for verifying CLI parsing and session wiring without hardware.
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the modem answers `AT` with `OK`.
    Probe,

    /// Print SIM insertion status.
    Status,

    /// Print the service provider name.
    Provider,

    /// Send a text message.
    Send {
        /// Recipient phone number.
        phone: String,
        /// Message text.
        body: String,
    },

    /// List every stored message.
    List,

    /// Delete every message that has been read.
    DeleteRead,

    /// Restore factory defaults, then re-apply the driver settings.
    FactoryReset {
        /// Number of times to repeat `AT&F`.
        #[arg(long, default_value_t = sim900::DEFAULT_FACTORY_RESET_ATTEMPTS)]
        attempts: u32,
    },
}

// ---------------------------------------------------------------------------
// Session construction
// ---------------------------------------------------------------------------

fn scaled_timing(scale: f64) -> Result<Timing> {
    anyhow::ensure!(
        scale.is_finite() && scale > 0.0,
        "--timing-scale must be a positive number"
    );
    let s = |d: Duration| d.mul_f64(scale);
    let t = Timing::default();
    Ok(Timing {
        per_byte: s(t.per_byte),
        init_step: s(t.init_step),
        send_prompt: s(t.send_prompt),
        reset_settle: s(t.reset_settle),
        list_settle: s(t.list_settle),
        delete_settle: s(t.delete_settle),
        read_poll: s(t.read_poll),
    })
}

/// Script a mock modem that answers the startup exchange and `command`.
fn scripted_modem(command: &Command) -> MockTransport {
    const OK: &[u8] = b"\r\nOK\r\n";
    let mock = MockTransport::new();
    for build in commands::INIT_SEQUENCE {
        mock.expect(&build(), OK);
    }
    mock.expect(&commands::cmd_probe(), OK);

    match command {
        Command::Probe => mock.expect(&commands::cmd_probe(), OK),
        Command::Status => mock.expect(
            &commands::cmd_sim_inserted_status(),
            b"\r\n+CSMINS: 0,1\r\n\r\nOK\r\n",
        ),
        Command::Provider => mock.expect(
            &commands::cmd_provider_name(),
            b"\r\n+CSPN: \"Mock Mobile\",0\r\n\r\nOK\r\n",
        ),
        Command::Send { phone, body } => {
            mock.expect(&commands::cmd_send_message(phone), b"\r\n> ");
            mock.expect(&commands::cmd_message_body(body), b"\r\n+CMGS: 1\r\n\r\nOK\r\n");
        }
        Command::List => mock.expect(
            &commands::cmd_list_all(),
            b"\r\n+CMGL: 1,\"REC UNREAD\",\"+84912345678\",,\"23/05/10,14:32:05+28\"\r\n\
              Hello there\r\n\
              +CMGL: 2,\"REC READ\",\"0901484041\",,\"23/05/09,07:05:00+28\"\r\n\
              bonjour mon ami\r\n\r\nOK\r\n",
        ),
        Command::DeleteRead => mock.expect(&commands::cmd_delete_read(), OK),
        Command::FactoryReset { attempts } => {
            for _ in 0..*attempts {
                mock.expect(&commands::cmd_factory_reset(), OK);
            }
            for build in commands::INIT_SEQUENCE {
                mock.expect(&build(), OK);
            }
        }
    }
    mock
}

async fn open_modem(cli: &Cli) -> Result<Sim900> {
    if cli.mock {
        let modem = Sim900Builder::new()
            .timing(Timing::immediate())
            .build_with_transport(Box::new(scripted_modem(&cli.command)))
            .await
            .context("failed to open session on mock transport")?;
        println!("Connected (mock transport)");
        return Ok(modem);
    }

    let port = cli
        .port
        .as_deref()
        .context("--port is required when not using --mock")?;
    let modem = Sim900Builder::new()
        .serial_port(port)
        .baud_rate(cli.baud)
        .timing(scaled_timing(cli.timing_scale)?)
        .build()
        .await
        .with_context(|| format!("failed to open SIM900 on {port}"))?;
    println!("Connected -- {port} @ {} baud", cli.baud);
    Ok(modem)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn run(modem: &mut Sim900, command: &Command) -> Result<()> {
    match command {
        Command::Probe => {
            let alive = modem.probe().await?;
            println!("{}", if alive { "OK" } else { "no answer" });
        }
        Command::Status => match modem.sim_status().await? {
            Some(line) => {
                println!("{line}");
                match SimStatus::parse(&line) {
                    Ok(status) => println!(
                        "SIM {}",
                        if status.inserted { "inserted" } else { "not inserted" }
                    ),
                    Err(e) => tracing::warn!(error = %e, "Could not interpret SIM status"),
                }
            }
            None => println!("SIM status unknown (modem may still be booting)"),
        },
        Command::Provider => match modem.provider_name().await? {
            Some(line) => {
                println!("{line}");
                if let Some(name) = provider_from_line(&line) {
                    println!("Provider: {name}");
                }
            }
            None => println!("Provider unknown (not registered yet?)"),
        },
        Command::Send { phone, body } => {
            modem.send_message(phone, body).await?;
            println!("Message handed to modem for {phone}");
        }
        Command::List => {
            let messages = modem.list_messages().await?;
            if messages.is_empty() {
                println!("No messages (or the modem was resynchronized; try again)");
            }
            for sms in messages {
                println!("[{}] {sms}\n", sms.index());
            }
        }
        Command::DeleteRead => {
            modem.delete_read_messages().await?;
            println!("Read messages deleted");
        }
        Command::FactoryReset { attempts } => {
            modem.factory_reset(*attempts).await?;
            modem.reinitialize().await?;
            println!("Factory reset done ({attempts} attempts)");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid --log-level filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut modem = open_modem(&cli).await?;
    let result = run(&mut modem, &cli.command).await;
    if let Err(e) = modem.close().await {
        tracing::warn!(error = %e, "Failed to close modem session");
    }
    result
}
