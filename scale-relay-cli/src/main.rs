// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

mod serial_link;

use clap::Parser;
use indicatif::ProgressBar;
use log::LevelFilter;
use scale_host_core::{
    DeviceSession, Measurement, RelayClient, Result, RetryPolicy, ScaleSession, SessionError,
};
use serial_link::SerialDeviceLink;
use std::io::Write;
use std::net::TcpStream;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "scale-relay",
    version,
    about = "Sets up the scale controller board, reads one weight and sends it to the collector"
)]
struct Cli {
    /// Serial device the scale controller board is attached to
    #[arg(short = 't', long = "tty", default_value = "/dev/ttyUSB0")]
    tty: String,

    /// Serial baud rate
    #[arg(short = 'b', long = "baud", default_value_t = 9600)]
    baud: u32,

    /// Collector host
    #[arg(long, default_value = "127.0.0.1")]
    relay_host: String,

    /// Collector TCP port
    #[arg(long, default_value_t = 8089)]
    relay_port: u16,

    /// Serial read timeout in seconds
    #[arg(long, default_value_t = 1)]
    timeout_secs: u64,

    /// Polls allowed per wait loop before giving up
    #[arg(long, default_value_t = 120)]
    max_polls: u32,

    /// Skip the collector: confirm the tare at the terminal and only print
    /// the weight
    #[arg(long)]
    standalone: bool,

    /// Log level
    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(cli.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Opening serial port {} at {} baud...", cli.tty, cli.baud);
    let port = match serialport::new(&cli.tty, cli.baud)
        .timeout(Duration::from_secs(cli.timeout_secs))
        .open()
    {
        Ok(port) => port,
        Err(e) => {
            log::error!("Unable to open {}: {}", cli.tty, e);
            return ExitCode::from(2);
        }
    };
    log::info!("Serial port opened");

    let retry = RetryPolicy::new(cli.max_polls);
    let device = DeviceSession::new(SerialDeviceLink::new(port), retry);

    let result = if cli.standalone {
        run_standalone(device)
    } else {
        run_relayed(&cli, device, retry)
    };

    // Both endpoints live inside the run_* helpers and are released by now
    match result {
        Ok(measurement) => {
            println!("Weight: {}", measurement.weight);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run_relayed(
    cli: &Cli,
    device: DeviceSession<SerialDeviceLink>,
    retry: RetryPolicy,
) -> Result<Measurement> {
    log::info!(
        "Connecting to collector at {}:{}...",
        cli.relay_host,
        cli.relay_port
    );
    let stream = TcpStream::connect((cli.relay_host.as_str(), cli.relay_port))?;
    let mut session = ScaleSession::new(device, RelayClient::new(stream, retry));

    session.announce()?;
    log::info!("Collector acknowledged");

    wait_with_spinner("Waiting for the scale controller to finish booting...", || {
        session.await_device_boot()
    })?;

    log::info!("Setting up scale...");
    wait_with_spinner("Taring once the collector confirms the scale is empty...", || {
        session.calibrate()
    })?;

    let measurement = session.sample()?;
    log::info!("Measured {measurement}");

    session.deliver(&measurement)?;
    log::info!("Weight sent to collector");

    Ok(measurement)
}

fn run_standalone(mut device: DeviceSession<SerialDeviceLink>) -> Result<Measurement> {
    wait_with_spinner("Waiting for the scale controller to finish booting...", || {
        device.await_boot_banner()
    })?;

    log::info!("Setting up scale...");
    device.enter_menu()?;
    device.run_tare_step(confirm_at_terminal)?;

    let measurement = device.read_weight()?;
    log::info!("Measured {measurement}");
    Ok(measurement)
}

fn confirm_at_terminal() -> Result<bool> {
    print!("Remove all weight from the scale and press enter to continue... ");
    std::io::stdout().flush().map_err(SessionError::Io)?;
    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .map_err(SessionError::Io)?;
    Ok(true)
}

fn wait_with_spinner<T>(message: &'static str, op: impl FnOnce() -> Result<T>) -> Result<T> {
    let spinner = ProgressBar::new_spinner().with_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    let result = op();
    spinner.finish_and_clear();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_field_setup() {
        let cli = Cli::parse_from(["scale-relay"]);
        assert_eq!(cli.tty, "/dev/ttyUSB0");
        assert_eq!(cli.baud, 9600);
        assert_eq!(cli.relay_host, "127.0.0.1");
        assert_eq!(cli.relay_port, 8089);
        assert_eq!(cli.timeout_secs, 1);
        assert_eq!(cli.max_polls, 120);
        assert!(!cli.standalone);
    }

    #[test]
    fn short_flags_select_tty_and_baud() {
        let cli = Cli::parse_from(["scale-relay", "-t", "/dev/ttyACM1", "-b", "115200"]);
        assert_eq!(cli.tty, "/dev/ttyACM1");
        assert_eq!(cli.baud, 115200);
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Cli::try_parse_from(["scale-relay", "--frobnicate"]).is_err());
    }
}
