//! CLI entry point for the simulator client: sensor polling and one-shot
//! board commands.

use arduino_sim::board::Led;
use arduino_sim::client::{ArduinoClient, ClientError, PollOptions};
use arduino_sim::config::{self, Config, ConfigError};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Arduino simulator client
#[derive(Parser, Debug)]
#[command(name = "arduino-client", about = "Poll sensors and drive LEDs on the Arduino simulator.")]
struct Cli {
    /// Path to a TOML config file (overrides defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server URL (overrides config)
    #[arg(long)]
    url: Option<String>,

    /// Delay between samples when polling, in milliseconds (overrides config)
    #[arg(long)]
    interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read temperature and light continuously (default)
    Poll {
        /// Print raw pin values instead of TEMP/LIGHT lines
        #[arg(long)]
        raw: bool,
        /// Stop after this many samples
        #[arg(long)]
        iterations: Option<u64>,
    },
    /// Read temperature and light once
    Read,
    /// Switch an LED on (or off with --off)
    Led {
        #[arg(value_enum)]
        led: LedArg,
        #[arg(long)]
        off: bool,
    },
    /// Ask the board to blink the built-in LED
    Blink {
        #[arg(long, default_value_t = 3)]
        times: i64,
        #[arg(long, default_value_t = 500)]
        delay: i64,
    },
    /// Print the full board state
    State,
    /// Turn every LED and digital pin off
    Reset,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LedArg {
    BuiltIn,
    Red,
    Green,
    Blue,
    Yellow,
}

impl From<LedArg> for Led {
    fn from(arg: LedArg) -> Self {
        match arg {
            LedArg::BuiltIn => Led::BuiltIn,
            LedArg::Red => Led::Red,
            LedArg::Green => Led::Green,
            LedArg::Blue => Led::Blue,
            LedArg::Yellow => Led::Yellow,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let config = load(&cli).map_err(|e| {
        tracing::error!("Failed to load config: {}", e);
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })?;

    let command = cli.command.unwrap_or(Commands::Poll { raw: false, iterations: None });
    if let Err(e) = run(&config, command).await {
        tracing::error!("{}", e);
        return Err(Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>);
    }
    Ok(())
}

fn load(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(&path.to_string_lossy())?,
        None => Config::default(),
    };
    if let Some(url) = &cli.url {
        config.client.url = url.clone();
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.client.poll_interval_ms = interval_ms;
    }
    config.validate()?;
    Ok(config)
}

async fn run(config: &Config, command: Commands) -> Result<(), ClientError> {
    let mut client = ArduinoClient::connect(&config.client.url).await?;
    let startup_delay = Duration::from_millis(config.client.startup_delay_ms);

    match command {
        Commands::Poll { raw, iterations } => {
            tokio::time::sleep(startup_delay).await;
            let options = PollOptions {
                interval: Duration::from_millis(config.client.poll_interval_ms),
                raw,
                iterations,
            };
            println!("Starting continuous sensor reading...");
            let taken = client.poll(&mut std::io::stdout(), &options).await?;
            println!();
            tracing::info!("Took {} samples", taken);
        }
        Commands::Read => {
            tokio::time::sleep(startup_delay).await;
            let reading = client.read_sensors().await?;
            println!("Sensor Data: {}", reading);
        }
        Commands::Led { led, off } => {
            let reply = client.set_led(led.into(), !off).await?;
            println!("{}", reply.message.unwrap_or_else(|| "Done".to_string()));
        }
        Commands::Blink { times, delay } => {
            let reply = client.blink(times, delay).await?;
            println!("{}", reply.message.unwrap_or_else(|| "Blinking...".to_string()));
        }
        Commands::State => {
            let state = client.state().await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Commands::Reset => {
            let state = client.reset().await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
    }

    client.close().await
}
