//! lights-client: terminal front-end for the shared light panel
//!
//! Connects to the light service, polls its status in the background and
//! reads intents from stdin. Every state change is rendered as it is
//! published.

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};

use lights_client::{ClientIdentity, ClientView, Config, IntentOutcome, LightId, LightsClient};

#[derive(Parser)]
#[command(name = "lights-client")]
#[command(about = "Compete for control of a shared light panel")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "lights-client.toml")]
    config: String,

    /// Light service base URL (overrides config file)
    #[arg(long, env = "LIGHTS_BASE_URL")]
    base_url: Option<String>,

    /// Client identity (generated when omitted)
    #[arg(long)]
    user_id: Option<String>,

    /// Status poll interval in seconds (overrides config file)
    #[arg(long)]
    poll_interval_secs: Option<u64>,
}

/// One line of user input
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Acquire,
    Release,
    Leave,
    Toggle(LightId),
    Song(String),
    Status,
    Help,
    Quit,
}

impl Input {
    fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let arg = words.next();

        match (command, arg) {
            ("acquire", None) => Ok(Input::Acquire),
            ("release", None) => Ok(Input::Release),
            ("leave", None) => Ok(Input::Leave),
            ("toggle", Some(id)) => id
                .parse()
                .map(Input::Toggle)
                .map_err(|_| format!("Not a light number: {}", id)),
            ("song", Some(name)) => Ok(Input::Song(name.to_string())),
            ("status", None) => Ok(Input::Status),
            ("help", None) => Ok(Input::Help),
            ("quit" | "exit", None) => Ok(Input::Quit),
            ("toggle" | "song", None) => Err(format!("Usage: {} <argument>", command)),
            _ => Err(format!("Unknown command: {} (try 'help')", line.trim())),
        }
    }
}

fn help(songs: &[String]) -> String {
    format!(
        "Commands:\n  acquire        request control\n  release        give up control\n  leave          leave the queue\n  toggle <id>    toggle a light\n  song <name>    play a song ({})\n  status         show current state\n  quit           exit",
        songs.join(", ")
    )
}

fn render(view: &ClientView) -> String {
    let mut out = format!("[{}] {}", view.user_id, view.status_line);
    if let Some(banner) = &view.error_banner {
        out.push_str(&format!("\n  ! {}", banner));
    }

    let lights: Vec<String> = view
        .lights
        .iter()
        .map(|(id, on)| format!("{}:{}", id, if *on { "on" } else { "off" }))
        .collect();
    out.push_str(&format!("\n  lights  {}", lights.join(" ")));

    let a = &view.affordances;
    let offered: Vec<&str> = [
        (a.request_control.enabled, "acquire"),
        (a.release_control.enabled, "release"),
        (a.leave_queue.enabled, "leave"),
        (a.lights.enabled, "toggle"),
        (a.songs.enabled, "song"),
    ]
    .into_iter()
    .filter_map(|(enabled, name)| enabled.then_some(name))
    .collect();
    out.push_str(&format!(
        "\n  actions {}",
        if offered.is_empty() { "none".to_string() } else { offered.join(" ") }
    ));
    out
}

async fn watch_views(mut rx: watch::Receiver<ClientView>) {
    while rx.changed().await.is_ok() {
        let view = rx.borrow_and_update().clone();
        println!("{}", render(&view));
    }
}

/// Run one intent. Returns false when the user asked to quit.
async fn dispatch(client: &LightsClient, input: Input) -> bool {
    let result = match input {
        Input::Acquire => client.request_control().await,
        Input::Release => client.release_control().await,
        Input::Leave => client.leave_queue().await,
        Input::Toggle(light) => client.toggle_light(light).await,
        Input::Song(name) => client.play_song(&name).await,
        Input::Status => {
            println!("{}", render(&client.view()));
            return true;
        }
        Input::Help => {
            println!("{}", help(client.songs()));
            return true;
        }
        Input::Quit => return false,
    };

    match result {
        Ok(IntentOutcome::Ignored) => println!("Not available right now"),
        Ok(IntentOutcome::Queued { message }) | Ok(IntentOutcome::Message(message)) => {
            println!("{}", message)
        }
        Ok(_) => {}
        Err(e) => {
            warn!(error = %e, "Intent failed");
            println!("{}", e.user_message());
        }
    }
    true
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lights_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    info!("Config file: {}", cli.config);
    let mut config = Config::load(&cli.config)?;

    // Apply CLI overrides
    if let Some(base_url) = cli.base_url {
        config.service.base_url = base_url;
    }
    if let Some(interval) = cli.poll_interval_secs {
        config.polling.interval_secs = interval;
    }
    config.validate()?;

    let identity = cli
        .user_id
        .map(ClientIdentity::from)
        .unwrap_or_else(ClientIdentity::generate);

    info!("Light service: {}", config.service.base_url);
    info!("User ID: {}", identity);

    let client = LightsClient::from_config(&config, identity)?;
    let renderer = tokio::spawn(watch_views(client.subscribe()));
    let poller = client.start_polling();

    println!("{}", help(client.songs()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match Input::parse(&line) {
                    Ok(input) => {
                        if !dispatch(&client, input).await {
                            break;
                        }
                    }
                    Err(message) => println!("{}", message),
                }
            }
        }
    }

    poller.stop().await;
    renderer.abort();
    info!("Shutting down");
    Ok(())
}
