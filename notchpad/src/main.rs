mod app;
mod core;
mod effect;
mod input;
mod ipc;
#[cfg(target_os = "macos")]
mod macos;
mod platform;
mod scheduler;

use anyhow::Result;
use argh::FromArgs;
use ipc::IpcClient;
use notchpad_ipc::{Command, RectInfo, Response, StateInfo};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Notchpad - drop target and quick-access panel in the display notch
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Start(StartCmd),
    Version(VersionCmd),
    Open(OpenCmd),
    Close(CloseCmd),
    Pop(PopCmd),
    GetState(GetStateCmd),
    Quit(QuitCmd),
}

/// Start the notchpad daemon, or reactivate the running one
#[derive(FromArgs)]
#[argh(subcommand, name = "start")]
struct StartCmd {}

/// Show version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCmd {}

/// Open the panel as if it had been clicked
#[derive(FromArgs)]
#[argh(subcommand, name = "open")]
struct OpenCmd {}

/// Close the panel
#[derive(FromArgs)]
#[argh(subcommand, name = "close")]
struct CloseCmd {}

/// Play the pop animation
#[derive(FromArgs)]
#[argh(subcommand, name = "pop")]
struct PopCmd {}

/// Print the current panel state
#[derive(FromArgs)]
#[argh(subcommand, name = "get-state")]
struct GetStateCmd {}

/// Quit the notchpad daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "quit")]
struct QuitCmd {}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();
    match cli.command {
        None => {
            // No subcommand - show help (simulate --help)
            let args: Vec<&str> = vec!["notchpad", "--help"];
            match Cli::from_args(&args[..1], &args[1..]) {
                Ok(_) => {}
                Err(e) => {
                    println!("{}", e.output);
                }
            }
            Ok(())
        }
        Some(SubCommand::Start(_)) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .init();

            // A running daemon turns a second launch into a reactivation
            if let Ok(mut client) = IpcClient::connect() {
                tracing::info!("notchpad already running, reactivating");
                return print_response(client.send(&Command::Reactivate)?);
            }

            tracing::info!("notchpad starting");
            app::App::run()
        }
        Some(SubCommand::Version(_)) => {
            println!("notchpad {}", VERSION);
            Ok(())
        }
        Some(subcmd) => run_cli(subcmd),
    }
}

fn run_cli(subcmd: SubCommand) -> Result<()> {
    let cmd = to_command(subcmd);
    let mut client = IpcClient::connect()?;
    print_response(client.send(&cmd)?)
}

fn to_command(subcmd: SubCommand) -> Command {
    match subcmd {
        SubCommand::Start(_) | SubCommand::Version(_) => {
            unreachable!("handled in main")
        }
        SubCommand::Open(_) => Command::Open,
        SubCommand::Close(_) => Command::Close,
        SubCommand::Pop(_) => Command::Pop,
        SubCommand::GetState(_) => Command::GetState,
        SubCommand::Quit(_) => Command::Quit,
    }
}

fn print_response(response: Response) -> Result<()> {
    match response {
        Response::Ok => {}
        Response::Error { message } => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        Response::State { state } => print_state(&state),
    }
    Ok(())
}

fn print_state(state: &StateInfo) {
    match state.reason {
        Some(reason) => println!("Status: {:?} ({:?})", state.status, reason),
        None => println!("Status: {:?}", state.status),
    }
    match state.display_id {
        Some(id) => println!("Display: {}", id),
        None => println!("Display: none"),
    }
    println!("Cutout: {}", if state.has_cutout { "yes" } else { "no" });
    println!("Notch rect: {}", format_rect(state.device_notch_rect));
    println!("Screen rect: {}", format_rect(state.screen_rect));
    println!(
        "Shape: {} radius {}",
        format_rect(state.shape_rect),
        state.corner_radius
    );
    println!("Inset: {}, spacing: {}", state.inset, state.spacing);
}

fn format_rect(rect: Option<RectInfo>) -> String {
    match rect {
        Some(r) => format!("{}x{} @ ({},{})", r.width, r.height, r.x, r.y),
        None => "-".to_string(),
    }
}
