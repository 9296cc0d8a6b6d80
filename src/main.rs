use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use signflow::{
    create_router, AppState, CaptureSourceFactory, CaptureSourceKind, Config, Mode, Notification,
    StreamingSession,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "signflow", about = "Stream webcam frames to a sign-language recognition server")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/signflow")]
    config: String,

    /// Override the server WebSocket URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Override the initial mode (LIVE or TRAINING)
    #[arg(long)]
    mode: Option<Mode>,

    /// Override the initial language
    #[arg(long)]
    language: Option<String>,

    /// Stream this image instead of the configured capture source
    #[arg(long)]
    image: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stream now; read commands from stdin
    Stream,
    /// Serve the HTTP control API
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("SignFlow v{}", env!("CARGO_PKG_VERSION"));

    let mut session_config = cfg.session_config();
    if let Some(endpoint) = cli.endpoint {
        session_config.endpoint = endpoint;
    }
    if let Some(mode) = cli.mode {
        session_config.initial_mode = mode;
    }
    if let Some(language) = cli.language {
        session_config.initial_language = language;
    }

    let source_kind = match cli.image {
        Some(path) => CaptureSourceKind::StillImage(path),
        None => cfg.capture_source()?,
    };
    let source = CaptureSourceFactory::create(source_kind)?;

    let (session, notifications) = StreamingSession::with_websocket(session_config, source)
        .context("Failed to create streaming session")?;
    let session = Arc::new(session);

    match cli.command {
        Command::Stream => run_stream(session, notifications).await,
        Command::Serve => run_server(&cfg, session, notifications).await,
    }
}

async fn run_stream(
    session: Arc<StreamingSession>,
    mut notifications: mpsc::UnboundedReceiver<Notification>,
) -> Result<()> {
    session.start()?;

    println!("Commands: mode live|training, lang <code>, gloss <text>, start, stop, status, quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            notification = notifications.recv() => match notification {
                Some(notification) => print_notification(&notification),
                None => break,
            },
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !handle_command(&session, line.trim()) {
                        break;
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let stats = session.stop();
    info!(
        "Session finished: {} frames sent, {} words recognized",
        stats.frames_encoded, stats.words_recognized
    );

    Ok(())
}

/// Returns `false` when the user asked to quit
fn handle_command(session: &StreamingSession, line: &str) -> bool {
    let (command, argument) = match line.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (line, ""),
    };

    let result = match command {
        "" => Ok(()),
        "quit" | "exit" => return false,
        "start" => session.start(),
        "stop" => {
            session.stop();
            Ok(())
        }
        "status" => {
            match serde_json::to_string_pretty(&session.stats()) {
                Ok(json) => println!("{}", json),
                Err(e) => warn!("Failed to render stats: {}", e),
            }
            Ok(())
        }
        "mode" => match argument.parse::<Mode>() {
            Ok(mode) => {
                if session.set_mode(mode) {
                    println!("Mode: {}", mode);
                }
                Ok(())
            }
            Err(e) => {
                println!("{}", e);
                Ok(())
            }
        },
        "lang" | "language" => session.set_language(argument).map(|_| ()),
        "gloss" => session.send_gloss(argument).map(|()| {
            println!("Gloss \"{}\" sent. Show it in front of the camera", argument);
        }),
        other => {
            println!("Unknown command: {}", other);
            Ok(())
        }
    };

    if let Err(e) = result {
        println!("{}", e);
    }

    true
}

fn print_notification(notification: &Notification) {
    match notification {
        Notification::Connected => println!("Connected to recognition server"),
        Notification::RecognizedWord { text } => println!("Recognized: {}", text),
        Notification::ServerError { status, message } => {
            println!("Server error {}: {}", status, message.as_deref().unwrap_or(""))
        }
        Notification::ConnectionClosed { .. } => println!("Connection to server closed"),
        Notification::ConnectionError { reason } => println!("Connection error: {}", reason),
    }
}

async fn run_server(
    cfg: &Config,
    session: Arc<StreamingSession>,
    mut notifications: mpsc::UnboundedReceiver<Notification>,
) -> Result<()> {
    tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            info!("Session notification: {:?}", notification);
        }
    });

    let app = create_router(AppState::new(session));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("{} control API listening on {}", cfg.service.name, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
