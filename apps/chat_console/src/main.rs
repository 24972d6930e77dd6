use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shared::{
    domain::{Point, Speaker},
    quick_reply::default_quick_replies,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast,
};
use tracing_subscriber::EnvFilter;
use widget_core::{
    load_settings, ChatController, ChatEvent, ChatHandle, GestureEnd, GestureStart,
    SubmitDecision, VerificationController, WidgetSettings,
};

mod surface;

use surface::TerminalSurface;

#[derive(Parser, Debug)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Talk to the answer service. `/topic <key>` sends a canned topic, `/quit` exits.
    Chat {
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long)]
        grace_ms: Option<u64>,
    },
    /// Replay a touch drag over a fixed ball/goal layout, then try to submit.
    Gesture {
        /// Pointer positions as `x,y`; the first starts the drag, the last releases it.
        #[arg(required = true, num_args = 2..)]
        points: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    match args.command {
        Command::Chat { endpoint, grace_ms } => {
            let mut settings = match endpoint {
                Some(endpoint) => WidgetSettings::with_endpoint(&endpoint)
                    .with_context(|| format!("invalid --endpoint '{endpoint}'"))?,
                None => load_settings(),
            };
            if let Some(ms) = grace_ms {
                settings = settings.grace_delay(Duration::from_millis(ms));
            }
            run_chat(&settings).await
        }
        Command::Gesture { points } => {
            let points = points
                .iter()
                .map(String::as_str)
                .map(parse_point)
                .collect::<Result<Vec<_>>>()?;
            run_gesture(&points);
            Ok(())
        }
    }
}

async fn run_chat(settings: &WidgetSettings) -> Result<()> {
    let chat = ChatController::from_settings(settings).context("failed to build chat client")?;
    tracing::info!(endpoint = %settings.answer_endpoint, "chat console ready");

    let printer = spawn_printer(chat.subscribe_events());
    chat.toggle_open().await;

    let topics = default_quick_replies();
    println!(
        "quick replies: {}",
        topics
            .iter()
            .map(|reply| reply.topic.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end();
        if line == "/quit" {
            break;
        }
        if let Some(key) = line.strip_prefix("/topic ") {
            let key = key.trim();
            match topics.iter().find(|reply| reply.topic == key) {
                Some(reply) => {
                    chat.quick_reply(reply).await;
                }
                None => println!("unknown topic '{key}'"),
            }
            continue;
        }
        chat.set_draft(line).await;
        chat.submit_draft().await;
    }

    chat.close_widget().await;
    // Dropping the last handle closes the event stream once the printer has drained it.
    drop(chat);
    printer.await?;
    Ok(())
}

/// Prints assistant replies until the event stream closes. Yields the number of reply lines.
fn spawn_printer(mut events: broadcast::Receiver<ChatEvent>) -> tokio::task::JoinHandle<usize> {
    tokio::spawn(async move {
        let mut printed = 0;
        loop {
            match events.recv().await {
                Ok(ChatEvent::MessageAppended(message))
                    if message.speaker == Speaker::Assistant =>
                {
                    for line in message.lines() {
                        println!("bot> {line}");
                        printed += 1;
                    }
                }
                Ok(ChatEvent::TypingStarted) => println!("bot is typing..."),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "console fell behind the chat events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        printed
    })
}

fn run_gesture(points: &[Point]) {
    let mut verification = VerificationController::new(TerminalSurface::pitch());
    let Some((first, rest)) = points.split_first() else {
        return;
    };

    verification.begin_gesture(GestureStart::Touch(*first));
    for point in rest {
        let over = verification.update_gesture_position(*point);
        println!("move to ({}, {}): over goal = {over}", point.x, point.y);
    }
    let release = rest.last().copied().unwrap_or(*first);
    let outcome = verification.end_gesture(GestureEnd::Release(release));
    println!("release: {outcome:?}");

    match verification.guard_submit() {
        SubmitDecision::Proceed { token } => {
            println!("form submitted with human_verified={}", token.as_str())
        }
        SubmitDecision::Cancel => println!("submission blocked: drag the ball into the goal"),
    }
}

fn parse_point(raw: &str) -> Result<Point> {
    let Some((x, y)) = raw.split_once(',') else {
        bail!("expected x,y but got '{raw}'");
    };
    let x = x
        .trim()
        .parse::<f64>()
        .with_context(|| format!("bad x coordinate in '{raw}'"))?;
    let y = y
        .trim()
        .parse::<f64>()
        .with_context(|| format!("bad y coordinate in '{raw}'"))?;
    Ok(Point::new(x, y))
}
