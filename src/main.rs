//! FitBuddy command line client

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fitbuddy::api::{ApiClient, ChatClient, Gender, PoseAnalyzer, WorkoutGoal};
use fitbuddy::capture::PatternCapture;
use fitbuddy::chat::Conversation;
use fitbuddy::pipeline::PoseSampler;
use fitbuddy::sink::{ChannelSink, FanoutSink, FeedbackBoard, ResultSink};
use fitbuddy::weight::WeightLog;
use fitbuddy::workout::{self, format_clock, Category, SessionCommand, WorkoutSession};
use fitbuddy::{forms, Config};

#[derive(Parser)]
#[command(name = "fitbuddy", version, about = "Workout companion with live pose feedback")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the backend is reachable
    Ping,
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        password_confirm: String,
    },
    /// Sign in
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Submit body measurements and workout goal
    UserInfo {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        height: String,
        #[arg(long, default_value = "")]
        weight: String,
        #[arg(long)]
        gender: Option<Gender>,
        #[arg(long)]
        goal: Option<WorkoutGoal>,
    },
    /// Ask the coaching assistant; reads stdin line by line when no message is given
    Chat { message: Vec<String> },
    /// List exercises
    Catalog { category: Option<Category> },
    /// Show the weekly weight log, optionally recording today's weight
    Weight {
        /// Weight entered at sign-up, in kg
        #[arg(long)]
        initial: Option<String>,
        /// Today's weight, in kg
        #[arg(long)]
        today: Option<String>,
    },
    /// Run a timed exercise with live pose feedback
    Workout {
        /// Exercise id from the catalog
        #[arg(long)]
        exercise: u32,
        /// Override the exercise duration, e.g. "45s"
        #[arg(long)]
        duration: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fitbuddy=debug")),
        )
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Ping => {
            let client = ApiClient::new(&config.api)?;
            match client.ping().await {
                Ok(reply) => println!("{:?}", reply),
                Err(e) => {
                    error!("Ping failed: {}", e);
                    return Err(eyre!(e.user_message("Ping")));
                }
            }
        }
        Command::Signup {
            email,
            name,
            password,
            password_confirm,
        } => {
            let request = forms::validate_signup(&email, &name, &password, &password_confirm)?;
            let client = ApiClient::new(&config.api)?;
            match client.signup(&request).await {
                Ok(reply) if reply.success => {
                    info!(email = %request.email, "Account created");
                    println!("{}", reply.message);
                }
                Ok(reply) => return Err(eyre!(reply.message)),
                Err(e) => {
                    error!("Signup request failed: {}", e);
                    return Err(eyre!(e.user_message("Sign-up")));
                }
            }
        }
        Command::Login { email, password } => {
            let request = forms::validate_login(&email, &password)?;
            let client = ApiClient::new(&config.api)?;
            match client.login(&request).await {
                Ok(reply) if reply.success => println!("Logged in"),
                Ok(reply) => return Err(eyre!(reply.message)),
                Err(e) => {
                    error!("Login request failed: {}", e);
                    return Err(eyre!(e.user_message("Login")));
                }
            }
        }
        Command::UserInfo {
            email,
            height,
            weight,
            gender,
            goal,
        } => {
            let request = forms::validate_user_info(&email, &height, &weight, gender, goal)?;
            let client = ApiClient::new(&config.api)?;
            match client.update_user_info(&request).await {
                Ok(reply) if reply.success => println!("{}", reply.message),
                Ok(reply) => return Err(eyre!(reply.message)),
                Err(e) => {
                    error!("User info request failed: {}", e);
                    return Err(eyre!(e.user_message("Saving your profile")));
                }
            }
        }
        Command::Chat { message } => {
            let client = ChatClient::new(&config.chat)?;
            let mut conversation = Conversation::new();
            if message.is_empty() {
                chat_loop(&client, &mut conversation).await?;
            } else {
                ask(&client, &mut conversation, &message.join(" ")).await;
            }
        }
        Command::Catalog { category } => {
            let categories = category.map(|c| vec![c]).unwrap_or_else(|| Category::ALL.to_vec());
            for category in categories {
                println!("{}", category.title());
                for exercise in workout::catalog(category) {
                    println!(
                        "  {:>2}  {:<20} {:>4}s  {:>3} kcal",
                        exercise.id,
                        exercise.name,
                        exercise.duration.as_secs(),
                        exercise.kcal
                    );
                }
            }
        }
        Command::Weight { initial, today } => {
            let mut log = WeightLog::new(initial.as_deref(), Local::now().date_naive());
            if let Some(input) = today.as_deref() {
                if log.record_today(input).is_none() {
                    warn!("Not a weight: {:?}", input);
                }
            }
            for entry in log.history() {
                println!("{:>6}  {:.1}", log.label(entry), entry.kg);
            }
            println!("Current: {}", log.display());
        }
        Command::Workout { exercise, duration } => {
            let exercise = workout::find_exercise(exercise)
                .ok_or_else(|| eyre!("No exercise with id {}", exercise))?;
            let duration = duration
                .as_deref()
                .map(workout::parse_duration)
                .unwrap_or(exercise.duration);
            run_workout(&config, exercise.name, duration).await?;
        }
    }

    Ok(())
}

async fn ask(client: &ChatClient, conversation: &mut Conversation, input: &str) {
    let Some(question) = conversation.push_user(input).map(|m| m.text.clone()) else {
        return;
    };

    match client.send(&question).await {
        Ok(reply) => println!("{}", conversation.push_coach(reply.reply)),
        Err(e) => {
            error!("Chat request failed: {}", e);
            eprintln!("{}", e.user_message("Chat"));
        }
    }
}

async fn chat_loop(client: &ChatClient, conversation: &mut Conversation) -> Result<()> {
    for message in conversation.messages() {
        println!("{}", message);
    }
    println!("(Ctrl-D to quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        ask(client, conversation, &line).await;
    }
    Ok(())
}

async fn run_workout(config: &Config, name: &str, duration: Duration) -> Result<()> {
    let analyzer: Arc<dyn PoseAnalyzer> = Arc::new(ApiClient::new(&config.api)?);

    // The terminal plays the display: feedback is printed from its own task
    let board = Arc::new(FeedbackBoard::default());
    let (channel, feedback_rx) = ChannelSink::new();
    let sink: Arc<dyn ResultSink> = Arc::new(FanoutSink::new(vec![
        board.clone() as Arc<dyn ResultSink>,
        Arc::new(channel),
    ]));
    let display = tokio::spawn(async move {
        while let Ok(feedback) = feedback_rx.recv_async().await {
            println!(">> {}", feedback);
        }
    });

    let sampler = PoseSampler::new(
        &config.pipeline,
        analyzer,
        sink,
        tokio::runtime::Handle::current(),
    );
    let session = WorkoutSession::new(name, duration).with_frame_queue(config.pipeline.frame_queue);

    let controller = session.controller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = controller.send(SessionCommand::Finish);
        }
    });

    println!("{} | {}", name, board.current());
    let on_tick = |remaining: Duration| println!("{}  {}", format_clock(remaining), name);

    let summary = if config.capture.device.is_empty() {
        let mut source = PatternCapture::new(config.capture.clone());
        session.run(&mut source, sampler, on_tick).await?
    } else {
        run_camera(config, session, sampler, on_tick).await?
    };

    if summary.completed {
        println!("Workout complete! {}", board.current());
    } else {
        warn!("Workout stopped early after {:?}", summary.elapsed);
    }
    display.abort();
    Ok(())
}

#[cfg(feature = "v4l2")]
async fn run_camera<F: FnMut(Duration)>(
    config: &Config,
    session: WorkoutSession,
    sampler: PoseSampler,
    on_tick: F,
) -> Result<fitbuddy::workout::SessionSummary> {
    use fitbuddy::capture::FrameSource as _;

    let mut source = fitbuddy::capture::V4l2Capture::new(config.capture.clone())?;
    source.start_stream()?;
    info!("Using capture device {} ({} slots)", config.capture.device, source.pool().capacity());
    Ok(session.run(&mut source, sampler, on_tick).await?)
}

#[cfg(not(feature = "v4l2"))]
async fn run_camera<F: FnMut(Duration)>(
    config: &Config,
    _session: WorkoutSession,
    _sampler: PoseSampler,
    _on_tick: F,
) -> Result<fitbuddy::workout::SessionSummary> {
    Err(eyre!(
        "capture device {} configured but camera support is not built in (enable the v4l2 feature)",
        config.capture.device
    ))
}
