//! Vidya CLI
//!
//! Command-line entry point for the teacher and student sides of the
//! shared lesson catalog. Both roles operate on the same JSON store file,
//! mirroring two browser tabs on one device.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;
use vidya_catalog::{
    merge, StudentProfile, TeacherSelection, CHARACTER_OPTIONS, LANGUAGE_OPTIONS, LIKES_OPTIONS,
};
use vidya_store::{keys, ChangeNotifier, JsonFileStore, MemoryStore, SharedStore};
use vidya_tasks::{
    publish_approval, GenerateRequest, GenerationTask, HttpGenerationClient, TaskPoller,
};

/// Default location of the shared store file.
const DEFAULT_STORE_PATH: &str = ".vidya/shared.json";

/// Default base URL of the video generation service.
const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Interval at which the CLI refreshes the displayed task status.
const STATUS_REFRESH_MS: u64 = 500;

/// Vidya - Personalized Video Lesson Tools
///
/// Lets a teacher generate and approve personalized lesson videos, and a
/// student browse and watch the approved catalog, over a shared local store.
#[derive(Parser, Debug)]
#[command(name = "vidya")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the shared store file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_STORE_PATH)]
    store: String,

    /// Base URL of the video generation service
    #[arg(long, value_name = "URL", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Teacher-side commands: personalization and video generation
    Teacher {
        #[command(subcommand)]
        action: TeacherAction,
    },

    /// Student-side commands: browsing and watching approved videos
    Student {
        #[command(subcommand)]
        action: StudentAction,
    },

    /// Runs both roles in-process to demonstrate change propagation
    Demo,
}

#[derive(Subcommand, Debug)]
enum TeacherAction {
    /// Shows or updates the stored personalization choices
    Profile {
        /// Student name the lessons address
        #[arg(long)]
        name: Option<String>,

        /// Familiar object to theme lessons around
        #[arg(long)]
        likes: Option<String>,

        /// Narration language (display name, e.g. "Hindi")
        #[arg(long)]
        language: Option<String>,

        /// Character preset (e.g. "Doraemon")
        #[arg(long)]
        character: Option<String>,
    },

    /// Submits a generation request and polls it to completion
    Generate {
        /// The topic to teach
        #[arg(long)]
        topic: String,

        /// Catalog title for the video (defaults to the topic)
        #[arg(long)]
        title: Option<String>,

        /// Publish the video to the shared catalog on completion
        #[arg(long)]
        approve: bool,
    },
}

#[derive(Subcommand, Debug)]
enum StudentAction {
    /// Lists the approved catalog with watch status
    List,

    /// Marks a video as watched
    Watch {
        /// Id of the video to mark
        #[arg(value_name = "VIDEO_ID")]
        video_id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    match args.command {
        Command::Teacher { ref action } => {
            let store = open_store(&args.store)?;
            match action {
                TeacherAction::Profile {
                    name,
                    likes,
                    language,
                    character,
                } => update_profile(
                    &store,
                    name.as_deref(),
                    likes.as_deref(),
                    language.as_deref(),
                    character.as_deref(),
                ),
                TeacherAction::Generate {
                    topic,
                    title,
                    approve,
                } => generate_video(&store, &args.api_base, topic, title.as_deref(), *approve).await,
            }
        }
        Command::Student { ref action } => {
            let store = open_store(&args.store)?;
            match action {
                StudentAction::List => {
                    list_videos(&store);
                    Ok(())
                }
                StudentAction::Watch { video_id } => watch_video(&store, video_id),
            }
        }
        Command::Demo => run_demo().await,
    }
}

/// Opens the shared store file, creating its directory if needed.
fn open_store(path: &str) -> anyhow::Result<JsonFileStore> {
    JsonFileStore::open(path, ChangeNotifier::default()).map_err(|e| {
        anyhow::anyhow!("Failed to open shared store at '{path}': {e}\n\nSuggestion: Check the --store path is writable")
    })
}

// ============================================================================
// Teacher commands
// ============================================================================

/// Shows the current selections, applying any requested updates first.
fn update_profile(
    store: &dyn SharedStore,
    name: Option<&str>,
    likes: Option<&str>,
    language: Option<&str>,
    character: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(name) = name {
        keys::save_profile(store, &StudentProfile::new(name));
    }

    let mut selection = keys::load_selection(store);
    let mut changed = false;

    if let Some(likes) = likes {
        validate_option(likes, &LIKES_OPTIONS, "--likes")?;
        selection.likes = likes.to_string();
        changed = true;
    }
    if let Some(language) = language {
        let names: Vec<&str> = LANGUAGE_OPTIONS.iter().map(|(name, _)| *name).collect();
        validate_option(language, &names, "--language")?;
        selection.language = language.to_string();
        changed = true;
    }
    if let Some(character) = character {
        validate_option(character, &CHARACTER_OPTIONS, "--character")?;
        selection.character = character.to_string();
        changed = true;
    }

    if changed {
        keys::save_selection(store, &selection);
    }

    let profile = keys::load_profile(store);
    println!("Current personalization:");
    println!("  Student name: {}", profile.name);
    println!("  Likes: {}", selection.likes);
    println!(
        "  Language: {} ({})",
        selection.language,
        selection.language_code()
    );
    println!("  Character: {}", selection.character);
    Ok(())
}

/// Rejects a value not present in the given option list.
fn validate_option(value: &str, options: &[&str], flag: &str) -> anyhow::Result<()> {
    if options.contains(&value) {
        return Ok(());
    }
    anyhow::bail!(
        "Invalid value for {flag}: '{value}'\n\nSuggestion: Choose one of: {}",
        options.join(", ")
    )
}

/// Submits a generation request and polls until the task is terminal.
async fn generate_video(
    store: &dyn SharedStore,
    api_base: &str,
    topic: &str,
    title: Option<&str>,
    approve: bool,
) -> anyhow::Result<()> {
    let profile = keys::load_profile(store);
    let selection = keys::load_selection(store);
    let request = GenerateRequest::personalized(&profile, &selection, topic);

    println!("Generating video:");
    println!("  Topic: {topic}");
    println!("  Student: {}", request.student_name);
    println!("  Language: {} ({})", selection.language, request.lang);
    println!("  Character: {}", selection.character);
    println!();

    let client = HttpGenerationClient::new(api_base)
        .map_err(|e| anyhow::anyhow!("Failed to set up the generation client: {e}"))?;
    let poller = TaskPoller::new(client);

    let mut handle = poller
        .submit(request)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let task = wait_for_terminal(&poller, &mut handle).await?;

    let Some(completed) = task.completed() else {
        anyhow::bail!("{}", task.message);
    };

    println!();
    println!("Video ready: {}", completed.result_url());

    if approve {
        let title = title.unwrap_or(topic);
        let record = publish_approval(store, &completed, title, selection.language_code());
        println!("Published to catalog as '{}' (id {})", record.title, record.id);
    } else {
        println!("Not published. Re-run with --approve to add it to the catalog.");
    }
    Ok(())
}

/// Prints status changes until the task reaches a terminal phase.
///
/// Ctrl+C resets the poller so that late responses are discarded.
async fn wait_for_terminal(
    poller: &TaskPoller<HttpGenerationClient>,
    handle: &mut vidya_tasks::PollHandle,
) -> anyhow::Result<GenerationTask> {
    let refresh = Duration::from_millis(STATUS_REFRESH_MS);
    let mut last_message = String::new();

    loop {
        tokio::select! {
            Ok(()) = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, abandoning task");
                handle.cancel();
                poller.reset().await;
                anyhow::bail!("Generation cancelled");
            }
            () = sleep(refresh) => {
                let task = poller.snapshot().await;
                if task.message != last_message {
                    println!("  {}", task.message);
                    last_message.clone_from(&task.message);
                }
                if task.is_terminal() {
                    return Ok(task);
                }
            }
        }
    }
}

// ============================================================================
// Student commands
// ============================================================================

/// Prints the approved catalog merged with the student's watch progress.
fn list_videos(store: &dyn SharedStore) {
    let catalog = keys::load_catalog(store);
    let progress = keys::load_progress(store);
    let merged = merge(&catalog, &progress);

    if merged.is_empty() {
        println!("No approved videos yet.");
        return;
    }

    println!("Approved videos:");
    for video in &merged {
        let marker = if video.status.is_completed() { "x" } else { " " };
        println!(
            "  [{marker}] {} - {} ({}) {}",
            video.record.id, video.record.title, video.record.lang, video.record.url
        );
    }
}

/// Marks a catalog video as watched.
fn watch_video(store: &dyn SharedStore, video_id: &str) -> anyhow::Result<()> {
    let catalog = keys::load_catalog(store);
    if !catalog.iter().any(|record| record.id == video_id) {
        anyhow::bail!(
            "No approved video with id '{video_id}'\n\nSuggestion: Run 'vidya student list' to see the catalog"
        );
    }

    keys::mark_video_completed(store, video_id);
    println!("Marked '{video_id}' as watched.");
    Ok(())
}

// ============================================================================
// Demo
// ============================================================================

/// Runs the teacher and student roles in one process over a memory store.
///
/// Demonstrates the change protocol: the student context is woken by the
/// teacher's catalog write, never by its own progress writes.
async fn run_demo() -> anyhow::Result<()> {
    let notifier = ChangeNotifier::default();
    let teacher_store = MemoryStore::new(notifier.clone());
    let student_store = teacher_store.another_context();

    println!("Demo: two execution contexts over one shared store");
    println!("  Teacher context: {}", teacher_store.context());
    println!("  Student context: {}", student_store.context());
    println!();

    // The student watches for catalog changes from other contexts.
    let woken = Arc::new(Notify::new());
    let wake = Arc::clone(&woken);
    let _subscription = notifier.subscribe(
        student_store.context(),
        |key| key == keys::APPROVED_VIDEOS,
        move || wake.notify_one(),
    );

    // Teacher side: set up personalization, then publish two approvals.
    keys::save_profile(&teacher_store, &StudentProfile::new("Rohan"));
    keys::save_selection(
        &teacher_store,
        &TeacherSelection {
            likes: "Panda".to_string(),
            language: "Hindi".to_string(),
            character: "Chhota Bheem".to_string(),
        },
    );

    for (id, title) in [("task-1", "Counting to ten"), ("task-2", "Shapes around us")] {
        println!("Teacher approves '{title}'...");
        keys::append_to_catalog(
            &teacher_store,
            vidya_catalog::VideoRecord::new(id, title, format!("https://cdn.local/{id}.mp4"), "hi"),
        );

        // Student side: woken by the external write, re-reads and merges.
        woken.notified().await;
        println!("Student context woken by catalog change:");
        list_videos(&student_store);
        println!();
    }

    // Watching a video notifies nobody back into the student context.
    keys::mark_video_completed(&student_store, "task-1");
    println!("Student watched 'task-1':");
    list_videos(&student_store);
    Ok(())
}
