//! spine-lipsync - batch lip-sync animation for Spine characters.
//!
//! Usage:
//!   spine-lipsync inspect character.json
//!   spine-lipsync animate character.json --event hello --event bye
//!
//! Settings are read from `.config/settings.toml` (created on first run).

use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use lipsync_core::config::{ConfigManager, ConfigSection};
use lipsync_core::logging::{init_tracing, init_tracing_with_file};
use lipsync_core::models::JobStatus;
use lipsync_core::scheduler::SubmitOutcome;
use lipsync_core::session::Session;
use lipsync_core::source::SourceFileModel;
use lipsync_core::state::StateEvent;

#[derive(Parser)]
#[command(author, version, about = "Generate lip-sync animations for Spine characters")]
struct Cli {
    /// Settings file.
    #[arg(long, global = true, default_value = ".config/settings.toml")]
    config: PathBuf,

    /// More log output (repeat for even more).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what a character file provides and which events can be animated.
    Inspect(InspectArgs),
    /// Animate audio events and save the animations into the character file.
    Animate(AnimateArgs),
}

#[derive(Args)]
struct FileArgs {
    /// Spine JSON file (defaults to the last file used).
    file: Option<String>,

    /// Mouth slot to use instead of the guessed one.
    #[arg(long)]
    slot: Option<String>,
}

#[derive(Args)]
struct InspectArgs {
    #[command(flatten)]
    file: FileArgs,

    /// Print the job list as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct AnimateArgs {
    #[command(flatten)]
    file: FileArgs,

    /// Event to animate; repeat for several. Defaults to every event with audio.
    #[arg(long = "event")]
    events: Vec<String>,

    /// Animation name prefix.
    #[arg(long)]
    prefix: Option<String>,

    /// Animation name suffix.
    #[arg(long)]
    suffix: Option<String>,

    /// Path to the rhubarb executable.
    #[arg(long)]
    rhubarb: Option<String>,

    /// Remember naming and rhubarb path in the settings file.
    #[arg(long)]
    save_settings: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigManager::new(&cli.config);
    if let Err(e) = config.load_or_create() {
        eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
    }

    let level = config.settings().logging.level.raised_by(cli.verbose);
    let _log_guard = if config.settings().logging.log_to_file {
        config
            .ensure_dirs_exist()
            .context("failed to create logs folder")?;
        Some(init_tracing_with_file(level, &config.logs_folder()))
    } else {
        init_tracing(level);
        None
    };
    tracing::debug!(
        "spine-lipsync {} (config: {})",
        lipsync_core::version(),
        cli.config.display()
    );

    match cli.command {
        Commands::Inspect(args) => inspect(&mut config, args),
        Commands::Animate(args) => animate(&mut config, args),
    }
}

fn inspect(config: &mut ConfigManager, args: InspectArgs) -> Result<()> {
    let session = Session::new(config.settings())?;
    let model = open(config, &session, &args.file)?;
    let snapshot = session.snapshot();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot.jobs)?);
        return Ok(());
    }

    print_model(&model);
    println!();
    println!("Events:");
    if snapshot.jobs.is_empty() {
        println!("  (no events with audio)");
    }
    for job in &snapshot.jobs {
        let audio = if job.has_audio() { "" } else { " [audio missing]" };
        let action = snapshot
            .action_for(&job.event_name)
            .map_or("-", |action| action.label());
        println!(
            "  {:<20} -> {:<24} {}{}  ({})",
            job.event_name, job.animation_name, job.relative_audio_path, audio, action
        );
    }
    Ok(())
}

fn animate(config: &mut ConfigManager, args: AnimateArgs) -> Result<()> {
    let mut settings = config.settings().clone();
    if let Some(prefix) = &args.prefix {
        settings.naming.animation_prefix = prefix.clone();
    }
    if let Some(suffix) = &args.suffix {
        settings.naming.animation_suffix = suffix.clone();
    }
    if let Some(rhubarb) = &args.rhubarb {
        settings.paths.rhubarb_binary = rhubarb.clone();
    }
    if args.save_settings {
        config.settings_mut().naming = settings.naming.clone();
        config.settings_mut().paths.rhubarb_binary = settings.paths.rhubarb_binary.clone();
        config.update_section(ConfigSection::Naming)?;
        config.update_section(ConfigSection::Paths)?;
    }

    let session = Session::new(&settings)?;
    let model = open(config, &session, &args.file)?;
    if !model.is_valid() {
        print_model(&model);
        bail!("{} cannot be animated", model.path().display());
    }

    let rx = session.subscribe();
    let queued = if args.events.is_empty() {
        session.submit_all()?
    } else {
        let mut queued = Vec::new();
        for event in unique_events(&args.events) {
            if session.submit_job(&event)? == SubmitOutcome::Queued {
                queued.push(event);
            }
        }
        queued
    };
    if queued.is_empty() {
        println!("Nothing to animate.");
        return Ok(());
    }

    report_until_idle(&rx)?;

    let snapshot = session.snapshot();
    let failed: Vec<_> = snapshot
        .jobs
        .iter()
        .filter(|job| queued.contains(&job.event_name) && job.status != JobStatus::Done)
        .collect();
    println!(
        "Animated {} of {} event(s) into {}",
        queued.len() - failed.len(),
        queued.len(),
        model.path().display()
    );
    if !failed.is_empty() {
        bail!("{} event(s) failed", failed.len());
    }
    Ok(())
}

/// Event names in first-seen order without repeats.
fn unique_events(events: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(events.len());
    for event in events {
        if !unique.contains(event) {
            unique.push(event.clone());
        }
    }
    unique
}

/// Load the requested file (or the last one) and apply the slot choice.
fn open(
    config: &mut ConfigManager,
    session: &Session,
    args: &FileArgs,
) -> Result<Arc<SourceFileModel>> {
    let input = match &args.file {
        Some(file) => file.clone(),
        None if !config.settings().paths.last_file.is_empty() => {
            config.settings().paths.last_file.clone()
        }
        None => bail!("no character file given"),
    };

    let mut model = session.load_file(&input)?;
    if let Some(slot) = &args.slot {
        model = session.select_slot(slot)?;
    }

    config.settings_mut().paths.last_file = model.path().display().to_string();
    if let Err(e) = config.update_section(ConfigSection::Paths) {
        tracing::warn!("Failed to remember last file: {}", e);
    }
    Ok(model)
}

fn print_model(model: &SourceFileModel) {
    let with_error = |value: String, error: Option<&str>| match error {
        Some(error) => format!("{}  [{}]", value, error),
        None => value,
    };

    println!("File:        {}", model.path().display());
    println!("Valid:       {}", if model.is_valid() { "yes" } else { "no" });
    println!("Frame rate:  {}", model.document().frame_rate());
    println!("Audio dir:   {}", model.audio_dir().display());
    println!("Slots:       {}", model.slots().join(", "));
    println!(
        "Mouth slot:  {}",
        with_error(
            model.selected_slot().unwrap_or("-").to_string(),
            model.slot_error()
        )
    );
    println!("Naming:      {}", model.mouth_naming_display());
    println!(
        "Shapes:      {}",
        with_error(model.mouth_shapes_display(), model.shapes_error())
    );
}

/// Print job changes until the session goes idle.
fn report_until_idle(rx: &Receiver<StateEvent>) -> Result<()> {
    loop {
        match rx.recv().context("session closed unexpectedly")? {
            StateEvent::Progress { event_name, value } => {
                println!("  {:<20} {:>3}%", event_name, (value * 100.0) as u32);
            }
            StateEvent::JobChanged(job) => match (&job.status, &job.error) {
                (JobStatus::NotAnimated, Some(error)) => {
                    println!("  {:<20} failed: {}", job.event_name, error)
                }
                (status, _) => println!("  {:<20} {}", job.event_name, status),
            },
            StateEvent::BusyChanged(false) => return Ok(()),
            _ => {}
        }
    }
}
