use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use medscan::core::{
    format_drug_event, format_duration, format_notification, truncate_for_display, Config,
};
use medscan::features::capture::{CapturePhase, CapturePipeline, CaptureSessionState};
use medscan::features::lookup::OpenFdaClient;
use medscan::features::matching::{MedicationTextMatcher, MedicationVocabulary};
use medscan::features::ocr::OcrSpaceClient;
use medscan::features::reminders::{
    compute_schedule, LocalNotifier, ReminderPlan, ReminderScheduler, ReminderSpec,
};

/// Read medication labels and schedule dose reminders
#[derive(Parser, Debug)]
#[command(name = "medscan", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// OCR a label image, match medication names and fetch adverse events
    Scan {
        /// Path to a JPEG or PNG photo of the label
        image: PathBuf,
    },
    /// Match medication names in text without OCR or lookups
    Match {
        /// Text to scan
        #[arg(required_unless_present = "file")]
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },
    /// Schedule daily dose reminders
    Remind(RemindArgs),
}

#[derive(Args, Debug)]
struct RemindArgs {
    /// Medication name
    #[arg(long, requires_all = ["dosage", "hours"], conflicts_with = "plan")]
    drug: Option<String>,

    /// Dose text, e.g. "250mg"
    #[arg(long, requires = "drug")]
    dosage: Option<String>,

    /// Comma-separated hours of day (0-23)
    #[arg(long, value_delimiter = ',', requires = "drug")]
    hours: Vec<u32>,

    /// YAML reminder plan
    #[arg(long)]
    plan: Option<String>,

    /// Print the schedule without waiting for delivery
    #[arg(long)]
    dry_run: bool,
}

fn load_vocabulary(config: &Config) -> Result<MedicationVocabulary> {
    match &config.vocabulary_path {
        Some(path) => {
            let vocabulary = MedicationVocabulary::load(path)?;
            info!("📄 Loaded {} medication names from {path}", vocabulary.len());
            Ok(vocabulary)
        }
        None => Ok(MedicationVocabulary::default()),
    }
}

fn print_progress(state: &CaptureSessionState) {
    match state.phase {
        CapturePhase::Analyzing => println!("Analyzing image..."),
        CapturePhase::LookingUp
            if state.events.is_empty()
                && state.empty_lookups.is_empty()
                && state.lookup_failures.is_empty() =>
        {
            println!("Medications: {}", state.tags.join(", "));
            println!("Fetching drug events for {}...", state.lookup_targets.join(", "));
        }
        _ => {}
    }
}

async fn run_scan(config: &Config, image: PathBuf) -> Result<()> {
    let bytes = std::fs::read(&image)
        .with_context(|| format!("Failed to read image {}", image.display()))?;

    let extractor = OcrSpaceClient::new(
        config.require_ocr_api_key()?.to_string(),
        config.http_timeout_secs,
    )?;
    let lookup = OpenFdaClient::new(
        config.openfda_api_key.clone(),
        config.openfda_result_limit,
        config.http_timeout_secs,
    )?;
    let matcher = MedicationTextMatcher::new(Arc::new(load_vocabulary(config)?));
    let pipeline = CapturePipeline::new(
        Arc::new(extractor),
        Arc::new(lookup),
        matcher,
        config.ocr_language.clone(),
    );

    let uri = format!("file://{}", image.display());
    let state = pipeline.analyze_with(&uri, &bytes, print_progress).await;

    if let Some(message) = &state.error {
        println!("{message}");
        return Ok(());
    }

    for event in &state.events {
        println!("\n{}", truncate_for_display(&format_drug_event(event)));
    }
    for drug in &state.empty_lookups {
        println!("\nNo drug events found for {drug}");
    }
    for (drug, reason) in &state.lookup_failures {
        warn!("Lookup for {drug} failed: {reason}");
        println!("\nError fetching drug events for {drug}");
    }

    Ok(())
}

fn run_match(config: &Config, text: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let text = match (text, file) {
        (_, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (Some(text), None) => text,
        (None, None) => String::new(),
    };

    let matcher = MedicationTextMatcher::new(Arc::new(load_vocabulary(config)?));
    match matcher.match_text(&text) {
        Ok(result) => {
            for name in &result.matches {
                println!("{name}");
            }
            for name in &result.overflow {
                println!("{name} (not looked up)");
            }
        }
        Err(e) => println!("{e}"),
    }

    Ok(())
}

fn remind_specs(args: &RemindArgs) -> Result<Vec<ReminderSpec>> {
    if let (Some(drug), Some(dosage)) = (&args.drug, &args.dosage) {
        return Ok(vec![ReminderSpec::new(
            drug.as_str(),
            dosage.as_str(),
            args.hours.iter().copied(),
        )?]);
    }

    let plan = match &args.plan {
        Some(path) => ReminderPlan::load(path)?,
        None => ReminderPlan::default(),
    };
    plan.specs()
}

async fn run_remind(args: RemindArgs) -> Result<()> {
    let specs = remind_specs(&args)?;

    if args.dry_run {
        let now = Local::now();
        for spec in &specs {
            for notification in compute_schedule(spec, &now) {
                println!("{}", format_notification(&notification));
            }
        }
        return Ok(());
    }

    let (notifier, mut delivered) = LocalNotifier::new().with_delivery_channel();
    let scheduler = ReminderScheduler::new(Arc::new(notifier));

    let mut failed = 0;
    for spec in &specs {
        let report = scheduler.schedule(spec).await;
        for reminder in &report.scheduled {
            println!("{}", format_notification(&reminder.notification));
        }
        for failure in &report.failures {
            error!("{failure}");
        }
        failed += report.failures.len();
    }

    if scheduler.tracked() == 0 {
        anyhow::bail!("No reminders could be scheduled ({failed} failed)");
    }

    println!("\nWaiting for reminders. Press Ctrl-C to dismiss all and exit.");

    loop {
        tokio::select! {
            message = delivered.recv() => match message {
                Some(message) => {
                    println!(
                        "\n🔔 {}\n  {}\n  delivered {}",
                        message.title,
                        message.body,
                        message.delivered_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                    );

                    // Daily reminders: queue only the slot that fired, for its next day
                    let Some(spec) = specs.iter().find(|s| s.drug_name == message.drug_name) else {
                        warn!("No reminder spec for delivered {}", message.drug_name);
                        continue;
                    };
                    let report = scheduler.rearm(spec, &message, &Local::now()).await;
                    for reminder in &report.scheduled {
                        info!(
                            "Next {} reminder in {}",
                            spec.drug_name,
                            format_duration(reminder.notification.fire_in_seconds)
                        );
                    }
                    for failure in &report.failures {
                        error!("{failure}");
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                let dismissed = scheduler.dismiss_all().await;
                println!("\nDismissed {dismissed} pending reminder(s)");
                break;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    match cli.command {
        Command::Scan { image } => run_scan(&config, image).await,
        Command::Match { text, file } => run_match(&config, text, file),
        Command::Remind(args) => run_remind(args).await,
    }
}
