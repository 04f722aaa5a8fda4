//! Remote Patient Monitoring — Vitals Pipeline Demo CLI
//!
//! Wires the producer, an in-memory partitioned stream, and the consumer
//! together and runs them end to end. All stores are in memory; nothing
//! leaves the process.
//!
//! Usage:
//!   cargo run -p demo -- run --cycles 3
//!   cargo run -p demo -- run --cycles 10 --no-sleep --seed 7
//!   cargo run -p demo -- classify --heart-rate 150 --spo2 85 --bp-sys 190
//!   cargo run -p demo -- stream start

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rpm_config::PipelineConfig;
use rpm_contracts::{error::PipelineResult, stream::StreamStatus};
use rpm_core::{
    classify,
    traits::{NotificationChannel, Sleeper, ThreadSleeper},
    AlertPublisher, StreamStatusGate, VitalsConsumer, VitalsProducer,
};
use rpm_memory::{
    InMemoryAlertStore, InMemoryConfigStore, InMemoryStream, InMemorySummaryStore,
    InMemoryVitalsStore, RecordingChannel,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Remote patient monitoring vitals pipeline demo.
#[derive(Parser)]
#[command(
    name = "rpm-demo",
    about = "Remote patient monitoring vitals pipeline demo",
    long_about = "Runs the synthetic vitals producer and the risk-classifying consumer\n\
                  against in-memory stores, a partitioned stream, and a recording\n\
                  notification channel."
)]
struct Cli {
    /// Pipeline configuration file (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Turn the stream ON, run the producer and consumer, and print a summary.
    Run {
        /// Number of producer cycles to run.
        #[arg(long, default_value_t = 3)]
        cycles: u64,
        /// Override the producer's RNG seed.
        #[arg(long)]
        seed: Option<u64>,
        /// Skip the producer's jitter and cycle sleeps.
        #[arg(long)]
        no_sleep: bool,
    },
    /// Classify a single reading.
    Classify {
        #[arg(long)]
        heart_rate: i32,
        #[arg(long)]
        spo2: i32,
        #[arg(long)]
        bp_sys: i32,
    },
    /// Exercise the stream ON/OFF gate.
    Stream {
        #[arg(value_enum)]
        action: StreamAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StreamAction {
    Start,
    Stop,
    Status,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config).and_then(|config| match cli.command {
        Command::Run { cycles, seed, no_sleep } => run_pipeline(config, cycles, seed, no_sleep),
        Command::Classify { heart_rate, spo2, bp_sys } => {
            let risk = classify(heart_rate, spo2, bp_sys);
            println!("HR={heart_rate}, SpO2={spo2}, BP_sys={bp_sys} → {risk}");
            Ok(())
        }
        Command::Stream { action } => run_stream_command(action),
    });

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<PathBuf>) -> PipelineResult<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(&path),
        None => Ok(PipelineConfig::default()),
    }
}

// ── Pipeline run ──────────────────────────────────────────────────────────────

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

/// Raises the consumer's stop flag when dropped, including during unwinding,
/// so a panicking producer still lets the consumer drain and exit.
struct StopOnDrop(Arc<AtomicBool>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

fn run_pipeline(
    mut config: PipelineConfig,
    cycles: u64,
    seed: Option<u64>,
    no_sleep: bool,
) -> PipelineResult<()> {
    if seed.is_some() {
        config.producer.seed = seed;
    }

    let config_store = Arc::new(InMemoryConfigStore::new());
    let stream = Arc::new(InMemoryStream::new(
        config.transport.stream_name.clone(),
        config.transport.shard_count,
    ));
    let vitals = Arc::new(InMemoryVitalsStore::new());
    let summaries = Arc::new(InMemorySummaryStore::new());
    let alerts = Arc::new(InMemoryAlertStore::new());
    let channel = config
        .notification
        .topic()
        .map(|topic| Arc::new(RecordingChannel::new(topic)));

    summaries.seed(&config.patients);

    let gate = StreamStatusGate::new(config_store);
    gate.set(StreamStatus::On)?;

    let sleeper: Arc<dyn Sleeper> = if no_sleep { Arc::new(NoSleep) } else { Arc::new(ThreadSleeper) };
    let mut producer = VitalsProducer::new(
        gate,
        stream.clone(),
        sleeper,
        config.patients.clone(),
        config.producer.to_settings(),
    );

    let publisher = AlertPublisher::new(
        channel
            .clone()
            .map(|c| c as Arc<dyn NotificationChannel>),
    );
    let consumer = VitalsConsumer::new(vitals.clone(), summaries.clone(), alerts.clone(), publisher);
    let consumer_settings = config.consumer.to_settings();

    info!(
        stream = %stream.name(),
        shards = stream.shard_count(),
        patients = config.patients.len(),
        cycles,
        "starting demo pipeline"
    );

    let producer_done = Arc::new(AtomicBool::new(false));
    let producer_thread = {
        let producer_done = producer_done.clone();
        thread::spawn(move || {
            let _stop = StopOnDrop(producer_done);
            producer.run(Some(cycles));
        })
    };

    let totals = consumer.run_until(stream.as_ref(), &consumer_settings, &producer_done);

    if producer_thread.join().is_err() {
        error!("producer thread panicked");
    }

    println!();
    println!("Pipeline summary");
    println!("================");
    println!(
        "records: {}  rejected: {}  alerts: {}  store failures: {}",
        totals.records, totals.rejected, totals.alerts, totals.store_failures
    );
    println!();
    for summary in summaries.all() {
        let name = summary.name.as_deref().unwrap_or("(unknown)");
        match (summary.last_heart_rate, summary.last_spo2, summary.last_bp_sys, summary.last_bp_dia) {
            (Some(hr), Some(spo2), Some(sys), Some(dia)) => println!(
                "  {:<4} {:<16} {:<8} HR={:<3} SpO2={:<3} BP={}/{}  readings={} alerts={}",
                summary.patient_id,
                name,
                summary.risk_level,
                hr,
                spo2,
                sys,
                dia,
                vitals.readings_for(&summary.patient_id).len(),
                alerts.alerts_for(&summary.patient_id).len(),
            ),
            _ => println!("  {:<4} {:<16} no readings", summary.patient_id, name),
        }
    }
    if let Some(channel) = &channel {
        println!();
        println!("notifications sent to '{}': {}", channel.topic(), channel.sent().len());
    }
    println!();

    Ok(())
}

// ── Stream gate ───────────────────────────────────────────────────────────────

fn run_stream_command(action: StreamAction) -> PipelineResult<()> {
    let gate = StreamStatusGate::new(Arc::new(InMemoryConfigStore::new()));
    println!("stream_status (initial): {}", gate.get());

    let status = match action {
        StreamAction::Start => gate.start()?,
        StreamAction::Stop => gate.stop()?,
        StreamAction::Status => gate.get(),
    };
    println!("stream_status: {}", status);
    Ok(())
}
