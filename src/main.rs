//! Bandguard engine runner.
//!
//! Wires the engine to in-process collaborators (in-memory alert store,
//! broadcast notice publisher, logging dialer, static patient directory) and
//! consumes readings from an in-process channel. In production the channel
//! is fed by the message transport; `--simulate` feeds it a synthetic
//! fall-and-desaturation scenario instead.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rand::Rng;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bandguard::{
    BroadcastPublisher, Engine, EngineConfig, InMemoryAlertStore, LoggingDialer,
    NotificationDispatcher, StaticDirectory,
};

#[derive(Parser, Debug)]
#[command(name = "bandguard", about = "Wearable telemetry anomaly-detection engine")]
struct Args {
    /// Feed a synthetic fall-and-desaturation scenario instead of waiting
    /// for transport input
    #[arg(long)]
    simulate: bool,

    /// Device code used by the simulated scenario
    #[arg(long, default_value = "SIM-1")]
    device: String,

    /// Patient age registered for the simulated device
    #[arg(long, default_value = "67")]
    patient_age: u8,

    /// Phone number handed to the emergency dialer
    #[arg(long, default_value = "+15550100000")]
    emergency_contact: String,

    /// Seconds of inactivity before device state is evicted
    #[arg(long, default_value = "60")]
    staleness_secs: u64,

    /// Seconds between idle-device eviction sweeps
    #[arg(long, default_value = "30")]
    eviction_interval_secs: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    info!(version = bandguard::VERSION, "starting bandguard engine");

    let config = EngineConfig::builder()
        .emergency_contact(args.emergency_contact.clone())
        .staleness_secs(args.staleness_secs)
        .eviction_interval_secs(args.eviction_interval_secs)
        .build();

    let store = Arc::new(InMemoryAlertStore::new());
    let directory = Arc::new(StaticDirectory::new());
    directory.insert(args.device.clone(), args.patient_age);

    let publisher = Arc::new(BroadcastPublisher::new(64));
    let dispatcher = NotificationDispatcher::new(
        publisher.clone(),
        Arc::new(LoggingDialer),
        config.emergency_contact.clone(),
    );

    let engine = Arc::new(Engine::new(config, store, directory, dispatcher));

    // Log every published notice the way a transport subscriber would see it
    let mut notices = publisher.subscribe();
    tokio::spawn(async move {
        while let Ok(published) = notices.recv().await {
            info!(
                channel = %published.channel,
                device_code = %published.notice.device_code,
                conditions = ?published.notice.conditions,
                "alert notice published"
            );
        }
    });

    let (tx, rx) = mpsc::channel::<Vec<u8>>(256);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Held until shutdown when no scenario feeds the channel
    let mut keep_alive = None;
    if args.simulate {
        let device = args.device.clone();
        tokio::spawn(async move {
            run_scenario(tx, &device).await;
        });
    } else {
        info!("no transport wired; waiting for shutdown (run with --simulate for a demo)");
        keep_alive = Some(tx);
    }

    let consumer = tokio::spawn(engine.clone().run(rx, shutdown_rx));

    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
    }
    let _ = shutdown_tx.send(true);
    drop(keep_alive);
    let _ = consumer.await;

    for alert in engine.pending_alerts().await.unwrap_or_default() {
        info!(
            device_code = alert.device_code(),
            conditions = ?alert.conditions(),
            "alert still pending at shutdown"
        );
    }
}

/// Feed the engine a scripted scenario: normal movement, then a fall with
/// sustained stillness, then a desaturation episode.
async fn run_scenario(tx: mpsc::Sender<Vec<u8>>, device: &str) {
    info!(device, "starting simulated scenario");

    // Normal movement baseline
    for _ in 0..10 {
        send(&tx, reading(device, jitter(9.8, 0.5), jitter(74.0, 3.0), jitter(97.0, 0.5))).await;
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    // Free fall, impact, then stillness long enough to confirm
    send(&tx, reading(device, 2.0, 76.0, 97.0)).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    send(&tx, reading(device, 30.0, 82.0, 97.0)).await;
    for _ in 0..12 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        send(&tx, reading(device, jitter(1.0, 0.3), jitter(80.0, 2.0), jitter(96.0, 0.5))).await;
    }

    // Desaturation while still down
    for _ in 0..4 {
        tokio::time::sleep(Duration::from_secs(2)).await;
        send(&tx, reading(device, jitter(1.0, 0.3), jitter(80.0, 2.0), jitter(85.0, 1.0))).await;
    }

    info!(device, "scenario complete; press ctrl-c to stop");
}

async fn send(tx: &mpsc::Sender<Vec<u8>>, payload: Vec<u8>) {
    if tx.send(payload).await.is_err() {
        warn!("engine stopped consuming; scenario aborted");
    }
}

fn jitter(base: f64, spread: f64) -> f64 {
    base + rand::thread_rng().gen_range(-spread..spread)
}

fn reading(device: &str, accel_magnitude: f64, heart_rate: f64, oxygen: f64) -> Vec<u8> {
    // Put the whole magnitude on the Z axis; the engine only uses the norm
    serde_json::json!({
        "device_code": device,
        "accelX": 0.0,
        "accelY": 0.0,
        "accelZ": accel_magnitude,
        "gyroX": 0.0,
        "gyroY": 0.0,
        "gyroZ": 0.0,
        "heartRate": heart_rate,
        "oxygen": oxygen,
    })
    .to_string()
    .into_bytes()
}
