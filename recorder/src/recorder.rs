use crate::aggregate;
use crate::channel::{SensorChannel, SensorSession};
use crate::errors::{Error, Result};
use crate::frame;
use crate::metrics::{
    CYCLE_READINGS, FRAMES_TOTAL, INVALID_FRAMES_TOTAL, READ_TIMEOUTS_TOTAL,
    RECORDS_WRITTEN_TOTAL, VALID_FRAMES_TOTAL, WRITE_LATENCY_SECONDS,
};
use crate::model::{Reading, Record};
use crate::store::Store;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct RecorderSettings {
    /// Length of one sampling window; one record is written per window.
    pub cycle: Duration,
    /// Pause before each window and between read attempts. Cancellation is
    /// observed at these pauses, so this also bounds cancellation latency.
    pub pause: Duration,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            cycle: Duration::from_secs(60),
            pause: Duration::from_secs(1),
        }
    }
}

enum TaskState {
    Idle,
    Running(TaskHandle),
}

struct TaskHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<Result<()>>,
}

/// Owns at most one recording task and the device-active flag persisted
/// alongside each record.
pub struct Controller<C> {
    channel: Arc<C>,
    store: Store,
    settings: RecorderSettings,
    device_active: Arc<AtomicBool>,
    state: Mutex<TaskState>,
}

impl<C: SensorChannel> Controller<C> {
    pub fn new(channel: C, store: Store, settings: RecorderSettings) -> Self {
        Self {
            channel: Arc::new(channel),
            store,
            settings,
            device_active: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(TaskState::Idle),
        }
    }

    /// Spawns the recording loop and returns without waiting for sampling to
    /// begin. Refused while a task is running, or while a faulted task has
    /// not yet been collected by `stop_recording`.
    pub async fn start_recording(&self, device_active: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        if matches!(*state, TaskState::Running(_)) {
            return Err(Error::AlreadyRunning);
        }

        self.device_active.store(device_active, Ordering::Relaxed);

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(
            Arc::clone(&self.channel),
            self.store.clone(),
            self.settings,
            Arc::clone(&self.device_active),
            cancel_rx,
        ));

        info!("Recording started (device_active={})", device_active);
        *state = TaskState::Running(TaskHandle {
            cancel: cancel_tx,
            task,
        });

        Ok(())
    }

    /// Stops the recording loop. A no-op when idle; a clean cancellation is
    /// not an error. A fault that already ended the task is returned here,
    /// exactly once. The handle is cleared on every path, so a subsequent
    /// `start_recording` is always permitted.
    pub async fn stop_recording(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let handle = match std::mem::replace(&mut *state, TaskState::Idle) {
            TaskState::Idle => return Ok(()),
            TaskState::Running(handle) => handle,
        };

        let _ = handle.cancel.send(true);

        match handle.task.await {
            Ok(Ok(())) => {
                info!("Recording stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(e) => Err(Error::Task(e.to_string())),
        }
    }

    /// Updates the flag persisted with each record. Takes effect at the next
    /// write; the running task is not restarted and no in-flight readings
    /// are discarded.
    pub fn set_device_active(&self, device_active: bool) {
        self.device_active.store(device_active, Ordering::Relaxed);
        info!("Device-active flag set to {}", device_active);
    }

    pub fn device_active(&self) -> bool {
        self.device_active.load(Ordering::Relaxed)
    }
}

async fn run_loop<C: SensorChannel>(
    channel: Arc<C>,
    store: Store,
    settings: RecorderSettings,
    device_active: Arc<AtomicBool>,
    mut cancel: watch::Receiver<bool>,
) -> Result<()> {
    loop {
        // Lets the start caller's response go out before sampling begins.
        if pause_or_cancelled(&mut cancel, settings.pause).await {
            info!("Cancelling recording task");
            return Ok(());
        }

        let readings = match sample_window(&channel, settings, &mut cancel).await? {
            Some(readings) => readings,
            None => {
                info!("Cancelling recording task");
                return Ok(());
            }
        };

        info!("Collected {} readings this cycle", readings.len());
        CYCLE_READINGS.set(readings.len() as f64);

        if readings.is_empty() {
            warn!("No valid frames this cycle, skipping write");
            continue;
        }

        let reading = aggregate::reduce(&readings)?;
        let record = Record {
            timestamp: Utc::now(),
            humidity_percent: reading.humidity_percent,
            temperature_celsius: reading.temperature_celsius,
            device_active: device_active.load(Ordering::Relaxed),
        };

        let started = std::time::Instant::now();
        store.insert(&record).await?;
        WRITE_LATENCY_SECONDS.observe(started.elapsed().as_secs_f64());
        RECORDS_WRITTEN_TOTAL.inc();

        debug!("Wrote record: {:?}", record);
    }
}

/// Collects valid readings for one window. Returns `None` once cancellation
/// is observed. The session lives on this function's stack, so the port is
/// released on every exit path, cancelled and fatal included.
async fn sample_window<C: SensorChannel>(
    channel: &Arc<C>,
    settings: RecorderSettings,
    cancel: &mut watch::Receiver<bool>,
) -> Result<Option<Vec<Reading>>> {
    let opened = Arc::clone(channel);
    let mut session = tokio::task::spawn_blocking(move || opened.open())
        .await
        .map_err(|e| Error::Task(e.to_string()))??;

    let deadline = Instant::now() + settings.cycle;
    let mut readings = Vec::new();

    while Instant::now() < deadline {
        // Cancellation checkpoint; also paces read attempts.
        if pause_or_cancelled(cancel, settings.pause).await {
            return Ok(None);
        }

        let (returned, outcome) = tokio::task::spawn_blocking(move || {
            let frame = session.read_frame();
            (session, frame)
        })
        .await
        .map_err(|e| Error::Task(e.to_string()))?;
        session = returned;

        match outcome {
            Ok(raw) => {
                FRAMES_TOTAL.inc();
                match frame::parse(&raw) {
                    Ok(reading) => {
                        debug!("Received reading: {:?}", reading);
                        VALID_FRAMES_TOTAL.inc();
                        readings.push(reading);
                    }
                    Err(e) => {
                        debug!("Discarding frame: {}", e);
                        INVALID_FRAMES_TOTAL.inc();
                    }
                }
            }
            Err(Error::ReadTimeout) => {
                READ_TIMEOUTS_TOTAL.inc();
            }
            Err(e) => return Err(e),
        }
    }

    Ok(Some(readings))
}

/// Sleeps for `pause`, returning `true` early if cancellation is requested
/// (or the controller went away entirely).
async fn pause_or_cancelled(cancel: &mut watch::Receiver<bool>, pause: Duration) -> bool {
    tokio::select! {
        changed = cancel.changed() => changed.is_err() || *cancel.borrow_and_update(),
        _ = time::sleep(pause) => false,
    }
}
