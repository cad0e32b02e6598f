// Feedwatch: Poller Loop
//
// Owns the start/stop state and one long-lived worker thread that runs
// fetch -> deliver -> wait(period) while a schedule is active and sleeps
// otherwise.  The period is counted from the end of each fetch, so fetches
// never overlap and a slow server only stretches the cycle.
//
// Every start/stop bumps a generation number.  The worker delivers only while
// its generation is still current, checked under the schedule lock, so a
// result fetched for a cancelled schedule is dropped.
//
// Results go out through a `StatusSink`; on the device that is the UI task's
// event channel, so the blocking HTTP call never runs on the UI task.

use std::io;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::channel::ChannelConfig;
use crate::config::*;
use crate::error::FeedError;
use crate::events::{LoopState, StatusReport, UiEvent};
use crate::feed::{self, FeedSource};

pub const MSG_INVALID_CHANNEL: &str = "Please enter a valid Channel ID.";
pub const MSG_STARTING: &str = "Starting data updates...";
pub const MSG_STOPPED: &str = "Stopped fetching data.";

/// Where poll results are rendered.
pub trait StatusSink: Send + Sync + 'static {
    fn post(&self, event: UiEvent);
}

impl StatusSink for Sender<UiEvent> {
    fn post(&self, event: UiEvent) {
        if self.send(event).is_err() {
            log::warn!("UI channel closed, dropping status update");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type WorkerBody = Box<dyn FnOnce() + Send + 'static>;

fn spawn_worker_thread(body: WorkerBody) -> io::Result<JoinHandle<()>> {
    let builder = thread::Builder::new().name("poller".into());
    // Host threads keep the platform default stack.
    #[cfg(target_os = "espidf")]
    let builder = builder.stack_size(STACK_POLLER);
    builder.spawn(body)
}

// ---------------------------------------------------------------------------
// Schedule shared with the worker
// ---------------------------------------------------------------------------
#[derive(Default)]
struct Schedule {
    generation: u64,
    config: Option<ChannelConfig>,
    shutdown: bool,
}

struct Control {
    schedule: Mutex<Schedule>,
    wake: Condvar,
}

impl Control {
    fn new() -> Self {
        Self {
            schedule: Mutex::new(Schedule::default()),
            wake: Condvar::new(),
        }
    }

    /// Replace the active schedule (`None` stops it).  Results still in flight
    /// for the previous one are discarded.
    fn set(&self, config: Option<ChannelConfig>) {
        let mut schedule = lock(&self.schedule);
        schedule.generation = schedule.generation.wrapping_add(1);
        schedule.config = config;
        self.wake.notify_all();
    }

    fn shutdown(&self) {
        let mut schedule = lock(&self.schedule);
        schedule.shutdown = true;
        schedule.config = None;
        self.wake.notify_all();
    }

    /// Block until a schedule is active.  `None` once shut down.
    fn next_job(&self) -> Option<(u64, ChannelConfig)> {
        let guard = lock(&self.schedule);
        let schedule = self
            .wake
            .wait_while(guard, |s| s.config.is_none() && !s.shutdown)
            .unwrap_or_else(PoisonError::into_inner);
        if schedule.shutdown {
            return None;
        }
        let config = schedule.config.clone()?;
        Some((schedule.generation, config))
    }

    /// Runs `deliver` under the schedule lock, so once `set` has returned
    /// nothing from an older generation gets through.
    fn deliver_if_current(&self, generation: u64, deliver: impl FnOnce()) -> bool {
        let schedule = lock(&self.schedule);
        if schedule.shutdown || schedule.config.is_none() || schedule.generation != generation {
            return false;
        }
        deliver();
        true
    }

    /// Sleep for `period`, returning early (with `false`) once `generation`
    /// is replaced.
    fn wait(&self, generation: u64, period: Duration) -> bool {
        let guard = lock(&self.schedule);
        let (schedule, _) = self
            .wake
            .wait_timeout_while(guard, period, |s| s.generation == generation && !s.shutdown)
            .unwrap_or_else(PoisonError::into_inner);
        schedule.generation == generation && !schedule.shutdown
    }
}

// ---------------------------------------------------------------------------
// Poller
// ---------------------------------------------------------------------------
pub struct Poller<S, K>
where
    S: FeedSource + Send + 'static,
    K: StatusSink,
{
    source: Arc<Mutex<S>>,
    sink: Arc<K>,
    control: Arc<Control>,
    period: Duration,
    state: LoopState,
    // Never joined: a fetch stuck in the HTTP timeout must not block `stop`.
    worker: Option<JoinHandle<()>>,
}

impl<S, K> Poller<S, K>
where
    S: FeedSource + Send + 'static,
    K: StatusSink,
{
    pub fn new(source: S, sink: K) -> Self {
        Self::with_period(source, sink, Duration::from_millis(FETCH_INTERVAL_MS))
    }

    pub fn with_period(source: S, sink: K, period: Duration) -> Self {
        Self {
            source: Arc::new(Mutex::new(source)),
            sink: Arc::new(sink),
            control: Arc::new(Control::new()),
            period,
            state: LoopState::Idle,
            worker: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Begin polling `config`: one fetch right away, then one every period.
    ///
    /// An empty channel id leaves the loop idle and shows a prompt instead.
    /// Starting while already running restarts with the new config.
    pub fn start(&mut self, config: &ChannelConfig) -> Result<(), FeedError> {
        self.start_with(config, spawn_worker_thread)
    }

    fn start_with(
        &mut self,
        config: &ChannelConfig,
        spawn: impl FnOnce(WorkerBody) -> io::Result<JoinHandle<()>>,
    ) -> Result<(), FeedError> {
        if let Err(e) = config.validate() {
            log::warn!("Not starting poller: {}", e);
            self.sink.post(UiEvent::Notice(MSG_INVALID_CHANNEL.into()));
            return Err(e);
        }

        if let Err(e) = self.ensure_worker(spawn) {
            log::error!("Not starting poller: {}", e);
            self.halt();
            self.sink.post(UiEvent::Status(StatusReport::Error(e.to_string())));
            return Err(e);
        }

        if self.is_running() {
            log::info!("Poller restarting with channel {}", config.channel_id);
            self.halt();
        } else {
            log::info!("Poller starting with channel {}", config.channel_id);
        }

        // Nothing is scheduled at this point, so the notice precedes every
        // report of the new schedule.
        self.sink.post(UiEvent::Notice(MSG_STARTING.into()));
        self.control.set(Some(config.clone()));
        self.state = LoopState::Running;
        Ok(())
    }

    /// Cancel polling.  No status is delivered after this returns.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.halt();
        self.sink.post(UiEvent::Note(MSG_STOPPED.into()));
    }

    /// Button action: start when idle, stop when running.
    pub fn toggle(&mut self, config: &ChannelConfig) -> Result<LoopState, FeedError> {
        if self.is_running() {
            self.stop();
        } else {
            self.start(config)?;
        }
        Ok(self.state)
    }

    /// One synchronous poll cycle outside the schedule.
    pub fn fetch_once(&self, config: &ChannelConfig) -> StatusReport {
        let mut source = lock(&self.source);
        feed::fetch_once(&mut *source, config)
    }

    /// Spawn the worker on first use, or again if it has died.
    fn ensure_worker(
        &mut self,
        spawn: impl FnOnce(WorkerBody) -> io::Result<JoinHandle<()>>,
    ) -> Result<(), FeedError> {
        if let Some(handle) = &self.worker {
            if !handle.is_finished() {
                return Ok(());
            }
            log::warn!("Poller worker exited, respawning");
        }

        let source = Arc::clone(&self.source);
        let sink = Arc::clone(&self.sink);
        let control = Arc::clone(&self.control);
        let period = self.period;

        let handle = spawn(Box::new(move || run_worker(&*source, &*sink, &*control, period)))
            .map_err(|e| FeedError::Worker(e.to_string()))?;
        self.worker = Some(handle);
        Ok(())
    }

    fn halt(&mut self) {
        if self.is_running() {
            self.control.set(None);
            log::info!("Poller stopped");
        }
        self.state = LoopState::Idle;
    }
}

impl<S, K> Drop for Poller<S, K>
where
    S: FeedSource + Send + 'static,
    K: StatusSink,
{
    fn drop(&mut self) {
        self.control.shutdown();
    }
}

fn run_worker<S, K>(source: &Mutex<S>, sink: &K, control: &Control, period: Duration)
where
    S: FeedSource,
    K: StatusSink,
{
    log::info!("Poller task started");

    while let Some((generation, config)) = control.next_job() {
        log::debug!("Polling channel {} (generation {})", config.channel_id, generation);

        loop {
            let report = {
                let mut source = lock(source);
                feed::fetch_once(&mut *source, &config)
            };

            if !control.deliver_if_current(generation, || sink.post(UiEvent::Status(report))) {
                log::debug!("Discarding result fetched for a cancelled schedule");
                break;
            }

            if !control.wait(generation, period) {
                break;
            }
        }
    }

    log::info!("Poller task exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Instant;

    #[test]
    fn wait_returns_early_on_stop() {
        let control = Arc::new(Control::new());
        control.set(Some(ChannelConfig::new("9", "")));
        let (generation, _) = control.next_job().unwrap();

        let stopper = Arc::clone(&control);
        let start = Instant::now();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            stopper.set(None);
        });

        assert!(!control.wait(generation, Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_secs(2));
        handle.join().unwrap();
    }

    #[test]
    fn wait_times_out_while_current() {
        let control = Control::new();
        control.set(Some(ChannelConfig::new("9", "")));
        let (generation, _) = control.next_job().unwrap();
        assert!(control.wait(generation, Duration::from_millis(5)));
    }

    #[test]
    fn stale_generation_blocks_delivery() {
        let control = Control::new();
        control.set(Some(ChannelConfig::new("9", "")));
        let (generation, _) = control.next_job().unwrap();

        let mut delivered = 0;
        assert!(control.deliver_if_current(generation, || delivered += 1));
        control.set(Some(ChannelConfig::new("10", "")));
        assert!(!control.deliver_if_current(generation, || delivered += 1));
        control.set(None);
        assert!(!control.deliver_if_current(generation + 1, || delivered += 1));
        assert_eq!(delivered, 1);
    }

    #[test]
    fn shutdown_releases_idle_worker() {
        let control = Arc::new(Control::new());
        let waiter = Arc::clone(&control);
        let handle = thread::spawn(move || waiter.next_job());

        thread::sleep(Duration::from_millis(20));
        control.shutdown();
        assert_eq!(handle.join().unwrap(), None);
    }

    #[test]
    fn failed_spawn_shows_error_and_stays_idle() {
        let (tx, rx) = mpsc::channel();
        let source = |_url: &str| -> Result<Vec<u8>, FeedError> { Ok(b"{}".to_vec()) };
        let mut poller = Poller::with_period(source, tx, Duration::from_millis(50));

        let err = poller
            .start_with(&ChannelConfig::new("9", ""), |_body| {
                Err(io::Error::new(io::ErrorKind::Other, "no memory for stack"))
            })
            .unwrap_err();

        assert_eq!(err, FeedError::Worker("no memory for stack".into()));
        assert_eq!(poller.state(), LoopState::Idle);
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            UiEvent::Status(StatusReport::Error(
                "poller worker unavailable: no memory for stack".into()
            ))
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn restarts_reuse_one_worker() {
        let (tx, rx) = mpsc::channel();
        let source = |_url: &str| -> Result<Vec<u8>, FeedError> { Ok(b"{}".to_vec()) };
        let mut poller = Poller::with_period(source, tx, Duration::from_secs(60));
        let config = ChannelConfig::new("9", "");
        let mut spawned = 0;

        for _ in 0..5 {
            poller
                .start_with(&config, |body| {
                    spawned += 1;
                    thread::Builder::new().spawn(body)
                })
                .unwrap();
            poller.stop();
        }

        assert_eq!(spawned, 1);
        assert_eq!(rx.recv().unwrap(), UiEvent::Notice(MSG_STARTING.into()));
    }

    #[test]
    fn toggle_flips_state() {
        let (tx, rx) = mpsc::channel();
        let source = |_url: &str| -> Result<Vec<u8>, FeedError> { Ok(b"{}".to_vec()) };
        let mut poller = Poller::with_period(source, tx, Duration::from_millis(50));
        let config = ChannelConfig::new("9", "");

        assert_eq!(poller.toggle(&config), Ok(LoopState::Running));
        assert_eq!(poller.toggle(&config), Ok(LoopState::Idle));
        assert_eq!(rx.recv().unwrap(), UiEvent::Notice(MSG_STARTING.into()));
    }

    #[test]
    fn fetch_once_uses_shared_source() {
        let (tx, _rx) = mpsc::channel();
        let source = |_url: &str| -> Result<Vec<u8>, FeedError> {
            Ok(br#"{"field1":"0.0","field2":"0.0","field3":"1.0"}"#.to_vec())
        };
        let poller = Poller::new(source, tx);
        let report = poller.fetch_once(&ChannelConfig::new("9", ""));
        assert_eq!(report.label(), Some(crate::events::MotionLabel::Normal));
        assert_eq!(poller.state(), LoopState::Idle);
    }
}
