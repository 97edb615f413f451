use std::time::{Duration, Instant};

use flume::{Receiver, Sender, TrySendError};
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::capture::FrameSource;
use crate::pipeline::{spawn_sampler, PoseSampler, StatsSnapshot};
use crate::workout::timer::CountdownTimer;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to start sampler thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("sampler thread panicked")]
    SamplerPanicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Pause,
    Resume,
    Finish,
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub name: String,
    /// Timer ran out, as opposed to being finished early
    pub completed: bool,
    pub elapsed: Duration,
    pub stats: StatsSnapshot,
}

/// One timed exercise with live pose sampling.
///
/// The session owns the camera-to-sampler plumbing for its lifetime: frames
/// flow until the countdown reaches zero or [`SessionCommand::Finish`]
/// arrives, then the frame channel closes and the sampler thread is joined.
/// Analyses still in flight at that point are not cancelled.
pub struct WorkoutSession {
    name: String,
    timer: CountdownTimer,
    tick: Duration,
    frame_queue: usize,
    commands_tx: Sender<SessionCommand>,
    commands_rx: Receiver<SessionCommand>,
}

impl WorkoutSession {
    pub fn new(name: impl Into<String>, duration: Duration) -> Self {
        let (commands_tx, commands_rx) = flume::unbounded();
        Self {
            name: name.into(),
            timer: CountdownTimer::new(duration),
            tick: Duration::from_secs(1),
            frame_queue: 1,
            commands_tx,
            commands_rx,
        }
    }

    /// Timer tick period (default one second)
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    /// Depth of the capture → sampler channel; a full channel drops new frames.
    pub fn with_frame_queue(mut self, depth: usize) -> Self {
        self.frame_queue = depth.max(1);
        self
    }

    /// Handle for pausing, resuming or finishing the session from elsewhere.
    pub fn controller(&self) -> Sender<SessionCommand> {
        self.commands_tx.clone()
    }

    pub async fn run<S, F>(
        mut self,
        source: &mut S,
        sampler: PoseSampler,
        mut on_tick: F,
    ) -> Result<SessionSummary, SessionError>
    where
        S: FrameSource,
        F: FnMut(Duration),
    {
        let stats = sampler.stats();
        let (tx, rx) = flume::bounded(self.frame_queue);
        let sampler_thread = spawn_sampler(sampler, rx)?;

        let started = Instant::now();
        self.timer.start(started);
        info!("Workout '{}' started: {:?}", self.name, self.timer.total());

        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let completed = loop {
            tokio::select! {
                captured = source.capture_frame() => match captured {
                    Ok(frame) => match tx.try_send(frame) {
                        Ok(()) => {}
                        Err(TrySendError::Full(frame)) => {
                            debug!(sequence = frame.meta.sequence, "Sampler busy, dropping frame");
                            frame.release();
                        }
                        Err(TrySendError::Disconnected(_)) => {
                            error!("Sampler thread gone");
                            break false;
                        }
                    },
                    Err(e) => {
                        error!("Capture error: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                },
                _ = ticker.tick() => {
                    let now = Instant::now();
                    on_tick(self.timer.remaining(now));
                    if self.timer.is_finished(now) {
                        break true;
                    }
                }
                Ok(command) = self.commands_rx.recv_async() => match command {
                    SessionCommand::Pause => {
                        self.timer.pause(Instant::now());
                        info!("Workout paused");
                    }
                    SessionCommand::Resume => {
                        self.timer.resume(Instant::now());
                        info!("Workout resumed");
                    }
                    SessionCommand::Finish => break false,
                },
            }
        };

        // Closing the channel stops the sampler once it drains
        drop(tx);
        tokio::task::spawn_blocking(move || sampler_thread.join())
            .await
            .map_err(|_| SessionError::SamplerPanicked)?
            .map_err(|_| SessionError::SamplerPanicked)?;

        let summary = SessionSummary {
            name: self.name,
            completed,
            elapsed: started.elapsed(),
            stats: stats.snapshot(),
        };
        info!("Workout finished: {:?}", summary);
        Ok(summary)
    }
}
