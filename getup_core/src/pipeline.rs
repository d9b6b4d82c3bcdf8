//! Single-consumer frame pipeline.
//!
//! A worker thread owns the [`WorkoutController`] and drains one bounded
//! command queue. Frames, control commands and the one-second tick are all
//! handled on that thread, so they are serialized by construction and frames
//! are processed strictly in arrival order.
//!
//! Frames are offered with `try_send`: when the worker falls behind, the
//! newest frame is dropped rather than queued out of order. Control commands
//! block until there is room.

use crate::controller::{CaptureControl, FrameOutcome, WorkoutController, WorkoutEvent};
use crate::wal::SessionSink;
use crate::{Error, JointSnapshot, Result};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Work for the pipeline thread
#[derive(Debug)]
pub enum PipelineCommand {
    Frame(JointSnapshot),
    StartCountdown,
    SkipRest,
    EndWorkout,
    Shutdown,
}

/// Results pushed back to the caller
#[derive(Debug)]
pub enum PipelineOutput {
    Frame(FrameOutcome),
    /// Events from a tick or a control command
    Events(Vec<WorkoutEvent>),
    /// A command failed; the worker keeps running
    Failed(String),
}

#[derive(Clone, Copy, Debug)]
pub struct PipelineSettings {
    pub tick: Duration,
    pub queue_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            queue_capacity: 64,
        }
    }
}

impl From<&crate::config::WorkoutConfig> for PipelineSettings {
    fn from(config: &crate::config::WorkoutConfig) -> Self {
        Self {
            tick: Duration::from_millis(config.tick_millis),
            queue_capacity: config.frame_queue_capacity,
        }
    }
}

pub struct FramePipeline<C: CaptureControl, S: SessionSink> {
    commands: SyncSender<PipelineCommand>,
    outputs: Receiver<PipelineOutput>,
    worker: JoinHandle<WorkoutController<C, S>>,
    dropped_frames: u64,
}

impl<C, S> FramePipeline<C, S>
where
    C: CaptureControl + Send + 'static,
    S: SessionSink + Send + 'static,
{
    /// Move the controller onto a worker thread
    pub fn spawn(controller: WorkoutController<C, S>, settings: PipelineSettings) -> Result<Self> {
        let (commands, command_rx) = mpsc::sync_channel(settings.queue_capacity.max(1));
        let (output_tx, outputs) = mpsc::channel();
        let tick = settings.tick.max(Duration::from_millis(1));

        let worker = thread::Builder::new()
            .name("getup-pipeline".into())
            .spawn(move || run_worker(controller, command_rx, output_tx, tick))?;

        Ok(Self {
            commands,
            outputs,
            worker,
            dropped_frames: 0,
        })
    }

    /// Offer a frame; returns false if the queue was full and it was dropped
    pub fn submit_frame(&mut self, snapshot: JointSnapshot) -> Result<bool> {
        match self.commands.try_send(PipelineCommand::Frame(snapshot)) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => {
                self.dropped_frames += 1;
                tracing::debug!("Pipeline busy, dropped frame ({} total)", self.dropped_frames);
                Ok(false)
            }
            Err(TrySendError::Disconnected(_)) => Err(worker_gone()),
        }
    }

    /// Queue a control command, waiting for room
    pub fn send(&self, command: PipelineCommand) -> Result<()> {
        self.commands.send(command).map_err(|_| worker_gone())
    }

    pub fn outputs(&self) -> &Receiver<PipelineOutput> {
        &self.outputs
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    /// Stop the worker and take the controller back
    pub fn shutdown(self) -> Result<WorkoutController<C, S>> {
        // The worker may already have exited; joining tells us either way
        let _ = self.commands.send(PipelineCommand::Shutdown);
        self.worker
            .join()
            .map_err(|_| Error::Other("pipeline worker panicked".into()))
    }
}

fn worker_gone() -> Error {
    Error::Other("pipeline worker has stopped".into())
}

fn run_worker<C: CaptureControl, S: SessionSink>(
    mut controller: WorkoutController<C, S>,
    commands: Receiver<PipelineCommand>,
    outputs: mpsc::Sender<PipelineOutput>,
    tick: Duration,
) -> WorkoutController<C, S> {
    tracing::debug!("Pipeline worker started, tick every {:?}", tick);
    let mut next_tick = Instant::now() + tick;

    loop {
        let wait = next_tick.saturating_duration_since(Instant::now());
        let output = match commands.recv_timeout(wait) {
            Ok(PipelineCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(PipelineCommand::Frame(snapshot)) => {
                controller.process_frame(&snapshot).map(PipelineOutput::Frame)
            }
            Ok(PipelineCommand::StartCountdown) => {
                controller.start_countdown().map(PipelineOutput::Events)
            }
            Ok(PipelineCommand::SkipRest) => controller.skip_rest().map(PipelineOutput::Events),
            Ok(PipelineCommand::EndWorkout) => {
                controller.end_workout().map(PipelineOutput::Events)
            }
            Err(RecvTimeoutError::Timeout) => {
                next_tick += tick;
                controller.tick().map(PipelineOutput::Events)
            }
        };

        let output = output.unwrap_or_else(|e| {
            tracing::warn!("Pipeline command failed: {}", e);
            PipelineOutput::Failed(e.to_string())
        });

        let empty = matches!(&output, PipelineOutput::Events(events) if events.is_empty());
        if !empty && outputs.send(output).is_err() {
            tracing::debug!("Pipeline output receiver dropped, stopping");
            break;
        }
    }

    tracing::debug!("Pipeline worker stopped");
    controller
}
