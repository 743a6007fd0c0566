// src/worker.rs - Single in-flight inference on a tokio task
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::session::{DetectorFrame, FrameOutcome, TrackingSession};

const OUTCOME_CHANNEL_SIZE: usize = 16;

/// Caller side of a running worker.
pub struct InferenceHandle {
    frames: mpsc::Sender<DetectorFrame>,
    outcomes: mpsc::Receiver<FrameOutcome>,
    stop: watch::Sender<bool>,
    task: JoinHandle<Option<TrackingSession>>,
}

pub struct InferenceWorker;

impl InferenceWorker {
    /// Moves the session onto a worker task.
    ///
    /// Frames are classified one at a time; at most one further frame waits
    /// in the queue and anything beyond that is dropped by `submit`.
    pub fn spawn(session: TrackingSession) -> InferenceHandle {
        let (frame_tx, frame_rx) = mpsc::channel(1);
        let (outcome_tx, outcome_rx) = mpsc::channel(OUTCOME_CHANNEL_SIZE);
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(run(session, frame_rx, outcome_tx, stop_rx));

        InferenceHandle {
            frames: frame_tx,
            outcomes: outcome_rx,
            stop: stop_tx,
            task,
        }
    }
}

impl InferenceHandle {
    /// Queues a frame unless one is already waiting. Returns whether it was accepted.
    pub fn submit(&self, frame: DetectorFrame) -> bool {
        match self.frames.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(frame)) => {
                debug!("Dropping frame at {:.3}s, classification still pending", frame.timestamp);
                false
            }
            Err(mpsc::error::TrySendError::Closed(frame)) => {
                warn!("Inference worker has exited, frame at {:.3}s rejected", frame.timestamp);
                false
            }
        }
    }

    /// Next classified frame, in submission order. `None` once stopped or
    /// once the worker has exited.
    pub async fn next(&mut self) -> Option<FrameOutcome> {
        if self.is_stopped() {
            return None;
        }
        let outcome = self.outcomes.recv().await?;
        if self.is_stopped() {
            return None;
        }
        Some(outcome)
    }

    /// Requests a stop. Outcomes not yet handed out by `next` are discarded,
    /// including any still being classified.
    pub fn stop(&mut self) {
        let _ = self.stop.send(true);
        let mut discarded = 0;
        while self.outcomes.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!("Discarded {} pending outcome(s) on stop", discarded);
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    /// Stops the worker and hands back the (cleared) session.
    pub async fn shutdown(mut self) -> Option<TrackingSession> {
        self.stop();
        drop(self.frames);
        drop(self.outcomes);
        match self.task.await {
            Ok(session) => session,
            Err(e) => {
                error!("Inference worker failed: {}", e);
                None
            }
        }
    }
}

async fn run(
    mut session: TrackingSession,
    mut frames: mpsc::Receiver<DetectorFrame>,
    outcomes: mpsc::Sender<FrameOutcome>,
    mut stop: watch::Receiver<bool>,
) -> Option<TrackingSession> {
    info!("Inference worker running for session {}", session.id());

    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            frame = frames.recv() => {
                let Some(frame) = frame else { break };

                // Model inference may block; keep it off the async workers.
                let joined = tokio::task::spawn_blocking(move || {
                    let outcome = session.process_frame(&frame);
                    (session, outcome)
                })
                .await;

                let outcome;
                (session, outcome) = match joined {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("Classification task failed: {}", e);
                        return None;
                    }
                };

                if *stop.borrow() {
                    debug!("Discarding result for frame at {:.3}s after stop", outcome.timestamp);
                    break;
                }

                let timestamp = outcome.timestamp;
                tokio::select! {
                    sent = outcomes.send(outcome) => {
                        if sent.is_err() {
                            debug!("Outcome receiver dropped");
                            break;
                        }
                    }
                    _ = stop.changed() => {
                        debug!("Discarding result for frame at {:.3}s after stop", timestamp);
                        break;
                    }
                }
            }
        }
    }

    session.stop();
    frames.close();
    while frames.try_recv().is_ok() {}
    Some(session)
}
