//! Supervised streaming connection with bounded reconnect backoff.
//!
//! The stream itself (filtered firehose, rule management) lives behind
//! [`StreamClient`]; the supervisor owns reconnect policy and shutdown.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::IngestError;

/// Initial reconnect delay.
const BACKOFF_BASE_SECS: f64 = 5.0;
/// Upper bound on the reconnect delay.
const BACKOFF_MAX_SECS: f64 = 600.0;

/// One streaming connection session.
///
/// `connect` runs until the connection drops: `Ok(())` for a clean end
/// (backoff resets), `Err` for a failure (backoff grows).
#[async_trait]
pub trait StreamClient: Send + Sync {
    async fn connect(&self) -> Result<(), IngestError>;
}

/// Next delay after a failed session: doubled, capped.
pub fn next_backoff(current_secs: f64) -> f64 {
    (current_secs * 2.0).min(BACKOFF_MAX_SECS)
}

/// Apply reconnect jitter (0.8x–1.4x) to a delay.
pub fn jittered(secs: f64, rng: &mut impl Rng) -> f64 {
    secs * rng.gen_range(0.8..1.4)
}

/// Runs a [`StreamClient`] in a background task, reconnecting with
/// exponential backoff and jitter until stopped.
pub struct StreamSupervisor {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl StreamSupervisor {
    /// Spawn the supervised connect loop.
    pub fn spawn(client: Arc<dyn StreamClient>) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(client, stop_rx));
        Self { stop_tx, handle }
    }

    /// Signal the loop to stop and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.handle.await;
    }
}

async fn run_loop(client: Arc<dyn StreamClient>, mut stop: watch::Receiver<bool>) {
    let mut backoff = BACKOFF_BASE_SECS;
    info!("stream supervisor started");

    loop {
        if *stop.borrow() {
            break;
        }

        tokio::select! {
            result = client.connect() => {
                match result {
                    Ok(()) => {
                        // Clean disconnect: reconnect promptly with a fresh backoff.
                        backoff = BACKOFF_BASE_SECS;
                        info!("stream session ended; reconnecting");
                    }
                    Err(e) => {
                        let delay = jittered(backoff, &mut rand::thread_rng());
                        warn!(error = %e, delay_secs = format!("{delay:.1}"), "stream session failed; backing off");
                        tokio::select! {
                            _ = tokio::time::sleep(Duration::from_secs_f64(delay)) => {}
                            _ = stop.changed() => {}
                        }
                        backoff = next_backoff(backoff);
                    }
                }
            }
            _ = stop.changed() => {}
        }
    }

    info!("stream supervisor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn backoff_doubles_and_caps() {
        let mut delay = BACKOFF_BASE_SECS;
        let mut seen = Vec::new();
        for _ in 0..10 {
            delay = next_backoff(delay);
            seen.push(delay);
        }
        assert_eq!(seen[0], 10.0);
        assert_eq!(seen[1], 20.0);
        assert_eq!(*seen.last().unwrap(), BACKOFF_MAX_SECS);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn jitter_stays_in_band() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let d = jittered(10.0, &mut rng);
            assert!((8.0..14.0).contains(&d));
        }
    }

    struct FlakyClient {
        attempts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl StreamClient for FlakyClient {
        async fn connect(&self) -> Result<(), IngestError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(IngestError::Stream("connection reset".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn supervisor_retries_then_stops() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let supervisor = StreamSupervisor::spawn(Arc::new(FlakyClient {
            attempts: attempts.clone(),
        }));

        // Paused time auto-advances through the backoff sleeps.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(attempts.load(Ordering::SeqCst) >= 2);

        supervisor.stop().await;
        let settled = attempts.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), settled);
    }
}
