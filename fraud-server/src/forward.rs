//! Result forwarding
//!
//! Predictions are queued on a bounded channel and POSTed by one background
//! task. Delivery is at most once: a full queue drops the result, and a
//! result that fails every attempt is dropped too. Both are logged.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::config::ForwardConfig;

#[derive(Clone)]
pub struct Forwarder {
    tx: mpsc::Sender<Value>,
}

impl Forwarder {
    /// Start the delivery task. It ends when every `Forwarder` clone is dropped.
    pub fn spawn(config: ForwardConfig) -> anyhow::Result<(Self, JoinHandle<()>)> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let (tx, rx) = mpsc::channel(config.queue_capacity);

        tracing::info!(
            "Forwarding predictions to {} (queue {}, {} attempts)",
            config.url,
            config.queue_capacity,
            config.max_attempts
        );
        let handle = tokio::spawn(run(client, config, rx));
        Ok((Self { tx }, handle))
    }

    /// Queue a result without waiting; false when it was dropped
    pub fn enqueue(&self, payload: Value) -> bool {
        match self.tx.try_send(payload) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Forward queue full, dropping prediction");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!("Forwarder stopped, dropping prediction");
                false
            }
        }
    }
}

async fn run(client: reqwest::Client, config: ForwardConfig, mut rx: mpsc::Receiver<Value>) {
    while let Some(payload) = rx.recv().await {
        deliver(&client, &config, &payload).await;
    }
    tracing::debug!("Forward queue closed");
}

async fn deliver(client: &reqwest::Client, config: &ForwardConfig, payload: &Value) -> bool {
    for attempt in 1..=config.max_attempts {
        match client.post(&config.url).json(payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!("Forwarded prediction (attempt {})", attempt);
                return true;
            }
            Ok(response) => {
                tracing::warn!(
                    "Forward attempt {}/{} rejected: HTTP {}",
                    attempt,
                    config.max_attempts,
                    response.status()
                );
            }
            Err(e) => {
                tracing::warn!("Forward attempt {}/{} failed: {}", attempt, config.max_attempts, e);
            }
        }

        if attempt < config.max_attempts {
            tokio::time::sleep(backoff(config.backoff, attempt)).await;
        }
    }

    tracing::error!("Dropping prediction after {} failed forward attempts", config.max_attempts);
    false
}

fn backoff(unit: Duration, attempt: u32) -> Duration {
    unit * attempt
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    use super::*;

    /// Receiver that rejects the first `failures` requests
    async fn receiver(failures: usize) -> (String, Arc<AtomicUsize>, Arc<tokio::sync::Mutex<Vec<Value>>>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(tokio::sync::Mutex::new(Vec::new()));

        let app = Router::new()
            .route(
                "/hook",
                post(
                    move |State((hits, received)): State<(Arc<AtomicUsize>, Arc<tokio::sync::Mutex<Vec<Value>>>)>,
                     Json(body): Json<Value>| async move {
                        if hits.fetch_add(1, Ordering::SeqCst) < failures {
                            return StatusCode::SERVICE_UNAVAILABLE;
                        }
                        received.lock().await.push(body);
                        StatusCode::OK
                    },
                ),
            )
            .with_state((hits.clone(), received.clone()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/hook", addr), hits, received)
    }

    fn config(url: String, max_attempts: u32) -> ForwardConfig {
        ForwardConfig {
            url,
            timeout: Duration::from_secs(2),
            max_attempts,
            queue_capacity: 8,
            backoff: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_retries_until_delivered() {
        let (url, hits, received) = receiver(2).await;
        let (forwarder, handle) = Forwarder::spawn(config(url, 3)).unwrap();

        assert!(forwarder.enqueue(json!({"fraud": true})));
        drop(forwarder);
        handle.await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(received.lock().await.as_slice(), &[json!({"fraud": true})]);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (url, hits, received) = receiver(usize::MAX).await;
        let (forwarder, handle) = Forwarder::spawn(config(url, 2)).unwrap();

        forwarder.enqueue(json!({"fraud": false}));
        drop(forwarder);
        handle.await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(received.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_drops() {
        let (tx, _rx) = mpsc::channel(1);
        let forwarder = Forwarder { tx };
        assert!(forwarder.enqueue(json!(1)));
        assert!(!forwarder.enqueue(json!(2)));
    }

    #[test]
    fn test_linear_backoff() {
        assert_eq!(backoff(Duration::from_millis(100), 3), Duration::from_millis(300));
    }
}
