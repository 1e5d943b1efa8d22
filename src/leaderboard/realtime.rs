//! Realtime change feed for the leaderboard table.
//!
//! Speaks the Phoenix channel protocol used by hosted Postgres realtime
//! services: join `realtime:public:<table>` asking for all postgres
//! changes, send a heartbeat every 25 seconds, and report every
//! insert/update/delete notification through the `notify` callback.
//!
//! The feed runs a single-threaded tokio runtime on its own OS thread so the
//! frame loop never blocks. Dropping the [`ChangeFeed`] stops it.

use super::remote::ChangeFeedTarget;
use futures_util::{SinkExt, StreamExt};
use std::io;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

const HEARTBEAT_SECS: u64 = 25;
const RECONNECT_DELAY_SECS: u64 = 5;

/// Handle to a running change feed.
pub struct ChangeFeed {
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("running", &self.stop.is_some())
            .finish()
    }
}

impl ChangeFeed {
    /// Start listening. `notify` is called once per change event.
    pub fn start<F>(target: ChangeFeedTarget, notify: F) -> io::Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = std::thread::Builder::new()
            .name("leaderboard-feed".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        tracing::warn!(error = %e, "could not start realtime runtime");
                        return;
                    }
                };
                runtime.block_on(run_until_stopped(target, notify, stop_rx));
            })?;

        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Signal the feed to stop. Does not wait for the socket to close.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        // Detach; the runtime exits on its own once it sees the signal.
        self.handle.take();
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_until_stopped<F>(target: ChangeFeedTarget, notify: F, mut stop: oneshot::Receiver<()>)
where
    F: Fn() + Send + 'static,
{
    loop {
        tokio::select! {
            _ = &mut stop => {
                tracing::debug!("realtime feed stopped");
                return;
            }
            result = listen(&target, &notify) => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "realtime feed disconnected");
                }
            }
        }

        tokio::select! {
            _ = &mut stop => return,
            _ = tokio::time::sleep(Duration::from_secs(RECONNECT_DELAY_SECS)) => {}
        }
    }
}

async fn listen<F>(
    target: &ChangeFeedTarget,
    notify: &F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Fn(),
{
    let (ws, _) = tokio_tungstenite::connect_async(target.url.as_str()).await?;
    let (mut sink, mut stream) = ws.split();

    sink.send(Message::Text(join_message(&target.table))).await?;
    tracing::info!(table = %target.table, "subscribed to leaderboard changes");

    let mut heartbeat = tokio::time::interval(Duration::from_secs(HEARTBEAT_SECS));
    let mut next_ref: u64 = 2;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                sink.send(Message::Text(heartbeat_message(next_ref))).await?;
                next_ref += 1;
            }
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if is_change_event(&text) {
                            notify();
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        sink.send(Message::Pong(payload)).await?;
                    }
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                }
            }
        }
    }
}

fn join_message(table: &str) -> String {
    serde_json::json!({
        "topic": format!("realtime:public:{}", table),
        "event": "phx_join",
        "payload": {
            "config": {
                "postgres_changes": [
                    { "event": "*", "schema": "public", "table": table }
                ]
            }
        },
        "ref": "1"
    })
    .to_string()
}

fn heartbeat_message(reference: u64) -> String {
    serde_json::json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": reference.to_string()
    })
    .to_string()
}

/// True for insert/update/delete notifications, in either the channel
/// (`postgres_changes`) or the legacy per-event framing.
pub fn is_change_event(text: &str) -> bool {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return false;
    };
    match value.get("event").and_then(|e| e.as_str()) {
        Some("postgres_changes") | Some("INSERT") | Some("UPDATE") | Some("DELETE") => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_event_detection() {
        assert!(is_change_event(
            r#"{"event":"postgres_changes","topic":"realtime:public:leaderboard","payload":{}}"#
        ));
        assert!(is_change_event(r#"{"event":"INSERT","payload":{}}"#));
        assert!(is_change_event(r#"{"event":"DELETE","payload":{}}"#));
        assert!(!is_change_event(r#"{"event":"phx_reply","payload":{"status":"ok"}}"#));
        assert!(!is_change_event("not json"));
    }

    #[test]
    fn test_join_message_targets_table() {
        let msg: serde_json::Value = serde_json::from_str(&join_message("scores")).unwrap();
        assert_eq!(msg["topic"], "realtime:public:scores");
        assert_eq!(msg["event"], "phx_join");
        assert_eq!(msg["payload"]["config"]["postgres_changes"][0]["table"], "scores");
    }
}
