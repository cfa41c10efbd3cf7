//! Host session: accept loop, streaming loop, input loop.
//!
//! The host exposes its screen to exactly one peer at a time. The
//! accept loop hands each connection to a capture→encode→send
//! streaming loop and a spawned receive→parse→inject input loop;
//! when the connection ends (either loop failing, or the peer going
//! away) the host joins the input task and returns to accepting, so
//! a viewer can reconnect without restarting the host.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::command::InputCommand;
use crate::error::SpyglassError;
use crate::event::{EventSender, SessionEvent};
use crate::provider::{InputSink, ScreenSource};
use crate::quality::{INITIAL_QUALITY, QualityController};
use crate::state::SessionState;
use crate::transport::{InputWireCodec, VideoFrameCodec};
use crate::video::FrameEncoder;

// ── HostConfig ───────────────────────────────────────────────────

/// Configuration for a [`Host`].
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// TCP port to bind on all interfaces. `0` picks an ephemeral
    /// port (the bound address is reported via
    /// [`SessionEvent::Listening`]).
    pub port: u16,
    /// Target streaming frame rate (1..=60).
    pub target_fps: u8,
    /// JPEG quality before the controller has observed a payload.
    pub initial_quality: u8,
    /// Bounded wait on `accept` so a stop request stays observable.
    /// Not a correctness timeout.
    pub accept_timeout: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            port: 9999,
            target_fps: 15,
            initial_quality: INITIAL_QUALITY,
            accept_timeout: Duration::from_secs(1),
        }
    }
}

// ── Host ─────────────────────────────────────────────────────────

/// Server-role session owner.
///
/// # Lifetime
///
/// [`run`](Self::run) binds the port and serves sequential peers
/// until [`SessionState::stop`] is invoked on the handle from
/// [`stop_handle`](Self::stop_handle), or the listener itself fails.
pub struct Host {
    config: HostConfig,
    state: Arc<SessionState>,
    events: EventSender,
}

impl Host {
    pub fn new(config: HostConfig, events: EventSender) -> Self {
        Self {
            config,
            state: Arc::new(SessionState::new()),
            events,
        }
    }

    /// A cloneable handle that stops the host from another task.
    ///
    /// Stopping is permanent: a handle stopped before
    /// [`run`](Self::run) keeps the host from serving any peer.
    pub fn stop_handle(&self) -> Arc<SessionState> {
        Arc::clone(&self.state)
    }

    /// Run the accept loop until stopped.
    ///
    /// One client is served at a time; a second connection attempt
    /// waits in the backlog until the current peer disconnects.
    /// A bind failure is fatal and reported once; per-connection
    /// failures are reported and the host keeps accepting.
    pub async fn run<S, K>(&self, mut source: S, sink: K) -> Result<(), SpyglassError>
    where
        S: ScreenSource,
        K: InputSink + 'static,
    {
        let bind_addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| SpyglassError::Bind {
                addr: bind_addr.to_string(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;

        self.state.start();
        self.events.emit(SessionEvent::Listening { addr: local_addr });

        let sink = Arc::new(Mutex::new(sink));

        while self.state.is_running() {
            let (stream, peer) = match timeout(self.config.accept_timeout, listener.accept()).await
            {
                // Bounded wait elapsed: re-check the stop flag.
                Err(_) => continue,
                Ok(Err(e)) => {
                    if self.state.is_running() {
                        self.events.emit(SessionEvent::SessionError {
                            detail: format!("accept failed: {e}"),
                        });
                    }
                    break;
                }
                Ok(Ok(accepted)) => accepted,
            };

            self.events.emit(SessionEvent::PeerConnected { addr: peer });
            self.state.start_streaming();

            let (read_half, write_half) = stream.into_split();
            let input_task = tokio::spawn(input_loop(
                FramedRead::new(read_half, InputWireCodec),
                Arc::clone(&sink),
                Arc::clone(&self.state),
                self.events.clone(),
            ));

            if let Err(e) = self
                .stream_loop(FramedWrite::new(write_half, VideoFrameCodec), &mut source)
                .await
            {
                self.events.emit(SessionEvent::StreamEnded {
                    reason: e.to_string(),
                });
            }

            // Wake the input task if it is still parked, then join it
            // before accepting again so a reconnect never races a
            // still-draining predecessor.
            self.state.stop_streaming();
            input_task.await?;
            self.events.emit(SessionEvent::PeerDisconnected);
        }

        self.events.emit(SessionEvent::Stopped);
        Ok(())
    }

    /// Capture → encode → send until the connection or session ends.
    async fn stream_loop<S: ScreenSource>(
        &self,
        mut frames: FramedWrite<OwnedWriteHalf, VideoFrameCodec>,
        source: &mut S,
    ) -> Result<(), SpyglassError> {
        let mut encoder = FrameEncoder::new();
        let mut controller = QualityController::with_initial(self.config.initial_quality);
        let interval = Duration::from_secs_f64(1.0 / self.config.target_fps.max(1) as f64);
        let mut last_iteration = Instant::now();

        while self.state.is_running() && self.state.is_streaming() {
            // Throttle measured from the end of the previous
            // iteration. An over-long iteration skips the sleep but
            // never bursts to catch up.
            let elapsed = last_iteration.elapsed();
            if elapsed < interval {
                tokio::time::sleep(interval - elapsed).await;
            }

            // Both awaits race teardown: a peer that stops reading
            // parks the send on a full socket buffer, and a stop
            // request has to win that race.
            let frame = tokio::select! {
                _ = self.state.stream_stopped() => break,
                frame = source.capture() => frame?,
            };
            let payload: Bytes = encoder.encode(&frame, controller.quality())?;
            controller.record(payload.len());
            tokio::select! {
                _ = self.state.stream_stopped() => break,
                sent = frames.send(payload) => sent?,
            }

            last_iteration = Instant::now();
        }

        Ok(())
    }
}

/// Receive → parse → inject until the peer or session goes away.
///
/// Malformed records are reported and skipped. A socket error or
/// peer close clears the streaming flag so the streaming loop exits
/// on its next iteration check.
async fn input_loop<K: InputSink>(
    mut records: FramedRead<OwnedReadHalf, InputWireCodec>,
    sink: Arc<Mutex<K>>,
    state: Arc<SessionState>,
    events: EventSender,
) {
    loop {
        let item = tokio::select! {
            _ = state.stream_stopped() => break,
            item = records.next() => item,
        };

        match item {
            // Peer closed the input channel.
            None => break,
            Some(Err(e)) => {
                events.emit(SessionEvent::SessionError {
                    detail: format!("input channel error: {e}"),
                });
                break;
            }
            Some(Ok(record)) => match InputCommand::from_wire(&record) {
                Ok(command) => {
                    if let Err(e) = sink.lock().await.inject(command).await {
                        tracing::warn!(error = %e, "input injection failed");
                    }
                }
                Err(e) => {
                    events.emit(SessionEvent::MalformedCommand {
                        detail: e.to_string(),
                    });
                }
            },
        }
    }

    state.stop_streaming();
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::event_channel;
    use crate::frame::{PixelFormat, RawFrame};
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct SolidScreen;

    #[async_trait]
    impl ScreenSource for SolidScreen {
        async fn capture(&mut self) -> Result<RawFrame, SpyglassError> {
            RawFrame::new(32, 24, PixelFormat::Rgb8, vec![0x55; 32 * 24 * 3])
        }
    }

    struct RecordingSink(mpsc::UnboundedSender<InputCommand>);

    #[async_trait]
    impl InputSink for RecordingSink {
        async fn inject(&mut self, command: InputCommand) -> Result<(), SpyglassError> {
            let _ = self.0.send(command);
            Ok(())
        }
    }

    #[tokio::test]
    async fn bind_conflict_is_a_resource_error() {
        let taken = TcpListener::bind("0.0.0.0:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let (events, _rx) = event_channel();
        let host = Host::new(
            HostConfig {
                port,
                ..HostConfig::default()
            },
            events,
        );
        let (tx, _cmd_rx) = mpsc::unbounded_channel();

        let err = host.run(SolidScreen, RecordingSink(tx)).await.unwrap_err();
        assert!(matches!(err, SpyglassError::Bind { .. }));
    }

    #[tokio::test]
    async fn stop_before_run_serves_no_peers() {
        let (events, mut rx) = event_channel();
        let host = Host::new(
            HostConfig {
                port: 0,
                ..HostConfig::default()
            },
            events,
        );
        host.stop_handle().stop();
        let (tx, _cmd_rx) = mpsc::unbounded_channel();

        tokio::time::timeout(Duration::from_secs(1), host.run(SolidScreen, RecordingSink(tx)))
            .await
            .expect("run did not return for a pre-stopped handle")
            .unwrap();

        // The listener came up and went straight back down.
        let mut saw_stopped = false;
        while let Ok(event) = rx.try_recv() {
            if event == SessionEvent::Stopped {
                saw_stopped = true;
            }
        }
        assert!(saw_stopped);
    }

    #[tokio::test]
    async fn stop_before_any_peer_is_clean() {
        let (events, mut rx) = event_channel();
        let host = Host::new(
            HostConfig {
                port: 0,
                accept_timeout: Duration::from_millis(50),
                ..HostConfig::default()
            },
            events,
        );
        let stop = host.stop_handle();
        let (tx, _cmd_rx) = mpsc::unbounded_channel();

        let run = tokio::spawn(async move { host.run(SolidScreen, RecordingSink(tx)).await });

        // Wait for the listener to come up, then stop it twice —
        // the second stop must be a no-op.
        match tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap()
        {
            SessionEvent::Listening { .. } => {}
            other => panic!("expected Listening, got {other:?}"),
        }
        stop.stop();
        stop.stop();

        tokio::time::timeout(Duration::from_secs(2), run)
            .await
            .expect("host did not observe stop")
            .unwrap()
            .unwrap();
    }
}
