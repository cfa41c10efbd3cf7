//! Viewer session: connect, receive loop, consume, input sending.
//!
//! The receive task only completes framed payloads and drops them
//! into the latest-frame buffer; decoding happens in the consumer at
//! presentation cadence, so a slow decode or redraw never stalls
//! frame reception.

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::buffer::LatestFrame;
use crate::command::InputCommand;
use crate::error::SpyglassError;
use crate::event::{EventSender, SessionEvent};
use crate::frame::RawFrame;
use crate::state::{SessionPhase, SessionState};
use crate::transport::{InputWireCodec, VideoFrameCodec};
use crate::video::FrameDecoder;

// ── ViewerConfig ─────────────────────────────────────────────────

/// Configuration for [`ViewerSession::connect`].
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Deadline for the TCP connection attempt.
    pub connect_timeout: Duration,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }
}

// ── ViewerSession ────────────────────────────────────────────────

/// Client-role session: one TCP connection receiving frames and
/// sending input commands.
#[derive(Debug)]
pub struct ViewerSession {
    state: Arc<SessionState>,
    phase: StdMutex<SessionPhase>,
    buffer: Arc<LatestFrame>,
    input: Mutex<Option<FramedWrite<OwnedWriteHalf, InputWireCodec>>>,
    receive_task: StdMutex<Option<JoinHandle<()>>>,
    events: EventSender,
}

impl ViewerSession {
    /// Connect to a host at `addr` (`"host:port"`).
    ///
    /// Failure classes surface as distinct errors because the
    /// remediation differs: [`SpyglassError::AddressResolution`]
    /// (fix the address), [`SpyglassError::ConnectionRefused`] (start
    /// the host), [`SpyglassError::ConnectTimeout`] (network path).
    pub async fn connect(
        addr: &str,
        config: ViewerConfig,
        events: EventSender,
    ) -> Result<Self, SpyglassError> {
        let mut phase = SessionPhase::default();
        phase.begin_connect()?;
        events.emit(SessionEvent::Connecting {
            addr: addr.to_string(),
        });

        let resolved = resolve(addr).await?;
        let stream = match timeout(config.connect_timeout, TcpStream::connect(resolved)).await {
            Err(_) => {
                return Err(SpyglassError::ConnectTimeout {
                    addr: addr.to_string(),
                    timeout: config.connect_timeout,
                });
            }
            Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => {
                return Err(SpyglassError::ConnectionRefused(addr.to_string()));
            }
            Ok(Err(e)) => return Err(e.into()),
            Ok(Ok(stream)) => stream,
        };
        phase.complete_connect()?;

        let state = Arc::new(SessionState::new());
        state.start();
        state.start_streaming();

        let buffer = Arc::new(LatestFrame::new());
        let (read_half, write_half) = stream.into_split();

        let receive_task = tokio::spawn(receive_loop(
            FramedRead::new(read_half, VideoFrameCodec),
            Arc::clone(&buffer),
            Arc::clone(&state),
            events.clone(),
        ));

        events.emit(SessionEvent::Connected { addr: resolved });

        Ok(Self {
            state,
            phase: StdMutex::new(phase),
            buffer,
            input: Mutex::new(Some(FramedWrite::new(write_half, InputWireCodec))),
            receive_task: StdMutex::new(Some(receive_task)),
            events,
        })
    }

    /// Whether the connection is still live (the receive loop has
    /// not ended and `disconnect` has not been called).
    pub fn is_connected(&self) -> bool {
        self.state.is_running() && self.phase().is_connected()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.lock_phase().clone()
    }

    /// Take the most recently received compressed payload, if any.
    ///
    /// Non-blocking; intended for a periodic presentation task whose
    /// cadence is independent of frame arrival.
    pub fn consume(&self) -> Option<Bytes> {
        self.buffer.take()
    }

    /// [`consume`](Self::consume) plus decode. A corrupt payload is
    /// dropped with a [`SessionEvent::FrameDropped`] diagnostic and
    /// reported as `None`; it never ends the session.
    pub fn consume_frame(&self, decoder: &FrameDecoder) -> Option<RawFrame> {
        let payload = self.consume()?;
        match decoder.decode(&payload) {
            Ok(frame) => Some(frame),
            Err(e) => {
                self.events.emit(SessionEvent::FrameDropped {
                    detail: e.to_string(),
                });
                None
            }
        }
    }

    /// Send an input command to the host.
    ///
    /// A write error tears the session down: a broken input channel
    /// makes the session unusable even if video still arrives.
    pub async fn send_input(&self, command: InputCommand) -> Result<(), SpyglassError> {
        if !self.state.is_running() {
            return Err(SpyglassError::ConnectionClosed);
        }

        let mut guard = self.input.lock().await;
        let Some(sink) = guard.as_mut() else {
            return Err(SpyglassError::ConnectionClosed);
        };

        // The write races teardown. A peer that stops reading would
        // otherwise park this send while it holds the sink lock, and
        // disconnect() could never take the write half.
        let outcome = tokio::select! {
            _ = self.state.stopped() => None,
            sent = sink.send(command) => Some(sent),
        };

        match outcome {
            None => {
                guard.take();
                Err(SpyglassError::ConnectionClosed)
            }
            Some(Ok(())) => Ok(()),
            Some(Err(e)) => {
                guard.take();
                drop(guard);
                self.state.stop();
                self.events.emit(SessionEvent::SessionError {
                    detail: format!("input channel write failed: {e}"),
                });
                Err(e)
            }
        }
    }

    /// Tear the session down. Idempotent: a second call finds the
    /// phase already `Disconnected` and returns immediately.
    ///
    /// Unblocks and joins the receive task, drops the socket halves,
    /// and clears any buffered frame.
    pub async fn disconnect(&self) {
        {
            let mut phase = self.lock_phase();
            if phase.is_disconnected() {
                return;
            }
            let _ = phase.begin_disconnect();
        }

        self.state.stop();
        // Dropping the write half closes our outbound direction; the
        // notify from stop() wakes the receive task.
        self.input.lock().await.take();

        let task = self.lock_task().take();
        if let Some(task) = task {
            let _ = task.await;
        }

        self.buffer.clear();
        self.lock_phase().force_disconnect();
        self.events.emit(SessionEvent::Disconnected);
    }

    fn lock_phase(&self) -> std::sync::MutexGuard<'_, SessionPhase> {
        self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_task(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.receive_task.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Resolve `addr`, mapping lookup failure and empty results to the
/// address-resolution error class.
async fn resolve(addr: &str) -> Result<SocketAddr, SpyglassError> {
    let mut candidates = tokio::net::lookup_host(addr)
        .await
        .map_err(|e| SpyglassError::AddressResolution(format!("{addr}: {e}")))?;
    candidates
        .next()
        .ok_or_else(|| SpyglassError::AddressResolution(addr.to_string()))
}

/// Receive framed payloads into the latest-frame buffer until the
/// connection or session ends.
async fn receive_loop(
    mut frames: FramedRead<OwnedReadHalf, VideoFrameCodec>,
    buffer: Arc<LatestFrame>,
    state: Arc<SessionState>,
    events: EventSender,
) {
    loop {
        let item = tokio::select! {
            _ = state.stopped() => break,
            item = frames.next() => item,
        };

        match item {
            Some(Ok(payload)) => buffer.store(payload),
            Some(Err(e)) => {
                events.emit(SessionEvent::StreamEnded {
                    reason: e.to_string(),
                });
                break;
            }
            None => {
                events.emit(SessionEvent::StreamEnded {
                    reason: "server closed the connection".to_string(),
                });
                break;
            }
        }
    }

    // Session teardown trigger: consume()/send_input() callers see a
    // closed session even before disconnect() runs.
    state.stop();
}

// ── Tests ────────────────────────────────────────────────────────
