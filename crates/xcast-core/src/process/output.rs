use std::collections::VecDeque;
use std::io::Read;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tracing::{debug, warn};

const READ_CHUNK_SIZE: usize = 8192;

/// Bytes of each stream a [`CaptureProcess`](super::CaptureProcess) keeps.
pub const OUTPUT_TAIL_CAPACITY: usize = 64 * 1024;

/// The most recent `capacity` bytes of a stream. Older bytes are evicted.
///
/// ffmpeg writes progress to stderr for as long as it runs, so a stream
/// session's output has no natural end.
#[derive(Debug, Clone)]
pub struct OutputTail {
    buffer: VecDeque<u8>,
    capacity: usize,
}

impl OutputTail {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "OutputTail capacity must be non-zero");
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append bytes, evicting the oldest once full.
    pub fn push(&mut self, data: &[u8]) {
        let data = &data[data.len().saturating_sub(self.capacity)..];
        let overflow = (self.buffer.len() + data.len()).saturating_sub(self.capacity);
        self.buffer.drain(..overflow);
        self.buffer.extend(data);
    }

    pub fn contents(&self) -> Vec<u8> {
        self.buffer.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for OutputTail {
    fn default() -> Self {
        Self::new(OUTPUT_TAIL_CAPACITY)
    }
}

/// Output of one child stream, fed by a reader thread.
///
/// The reader thread owns the pipe and exits at end of file, which
/// disconnects the channel. Drained bytes are handed to the caller and
/// their tail is kept in `data`.
pub(super) struct StreamBuffer {
    rx: Option<Receiver<Vec<u8>>>,
    data: OutputTail,
}

impl StreamBuffer {
    pub(super) fn spawn<R: Read + Send + 'static>(stream: &'static str, reader: R) -> Self {
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name(format!("xcast-{}-reader", stream))
            .spawn(move || read_to_channel(stream, reader, tx));

        match spawned {
            Ok(_) => Self {
                rx: Some(rx),
                data: OutputTail::default(),
            },
            Err(e) => {
                warn!(
                    event = "core.process.reader_spawn_failed",
                    stream = stream,
                    error = %e
                );
                Self::closed()
            }
        }
    }

    pub(super) fn closed() -> Self {
        Self {
            rx: None,
            data: OutputTail::default(),
        }
    }

    pub(super) fn is_closed(&self) -> bool {
        self.rx.is_none()
    }

    pub(super) fn data(&self) -> Vec<u8> {
        self.data.contents()
    }

    /// Take whatever has arrived without blocking.
    pub(super) fn drain(&mut self) -> Vec<u8> {
        let mut fresh = Vec::new();
        if let Some(rx) = &self.rx {
            loop {
                match rx.try_recv() {
                    Ok(chunk) => fresh.extend_from_slice(&chunk),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        self.rx = None;
                        break;
                    }
                }
            }
        }
        self.data.push(&fresh);
        fresh
    }

    /// Block until end of file. Only call once the child has exited.
    pub(super) fn drain_to_end(&mut self) -> Vec<u8> {
        let mut fresh = Vec::new();
        if let Some(rx) = self.rx.take() {
            for chunk in rx {
                fresh.extend_from_slice(&chunk);
            }
        }
        self.data.push(&fresh);
        fresh
    }
}

fn read_to_channel<R: Read>(stream: &'static str, mut reader: R, tx: mpsc::Sender<Vec<u8>>) {
    let mut buf = [0u8; READ_CHUNK_SIZE];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    // Receiver dropped; nobody wants the rest
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!(
                    event = "core.process.read_failed",
                    stream = stream,
                    error = %e
                );
                break;
            }
        }
    }
}
