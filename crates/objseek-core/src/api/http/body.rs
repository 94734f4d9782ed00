//! Pull-style body over a push-style curl transfer.
//!
//! The transfer runs on its own thread and hands chunks to the reader through
//! a bounded channel. Dropping the body raises the abort flag and closes the
//! channel, then joins the worker. The flag is polled from curl's progress
//! callback, so a stalled connection is torn down within one progress tick
//! instead of waiting for the low-speed timeout.

use super::parse::parse_status_line;
use crate::error::TransportError;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Chunks buffered between the transfer thread and the reader.
pub(super) const CHUNK_QUEUE_DEPTH: usize = 8;

/// Message from the transfer thread.
pub(super) enum Frame {
    /// Final status and header lines (interim 1xx blocks are skipped).
    Head { code: u32, lines: Vec<String> },
    Chunk(Vec<u8>),
    Done(Result<(), curl::Error>),
}

/// Transfer thread body: perform `easy` and forward everything through `tx`.
pub(super) fn run_transfer(
    mut easy: curl::easy::Easy,
    tx: SyncSender<Frame>,
    abort: Arc<AtomicBool>,
) {
    let result = perform(&mut easy, tx.clone(), abort);
    let _ = tx.send(Frame::Done(result));
}

fn perform(
    easy: &mut curl::easy::Easy,
    tx: SyncSender<Frame>,
    abort: Arc<AtomicBool>,
) -> Result<(), curl::Error> {
    let head_tx = tx.clone();
    let mut code = 0u32;
    let mut lines: Vec<String> = Vec::new();

    easy.header_function(move |data| {
        let line = String::from_utf8_lossy(data).trim_end().to_string();
        if let Some(c) = parse_status_line(&line) {
            code = c;
            lines.clear();
            return true;
        }
        if !line.is_empty() {
            lines.push(line);
            return true;
        }
        if (100..200).contains(&code) {
            return true;
        }
        head_tx
            .send(Frame::Head {
                code,
                lines: std::mem::take(&mut lines),
            })
            .is_ok()
    })?;
    easy.write_function(move |data| match tx.send(Frame::Chunk(data.to_vec())) {
        Ok(()) => Ok(data.len()),
        // Reader is gone: abort the transfer.
        Err(_) => Ok(0),
    })?;
    easy.progress(true)?;
    easy.progress_function(move |_, _, _, _| !abort.load(Ordering::Relaxed))?;
    easy.perform()
}

/// Reader end of a running transfer.
pub(super) struct CurlBody {
    rx: Option<Receiver<Frame>>,
    chunk: Vec<u8>,
    pos: usize,
    done: bool,
    abort: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl CurlBody {
    pub(super) fn new(rx: Receiver<Frame>, abort: Arc<AtomicBool>, worker: JoinHandle<()>) -> Self {
        Self {
            rx: Some(rx),
            chunk: Vec::new(),
            pos: 0,
            done: false,
            abort,
            worker: Some(worker),
        }
    }

    /// Block until the response headers arrive.
    pub(super) fn wait_head(&mut self) -> Result<(u32, Vec<String>), TransportError> {
        let Some(rx) = &self.rx else {
            return Err(closed_early().into());
        };
        match rx.recv() {
            Ok(Frame::Head { code, lines }) => Ok((code, lines)),
            Ok(Frame::Done(Err(e))) => {
                self.done = true;
                Err(TransportError::Curl(e))
            }
            Ok(Frame::Done(Ok(()))) | Ok(Frame::Chunk(_)) | Err(_) => {
                self.done = true;
                Err(closed_early().into())
            }
        }
    }
}

fn closed_early() -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "transfer ended before a complete response",
    )
}

impl Read for CurlBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.pos < self.chunk.len() {
                let n = (self.chunk.len() - self.pos).min(buf.len());
                buf[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }
            if self.done || buf.is_empty() {
                return Ok(0);
            }
            let Some(rx) = &self.rx else {
                return Ok(0);
            };
            match rx.recv() {
                Ok(Frame::Chunk(chunk)) => {
                    self.chunk = chunk;
                    self.pos = 0;
                }
                Ok(Frame::Head { .. }) => {}
                Ok(Frame::Done(Ok(()))) => self.done = true,
                Ok(Frame::Done(Err(e))) => {
                    self.done = true;
                    return Err(io::Error::new(io::ErrorKind::Other, e));
                }
                Err(_) => {
                    self.done = true;
                    return Err(closed_early());
                }
            }
        }
    }
}

impl Drop for CurlBody {
    fn drop(&mut self) {
        // Stalled transfers see the flag; one blocked on send sees the closed channel.
        self.abort.store(true, Ordering::Relaxed);
        drop(self.rx.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("object fetch worker panicked");
            }
        }
    }
}
