//! Background thread for image decoding.
//!
//! `ImageDecoder` owns a worker thread that decodes uploaded files and
//! reports their pixel dimensions. Requests are one-shot: they cannot be
//! cancelled and are never retried. A request the caller no longer cares
//! about is simply ignored when its result arrives.

use std::sync::mpsc::{self, Receiver, RecvError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

/// Request to decode an image, sent to the background thread.
struct DecodeRequest {
    ticket: u64,
    data: Vec<u8>,
}

/// Message sent to the decoder thread.
enum ThreadMessage {
    /// Decode an image
    Decode(DecodeRequest),
    /// Shutdown the thread
    Shutdown,
}

/// Successfully decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Ticket of the request this answers
    pub ticket: u64,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

/// Error result from a decode attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// Ticket of the request that failed
    pub ticket: u64,
    /// Error message describing the failure
    pub error: String,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Can't load image (request {}): {}", self.ticket, self.error)
    }
}

impl std::error::Error for DecodeError {}

/// Result from background decoding - either decoded data or an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// Successfully decoded image
    Decoded(DecodedImage),
    /// Decode failed with error
    Error(DecodeError),
}

impl DecodeResult {
    pub fn ticket(&self) -> u64 {
        match self {
            DecodeResult::Decoded(img) => img.ticket,
            DecodeResult::Error(err) => err.ticket,
        }
    }
}

/// Manages a background thread for image decoding.
pub struct ImageDecoder {
    /// Sender for requests to the background thread
    request_tx: Sender<ThreadMessage>,
    /// Receiver for results from the background thread
    result_rx: Receiver<DecodeResult>,
    /// Handle to the background thread (for joining on drop)
    thread_handle: Option<JoinHandle<()>>,
    /// Counter for generating request tickets
    next_ticket: u64,
    /// Requests sent but not yet answered
    pending: usize,
}

impl ImageDecoder {
    /// Spawn a new decoder thread.
    ///
    /// Returns `Err` if the thread fails to spawn.
    pub fn spawn() -> Result<Self, String> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<DecodeResult>();

        let thread_handle = thread::Builder::new()
            .name("image-decoder".to_string())
            .spawn(move || {
                log::debug!("Image decoder thread started");
                Self::thread_loop(request_rx, result_tx);
                log::debug!("Image decoder thread exiting");
            })
            .map_err(|e| format!("Failed to spawn decoder thread: {}", e))?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            next_ticket: 0,
            pending: 0,
        })
    }

    /// Background thread main loop.
    fn thread_loop(request_rx: Receiver<ThreadMessage>, result_tx: Sender<DecodeResult>) {
        while let Ok(message) = request_rx.recv() {
            match message {
                ThreadMessage::Decode(request) => {
                    let result = Self::decode(request.ticket, &request.data);
                    if result_tx.send(result).is_err() {
                        log::warn!("Result channel closed, decoder thread exiting");
                        break;
                    }
                }
                ThreadMessage::Shutdown => {
                    log::debug!("Received shutdown signal");
                    break;
                }
            }
        }
    }

    /// Decode an image and report its dimensions.
    fn decode(ticket: u64, data: &[u8]) -> DecodeResult {
        log::debug!("Decoding request {} ({} bytes)", ticket, data.len());

        match image::load_from_memory(data) {
            Ok(img) => {
                log::debug!("Decoded request {}: {}x{}", ticket, img.width(), img.height());
                DecodeResult::Decoded(DecodedImage {
                    ticket,
                    width: img.width(),
                    height: img.height(),
                })
            }
            Err(e) => {
                log::debug!("Failed to decode request {}: {}", ticket, e);
                DecodeResult::Error(DecodeError {
                    ticket,
                    error: e.to_string(),
                })
            }
        }
    }

    /// Queue `data` for decoding and return the request ticket.
    ///
    /// Fails when the decoder thread is gone; the decoder is unusable after that.
    pub fn request_decode(&mut self, data: Vec<u8>) -> Result<u64, String> {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let request = DecodeRequest { ticket, data };
        if self.request_tx.send(ThreadMessage::Decode(request)).is_err() {
            log::error!("Failed to send decode request {}: channel closed", ticket);
            return Err(format!("decoder thread stopped, request {} not sent", ticket));
        }
        self.pending += 1;
        log::debug!("Sent decode request {}", ticket);
        Ok(ticket)
    }

    /// Stop the worker thread and wait for it to exit.
    fn shutdown(&mut self) {
        let _ = self.request_tx.send(ThreadMessage::Shutdown);

        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Decoder thread panicked: {:?}", e);
            }
        }
    }

    /// Take one completed result without blocking.
    pub fn take_one_result(&mut self) -> Option<DecodeResult> {
        match self.result_rx.try_recv() {
            Ok(result) => {
                self.pending = self.pending.saturating_sub(1);
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("Decoder thread disconnected");
                None
            }
        }
    }

    /// Block until the next result arrives.
    ///
    /// Returns `None` immediately when nothing is pending.
    pub fn wait_result(&mut self) -> Option<DecodeResult> {
        if self.pending == 0 {
            return None;
        }
        match self.result_rx.recv() {
            Ok(result) => {
                self.pending -= 1;
                Some(result)
            }
            Err(RecvError) => {
                log::warn!("Decoder thread disconnected");
                self.pending = 0;
                None
            }
        }
    }

    /// Get the number of pending requests.
    pub fn pending_count(&self) -> usize {
        self.pending
    }
}

impl Drop for ImageDecoder {
    fn drop(&mut self) {
        log::debug!("Shutting down image decoder thread");
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::new(width, height);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_reports_dimensions() {
        let mut decoder = ImageDecoder::spawn().unwrap();
        let ticket = decoder.request_decode(png_bytes(64, 32)).unwrap();
        assert_eq!(decoder.pending_count(), 1);

        let result = decoder.wait_result().unwrap();
        assert_eq!(
            result,
            DecodeResult::Decoded(DecodedImage {
                ticket,
                width: 64,
                height: 32
            })
        );
        assert_eq!(decoder.pending_count(), 0);
    }

    #[test]
    fn test_decode_failure_is_reported() {
        let mut decoder = ImageDecoder::spawn().unwrap();
        let ticket = decoder
            .request_decode(b"definitely not an image".to_vec())
            .unwrap();
        match decoder.wait_result() {
            Some(DecodeResult::Error(err)) => assert_eq!(err.ticket, ticket),
            other => panic!("Expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_tickets_increase() {
        let mut decoder = ImageDecoder::spawn().unwrap();
        let a = decoder.request_decode(png_bytes(2, 2)).unwrap();
        let b = decoder.request_decode(png_bytes(3, 3)).unwrap();
        assert!(b > a);
        assert_eq!(decoder.wait_result().map(|r| r.ticket()), Some(a));
        assert_eq!(decoder.wait_result().map(|r| r.ticket()), Some(b));
        assert!(decoder.wait_result().is_none());
    }

    #[test]
    fn test_request_after_thread_stopped_fails() {
        let mut decoder = ImageDecoder::spawn().unwrap();
        decoder.shutdown();

        assert!(decoder.request_decode(png_bytes(2, 2)).is_err());
        assert_eq!(decoder.pending_count(), 0);
        assert!(decoder.wait_result().is_none());
    }
}
