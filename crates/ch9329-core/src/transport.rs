//! Byte-stream transport the driver core talks through.
//!
//! The chip hangs off a UART, usually reached through a serial port the
//! embedding application opens and configures. The core never touches the
//! port itself; it only needs something to push frames into and pull replies
//! from, with timeouts handled by the transport.

use std::collections::VecDeque;
use std::io;

/// Byte-stream connection to the chip.
///
/// Implemented for every `io::Read + io::Write` type, so a
/// `Box<dyn serialport::SerialPort>` plugs in directly, as does
/// [`MockTransport`] in tests.
pub trait Transport {
    /// Writes the whole of `bytes`, returning how many bytes went out.
    ///
    /// Frames must reach the chip intact, so partial writes are retried
    /// until everything is on the wire.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error, including when only part of the
    /// data could be written.
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Reads available bytes into `buffer`, waiting up to the transport's
    /// configured timeout.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error. A timeout with nothing received is
    /// `io::ErrorKind::TimedOut`, matching serial port semantics.
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize>;
}

impl<T: io::Read + io::Write + ?Sized> Transport for T {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        io::Write::write_all(self, bytes)?;
        Ok(bytes.len())
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self, buffer)
    }
}

/// In-memory transport for tests.
///
/// Records every frame written and replays scripted responses one chunk per
/// read call, the way a serial port delivers data. An exhausted script reads
/// as `TimedOut`, and timeouts or interrupted reads can be scripted ahead
/// of queued data.
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Frames captured from writes, in order.
    pub written: Vec<Vec<u8>>,
    responses: VecDeque<ReadScript>,
    fail_writes: bool,
    fail_reads: bool,
}

/// One scripted outcome for a read call.
#[derive(Debug)]
enum ReadScript {
    /// Deliver these bytes, re-queuing what does not fit the buffer.
    Data(Vec<u8>),
    /// Time out with nothing delivered.
    Timeout,
    /// Fail with `Interrupted`, as a signal landing mid-read does.
    Interrupted,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `bytes` to be returned by an upcoming read call.
    pub fn push_response(&mut self, bytes: &[u8]) {
        self.responses.push_back(ReadScript::Data(bytes.to_vec()));
    }

    /// Queues one read that times out before any queued data is delivered.
    pub fn push_timeout(&mut self) {
        self.responses.push_back(ReadScript::Timeout);
    }

    /// Queues one read that fails with `Interrupted` before any queued data
    /// is delivered.
    pub fn push_interrupted(&mut self) {
        self.responses.push_back(ReadScript::Interrupted);
    }

    /// Makes every subsequent write fail with `BrokenPipe`.
    pub fn fail_writes(&mut self) {
        self.fail_writes = true;
    }

    /// Makes every subsequent read fail with `BrokenPipe`.
    pub fn fail_reads(&mut self) {
        self.fail_reads = true;
    }
}

impl io::Write for MockTransport {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "injected write failure"));
        }
        self.written.push(bytes.to_vec());
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for MockTransport {
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        if self.fail_reads {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "injected read failure"));
        }
        match self.responses.pop_front() {
            Some(ReadScript::Timeout) => {
                Err(io::Error::new(io::ErrorKind::TimedOut, "scripted timeout"))
            }
            Some(ReadScript::Interrupted) => {
                Err(io::Error::new(io::ErrorKind::Interrupted, "scripted interrupt"))
            }
            Some(ReadScript::Data(chunk)) => {
                let n = chunk.len().min(buffer.len());
                buffer[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    self.responses.push_front(ReadScript::Data(chunk[n..].to_vec()));
                }
                Ok(n)
            }
            None => Err(io::Error::new(io::ErrorKind::TimedOut, "no scripted response")),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
