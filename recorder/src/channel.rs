use crate::errors::{Error, Result};
use std::io::Read;
use std::time::{Duration, Instant};
use tracing::info;

/// Serial connection parameters, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct SensorConfig {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

/// One read session over the sensor link. `read_frame` blocks until a line
/// terminator arrives or the configured timeout elapses; `Error::ReadTimeout`
/// means "no frame this attempt" and is not fatal. Dropping the session
/// releases the underlying connection.
pub trait SensorSession: Send + 'static {
    fn read_frame(&mut self) -> Result<Vec<u8>>;
}

/// Factory for read sessions. The recording task opens one session per
/// cycle and owns it exclusively until the cycle ends.
pub trait SensorChannel: Send + Sync + 'static {
    type Session: SensorSession;

    fn open(&self) -> Result<Self::Session>;
}

/// Production channel over a serial-attached sensor.
pub struct SerialChannel {
    config: SensorConfig,
}

impl SerialChannel {
    pub fn new(config: SensorConfig) -> Self {
        Self { config }
    }
}

impl SensorChannel for SerialChannel {
    type Session = SerialSession;

    fn open(&self) -> Result<SerialSession> {
        let port = serialport::new(&self.config.port, self.config.baud_rate)
            .timeout(self.config.read_timeout)
            .open()?;

        info!(
            "Opened serial port {} at {} baud",
            self.config.port, self.config.baud_rate
        );

        Ok(SerialSession {
            port,
            timeout: self.config.read_timeout,
        })
    }
}

pub struct SerialSession {
    port: Box<dyn serialport::SerialPort>,
    timeout: Duration,
}

impl SensorSession for SerialSession {
    fn read_frame(&mut self) -> Result<Vec<u8>> {
        read_line(&mut self.port, self.timeout)
    }
}

/// Accumulates bytes up to a `\n` terminator. A timeout with a partial line
/// buffered yields the partial frame (rejected downstream as malformed); a
/// timeout with nothing buffered yields `Error::ReadTimeout`.
fn read_line(reader: &mut impl Read, timeout: Duration) -> Result<Vec<u8>> {
    let deadline = Instant::now() + timeout;
    let mut frame = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        match reader.read(&mut byte) {
            Ok(0) => return finish(frame),
            Ok(_) => {
                frame.push(byte[0]);
                if byte[0] == b'\n' {
                    return Ok(frame);
                }
                if Instant::now() >= deadline {
                    return finish(frame);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => return finish(frame),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
}

fn finish(frame: Vec<u8>) -> Result<Vec<u8>> {
    if frame.is_empty() {
        Err(Error::ReadTimeout)
    } else {
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    const TIMEOUT: Duration = Duration::from_millis(50);

    #[test]
    fn test_reads_one_line_per_call() {
        let mut reader = Cursor::new(b"first line\nsecond line\n".to_vec());

        assert_eq!(read_line(&mut reader, TIMEOUT).unwrap(), b"first line\n");
        assert_eq!(read_line(&mut reader, TIMEOUT).unwrap(), b"second line\n");
    }

    #[test]
    fn test_partial_line_is_returned_on_timeout() {
        struct PartialThenTimeout {
            inner: Cursor<Vec<u8>>,
        }

        impl Read for PartialThenTimeout {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                match self.inner.read(buf) {
                    Ok(0) => Err(io::ErrorKind::TimedOut.into()),
                    other => other,
                }
            }
        }

        let mut reader = PartialThenTimeout {
            inner: Cursor::new(b"Humidity (%): 4".to_vec()),
        };

        assert_eq!(read_line(&mut reader, TIMEOUT).unwrap(), b"Humidity (%): 4");
    }

    #[test]
    fn test_timeout_with_no_data_yields_no_frame() {
        struct AlwaysTimeout;

        impl Read for AlwaysTimeout {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::ErrorKind::TimedOut.into())
            }
        }

        assert!(matches!(
            read_line(&mut AlwaysTimeout, TIMEOUT),
            Err(Error::ReadTimeout)
        ));
    }

    #[test]
    fn test_other_io_errors_propagate() {
        struct Broken;

        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::ErrorKind::BrokenPipe.into())
            }
        }

        assert!(matches!(read_line(&mut Broken, TIMEOUT), Err(Error::Io(_))));
    }
}
