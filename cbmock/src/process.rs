//! Mock cluster process management
//!
//! The mock is started with `--harakiri-monitor` pointing at a listener we
//! own. Once up, it connects back, writes its REST port terminated by a NUL
//! byte, and then serves control commands on that same connection. The mock
//! exits by itself when the connection drops.

use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::command::{MockCommand, MockResponse};
use crate::error::{MockError, MockResult};
use crate::jar::JarLocator;
use crate::spec::MockSpec;

/// Upper bound for the mock to come up and report its REST port
pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Grace period between SIGTERM and a hard kill on close
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A running mock cluster
pub struct CouchbaseMock {
    child: Mutex<Option<Child>>,
    control: Mutex<Option<BufReader<TcpStream>>>,
    rest_port: u16,
    data_ports: Vec<u16>,
    version: String,
}

impl CouchbaseMock {
    /// Start a mock with the given topology and wait until it is ready
    pub async fn start(locator: &JarLocator, spec: &MockSpec) -> MockResult<Self> {
        let jar = locator.locate().await?;
        let version = locator.version_of(&jar);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let monitor_addr = listener.local_addr()?;

        let mut cmd = Command::new("java");
        cmd.arg("-jar")
            .arg(&jar)
            .arg(format!("--harakiri-monitor={monitor_addr}"))
            .args(spec.to_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        info!("Starting mock cluster {} from {}", version, jar.display());
        let mut child = cmd.spawn().map_err(|e| MockError::SpawnFailed { message: e.to_string() })?;

        let accepted = tokio::select! {
            accepted = timeout(STARTUP_TIMEOUT, listener.accept()) => accepted,
            status = child.wait() => {
                let status = match status {
                    Ok(status) => status.to_string(),
                    Err(e) => e.to_string(),
                };
                return Err(MockError::ExitedDuringStartup { status });
            }
        };

        let stream = match accepted {
            Ok(Ok((stream, _))) => stream,
            Ok(Err(e)) => {
                abort_child(&mut child).await;
                return Err(e.into());
            }
            Err(_) => {
                abort_child(&mut child).await;
                return Err(MockError::StartupTimeout { timeout: STARTUP_TIMEOUT });
            }
        };

        let mut reader = BufReader::new(stream);
        let rest_port = match read_rest_port(&mut reader).await {
            Ok(port) => port,
            Err(e) => {
                abort_child(&mut child).await;
                return Err(e);
            }
        };
        debug!("Mock REST service listening on port {}", rest_port);

        let mut mock = Self {
            child: Mutex::new(Some(child)),
            control: Mutex::new(Some(reader)),
            rest_port,
            data_ports: Vec::new(),
            version,
        };

        if let Some(bucket) = spec.buckets.first() {
            mock.load_data_ports(&bucket.name).await?;
        }

        info!(
            "Mock cluster ready: rest port {}, data ports {:?}",
            mock.rest_port, mock.data_ports
        );
        Ok(mock)
    }

    /// Ask the mock for the data ports of `bucket`; the mock is closed on failure
    async fn load_data_ports(&mut self, bucket: &str) -> MockResult<()> {
        let command = MockCommand::GetMemcachedPorts {
            bucket: bucket.to_string(),
        };
        match self.control(&command).await.and_then(|response| response.ports()) {
            Ok(ports) => {
                self.data_ports = ports;
                Ok(())
            }
            Err(e) => {
                if let Err(close_err) = self.close().await {
                    warn!("Failed to close mock after port lookup failure: {}", close_err);
                }
                Err(e)
            }
        }
    }

    /// Send a control command and wait for its reply
    pub async fn control(&self, command: &MockCommand) -> MockResult<MockResponse> {
        let mut guard = self.control.lock().await;
        let reader = guard.as_mut().ok_or(MockError::ConnectionClosed)?;

        debug!("Mock control: {}", command.name());
        reader.get_mut().write_all(command.to_line()?.as_bytes()).await?;

        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(MockError::ConnectionClosed);
        }

        MockResponse::parse(&line)?.into_result(command)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn rest_port(&self) -> u16 {
        self.rest_port
    }

    pub fn data_ports(&self) -> &[u16] {
        &self.data_ports
    }

    /// Shut the mock down; closing an already closed mock is a no-op
    pub async fn close(&self) -> MockResult<()> {
        // Dropping the monitor connection asks the mock to exit on its own.
        self.control.lock().await.take();

        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(());
        };

        #[cfg(unix)]
        terminate_gracefully(&child);

        match timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(Ok(status)) => {
                debug!("Mock cluster exited with {}", status);
                Ok(())
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                warn!("Mock cluster ignored SIGTERM, killing it");
                child.kill().await?;
                Ok(())
            }
        }
    }
}

async fn abort_child(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!("Failed to kill mock process after startup failure: {}", e);
    }
}

#[cfg(unix)]
fn terminate_gracefully(child: &Child) {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };
    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    if let Err(e) = signal::kill(Pid::from_raw(raw), Signal::SIGTERM) {
        debug!("SIGTERM to mock process {} failed: {}", pid, e);
    }
}

async fn read_rest_port(reader: &mut BufReader<TcpStream>) -> MockResult<u16> {
    let mut buf = Vec::new();
    let read = timeout(STARTUP_TIMEOUT, reader.read_until(0, &mut buf))
        .await
        .map_err(|_| MockError::StartupTimeout { timeout: STARTUP_TIMEOUT })??;
    if read == 0 {
        return Err(MockError::HandshakeFailed {
            message: "connection closed before the REST port was reported".to_string(),
        });
    }
    parse_rest_port(&buf)
}

fn parse_rest_port(raw: &[u8]) -> MockResult<u16> {
    let text = std::str::from_utf8(raw).map_err(|e| MockError::HandshakeFailed { message: e.to_string() })?;
    let trimmed = text.trim_end_matches('\0').trim();
    trimmed.parse::<u16>().map_err(|_| MockError::HandshakeFailed {
        message: format!("invalid REST port '{trimmed}'"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rest_port() {
        assert_eq!(parse_rest_port(b"8091\0").unwrap(), 8091);
        assert_eq!(parse_rest_port(b" 49152 \0").unwrap(), 49152);
    }

    #[test]
    fn test_parse_rest_port_rejects_garbage() {
        assert!(parse_rest_port(b"\0").is_err());
        assert!(parse_rest_port(b"port\0").is_err());
        assert!(parse_rest_port(&[0xff, 0xfe, 0]).is_err());
    }

    #[tokio::test]
    async fn test_read_rest_port_from_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let writer = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(b"12345\0").await.unwrap();
            stream
        });

        let (stream, _) = listener.accept().await.unwrap();
        let mut reader = BufReader::new(stream);
        assert_eq!(read_rest_port(&mut reader).await.unwrap(), 12345);
        drop(writer.await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_port_lookup_closes_mock() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(stream);
            let mut request = String::new();
            reader.read_line(&mut request).await.unwrap();
            reader
                .get_mut()
                .write_all(b"{\"status\":\"fail: no such bucket\"}\n")
                .await
                .unwrap();
            request
        });

        let child = Command::new("sleep").arg("30").kill_on_drop(true).spawn().unwrap();
        let control = BufReader::new(TcpStream::connect(addr).await.unwrap());
        let mut mock = CouchbaseMock {
            child: Mutex::new(Some(child)),
            control: Mutex::new(Some(control)),
            rest_port: 8091,
            data_ports: Vec::new(),
            version: "1.5.25".to_string(),
        };

        assert!(mock.load_data_ports("default").await.is_err());
        assert!(server.await.unwrap().contains("GET_MCPORTS"));
        assert!(mock.child.lock().await.is_none());
        assert!(mock.control.lock().await.is_none());
        assert!(mock.data_ports().is_empty());
    }
}
