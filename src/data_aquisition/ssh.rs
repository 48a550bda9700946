use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, trace};

use thiserror::Error;

const PAGING_OFF_COMMAND: &str = "terminal length 0";
const READ_CHUNK: usize = 4096;

/// Interactive CLI session (PTY shell) over SSH.
pub struct SshClient {
    username: String,
    host: String,
    password: Option<String>,
    port: u16,
    connect_timeout: Duration,
    command_timeout: Duration,
    shell: Option<Arc<Mutex<CliShell>>>,
}

/// Blocking session state: the ssh2 session must outlive the channel it opened.
struct CliShell {
    session: ssh2::Session,
    channel: ssh2::Channel,
    command_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum SshError {
    #[error("TCP error: {0}")]
    TcpError(String),
    #[error("Timed out: {0}")]
    Timeout(String),
    #[error("SSH error: {0}")]
    SshError(String),
    #[error("SSH authentication error: {0}")]
    SshAuthError(String),
    #[error("Command execution error: {0}")]
    CommandError(String),
    #[error("Async error: {0}")]
    AsyncError(String),
}

impl SshError {
    fn from_io(e: std::io::Error, context: &str) -> Self {
        match e.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => SshError::Timeout(format!("{context}: {e}")),
            _ => SshError::CommandError(format!("{context}: {e}")),
        }
    }

    fn from_ssh2(e: ssh2::Error, context: &str) -> Self {
        let io: std::io::Error = e.into();
        match io.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => SshError::Timeout(format!("{context}: {io}")),
            _ => SshError::SshError(format!("{context}: {io}")),
        }
    }
}

impl SshClient {
    pub fn new_with_password(username: String, host: String, password: String, port: u16) -> Self {
        Self {
            username,
            host,
            password: Some(password),
            port,
            connect_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(30),
            shell: None,
        }
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, command_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.command_timeout = command_timeout;
        self
    }

    fn connect_sync_inner(
        username: String,
        host: String,
        password: Option<String>,
        port: u16,
        connect_timeout: Duration,
        command_timeout: Duration,
    ) -> Result<CliShell, SshError> {
        let addr = (host.as_str(), port)
            .to_socket_addrs()
            .map_err(|e| SshError::TcpError(e.to_string()))?
            .next()
            .ok_or_else(|| SshError::TcpError(format!("{host}:{port} did not resolve")))?;
        let tcp = TcpStream::connect_timeout(&addr, connect_timeout).map_err(|e| match e.kind() {
            ErrorKind::TimedOut => SshError::Timeout(format!("connecting to {addr}: {e}")),
            _ => SshError::TcpError(e.to_string()),
        })?;

        let mut session = ssh2::Session::new().map_err(|e| SshError::SshError(e.to_string()))?;
        session.set_timeout(millis(connect_timeout));
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| SshError::from_ssh2(e, "handshake"))?;
        if let Some(password) = password {
            session
                .userauth_password(&username, &password)
                .map_err(|e| SshError::SshAuthError(e.to_string()))?;
        }
        if !session.authenticated() {
            return Err(SshError::SshAuthError("Authentication failed".to_string()));
        }

        session.set_timeout(millis(command_timeout));
        let mut channel = session
            .channel_session()
            .map_err(|e| SshError::from_ssh2(e, "opening channel"))?;
        channel
            .request_pty("vt100", None, Some((511, 24, 0, 0)))
            .map_err(|e| SshError::from_ssh2(e, "requesting pty"))?;
        channel.shell().map_err(|e| SshError::from_ssh2(e, "starting shell"))?;

        let mut shell = CliShell {
            session,
            channel,
            command_timeout,
        };
        let prompt = shell.read_prompt()?;
        shell.run(PAGING_OFF_COMMAND, &prompt)?;
        Ok(shell)
    }

    pub async fn connect(&mut self) -> Result<(), SshError> {
        if self.shell.is_some() {
            return Err(SshError::SshError("Already connected".to_string()));
        }
        let username = self.username.clone();
        let host = self.host.clone();
        let password = self.password.clone();
        let port = self.port;
        let connect_timeout = self.connect_timeout;
        let command_timeout = self.command_timeout;
        let shell = tokio::task::spawn_blocking(move || {
            SshClient::connect_sync_inner(username, host, password, port, connect_timeout, command_timeout)
        })
        .await
        .map_err(|e| SshError::AsyncError(e.to_string()))??;
        debug!(host = %self.host, port = self.port, "ssh shell open");
        self.shell = Some(Arc::new(Mutex::new(shell)));
        Ok(())
    }

    fn shell(&self) -> Result<Arc<Mutex<CliShell>>, SshError> {
        self.shell
            .clone()
            .ok_or_else(|| SshError::SshError("Session not initialized".to_string()))
    }

    /// Current prompt as printed, including the trailing `>` or `#`.
    pub async fn find_prompt(&self) -> Result<String, SshError> {
        let shell = self.shell()?;
        tokio::task::spawn_blocking(move || {
            let mut shell = shell.blocking_lock();
            shell.write_line("")?;
            shell.read_prompt()
        })
        .await
        .map_err(|e| SshError::AsyncError(e.to_string()))?
    }

    /// Enter privileged EXEC mode.
    pub async fn enable(&self, secret: &str) -> Result<(), SshError> {
        let shell = self.shell()?;
        let secret = secret.to_string();
        tokio::task::spawn_blocking(move || {
            let mut shell = shell.blocking_lock();
            shell.write_line("enable")?;
            let output = shell.read_until(|buf| buf.trim_end().ends_with("Password:") || ends_with_prompt(buf))?;
            if output.trim_end().ends_with("Password:") {
                shell.write_line(&secret)?;
                shell.read_prompt()?;
            }
            let prompt = {
                shell.write_line("")?;
                shell.read_prompt()?
            };
            if prompt.ends_with('#') {
                Ok(())
            } else {
                Err(SshError::SshAuthError("enable secret rejected".to_string()))
            }
        })
        .await
        .map_err(|e| SshError::AsyncError(e.to_string()))?
    }

    /// Run a command and return its output without the echoed command and trailing prompt.
    pub async fn execute_command(&self, command: &str) -> Result<String, SshError> {
        let command = command.to_string();
        let shell = self.shell()?;
        tokio::task::spawn_blocking(move || {
            let mut shell = shell.blocking_lock();
            shell.write_line("")?;
            let prompt = shell.read_prompt()?;
            shell.run(&command, &prompt)
        })
        .await
        .map_err(|e| SshError::AsyncError(e.to_string()))?
    }

    pub async fn close(self) -> Result<(), SshError> {
        if let Some(shell) = self.shell {
            let mut shell = shell.lock().await;
            let _ = shell.channel.close();
            shell
                .session
                .disconnect(Some(ssh2::DisconnectCode::ByApplication), "", None)
                .map_err(|e| SshError::SshError(e.to_string()))?;
        }
        Ok(())
    }
}

impl CliShell {
    fn write_line(&mut self, line: &str) -> Result<(), SshError> {
        self.channel
            .write_all(format!("{line}\n").as_bytes())
            .and_then(|_| self.channel.flush())
            .map_err(|e| SshError::from_io(e, "writing to shell"))
    }

    /// Read until `done` holds for everything read so far, or the command timeout elapses.
    fn read_until(&mut self, done: impl Fn(&str) -> bool) -> Result<String, SshError> {
        let deadline = Instant::now() + self.command_timeout;
        let mut output = String::new();
        let mut buf = [0u8; READ_CHUNK];
        loop {
            if Instant::now() > deadline {
                return Err(SshError::Timeout("waiting for device prompt".to_string()));
            }
            let n = self
                .channel
                .read(&mut buf)
                .map_err(|e| SshError::from_io(e, "reading from shell"))?;
            if n == 0 {
                return Err(SshError::CommandError("shell closed by device".to_string()));
            }
            output.push_str(&String::from_utf8_lossy(&buf[..n]));
            trace!(bytes = n, "shell read");
            if done(&output) {
                return Ok(output.replace('\r', ""));
            }
        }
    }

    fn read_prompt(&mut self) -> Result<String, SshError> {
        let output = self.read_until(ends_with_prompt)?;
        Ok(output
            .lines()
            .last()
            .map(|line| line.trim().to_string())
            .unwrap_or_default())
    }

    fn run(&mut self, command: &str, prompt: &str) -> Result<String, SshError> {
        self.write_line(command)?;
        let output = self.read_until(|buf| buf.trim_end().ends_with(prompt))?;
        Ok(strip_echo_and_prompt(&output, command, prompt))
    }
}

/// A hostname followed by `#` or `>`. Banner rules like `#####` are not prompts.
fn ends_with_prompt(buf: &str) -> bool {
    let last = buf.trim_end().lines().last().unwrap_or_default().trim();
    let Some(name) = last.strip_suffix('#').or_else(|| last.strip_suffix('>')) else {
        return false;
    };
    !name.contains(' ') && name.chars().any(|c| c.is_ascii_alphanumeric())
}

fn strip_echo_and_prompt(output: &str, command: &str, prompt: &str) -> String {
    let mut lines: Vec<&str> = output.lines().collect();
    if lines.last().is_some_and(|line| line.trim() == prompt) {
        lines.pop();
    }
    if let Some(pos) = lines.iter().position(|line| line.trim_end().ends_with(command)) {
        lines.drain(..=pos);
    }
    lines.join("\n")
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_detection() {
        assert!(ends_with_prompt("banner\r\nSW1>"));
        assert!(ends_with_prompt("SW1#  "));
        assert!(!ends_with_prompt("Building configuration..."));
        assert!(!ends_with_prompt("Password:"));
        assert!(!ends_with_prompt("Gi0/0  Desg FWD 4 128.1 Shr #"));
    }

    #[test]
    fn test_banner_rule_is_not_a_prompt() {
        assert!(!ends_with_prompt("Authorized access only\r\n#########"));
        assert!(!ends_with_prompt(">>>>"));
        assert!(!ends_with_prompt("#"));
        assert!(ends_with_prompt("#########\r\nSW-CORE_1#"));
    }

    #[test]
    fn test_strip_echo_and_prompt() {
        let output = "show cdp neighbors\nDevice ID  Local Intrfce\nSW2        Gig 0/1\nSW1#";
        let stripped = strip_echo_and_prompt(output, "show cdp neighbors", "SW1#");
        assert_eq!(stripped, "Device ID  Local Intrfce\nSW2        Gig 0/1");
    }

    #[tokio::test]
    async fn test_commands_require_connection() {
        let client = SshClient::new_with_password(
            "admin".to_string(),
            "127.0.0.1".to_string(),
            "password".to_string(),
            22,
        );
        let res = client.execute_command("show spanning-tree").await;
        assert!(matches!(res, Err(SshError::SshError(_))));
    }
}
