//! Operator console.
//!
//! Reads one command per line: `list`, `params`, `help`, `exit`.
//! `exit` triggers graceful shutdown. End of input just stops the console.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::ServerConfig;
use crate::credentials::CredentialGateway;
use crate::lifecycle::shutdown::Shutdown;

const HELP: &str = "possible commands:\n\
list -- list information about clients\n\
params -- print the parameters of the program\n\
help -- print this message\n\
exit -- gracefully ends the execution of the program\n";

/// A parsed console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    List,
    Params,
    Help,
    Exit,
    Unknown,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "" => None,
            "list" => Some(Self::List),
            "params" => Some(Self::Params),
            "help" => Some(Self::Help),
            "exit" => Some(Self::Exit),
            _ => Some(Self::Unknown),
        }
    }
}

/// What the console needs from the server.
#[derive(Debug, Clone)]
pub struct Console {
    pub credentials: Arc<CredentialGateway>,
    pub config: Arc<ServerConfig>,
    pub shutdown: Shutdown,
}

impl Console {
    /// Run until `exit` or end of input.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let Some(command) = Command::parse(&line) else {
                continue;
            };
            tracing::debug!(command = ?command, "Console command");

            let text = match command {
                Command::List => self.render_list(),
                Command::Params => self.render_params(),
                Command::Help => HELP.to_string(),
                Command::Unknown => "invalid command -- try \"help\"\n".to_string(),
                Command::Exit => {
                    output
                        .write_all(b"no more clients are accepted!\nwaiting for client sessions to terminate\n")
                        .await?;
                    output.flush().await?;
                    self.shutdown.trigger();
                    return Ok(());
                }
            };
            output.write_all(text.as_bytes()).await?;
            output.flush().await?;
        }

        tracing::debug!("Console input closed");
        Ok(())
    }

    fn render_list(&self) -> String {
        let records = self.credentials.list_all();
        let mut out = format!("{:<24} {:>16} {}\n", "username", "bytes encrypted", "status");
        for record in records {
            let status = if record.connected { "connected" } else { "disconnected" };
            out.push_str(&format!("{:<24} {:>16} {}\n", record.username, record.bytes_encrypted, status));
        }
        out
    }

    fn render_params(&self) -> String {
        let config = &self.config;
        format!(
            "channel: {}\nlog file: {}\ncredential file: {}\nmax clients: {}\nworkers: {}\n",
            config.channel.socket_path().display(),
            config.logging.file.display(),
            config.credentials.file.display(),
            config.limits.max_clients,
            config.limits.workers,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;

    fn console() -> Console {
        let gw = CredentialGateway::new(MemoryCredentialStore::from_pairs([("alice", "pw")]).unwrap());
        gw.record_usage_and_disconnect("alice", 42);
        Console {
            credentials: Arc::new(gw),
            config: Arc::new(ServerConfig::default()),
            shutdown: Shutdown::new(),
        }
    }

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse("list\n"), Some(Command::List));
        assert_eq!(Command::parse("  exit "), Some(Command::Exit));
        assert_eq!(Command::parse("   "), None);
        assert_eq!(Command::parse("quit"), Some(Command::Unknown));
    }

    #[tokio::test]
    async fn list_then_exit_triggers_shutdown() {
        let console = console();
        let input: &[u8] = b"list\nbogus\nexit\nlist\n";
        let mut output = Vec::new();

        console.run(input, &mut output).await.unwrap();
        let text = String::from_utf8(output).unwrap();

        assert!(text.contains("alice"));
        assert!(text.contains("42"));
        assert!(!text.contains("pw"));
        assert!(text.contains("invalid command"));
        assert!(text.contains("no more clients are accepted"));
        assert_eq!(text.matches("alice").count(), 1);
        assert!(console.shutdown.is_triggered());
    }

    #[tokio::test]
    async fn end_of_input_does_not_shut_down() {
        let console = console();
        let input: &[u8] = b"help\nparams\n";
        let mut output = Vec::new();

        console.run(input, &mut output).await.unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("possible commands"));
        assert!(text.contains("max clients: 8"));
        assert!(!console.shutdown.is_triggered());
    }
}
