//! Line-oriented console.
//!
//! Each input line is either a session command starting with `/` or an
//! utterance for the orchestrator. Output goes to the writer, one reply per
//! input line; logs stay on stderr.

use ploughman_conversation::Conversation;
use ploughman_orchestrator::SessionHub;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Client key the console's session is stored under.
pub const CONSOLE_CLIENT: &str = "console";

const HELP: &str = "Commands: /new, /history, /select <n>, /delete <n>, /clear, /clear-all, /quit";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Archive the active conversation and start a new session.
    New,
    /// List archived conversations.
    History,
    /// Load the archived conversation at an index.
    Select(isize),
    /// Delete the archived conversation at an index.
    Delete(isize),
    /// Discard the active conversation.
    Clear,
    /// Discard every archived conversation.
    ClearAll,
    /// Stop reading input.
    Quit,
    /// Unrecognized command line.
    Invalid(String),
    /// An utterance for the orchestrator.
    Say(String),
}

impl Command {
    /// Parses one input line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Say(line.to_string());
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let argument = parts.next();
        if parts.next().is_some() {
            return Self::Invalid(line.to_string());
        }

        match (name, argument) {
            ("new", None) => Self::New,
            ("history", None) => Self::History,
            ("clear", None) => Self::Clear,
            ("clear-all", None) => Self::ClearAll,
            ("quit" | "exit", None) => Self::Quit,
            ("select", Some(index)) => index
                .parse()
                .map_or_else(|_| Self::Invalid(line.to_string()), Self::Select),
            ("delete", Some(index)) => index
                .parse()
                .map_or_else(|_| Self::Invalid(line.to_string()), Self::Delete),
            _ => Self::Invalid(line.to_string()),
        }
    }
}

/// Reads commands and utterances and writes the replies.
pub struct Console {
    hub: Arc<SessionHub>,
    client: String,
}

impl Console {
    /// Creates a console over `hub` using [`CONSOLE_CLIENT`].
    #[must_use]
    pub fn new(hub: Arc<SessionHub>) -> Self {
        Self {
            hub,
            client: CONSOLE_CLIENT.to_string(),
        }
    }

    /// Uses `client` as the session key instead of [`CONSOLE_CLIENT`].
    #[must_use]
    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = client.into();
        self
    }

    /// Processes lines until `/quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing fails.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let command = Command::parse(&line);
            if command == Command::Quit {
                debug!("quit requested");
                break;
            }
            if let Some(output) = self.execute(command).await {
                writer.write_all(output.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        Ok(())
    }

    /// Runs one command, returning the text to show, if any.
    pub async fn execute(&self, command: Command) -> Option<String> {
        let client = self.client.as_str();
        match command {
            Command::Say(utterance) => self.hub.handle(client, &utterance).await,
            Command::New => {
                let id = self
                    .hub
                    .with_session(client, |ctx| ctx.start_new_session().clone())
                    .await;
                Some(format!("Started session {id}"))
            }
            Command::History => {
                let summaries = self
                    .hub
                    .with_session(client, |ctx| ctx.history().summaries())
                    .await;
                if summaries.is_empty() {
                    return Some("No archived conversations".to_string());
                }
                let rows: Vec<String> = summaries
                    .iter()
                    .enumerate()
                    .map(|(i, s)| format!("{i}: {} {}", s.session_id, s.preview))
                    .collect();
                Some(rows.join("\n"))
            }
            Command::Select(index) => {
                let shown = self
                    .hub
                    .with_session(client, |ctx| render_conversation(ctx.load_history(index)))
                    .await;
                Some(shown.unwrap_or_else(|| {
                    format!(
                        "No archived conversation at {index}; the current conversation was cleared"
                    )
                }))
            }
            Command::Delete(index) => {
                let removed = self
                    .hub
                    .with_session(client, |ctx| ctx.delete_history(index))
                    .await;
                Some(match removed {
                    Some(entry) => format!("Deleted {}", entry.session_id()),
                    None => format!("No archived conversation at {index}"),
                })
            }
            Command::Clear => {
                self.hub.with_session(client, |ctx| ctx.clear_current()).await;
                Some("Cleared the current conversation".to_string())
            }
            Command::ClearAll => {
                self.hub.with_session(client, |ctx| ctx.clear_all()).await;
                Some("Cleared all archived conversations".to_string())
            }
            Command::Invalid(line) => Some(format!("Unknown command {line}\n{HELP}")),
            Command::Quit => None,
        }
    }
}

fn render_conversation(conversation: &Conversation) -> Option<String> {
    if conversation.is_empty() {
        return None;
    }
    let turns: Vec<String> = conversation
        .turns()
        .iter()
        .map(|t| format!("you: {}\nploughman: {}", t.utterance, t.response))
        .collect();
    Some(turns.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ploughman_orchestrator::{IntentRouter, Orchestrator, RouterError, RoutingDecision};
    use ploughman_tools::{ToolDefinition, ToolRegistry};

    struct Echo;

    #[async_trait]
    impl IntentRouter for Echo {
        async fn route(
            &self,
            utterance: &str,
            _catalog: &[ToolDefinition],
        ) -> Result<RoutingDecision, RouterError> {
            Ok(RoutingDecision::Reply(format!("echo {utterance}")))
        }
    }

    fn console() -> Console {
        let orchestrator = Orchestrator::new(Arc::new(Echo), Arc::new(ToolRegistry::new()));
        Console::new(Arc::new(SessionHub::new(Arc::new(orchestrator))))
    }

    async fn run(console: &Console, input: &str) -> String {
        let mut output = Vec::new();
        console
            .run(input.as_bytes(), &mut output)
            .await
            .expect("console run");
        String::from_utf8(output).expect("utf-8 output")
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("/new"), Command::New);
        assert_eq!(Command::parse("  /history "), Command::History);
        assert_eq!(Command::parse("/select 2"), Command::Select(2));
        assert_eq!(Command::parse("/delete -1"), Command::Delete(-1));
        assert_eq!(Command::parse("/clear-all"), Command::ClearAll);
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(
            Command::parse("show me the tables"),
            Command::Say("show me the tables".to_string())
        );
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(matches!(Command::parse("/select two"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/select"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/new 1"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/launch"), Command::Invalid(_)));
    }

    #[tokio::test]
    async fn utterances_are_answered_and_blank_lines_skipped() {
        let console = console();

        let output = run(&console, "hello\n\n   \nbye\n").await;

        assert_eq!(output, "echo hello\necho bye\n");
    }

    #[tokio::test]
    async fn history_round_trip() {
        let console = console();

        let output = run(&console, "first question\n/new\n/history\n/select 0\n").await;
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "echo first question");
        assert!(lines[1].starts_with("Started session "));
        assert!(lines[2].starts_with("0: "));
        assert!(lines[2].ends_with(" first question"));
        assert_eq!(lines[3], "you: first question");
        assert_eq!(lines[4], "ploughman: echo first question");
    }

    #[tokio::test]
    async fn quit_stops_reading() {
        let console = console();

        let output = run(&console, "one\n/quit\ntwo\n").await;

        assert_eq!(output, "echo one\n");
    }

    #[tokio::test]
    async fn out_of_range_indices_are_reported() {
        let console = console();

        assert_eq!(
            console.execute(Command::Delete(3)).await.as_deref(),
            Some("No archived conversation at 3")
        );
        assert_eq!(
            console.execute(Command::Select(-1)).await.as_deref(),
            Some("No archived conversation at -1; the current conversation was cleared")
        );
        assert_eq!(
            console.execute(Command::History).await.as_deref(),
            Some("No archived conversations")
        );
    }

    #[tokio::test]
    async fn out_of_range_select_reports_the_cleared_conversation() {
        let console = console();
        console.execute(Command::Say("keep me?".to_string())).await;

        let reply = console.execute(Command::Select(4)).await.expect("reply");

        assert!(reply.contains("current conversation was cleared"));
        let turns = console
            .hub
            .with_session(CONSOLE_CLIENT, |ctx| ctx.conversation().len())
            .await;
        assert_eq!(turns, 0);
    }

    #[tokio::test]
    async fn clear_discards_active_conversation() {
        let console = console();
        console.execute(Command::Say("hi".to_string())).await;

        console.execute(Command::Clear).await;

        let turns = console
            .hub
            .with_session(CONSOLE_CLIENT, |ctx| ctx.conversation().len())
            .await;
        assert_eq!(turns, 0);
    }
}
