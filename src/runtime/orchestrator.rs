use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::{
    app::{load_config, load_config_file, Config, UIConfig},
    cli::{handle_command, Cli},
    models::{MessageRole, ModelFactory},
    session::SessionManager,
    utils::ChatError,
};

/// Resolve configuration: explicit file > layered defaults, then CLI overrides
pub fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        load_config_file(config_path)?
    } else {
        match load_config() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        }
    };

    if let Some(model) = &cli.model {
        config.model.model = model.clone();
    }

    Ok(config)
}

/// One line typed at the chat prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Quit,
    Reset,
    History,
    Help,
    Empty,
    Message(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed {
            "" => ChatCommand::Empty,
            "/quit" | "/exit" => ChatCommand::Quit,
            "/reset" | "/clear" => ChatCommand::Reset,
            "/history" => ChatCommand::History,
            "/help" => ChatCommand::Help,
            _ => ChatCommand::Message(trimmed.to_string()),
        }
    }
}

/// Main runtime orchestrator for interactive chat
pub struct Orchestrator {
    cli: Cli,
    config: Config,
}

impl Orchestrator {
    /// Create a new orchestrator from CLI args
    pub fn new(cli: Cli) -> Result<Self> {
        let config = resolve_config(&cli)?;
        Ok(Self { cli, config })
    }

    /// Run the orchestrator
    pub async fn run(self) -> Result<()> {
        // Handle subcommands
        if let Some(command) = &self.cli.command {
            if handle_command(command, &self.config).await? {
                return Ok(()); // Command handled, exit
            }
        }

        let backend = ModelFactory::create(&self.config)?;
        let manager = SessionManager::from_config(backend, &self.config);

        let stdin = BufReader::new(tokio::io::stdin());
        run_chat(&manager, &self.config.ui, stdin, std::io::stdout()).await
    }
}

/// Read lines from `input` and converse until `/quit` or end of input
pub async fn run_chat<R, W>(
    manager: &SessionManager,
    ui: &UIConfig,
    input: R,
    mut output: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(output, "{} {}", "Assistant:".cyan().bold(), ui.greeting)?;
    writeln!(output, "{}", "Type /help for commands.".dimmed())?;

    let mut lines = input.lines();
    loop {
        write!(output, "{} ", "You:".green().bold())?;
        output.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(output)?;
            break;
        };

        match ChatCommand::parse(&line) {
            ChatCommand::Quit => break,
            ChatCommand::Empty => continue,
            ChatCommand::Help => {
                writeln!(output, "  /history  show the conversation so far")?;
                writeln!(output, "  /reset    start a new conversation")?;
                writeln!(output, "  /quit     leave the chat")?;
            }
            ChatCommand::Reset => {
                manager.reset().await;
                writeln!(output, "{}", "Conversation cleared.".dimmed())?;
                writeln!(output, "{} {}", "Assistant:".cyan().bold(), ui.greeting)?;
            }
            ChatCommand::History => print_history(manager, ui.show_timestamps, &mut output)?,
            ChatCommand::Message(text) => match manager.send_message(&text).await {
                Ok(reply) => writeln!(output, "{} {}", "Assistant:".cyan().bold(), reply)?,
                Err(ChatError::EmptyMessage) => continue,
                Err(e) => writeln!(output, "{} {}", "[ERROR]".red(), e)?,
            },
        }
    }

    Ok(())
}

fn print_history<W: Write>(manager: &SessionManager, show_timestamps: bool, output: &mut W) -> Result<()> {
    let history = manager.history();
    writeln!(output, "{}", manager.history_summary().dimmed())?;

    for message in &history {
        let speaker = match message.role {
            MessageRole::User => "You:".green().bold(),
            MessageRole::Assistant => "Assistant:".cyan().bold(),
        };
        if show_timestamps {
            writeln!(
                output,
                "  [{}] {} {}",
                message.timestamp.format("%H:%M:%S"),
                speaker,
                message.content
            )?;
        } else {
            writeln!(output, "  {} {}", speaker, message.content)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::SessionConfig;
    use crate::models::{BackendSession, MockBackendSession, MockChatBackend, ModelConfig, ModelResponse};
    use crate::session::RetryPolicy;
    use std::sync::Arc;
    use std::time::Duration;

    fn echo_manager(expected_sessions: usize) -> SessionManager {
        let mut backend = MockChatBackend::new();
        backend.expect_name().return_const("mock".to_string());
        backend.expect_start_session().times(expected_sessions).returning(|_| {
            let mut session = MockBackendSession::new();
            session
                .expect_send_message()
                .returning(|text| Ok(Some(ModelResponse::with_text(format!("echo: {}", text.len())))));
            Ok(Box::new(session) as Box<dyn BackendSession>)
        });

        SessionManager::new(Arc::new(backend), ModelConfig::default(), &SessionConfig::default())
            .with_retry_policy(RetryPolicy::new(0, Duration::ZERO))
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(ChatCommand::parse("  "), ChatCommand::Empty);
        assert_eq!(ChatCommand::parse("/exit"), ChatCommand::Quit);
        assert_eq!(ChatCommand::parse("/clear"), ChatCommand::Reset);
        assert_eq!(ChatCommand::parse("/history"), ChatCommand::History);
        assert_eq!(
            ChatCommand::parse("  where is my charger? "),
            ChatCommand::Message("where is my charger?".to_string())
        );
    }

    #[tokio::test]
    async fn test_chat_loop_round_trip() {
        let manager = echo_manager(1);
        let ui = UIConfig {
            greeting: "Welcome!".to_string(),
            show_timestamps: false,
        };
        let input: &[u8] = b"hello\n\n/history\n/quit\nignored\n";
        let mut output = Vec::new();

        run_chat(&manager, &ui, BufReader::new(input), &mut output).await.unwrap();

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("Welcome!"));
        assert!(printed.contains("echo: 5"));
        assert!(printed.contains("2 messages"));
        assert_eq!(manager.history().len(), 2);
    }

    #[tokio::test]
    async fn test_reset_command_starts_over() {
        let manager = echo_manager(2);
        let ui = UIConfig::default();
        let input: &[u8] = b"hello\n/reset\n";
        let mut output = Vec::new();

        run_chat(&manager, &ui, BufReader::new(input), &mut output).await.unwrap();

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("Conversation cleared."));
        assert!(manager.history().is_empty());
    }

    #[test]
    fn test_cli_model_overrides_config() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[model]\nmodel = \"gemini-1.5-flash\"\n").unwrap();

        let cli = Cli {
            model: Some("gemini-1.5-pro".to_string()),
            config: Some(path),
            verbose: false,
            prompt: None,
            output_format: crate::cli::OutputFormat::Text,
            command: None,
        };

        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.model.model, "gemini-1.5-pro");
        assert_eq!(config.model.top_k, 40);
    }
}
