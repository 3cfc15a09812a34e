use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "aiapp")]
#[command(version, about = "AiApp - terminal client for Dify applications")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (defaults to ./aiapp.toml)
    #[arg(long, global = true, env = "AIAPP_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List configured apps
    Apps,

    /// Ask an app a single question
    Ask(AskArgs),

    /// Interactive chat with a chat app
    Chat(ChatArgs),
}

#[derive(Args)]
pub struct AskArgs {
    /// App ID to query
    pub app_id: String,

    /// The question or prompt
    pub query: String,

    /// Wait for the complete answer instead of streaming
    #[arg(long)]
    pub blocking: bool,

    /// User identifier forwarded upstream
    #[arg(long, default_value = "cli_user")]
    pub user: String,

    /// Workflow input as key=value (repeatable, workflow apps only)
    #[arg(long = "input", value_name = "KEY=VALUE")]
    pub inputs: Vec<String>,
}

#[derive(Args)]
pub struct ChatArgs {
    /// App ID to chat with
    pub app_id: String,

    /// User identifier forwarded upstream
    #[arg(long, default_value = "cli_user")]
    pub user: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parses_apps_command() {
        let cli = Cli::try_parse_from(["aiapp", "apps"]).expect("parse apps");
        assert!(matches!(cli.command, Commands::Apps));
    }

    #[test]
    fn parses_ask_command_with_inputs() {
        let cli = Cli::try_parse_from([
            "aiapp", "ask", "pipeline", "summarize", "--input", "topic=rust", "--blocking",
        ])
        .expect("parse ask");
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.app_id, "pipeline");
                assert_eq!(args.query, "summarize");
                assert_eq!(args.inputs, vec!["topic=rust".to_string()]);
                assert!(args.blocking);
            }
            _ => panic!("expected ask command"),
        }
    }

    #[test]
    fn parses_chat_command() {
        let cli = Cli::try_parse_from(["aiapp", "chat", "writer"]).expect("parse chat");
        match cli.command {
            Commands::Chat(args) => {
                assert_eq!(args.app_id, "writer");
                assert_eq!(args.user, "cli_user");
            }
            _ => panic!("expected chat command"),
        }
    }
}
