//! Command implementations: app listing, one-shot asks, interactive chat

use aiapp_relay::{
    AppKind, AppProfile, CancellationToken, ChatMessage, ChatRequest, DifyClient, StreamSink,
    WorkflowRunRequest, blocking_content,
};
use anyhow::{Context, Result, bail};
use colored::Colorize;
use std::io::{self, Write};
use tokio::io::AsyncBufReadExt;

use crate::cli::{AskArgs, ChatArgs};
use crate::config::CliConfig;

/// Prints each answer increment as it arrives. The parser always hands over
/// the full accumulated answer, so only the unseen suffix is printed.
#[derive(Default)]
struct StdoutSink {
    printed: usize,
}

impl StreamSink for StdoutSink {
    fn on_answer(&mut self, answer: &str) {
        print!("{}", &answer[self.printed..]);
        io::stdout().flush().ok();
        self.printed = answer.len();
    }

    fn on_end(&mut self) {
        println!();
    }
}

pub fn list_apps(config: &CliConfig) -> Result<()> {
    if config.apps.is_empty() {
        println!("no apps configured");
        return Ok(());
    }

    for app in &config.apps {
        let kind = match app.kind {
            AppKind::Chat => "chat",
            AppKind::Completion => "completion",
            AppKind::Workflow => "workflow",
        };
        if app.description.is_empty() {
            println!("{}  [{}]  {}", app.id.bold(), kind, app.name);
        } else {
            println!(
                "{}  [{}]  {} - {}",
                app.id.bold(),
                kind,
                app.name,
                app.description.dimmed()
            );
        }
    }
    Ok(())
}

pub async fn ask(config: &CliConfig, args: AskArgs) -> Result<()> {
    let app = resolve_app(config, &args.app_id)?;
    let client = DifyClient::new(&config.dify.base_url);

    match app.kind {
        AppKind::Workflow => {
            let request = workflow_request(&args)?;
            if args.blocking {
                let body = client.workflow_block(app, &request).await?;
                println!("{}", blocking_content(&body)?);
            } else {
                let mut sink = StdoutSink::default();
                let cancel = CancellationToken::new();
                watch_ctrl_c(cancel.clone());
                finish_stream(client.stream_workflow(app, &request, &mut sink, &cancel).await)?;
            }
        }
        AppKind::Chat | AppKind::Completion => {
            let request = ChatRequest::new(&args.query).with_user(&args.user);
            if args.blocking {
                let body = client.message_block(app, &request).await?;
                println!("{}", blocking_content(&body)?);
            } else {
                let mut sink = StdoutSink::default();
                let cancel = CancellationToken::new();
                watch_ctrl_c(cancel.clone());
                finish_stream(client.stream_message(app, &request, &mut sink, &cancel).await)?;
            }
        }
    }
    Ok(())
}

/// Cancellation is a silent teardown, not a failure.
fn finish_stream(result: aiapp_relay::Result<aiapp_relay::StreamOutcome>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(err) if err.is_cancelled() => {
            println!();
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn chat(config: &CliConfig, args: ChatArgs) -> Result<()> {
    let app = resolve_app(config, &args.app_id)?;
    if app.kind != AppKind::Chat {
        bail!("interactive chat requires a chat app; '{}' is not one", app.id);
    }

    let client = DifyClient::new(&config.dify.base_url);
    println!(
        "Chatting with {} - empty line or Ctrl-D to quit",
        app.name.bold()
    );

    let mut session: Vec<ChatMessage> = Vec::new();
    let mut conversation_id: Option<String> = None;
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", "you>".green().bold());
        io::stdout().flush().ok();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            break;
        }

        session.push(ChatMessage::user(line));

        let mut request = ChatRequest::new(line).with_user(&args.user);
        match &conversation_id {
            Some(id) => request = request.with_conversation(id.clone()),
            None => request.auto_generate_name = Some(true),
        }

        print!("{} ", "assistant>".cyan().bold());
        io::stdout().flush().ok();

        let mut message = ChatMessage::streaming_assistant();
        let mut sink = SessionSink {
            message: &mut message,
            printed: 0,
        };
        let cancel = CancellationToken::new();
        watch_ctrl_c(cancel.clone());

        match client.stream_message(app, &request, &mut sink, &cancel).await {
            Ok(outcome) => {
                if let Some(id) = outcome.conversation_id {
                    conversation_id = Some(id);
                }
                session.push(message);
            }
            Err(err) if err.is_cancelled() => {
                // Silent teardown; the partial message is dropped.
                println!();
            }
            Err(err) => {
                let note = format!("Request failed: {err}");
                println!("{}", note.red());
                session.push(ChatMessage::assistant(note));
            }
        }
        // Reap this turn's Ctrl-C watcher.
        cancel.cancel();
    }

    Ok(())
}

/// Grows a session message alongside the terminal output.
struct SessionSink<'a> {
    message: &'a mut ChatMessage,
    printed: usize,
}

impl StreamSink for SessionSink<'_> {
    fn on_answer(&mut self, answer: &str) {
        print!("{}", &answer[self.printed..]);
        io::stdout().flush().ok();
        self.printed = answer.len();
        self.message.set_answer(answer);
    }

    fn on_end(&mut self) {
        println!();
        self.message.finish_streaming();
    }
}

fn resolve_app<'a>(config: &'a CliConfig, id: &str) -> Result<&'a AppProfile> {
    config
        .find_app(id)
        .with_context(|| format!("app '{}' is not configured; run `aiapp apps`", id))
}

fn workflow_request(args: &AskArgs) -> Result<WorkflowRunRequest> {
    let mut request = WorkflowRunRequest::default();
    request.user = Some(args.user.clone());
    request.inputs.insert("query".into(), args.query.clone().into());
    for pair in &args.inputs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("invalid --input '{}', expected KEY=VALUE", pair);
        };
        request.inputs.insert(key.to_string(), value.into());
    }
    Ok(request)
}

/// Cancel the token on Ctrl-C; the watcher exits once the token cancels.
fn watch_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => cancel.cancel(),
            _ = cancel.cancelled() => {}
        }
    });
}
