use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use tracing_subscriber::EnvFilter;

use ragline_application::{ConversationEngine, InputCapture};
use ragline_core::{
    ChatMessage, EngineEvent, MessageRole, NoticeLevel, RaglineError, Scope, SessionDirectory,
};
use ragline_infrastructure::{ClientConfig, TomlSessionDirectory};
use ragline_interaction::{HttpAnsweringClient, UnsupportedTranscription};

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: [
                "/new", "/sessions", "/switch", "/rename", "/delete", "/edit", "/scope",
                "/history", "/export", "/speak", "/quit",
            ]
            .iter()
            .map(|cmd| cmd.to_string())
            .collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

fn print_message(index: usize, message: &ChatMessage) {
    match message.role {
        MessageRole::User => {
            println!("{}", format!("[{}] > {}", index, message.content).green());
        }
        MessageRole::Assistant => {
            for line in message.content.lines() {
                println!("{}", line.bright_blue());
            }
            for source in &message.sources {
                println!("{}", format!("  source: {}", source.source).bright_black());
            }
            if let Some(ms) = message.response_time_ms {
                println!("{}", format!("  ({} ms, {})", ms, message.scope.as_str()).bright_black());
            }
        }
    }
}

/// Prints transcript messages appended since the last call, keeping a
/// high-water mark so user echoes are not duplicated.
async fn print_new_messages(engine: &ConversationEngine, printed: &mut usize) {
    let snapshot = engine.transcript_snapshot().await;
    if snapshot.len() < *printed {
        // Transcript was reset (new conversation or session switch).
        *printed = 0;
    }
    for (index, message) in snapshot.iter().enumerate().skip(*printed) {
        if message.role == MessageRole::Assistant {
            print_message(index, message);
        }
    }
    *printed = snapshot.len();
}

/// The ragline readline REPL.
///
/// Plain lines are dispatched as queries against the answering backend;
/// slash commands manage sessions, message editing, retrieval scope, and
/// speech capture. A background watcher follows the shared session pointer
/// so switches made by sibling frontends show up here.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // ===== Backend wiring =====
    let config = ClientConfig::load().await;
    let answering = Arc::new(HttpAnsweringClient::from_config(&config));
    let directory: Arc<dyn SessionDirectory> = Arc::new(TomlSessionDirectory::new().await?);

    let engine = Arc::new(ConversationEngine::new(answering, directory));
    engine.sync_with_directory().await?;
    let watcher = engine.spawn_directory_watch(config.poll_interval());

    let capture = Arc::new(InputCapture::new(
        Arc::new(UnsupportedTranscription),
        engine.event_sender(),
    ));

    // ===== Event printer =====
    let printer_engine = Arc::clone(&engine);
    let mut events = engine.subscribe();
    let printer = tokio::spawn(async move {
        let mut printed = printer_engine.transcript_snapshot().await.len();
        while let Ok(event) = events.recv().await {
            match event {
                EngineEvent::TranscriptChanged => {
                    print_new_messages(&printer_engine, &mut printed).await;
                }
                EngineEvent::Notice { level, message } => match level {
                    NoticeLevel::Info => println!("{}", message.bright_black()),
                    NoticeLevel::Blocking => println!("{}", message.red()),
                },
                EngineEvent::CaptureStateChanged { listening } => {
                    if listening {
                        println!("{}", "Listening...".bright_yellow());
                    } else {
                        println!("{}", "Capture ended.".bright_black());
                    }
                }
                EngineEvent::DispatchStateChanged { .. } | EngineEvent::PendingInputChanged => {}
            }
        }
    });

    // ===== REPL setup =====
    let helper = CliHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== ragline ===".bright_magenta().bold());
    println!(
        "{}",
        "Ask anything, or use /sessions, /switch <id>, /edit <n> <text>, /scope, /quit."
            .bright_black()
    );
    println!();

    let mut scope = Scope::Local;

    // ===== Main REPL loop =====
    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if trimmed == "/quit" || trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                if let Some(rest) = trimmed.strip_prefix('/') {
                    let mut parts = rest.splitn(2, ' ');
                    let command = parts.next().unwrap_or_default();
                    let argument = parts.next().unwrap_or_default().trim();
                    run_command(&engine, &capture, &mut scope, command, argument).await;
                    continue;
                }

                // Plain text: dispatch as a query in the background so the
                // prompt stays responsive.
                let engine = Arc::clone(&engine);
                let query = trimmed.to_string();
                tokio::spawn(async move {
                    if let Err(err) = engine.dispatch(query, scope).await {
                        print_engine_error(&err);
                    }
                });
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    watcher.abort();
    printer.abort();

    Ok(())
}

fn print_engine_error(err: &RaglineError) {
    match err {
        RaglineError::Busy => {
            println!(
                "{}",
                "Still answering the previous question; try again in a moment.".yellow()
            );
        }
        other => eprintln!("{}", format!("Error: {}", other).red()),
    }
}

async fn run_command(
    engine: &Arc<ConversationEngine>,
    capture: &Arc<InputCapture>,
    scope: &mut Scope,
    command: &str,
    argument: &str,
) {
    match command {
        "new" => {
            if let Err(err) = engine.new_conversation().await {
                print_engine_error(&err);
            } else {
                println!("{}", "Started a new conversation.".bright_green());
            }
        }
        "sessions" => match engine.list_sessions().await {
            Ok(sessions) if sessions.is_empty() => {
                println!("{}", "No sessions yet.".bright_black());
            }
            Ok(sessions) => {
                let bound = engine.bound_session().await;
                for session in sessions {
                    let marker = if bound.as_deref() == Some(session.id.as_str()) {
                        "*"
                    } else {
                        " "
                    };
                    println!(
                        "{} {}  {}  ({} messages)",
                        marker.bright_yellow(),
                        session.id.bright_cyan(),
                        session.title,
                        session.message_count
                    );
                }
            }
            Err(err) => print_engine_error(&err),
        },
        "switch" => {
            if argument.is_empty() {
                println!("{}", "Usage: /switch <session-id>".bright_black());
                return;
            }
            if let Err(err) = engine.select_session(argument).await {
                print_engine_error(&err);
            }
        }
        "rename" => {
            let mut parts = argument.splitn(2, ' ');
            match (parts.next(), parts.next()) {
                (Some(id), Some(title)) if !title.trim().is_empty() => {
                    if let Err(err) = engine.rename_session(id, title.trim()).await {
                        print_engine_error(&err);
                    }
                }
                _ => println!("{}", "Usage: /rename <session-id> <title>".bright_black()),
            }
        }
        "delete" => {
            if argument.is_empty() {
                println!("{}", "Usage: /delete <session-id>".bright_black());
                return;
            }
            if let Err(err) = engine.delete_session(argument).await {
                print_engine_error(&err);
            } else {
                println!("{}", format!("Deleted session {}", argument).bright_green());
            }
        }
        "edit" => {
            let mut parts = argument.splitn(2, ' ');
            let index = parts.next().and_then(|raw| raw.parse::<usize>().ok());
            match (index, parts.next()) {
                (Some(index), Some(text)) if !text.trim().is_empty() => {
                    let engine = Arc::clone(engine);
                    let text = text.trim().to_string();
                    tokio::spawn(async move {
                        if let Err(err) = engine.edit(index, text).await {
                            print_engine_error(&err);
                        }
                    });
                }
                _ => println!("{}", "Usage: /edit <index> <new text>".bright_black()),
            }
        }
        "scope" => {
            match argument {
                "" => {}
                "local" => *scope = Scope::Local,
                "shared" => *scope = Scope::Shared,
                _ => {
                    println!("{}", "Usage: /scope [local|shared]".bright_black());
                    return;
                }
            }
            println!(
                "{}",
                format!("Retrieval scope: {}", scope.as_str()).bright_cyan()
            );
        }
        "history" => {
            let snapshot = engine.transcript_snapshot().await;
            if snapshot.is_empty() {
                println!("{}", "Transcript is empty.".bright_black());
            }
            for (index, message) in snapshot.iter().enumerate() {
                print_message(index, message);
            }
        }
        "export" => {
            print!("{}", engine.export_transcript().await);
        }
        "speak" => {
            if let Err(err) = capture.toggle().await {
                // The unsupported notice already went through the event
                // stream; anything else is worth a line of its own.
                if !err.is_unsupported() {
                    print_engine_error(&err);
                }
            }
        }
        other => {
            println!("{}", format!("Unknown command: /{}", other).bright_black());
        }
    }
}
