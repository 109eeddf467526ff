// src/repl.rs

use crate::auth::AuthContext;
use crate::chat::{ChatSession, ChatSettings, SessionStatus};
use crate::config::Config;
use crate::conversation::StoredHistory;
use crate::document::{fetch_document_options, DocumentTextLoader};
use crate::gateway::HttpGateway;
use crate::models::{DocumentOption, Message, ModelType, Role};
use crate::notify::{ConsoleNotifier, Notifier};
use crate::session_store::SessionStoreClient;
use crate::storage::{FileStore, KeyValueStore};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use std::time::Duration;

const WRAP_WIDTH: usize = 88;

const HELP: &str = "\
/models            list available models
/model <n|id>      switch model
/docs              list documents
/doc <n|id>        attach a document to the next message
/doc none          detach the document
/history           print the conversation
/clear             forget the conversation
/login <token>     sign in with a session token
/logout            sign out
/whoami            show the signed-in user
/quit              exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Models,
    Model(String),
    Docs,
    Doc(Option<String>),
    History,
    Clear,
    Login(String),
    Logout,
    WhoAmI,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    if !trimmed.starts_with('/') {
        return Command::Send(line.to_string());
    }

    let (name, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (trimmed, ""),
    };

    match (name, arg) {
        ("/models", _) => Command::Models,
        ("/model", arg) if !arg.is_empty() => Command::Model(arg.to_string()),
        ("/docs", _) => Command::Docs,
        ("/doc", "none") | ("/doc", "") => Command::Doc(None),
        ("/doc", arg) => Command::Doc(Some(arg.to_string())),
        ("/history", _) => Command::History,
        ("/clear", _) => Command::Clear,
        ("/login", arg) if !arg.is_empty() => Command::Login(arg.to_string()),
        ("/logout", _) => Command::Logout,
        ("/whoami", _) => Command::WhoAmI,
        ("/help", _) => Command::Help,
        ("/quit", _) | ("/exit", _) => Command::Quit,
        _ => Command::Unknown(trimmed.to_string()),
    }
}

/// Only a send replaces the input kept from a failed send; any other command
/// drops it so it is not offered again at the next prompt.
fn keeps_pending_input(command: &Command) -> bool {
    matches!(command, Command::Send(_))
}

/// Picks a model by 1-based position in the catalog, id or label.
pub fn resolve_model(arg: &str) -> Option<ModelType> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => ModelType::ALL.get(n - 1).copied(),
        _ => arg.parse().ok(),
    }
}

/// Picks a document by 1-based position in the list or by id.
pub fn resolve_document(arg: &str, options: &[DocumentOption]) -> Option<String> {
    if let Ok(n) = arg.parse::<usize>() {
        if let Some(option) = n.checked_sub(1).and_then(|i| options.get(i)) {
            return Some(option.value.clone());
        }
    }
    options
        .iter()
        .find(|o| o.value == arg)
        .map(|o| o.value.clone())
}

fn render_message(message: &Message) -> String {
    let body = textwrap::fill(&message.content, WRAP_WIDTH);
    match message.role {
        Role::User => format!("{}\n{}", "you".blue().bold(), body),
        Role::Assistant => format!("{}\n{}", "assistant".green().bold(), body),
    }
}

pub struct Repl {
    session: ChatSession,
    auth: AuthContext,
    notifier: Arc<dyn Notifier>,
    documents: Option<Vec<DocumentOption>>,
}

impl Repl {
    /// Wires the chat client against the configured proxy and Session Store.
    pub async fn connect(config: &Config, model: Option<ModelType>) -> anyhow::Result<Self> {
        let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.data_dir)?);
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let client = SessionStoreClient::new(&config.session_store_url, store.clone(), timeout)?;
        let auth = AuthContext::bootstrap(client.clone()).await;

        let loader = Arc::new(DocumentTextLoader::new(
            Arc::new(client),
            notifier.clone(),
            config.max_document_chars,
        ));
        let gateway = Arc::new(HttpGateway::new(&config.proxy_url, timeout)?);
        let history = Arc::new(StoredHistory::new(store));

        let mut settings = ChatSettings::from_config(config)?;
        if let Some(model) = model {
            settings.model = model;
        }

        Ok(Repl {
            session: ChatSession::mount(gateway, history, loader, settings),
            auth,
            notifier,
            documents: None,
        })
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut editor = DefaultEditor::new()?;

        println!("{}", "Chat with AI".bold());
        println!("{}", "Type /help for commands.".dimmed());
        match self.auth.user() {
            Some(user) => println!("Signed in as {} ({:?})", user.name, user.role),
            None => println!("{}", "Not signed in; documents are unavailable.".yellow()),
        }
        if self.auth.is_authenticated() {
            self.refresh_documents().await;
        }
        for message in self.session.messages() {
            println!("{}\n", render_message(message));
        }

        loop {
            let prompt = self.prompt().await;
            let line = if self.session.input().is_empty() {
                editor.readline(&prompt)
            } else {
                editor.readline_with_initial(&prompt, (self.session.input(), ""))
            };

            let line = match line {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };
            if line.trim().is_empty() {
                self.session.set_input(String::new());
                continue;
            }
            let _ = editor.add_history_entry(line.as_str());

            let command = parse_command(&line);
            if !keeps_pending_input(&command) {
                self.session.set_input(String::new());
            }
            if !self.handle(command).await {
                break;
            }
        }
        Ok(())
    }

    async fn prompt(&self) -> String {
        let document = match self.session.selected_document().await {
            Some(id) => {
                let label = self
                    .documents
                    .iter()
                    .flatten()
                    .find(|o| o.value == id)
                    .map(|o| o.label.clone())
                    .unwrap_or(id);
                format!(" + {}", label)
            }
            None => String::new(),
        };
        format!("[{}{}] › ", self.session.model().label(), document)
    }

    /// Returns `false` when the loop should stop.
    async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Send(text) => self.send(text).await,
            Command::Models => {
                for (i, model) in ModelType::ALL.iter().enumerate() {
                    let marker = if *model == self.session.model() { "*" } else { " " };
                    println!(
                        "{} {:>2}. {:<24} {}",
                        marker,
                        i + 1,
                        model.label(),
                        model.id().dimmed()
                    );
                }
            }
            Command::Model(arg) => match resolve_model(&arg) {
                Some(model) => self.session.set_model(model),
                None => self.notifier.error(&format!("Unknown model: {}", arg)),
            },
            Command::Docs => {
                self.refresh_documents().await;
                for (i, doc) in self.documents.iter().flatten().enumerate() {
                    println!("{:>3}. {} {}", i + 1, doc.label, doc.value.dimmed());
                }
            }
            Command::Doc(None) => {
                self.session.select_document(None).await;
            }
            Command::Doc(Some(arg)) => {
                let options = self.documents.as_deref().unwrap_or_default();
                match resolve_document(&arg, options) {
                    Some(id) => {
                        // The load runs in the background; a send before it
                        // finishes goes out without the document.
                        self.session.select_document(Some(id)).await;
                    }
                    None => self.notifier.error(&format!("Unknown document: {}", arg)),
                }
            }
            Command::History => {
                for message in self.session.messages() {
                    println!("{}\n", render_message(message));
                }
            }
            Command::Clear => {
                if let Err(e) = self.session.clear().await {
                    self.notifier.error(&format!("Failed to clear history: {}", e));
                }
            }
            Command::Login(token) => {
                match self.auth.login(&token).await {
                    Ok(user) => println!("Signed in as {}", user.name),
                    Err(e) => {
                        self.notifier.error(&format!("Login failed: {}", e));
                        return true;
                    }
                }
                self.refresh_documents().await;
            }
            Command::Logout => {
                if let Err(e) = self.auth.logout() {
                    self.notifier.error(&format!("Logout failed: {}", e));
                }
                self.documents = None;
                self.session.select_document(None).await;
            }
            Command::WhoAmI => match self.auth.user() {
                Some(user) => println!("{} <{}> {:?}", user.name, user.email, user.role),
                None => println!("Not signed in"),
            },
            Command::Help => println!("{}", HELP),
            Command::Quit => return false,
            Command::Unknown(text) => self.notifier.error(&format!("Unknown command: {}", text)),
        }
        true
    }

    async fn send(&mut self, text: String) {
        self.session.set_input(text);

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message("Sending...");
        spinner.enable_steady_tick(Duration::from_millis(80));

        let result = self.session.submit_input().await;
        spinner.finish_and_clear();

        match result {
            Ok(Some(_)) => {
                if let Some(reply) = self.session.messages().last() {
                    println!("{}\n", render_message(reply));
                }
            }
            Ok(None) => {}
            Err(_) => {
                if let SessionStatus::Failed(reason) = self.session.status() {
                    eprintln!("{}", reason.dimmed());
                }
            }
        }
    }

    async fn refresh_documents(&mut self) {
        let documents = fetch_document_options(self.auth.client(), self.notifier.as_ref()).await;
        self.documents = documents;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<DocumentOption> {
        vec![
            DocumentOption {
                label: "Annual 2023".to_string(),
                value: "doc-a".to_string(),
            },
            DocumentOption {
                label: "KIID".to_string(),
                value: "doc-b".to_string(),
            },
        ]
    }

    #[test]
    fn test_plain_line_is_sent_verbatim() {
        assert_eq!(
            parse_command("  what is the NAV?"),
            Command::Send("  what is the NAV?".to_string())
        );
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("/models"), Command::Models);
        assert_eq!(parse_command("/model 2"), Command::Model("2".to_string()));
        assert_eq!(parse_command("/doc none"), Command::Doc(None));
        assert_eq!(parse_command("/doc"), Command::Doc(None));
        assert_eq!(parse_command("/doc doc-a"), Command::Doc(Some("doc-a".to_string())));
        assert_eq!(parse_command("/login abc"), Command::Login("abc".to_string()));
        assert_eq!(parse_command("/exit"), Command::Quit);
        assert_eq!(parse_command("/model"), Command::Unknown("/model".to_string()));
        assert_eq!(parse_command("/nope"), Command::Unknown("/nope".to_string()));
    }

    #[test]
    fn test_only_send_keeps_pending_input() {
        assert!(keeps_pending_input(&Command::Send("retry".to_string())));
        assert!(!keeps_pending_input(&Command::Models));
        assert!(!keeps_pending_input(&Command::Doc(Some("doc-a".to_string()))));
        assert!(!keeps_pending_input(&Command::Unknown("/nope".to_string())));
    }

    #[test]
    fn test_resolve_model() {
        assert_eq!(resolve_model("1"), Some(ModelType::GptOss120b));
        assert_eq!(resolve_model("7"), Some(ModelType::Gemma3_12b));
        assert_eq!(resolve_model("8"), None);
        assert_eq!(resolve_model("0"), None);
        assert_eq!(
            resolve_model("tngtech/deepseek-r1t2-chimera:free"),
            Some(ModelType::DeepSeekChimera)
        );
    }

    #[test]
    fn test_resolve_document() {
        let options = options();
        assert_eq!(resolve_document("2", &options).as_deref(), Some("doc-b"));
        assert_eq!(resolve_document("doc-a", &options).as_deref(), Some("doc-a"));
        assert_eq!(resolve_document("3", &options), None);
        assert_eq!(resolve_document("doc-z", &options), None);
    }
}
