use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{cursor, execute, terminal};
use futures::future::LocalBoxFuture;
use rustyline::error::ReadlineError;
use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};
use tokio::runtime::Handle;
use tracing::debug;

use waste_console::api::{BinColor, MessageReply};
use waste_console::bin_status::DeleteOutcome;
use waste_console::forms::{FormSchema, FormValues, Rule, SubmitOutcome};
use waste_console::screens::{
    BinsScreen, ChangePasswordScreen, CreateBinScreen, CreateUserScreen, DashboardScreen,
    DemoAccount, EditBinScreen, EditUserScreen, LoginScreen,
};
use waste_console::session::Session;
use waste_console::{AppContext, Route};

use crate::cli_style::{self, get_styles, CommandHelp};

#[derive(Parser)]
#[command(styles=get_styles(), name = "", disable_help_subcommand = true)]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
enum InnerCommand {
    /// Log in with email and password.
    Login { email: Option<String> },

    /// Log in with a preset account, "admin" or "user".
    Demo { account: String },

    /// End the session.
    Logout,

    /// Show who is logged in.
    Whoami,

    /// Show the menubar for the current session.
    Menu,

    /// List users (admin).
    Users,

    /// Create a user (admin).
    UserCreate,

    /// Edit a user (admin).
    UserEdit { id: String },

    /// Delete a user after confirmation (admin).
    UserDelete { id: String },

    /// Set a new password for a user (admin).
    ChangePassword { id: String },

    /// List bins with their current telemetry.
    Bins,

    /// Register a bin (admin).
    BinCreate,

    /// Edit a bin.
    BinEdit { id: String },

    /// Delete a bin after confirmation.
    BinDelete { id: String },

    /// Follow live telemetry of every bin until Ctrl-C.
    Watch,

    /// Open the screen at the given path, e.g. /users/bins.
    Go { path: String },

    /// Show the current route.
    Where,

    /// Show the available commands.
    Help,

    /// Leave the console.
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

const SESSION_COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "login",
        args: "[email]",
        description: "Log in with email and password",
    },
    CommandHelp {
        name: "demo",
        args: "<admin|user>",
        description: "Log in with a demo account",
    },
    CommandHelp {
        name: "logout",
        args: "",
        description: "End the session",
    },
    CommandHelp {
        name: "whoami",
        args: "",
        description: "Show who is logged in",
    },
    CommandHelp {
        name: "menu",
        args: "",
        description: "Show the menubar",
    },
];

const USER_COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "users",
        args: "",
        description: "List users",
    },
    CommandHelp {
        name: "user-create",
        args: "",
        description: "Create a user",
    },
    CommandHelp {
        name: "user-edit",
        args: "<id>",
        description: "Edit a user",
    },
    CommandHelp {
        name: "user-delete",
        args: "<id>",
        description: "Delete a user",
    },
    CommandHelp {
        name: "change-password",
        args: "<id>",
        description: "Set a user's password",
    },
];

const BIN_COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "bins",
        args: "",
        description: "List bins with their telemetry",
    },
    CommandHelp {
        name: "bin-create",
        args: "",
        description: "Register a bin",
    },
    CommandHelp {
        name: "bin-edit",
        args: "<id>",
        description: "Edit a bin",
    },
    CommandHelp {
        name: "bin-delete",
        args: "<id>",
        description: "Delete a bin",
    },
    CommandHelp {
        name: "watch",
        args: "",
        description: "Follow live telemetry until Ctrl-C",
    },
];

const SYSTEM_COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "go",
        args: "<path>",
        description: "Open the screen at a path",
    },
    CommandHelp {
        name: "where",
        args: "",
        description: "Show the current route",
    },
    CommandHelp {
        name: "help",
        args: "",
        description: "Show this help",
    },
    CommandHelp {
        name: "exit",
        args: "",
        description: "Leave the console",
    },
];

const ROUTE_PATHS: &[&str] = &[
    "/login",
    "/dashboard",
    "/create-user",
    "/edit-user/",
    "/users/bins",
    "/users/create-bin",
    "/users/edit-bin/",
    "/users/change-password/",
];

fn print_help() {
    cli_style::print_help(&[
        ("Session", SESSION_COMMANDS),
        ("Users", USER_COMMANDS),
        ("Bins", BIN_COMMANDS),
        ("System", SYSTEM_COMMANDS),
    ]);
}

fn parse_command(line: &str) -> Result<InnerCommand, clap::Error> {
    let args = shlex::split(line)
        .unwrap_or_else(|| line.split_whitespace().map(|s| s.to_string()).collect());
    InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)))
        .map(|cli| cli.command)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Line editing
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(rustyline_derive::Hinter)]
struct ConsoleHelper {
    commands_names: Vec<String>,
}

impl ConsoleHelper {
    fn new() -> Self {
        let commands_names = InnerCli::command()
            .get_subcommands()
            .map(|c| c.get_name().to_string())
            .collect();
        ConsoleHelper { commands_names }
    }

    fn candidates(&self, line: &str) -> (usize, Vec<String>) {
        if let Some(partial) = line.strip_prefix("go ") {
            let matches = ROUTE_PATHS
                .iter()
                .filter(|p| p.starts_with(partial.trim_start()))
                .map(|p| p.to_string())
                .collect();
            return (line.len() - partial.trim_start().len(), matches);
        }
        if line.contains(' ') {
            return (0, Vec::with_capacity(0));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .cloned()
            .collect();
        (0, matches)
    }
}

impl Completer for ConsoleHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        Ok(self.candidates(&line[..pos]))
    }
}

impl Highlighter for ConsoleHelper {}
impl Validator for ConsoleHelper {}
impl Helper for ConsoleHelper {}

/// Reads a line without echoing it. `None` when cancelled with Esc or Ctrl-C.
fn read_secret(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    cli_style::flush();
    terminal::enable_raw_mode()?;
    let result = read_secret_keys();
    terminal::disable_raw_mode()?;
    println!();
    result
}

fn read_secret_keys() -> Result<Option<String>> {
    let mut secret = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(Some(secret)),
            KeyCode::Esc => return Ok(None),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(None)
            }
            KeyCode::Backspace => {
                secret.pop();
            }
            KeyCode::Char(c) => secret.push(c),
            _ => {}
        }
    }
}

fn field_prompt(label: &str, required: bool, choices: Option<&[&str]>) -> String {
    let mut prompt = format!("  {}", label);
    if let Some(choices) = choices {
        prompt.push_str(&format!(" ({})", choices.join("/")));
    }
    if required {
        prompt.push('*');
    }
    prompt.push_str(": ");
    prompt
}

// ═══════════════════════════════════════════════════════════════════════════════
// Forms
// ═══════════════════════════════════════════════════════════════════════════════

/// A screen built around one form.
trait FormScreen {
    type Output;

    fn form(&self) -> &'static FormSchema;

    fn send<'a>(&'a self, values: &'a FormValues) -> LocalBoxFuture<'a, SubmitOutcome<Self::Output>>;
}

macro_rules! form_screen {
    ($($screen:ty => $output:ty),* $(,)?) => {
        $(
            impl FormScreen for $screen {
                type Output = $output;

                fn form(&self) -> &'static FormSchema {
                    self.schema()
                }

                fn send<'a>(
                    &'a self,
                    values: &'a FormValues,
                ) -> LocalBoxFuture<'a, SubmitOutcome<$output>> {
                    Box::pin(self.submit(values))
                }
            }
        )*
    };
}

form_screen!(
    LoginScreen => Session,
    CreateUserScreen => MessageReply,
    EditUserScreen => MessageReply,
    ChangePasswordScreen => MessageReply,
    CreateBinScreen => MessageReply,
    EditBinScreen => MessageReply,
);

// ═══════════════════════════════════════════════════════════════════════════════
// Console
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Console {
    ctx: AppContext,
    runtime: Handle,
    editor: Editor<ConsoleHelper, FileHistory>,
    summary: Vec<(&'static str, String)>,
}

impl Console {
    /// `summary` is shown in the welcome box.
    pub fn new(
        ctx: AppContext,
        runtime: Handle,
        summary: Vec<(&'static str, String)>,
    ) -> Result<Self> {
        let config = Config::builder()
            .completion_type(CompletionType::List)
            .build();
        let mut editor = Editor::<ConsoleHelper, FileHistory>::with_config(config)?;
        editor.set_helper(Some(ConsoleHelper::new()));
        Ok(Self {
            ctx,
            runtime,
            editor,
            summary,
        })
    }

    pub fn run(mut self) -> Result<()> {
        cli_style::print_welcome(&self.summary);

        loop {
            self.flush_notifications();
            let prompt = cli_style::get_prompt(&self.ctx.navigator().current().path());
            match self.editor.readline(&prompt) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(line.as_str());
                    match self.execute(&line) {
                        CommandExecutionResult::Ok => {}
                        CommandExecutionResult::Exit => break,
                        CommandExecutionResult::Error(err) => {
                            cli_style::print_error(&err);
                            continue;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D: exiting.");
                    break;
                }
                Err(e) => {
                    cli_style::print_error(&format!("{:?}", e));
                    break;
                }
            }
        }

        self.flush_notifications();
        cli_style::print_goodbye();
        Ok(())
    }

    fn execute(&mut self, line: &str) -> CommandExecutionResult {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(e) => {
                let _ = e.print();
                return CommandExecutionResult::Ok;
            }
        };
        debug!("Executing {:?}", command);

        let result = match command {
            InnerCommand::Login { email } => self.login(email),
            InnerCommand::Demo { account } => self.demo(&account),
            InnerCommand::Logout => {
                self.ctx.logout();
                cli_style::print_info("Logged out");
                Ok(())
            }
            InnerCommand::Whoami => {
                self.whoami();
                Ok(())
            }
            InnerCommand::Menu => {
                cli_style::print_menu(&self.ctx.gate().menu());
                Ok(())
            }
            InnerCommand::Users => self.open(Route::Dashboard),
            InnerCommand::UserCreate => self.open(Route::CreateUser),
            InnerCommand::UserEdit { id } => self.open(Route::EditUser(id)),
            InnerCommand::UserDelete { id } => self.delete_user(&id),
            InnerCommand::ChangePassword { id } => self.open(Route::ChangePassword(id)),
            InnerCommand::Bins => self.open(Route::Bins),
            InnerCommand::BinCreate => self.open(Route::CreateBin),
            InnerCommand::BinEdit { id } => self.open(Route::EditBin(id)),
            InnerCommand::BinDelete { id } => self.delete_bin(&id),
            InnerCommand::Watch => self.watch_bins(),
            InnerCommand::Go { path } => self.open(Route::parse(&path)),
            InnerCommand::Where => {
                let route = self.ctx.navigator().current();
                cli_style::print_key_value(route.title(), &route.path());
                Ok(())
            }
            InnerCommand::Help => {
                print_help();
                Ok(())
            }
            InnerCommand::Exit => return CommandExecutionResult::Exit,
        };

        match result {
            Ok(()) => CommandExecutionResult::Ok,
            Err(e) => CommandExecutionResult::Error(format!("{:#}", e)),
        }
    }

    fn flush_notifications(&self) {
        cli_style::print_notifications(&self.ctx.notifier.drain());
    }

    fn redirected(&self, wanted: &Route, redirect: Route) {
        cli_style::print_warning(&format!(
            "{} is not available, redirected to {}",
            wanted.path(),
            redirect.path()
        ));
    }

    /// Opens the screen of `route` and runs its interaction.
    fn open(&mut self, route: Route) -> Result<()> {
        match route {
            Route::Login => self.login(None),
            Route::Dashboard => self.list_users(),
            Route::Bins => self.list_bins(),
            Route::CreateUser => match CreateUserScreen::open(&self.ctx) {
                Ok(screen) => self
                    .run_form(&screen, FormValues::new().with("role", "user"))
                    .map(drop),
                Err(redirect) => {
                    self.redirected(&route, redirect);
                    Ok(())
                }
            },
            Route::EditUser(ref id) => match EditUserScreen::open(&self.ctx, id) {
                Ok(mut screen) => {
                    if self.runtime.block_on(screen.load()) {
                        let initial = screen.values().clone();
                        self.run_form(&screen, initial).map(drop)
                    } else {
                        Ok(())
                    }
                }
                Err(redirect) => {
                    self.redirected(&route, redirect);
                    Ok(())
                }
            },
            Route::ChangePassword(ref id) => match ChangePasswordScreen::open(&self.ctx, id) {
                Ok(screen) => self.run_form(&screen, FormValues::new()).map(drop),
                Err(redirect) => {
                    self.redirected(&route, redirect);
                    Ok(())
                }
            },
            Route::CreateBin => match CreateBinScreen::open(&self.ctx) {
                Ok(screen) => self.run_form(&screen, FormValues::new()).map(drop),
                Err(redirect) => {
                    self.redirected(&route, redirect);
                    Ok(())
                }
            },
            Route::EditBin(ref id) => match EditBinScreen::open(&self.ctx, id) {
                Ok(mut screen) => {
                    if self.runtime.block_on(screen.load()) {
                        let initial = screen.values().clone();
                        self.run_form(&screen, initial).map(drop)
                    } else {
                        Ok(())
                    }
                }
                Err(redirect) => {
                    self.redirected(&route, redirect);
                    Ok(())
                }
            },
        }
    }

    /// Fills and submits `screen`'s form until it is accepted, refused by
    /// the backend, or cancelled. Invalid input is asked again with the
    /// previous answers filled in.
    fn run_form<S: FormScreen>(
        &mut self,
        screen: &S,
        initial: FormValues,
    ) -> Result<Option<S::Output>> {
        let schema = screen.form();
        cli_style::print_section_header(schema.title);
        let mut values = initial;
        let outcome = loop {
            let Some(filled) = self.read_form(schema, &values)? else {
                cli_style::print_warning("Cancelled");
                break None;
            };
            match self.runtime.block_on(screen.send(&filled)) {
                SubmitOutcome::Invalid(errors) => {
                    cli_style::print_error("Please fix the following fields");
                    cli_style::print_field_errors(&errors);
                    values = filled;
                }
                SubmitOutcome::Submitted(output) => break Some(output),
                SubmitOutcome::Failed(_) => break None,
                SubmitOutcome::Discarded => {
                    cli_style::print_warning("The screen was left, the result was discarded");
                    break None;
                }
            }
        };
        cli_style::print_section_footer();
        Ok(outcome)
    }

    /// `None` when the user cancels.
    fn read_form(&mut self, schema: &FormSchema, initial: &FormValues) -> Result<Option<FormValues>> {
        let mut values = FormValues::new();
        for field in schema.fields {
            let choices = field.rules.iter().find_map(|rule| match rule {
                Rule::OneOf(choices, _) => Some(*choices),
                _ => None,
            });
            let prompt = field_prompt(field.label, field.is_required(), choices);
            let input = if field.secret {
                read_secret(&prompt)?
            } else {
                match self
                    .editor
                    .readline_with_initial(&prompt, (initial.get(field.name), ""))
                {
                    Ok(line) => Some(line),
                    Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => None,
                    Err(e) => return Err(e.into()),
                }
            };
            match input {
                Some(value) => values.set(field.name, value),
                None => return Ok(None),
            }
        }
        Ok(Some(values))
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        match self.editor.readline(&format!("  {} [y/N] ", question)) {
            Ok(answer) => Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    // Session

    fn login(&mut self, email: Option<String>) -> Result<()> {
        let screen = match LoginScreen::open(&self.ctx) {
            Ok(screen) => screen,
            Err(redirect) => {
                self.redirected(&Route::Login, redirect);
                return Ok(());
            }
        };
        let initial = match email {
            Some(email) => FormValues::new().with("email", email),
            None => FormValues::new(),
        };
        if self.run_form(&screen, initial)?.is_some() {
            self.flush_notifications();
            cli_style::print_menu(&self.ctx.gate().menu());
        }
        Ok(())
    }

    fn demo(&mut self, account: &str) -> Result<()> {
        let Some(account) = DemoAccount::from_str(account) else {
            anyhow::bail!("Unknown demo account {:?}, use admin or user", account);
        };
        let screen = match LoginScreen::open(&self.ctx) {
            Ok(screen) => screen,
            Err(redirect) => {
                self.redirected(&Route::Login, redirect);
                return Ok(());
            }
        };
        cli_style::print_info(&format!("Logging in as {}", account.email()));
        if self.runtime.block_on(screen.demo_login(account)).is_submitted() {
            self.flush_notifications();
            cli_style::print_menu(&self.ctx.gate().menu());
        }
        Ok(())
    }

    fn whoami(&self) {
        let gate = self.ctx.gate();
        match gate.claims() {
            Some(claims) => {
                cli_style::print_section_header("Session");
                cli_style::print_key_value("Name", &claims.first_name);
                cli_style::print_key_value("Role", claims.role.as_str());
                if let Some(email) = &claims.email {
                    cli_style::print_key_value("Email", email);
                }
                if let Some(exp) = claims.exp.and_then(|exp| chrono::DateTime::from_timestamp(exp, 0)) {
                    cli_style::print_key_value("Expires", &exp.to_rfc3339());
                }
                cli_style::print_section_footer();
            }
            None => cli_style::print_info("Not logged in"),
        }
    }

    // Users

    fn open_dashboard(&mut self) -> Option<DashboardScreen> {
        match DashboardScreen::open(&self.ctx) {
            Ok(mut screen) => self.runtime.block_on(screen.load()).then_some(screen),
            Err(redirect) => {
                self.redirected(&Route::Dashboard, redirect);
                None
            }
        }
    }

    fn list_users(&mut self) -> Result<()> {
        if let Some(screen) = self.open_dashboard() {
            cli_style::print_section_header("Users");
            cli_style::print_users(screen.users());
            cli_style::print_section_footer();
        }
        Ok(())
    }

    fn delete_user(&mut self, id: &str) -> Result<()> {
        let Some(mut screen) = self.open_dashboard() else {
            return Ok(());
        };
        if !screen.request_delete(id) {
            anyhow::bail!("No user with id {}", id);
        }
        let name = screen
            .pending_delete()
            .map(|user| format!("{} {}", user.first_name, user.last_name))
            .unwrap_or_else(|| id.to_string());
        if self.confirm(&format!("Delete user {}?", name))? {
            self.runtime.block_on(screen.confirm_delete());
        } else {
            screen.dismiss_delete();
            cli_style::print_info("Kept");
        }
        Ok(())
    }

    // Bins

    fn open_bins(&mut self) -> Option<BinsScreen> {
        match BinsScreen::open(&self.ctx) {
            Ok(mut screen) => self.runtime.block_on(screen.load()).then_some(screen),
            Err(redirect) => {
                self.redirected(&Route::Bins, redirect);
                None
            }
        }
    }

    fn print_bins(screen: &BinsScreen) {
        cli_style::print_section_header("Bins");
        if screen.entries().is_empty() {
            cli_style::print_empty_list("no bins");
        }
        for entry in screen.entries() {
            cli_style::print_bin_card(&entry.record, &entry.status.state());
        }
        cli_style::print_section_footer();
    }

    fn list_bins(&mut self) -> Result<()> {
        if let Some(screen) = self.open_bins() {
            Self::print_bins(&screen);
            screen.unmount();
        }
        Ok(())
    }

    fn delete_bin(&mut self, id: &str) -> Result<()> {
        let Some(mut screen) = self.open_bins() else {
            return Ok(());
        };
        let name = match screen.entry(id) {
            Some(entry) => entry.record.bin_name.clone(),
            None => {
                screen.unmount();
                anyhow::bail!("No bin with id {}", id);
            }
        };
        screen.request_delete(id);
        if self.confirm(&format!("Delete bin {}?", name))? {
            if let DeleteOutcome::Discarded = self.runtime.block_on(screen.confirm_delete(id)) {
                cli_style::print_warning("The screen was left, the result was discarded");
            }
        } else {
            screen.dismiss_delete(id);
            cli_style::print_info("Kept");
        }
        screen.unmount();
        Ok(())
    }

    fn watch_bins(&mut self) -> Result<()> {
        let Some(screen) = self.open_bins() else {
            return Ok(());
        };
        let mut route = self.ctx.navigator().subscribe();

        self.runtime.block_on(async {
            let mut receivers: Vec<_> = screen.entries().iter().map(|e| e.status.watch()).collect();
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            loop {
                let _ = execute!(
                    std::io::stdout(),
                    terminal::Clear(terminal::ClearType::All),
                    cursor::MoveTo(0, 0)
                );
                Self::print_bins(&screen);
                cli_style::print_info("Watching live telemetry, Ctrl-C to stop");

                let changed = async {
                    if receivers.is_empty() {
                        futures::future::pending::<()>().await;
                    }
                    let (result, _, _) = futures::future::select_all(
                        receivers.iter_mut().map(|rx| Box::pin(rx.changed())),
                    )
                    .await;
                    result.is_ok()
                };

                tokio::select! {
                    _ = &mut ctrl_c => break,
                    _ = route.changed() => break,
                    still_mounted = changed => {
                        if !still_mounted {
                            break;
                        }
                    }
                }
            }
        });

        screen.unmount();
        println!();
        Ok(())
    }
}

/// Welcome box lines for the resolved configuration.
pub fn summary(api_url: &str, feed_url: Option<&str>, channel: &str) -> Vec<(&'static str, String)> {
    vec![
        ("API", api_url.to_string()),
        (
            "Telemetry",
            match feed_url {
                Some(url) => format!("{} ({})", url, channel),
                None => "disabled".to_string(),
            },
        ),
        (
            "Bin colors",
            BinColor::ALL
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ),
    ]
}
