//! # Console Command Registry
//!
//! Server consoles and chat `/commands` run on their own thread and feed
//! the same channels the simulation does. Commands live in an explicit
//! registry object built once at startup and passed by reference to the
//! dispatcher — no process-wide command list, no runtime type scanning.
//!
//! ## Design
//!
//! - Static table of `(name, admin flag, handler)` function pointers
//! - Admin-gated commands are checked before the handler runs
//! - Replies go through [`ConsoleContext`] so the host routes them back
//!   over whatever [`Channel`](crate::Channel) the session uses

/// Handler signature for a console command. `args` is the raw remainder
/// of the input line after the command name.
pub type CommandHandler = fn(ctx: &mut dyn ConsoleContext, args: &str);

/// One registered console command.
#[derive(Clone, Copy)]
pub struct ConsoleCommand {
    /// Command name, matched case-insensitively against the first word.
    pub name: &'static str,
    /// Whether only admin sessions may run this command.
    pub admin_only: bool,
    /// The handler invoked on dispatch.
    pub handler: CommandHandler,
}

impl ConsoleCommand {
    /// Creates a command entry.
    #[must_use]
    pub const fn new(name: &'static str, admin_only: bool, handler: CommandHandler) -> Self {
        Self {
            name,
            admin_only,
            handler,
        }
    }
}

/// Session-side surface a command executes against.
pub trait ConsoleContext {
    /// Sends a console reply line back to the issuing session.
    fn reply(&mut self, message: &str);

    /// Whether the issuing session has admin rights.
    fn is_admin(&self) -> bool;
}

/// Explicit command registry, constructed at startup.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<ConsoleCommand>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from a static command table.
    #[must_use]
    pub fn from_table(table: &[ConsoleCommand]) -> Self {
        Self {
            commands: table.to_vec(),
        }
    }

    /// Adds a command. Later registrations win on name collision because
    /// dispatch scans in reverse registration order.
    pub fn register(&mut self, command: ConsoleCommand) {
        self.commands.push(command);
    }

    /// Returns the registered commands.
    #[must_use]
    pub fn commands(&self) -> &[ConsoleCommand] {
        &self.commands
    }

    /// Parses `line` as `<name> [args...]` and runs the matching
    /// command. Unknown names and failed admin checks are reported to
    /// `ctx`. Returns true when a handler ran.
    pub fn dispatch(&self, line: &str, ctx: &mut dyn ConsoleContext) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return false;
        }
        let (name, args) = match line.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim_start()),
            None => (line, ""),
        };
        let Some(command) = self
            .commands
            .iter()
            .rev()
            .find(|c| c.name.eq_ignore_ascii_case(name))
        else {
            ctx.reply(&format!("unknown command: {name}"));
            return false;
        };
        if command.admin_only && !ctx.is_admin() {
            tracing::debug!(name, "admin command refused");
            ctx.reply(&format!("permission denied: {name}"));
            return false;
        }
        (command.handler)(ctx, args);
        true
    }
}
