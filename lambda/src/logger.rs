use std::io::Write;

/// Output gate for the session. `log` always prints, `vlog` from `-v`,
/// `vvlog` from `-vv`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Default)]
pub enum Verbosity {
    #[default]
    None,
    Low,
    High,
}

/// Session-owned sink for evaluation output and statement-local error
/// reporting. Syntax errors never come through here; they abort the batch
/// and render as span reports upstream.
pub struct Logger {
    verbosity: Verbosity,
    out: Box<dyn Write>,
    pub had_error: bool,
}

impl Logger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self::with_output(verbosity, Box::new(std::io::stdout()))
    }

    pub fn with_output(verbosity: Verbosity, out: Box<dyn Write>) -> Self {
        Self {
            verbosity,
            out,
            had_error: false,
        }
    }

    pub fn log(&mut self, message: impl std::fmt::Display) {
        self.print(message, Verbosity::None);
    }

    pub fn vlog(&mut self, message: impl std::fmt::Display) {
        self.print(message, Verbosity::Low);
    }

    pub fn vvlog(&mut self, message: impl std::fmt::Display) {
        self.print(message, Verbosity::High);
    }

    pub fn report_error(&mut self, message: impl std::fmt::Display) {
        self.had_error = true;
        self.print(format_args!("Error: {message}"), Verbosity::None);
    }

    fn print(&mut self, message: impl std::fmt::Display, target: Verbosity) {
        if self.verbosity >= target {
            writeln!(self.out, "{message}").ok();
        }
    }
}
