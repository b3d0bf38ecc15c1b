use anyhow::Result;
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use util::repl;

use crate::{interpreter::Interpreter, logger::Verbosity, prelude::*};

mod hasher;
mod interpreter;
mod lang;
mod logger;
mod parser;
mod prelude;
mod reducer;
mod resolver;
mod term;

fn build_report(e: Error<String>) -> Report<Span> {
    use chumsky::error::SimpleReason;
    let report = Report::build(ReportKind::Error, (), e.span().start);
    match e.reason() {
        SimpleReason::Unexpected => {
            let found = e.found().map(String::as_str).unwrap_or("end of the input");
            let expected = e
                .expected()
                .map(|t| t.as_ref().map(String::as_str).unwrap_or("end of the input"))
                .collect::<Vec<_>>()
                .join(", ");
            let expected = if expected.is_empty() {
                "something else"
            } else {
                &expected
            };
            report
                .with_message(format!("Unexpected {found}, expected {expected}"))
                .with_label(
                    Label::new(e.span())
                        .with_message(format!("Unexpected {}", found.fg(Color::Red)))
                        .with_color(Color::Red),
                )
        }
        SimpleReason::Unclosed { span, delimiter } => report
            .with_message(format!("Unclosed delimiter {}", delimiter.fg(Color::Yellow)))
            .with_label(
                Label::new(span.clone())
                    .with_message(format!(
                        "Unclosed delimiter {}",
                        delimiter.fg(Color::Yellow)
                    ))
                    .with_color(Color::Yellow),
            )
            .with_label(
                Label::new(e.span())
                    .with_message(format!(
                        "Must be closed before this {}",
                        e.found()
                            .map(String::as_str)
                            .unwrap_or("end of the input")
                            .fg(Color::Red)
                    ))
                    .with_color(Color::Red),
            ),
        SimpleReason::Custom(msg) => report.with_message(msg).with_label(
            Label::new(e.span())
                .with_message(format!("{}", msg.fg(Color::Red)))
                .with_color(Color::Red),
        ),
    }
    .finish()
}

/// An interactive evaluator for the untyped lambda calculus.
#[derive(clap::Parser, Debug)]
#[command(name = "lambda")]
struct Args {
    /// Script of statements to run instead of starting a REPL.
    file: Option<std::path::PathBuf>,
    /// -v echoes evaluated terms, -vv traces expansions and reductions.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn verbosity(&self) -> Verbosity {
        match self.verbose {
            0 => Verbosity::None,
            1 => Verbosity::Low,
            _ => Verbosity::High,
        }
    }
}

struct Repl {
    interpreter: Interpreter,
}

impl repl::Repl for Repl {
    type Error = anyhow::Error;
    const PROMPT: &'static str = "λ> ";
    const HISTORY: Option<&'static str> = Some("/tmp/lambda.history");
    fn evaluate(&mut self, input: String) -> Result<(), Self::Error> {
        if let Err(es) = self.interpreter.interpret(&input) {
            for e in es {
                build_report(e).eprint(Source::from(&input))?;
            }
        }
        self.interpreter.clear_error();
        Ok(())
    }
}

fn run_script(mut interpreter: Interpreter, path: &std::path::Path) -> Result<bool> {
    let source = std::fs::read_to_string(path)?;
    if let Err(es) = interpreter.interpret(&source) {
        for e in es {
            build_report(e).eprint(Source::from(&source))?;
        }
        return Ok(false);
    }
    Ok(!interpreter.had_error())
}

fn main() -> Result<()> {
    let args = <Args as clap::Parser>::parse();
    let interpreter = Interpreter::new(args.verbosity());
    if let Some(file) = &args.file {
        if !run_script(interpreter, file)? {
            std::process::exit(1);
        }
        return Ok(());
    }
    println!("Hi, this is an untyped lambda calculus REPL. `help` lists the statement forms.");
    println!();
    repl::start_repl(Repl { interpreter })?;
    Ok(())
}
