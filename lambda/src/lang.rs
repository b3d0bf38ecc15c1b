use std::rc::Rc;

use crate::prelude::*;

#[derive(PartialEq, Eq, Hash, Clone, derive_more::Display, Debug)]
pub enum Token {
    #[display(fmt = "(")]
    LParen,
    #[display(fmt = ")")]
    RParen,
    #[display(fmt = "λ")]
    Lambda,
    #[display(fmt = ".")]
    Dot,
    #[display(fmt = "=")]
    Equals,
    #[display(fmt = "|")]
    Pipe,
    #[display(fmt = "<newline>")]
    Newline,

    #[display(fmt = "env")]
    Env,
    #[display(fmt = "unbind")]
    Unbind,
    #[display(fmt = "help")]
    Help,

    #[display(fmt = "{_0}")]
    Ident(Identifier),
}

/// Surface syntax tree, spans intact for diagnostics. Lowered into
/// [`crate::term::Term`] before anything touches the environment.
#[derive(Clone, Debug)]
pub enum Term {
    Variable(Spanned<Identifier>),
    Abstract(Spanned<Identifier>, Rc<Spanned<Self>>),
    Apply(Rc<Spanned<Self>>, Rc<Spanned<Self>>),
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Variable(name) => f.write_str(name.value().as_str()),
            Term::Abstract(param, body) => f.write_fmt(format_args!("(λ{param}. {body})")),
            Term::Apply(lhs, rhs) => f.write_fmt(format_args!("({lhs} {rhs})")),
        }
    }
}
