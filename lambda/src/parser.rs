use chumsky::prelude::*;

use crate::{
    lang::{Term, Token},
    prelude::*,
};

pub trait SimpleParser<I: Clone + std::hash::Hash, O>:
    Parser<I, O, Error = Error<I>> + Clone
{
    #[allow(clippy::type_complexity)]
    fn spanned(self) -> chumsky::combinator::MapWithSpan<Self, fn(O, Span) -> Spanned<O>, O>
    where
        Self: Sized,
        I: std::cmp::Eq,
    {
        self.map_with_span(|value, span| Spanned { span, value })
    }
}
impl<I: Clone + std::hash::Hash, O, T> SimpleParser<I, O> for T where
    T: Parser<I, O, Error = Error<I>> + Clone
{
}

pub fn lexer() -> impl SimpleParser<char, Vec<Spanned<Token>>> {
    let symbols = choice((
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('\\').to(Token::Lambda),
        just('L').to(Token::Lambda),
        just('λ').to(Token::Lambda),
        just('.').to(Token::Dot),
        just('=').to(Token::Equals),
        just('|').to(Token::Pipe),
        just('\n').to(Token::Newline),
    ));
    // Identifiers are lowercase alphanumeric; bare numerals like `0` are
    // ordinary identifiers bound by the prelude.
    let words = filter(|c: &char| c.is_ascii_lowercase() || c.is_ascii_digit())
        .repeated()
        .at_least(1)
        .collect::<String>()
        .map(|word| match word.as_str() {
            "lambda" => Token::Lambda,
            "env" => Token::Env,
            "unbind" => Token::Unbind,
            "help" => Token::Help,
            _ => Token::Ident(Identifier::new(word)),
        });
    let comment = just('#')
        .then(filter(|c: &char| *c != '\n').repeated())
        .ignored();
    let padding = choice((
        filter(|c: &char| *c == ' ' || *c == '\t' || *c == '\r').ignored(),
        comment,
    ))
    .repeated();
    let token = choice((symbols, words));
    padding
        .clone()
        .ignore_then(token.spanned())
        .repeated()
        .then_ignore(padding)
        .then_ignore(end())
}

fn term_parser() -> impl SimpleParser<Token, Spanned<Term>> {
    recursive(|term: Recursive<_, Spanned<Term>, _>| {
        let name = select! { Token::Ident(name) => name }.spanned();

        let variable = name.clone().map(Term::Variable).labelled("variable");

        let atom = choice((
            variable,
            term.clone()
                .map(Spanned::forget_span)
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        ))
        .spanned();

        // Application is juxtaposition and associates to the left.
        let application = atom.clone().then(atom.repeated()).foldl(|lhs, rhs| {
            let span = merge_span(&lhs.span(), &rhs.span());
            Spanned {
                span,
                value: Term::Apply(lhs.into(), rhs.into()),
            }
        });

        // The body extends as far right as possible.
        let abstraction = just(Token::Lambda)
            .ignore_then(name)
            .then_ignore(just(Token::Dot))
            .then(term.clone())
            .map(|(param, body)| Term::Abstract(param, body.into()))
            .spanned()
            .labelled("abstraction");

        choice((abstraction, application))
    })
    .labelled("term")
}

#[derive(Clone, Debug)]
pub enum Stmt {
    Term(Spanned<Term>),
    Binding(Vec<Spanned<Identifier>>, Spanned<Term>),
    Env,
    Unbind(Spanned<Identifier>),
    Help,
}

impl std::fmt::Display for Stmt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stmt::Term(term) => f.write_fmt(format_args!("{term}")),
            Stmt::Binding(aliases, term) => {
                for (i, alias) in aliases.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    f.write_fmt(format_args!("{alias}"))?;
                }
                f.write_fmt(format_args!(" = {term}"))
            }
            Stmt::Env => f.write_str("env"),
            Stmt::Unbind(name) => f.write_fmt(format_args!("unbind {name}")),
            Stmt::Help => f.write_str("help"),
        }
    }
}

fn stmt_parser() -> impl SimpleParser<Token, Stmt> {
    let name = select! { Token::Ident(name) => name }.spanned();
    let term = term_parser();

    // name = term, or name1|name2 = term to install aliases.
    let binding = name
        .clone()
        .then(just(Token::Pipe).ignore_then(name.clone()).repeated())
        .then_ignore(just(Token::Equals))
        .then(term.clone())
        .map(|((first, rest), term)| {
            let mut aliases = vec![first];
            aliases.extend(rest);
            Stmt::Binding(aliases, term)
        })
        .labelled("binding");

    let command = choice((
        just(Token::Env).to(Stmt::Env),
        just(Token::Unbind).ignore_then(name).map(Stmt::Unbind),
        just(Token::Help).to(Stmt::Help),
    ))
    .labelled("command");

    choice((binding, command, term.map(Stmt::Term)))
}

fn stmts_parser() -> impl SimpleParser<Token, Vec<Stmt>> {
    let newlines = just(Token::Newline).repeated();
    newlines
        .ignore_then(
            stmt_parser()
                .separated_by(just(Token::Newline).repeated().at_least(1))
                .allow_trailing(),
        )
}

fn parse_full<T>(s: &str, parser: impl SimpleParser<Token, T>) -> Result<T, Vec<Error<String>>> {
    let len = s.chars().count();
    let eoi = Span {
        start: len,
        end: len + 1,
    };
    let tokens = lexer().parse(s).map_err(|es| {
        es.into_iter()
            .map(|e| e.map(|e| e.to_string()))
            .collect::<Vec<_>>()
    })?;
    let value = parser
        .then_ignore(end())
        .parse(chumsky::Stream::from_iter(
            eoi,
            tokens
                .into_iter()
                .map(|Spanned { span, value }| (value, span)),
        ))
        .map_err(|es| {
            es.into_iter()
                .map(|e| e.map(|e| e.to_string()))
                .collect::<Vec<_>>()
        })?;
    Ok(value)
}

pub fn parse_term(s: &str) -> Result<Spanned<Term>, Vec<Error<String>>> {
    parse_full(s, term_parser())
}

pub fn parse_stmts(s: &str) -> Result<Vec<Stmt>, Vec<Error<String>>> {
    parse_full(s, stmts_parser())
}

#[cfg(test)]
mod test {
    use super::*;

    fn lex(s: &str) -> Result<Vec<Token>, Vec<Error<char>>> {
        Ok(lexer()
            .parse(s)?
            .iter()
            .map(Spanned::value)
            .cloned()
            .collect::<Vec<_>>())
    }

    #[test]
    fn test_lexer() {
        assert_eq!(
            lex(r"\x.x").unwrap(),
            vec![
                Token::Lambda,
                Token::Ident(Identifier::new("x".into())),
                Token::Dot,
                Token::Ident(Identifier::new("x".into())),
            ]
        );
        // All four spellings of the binder.
        assert_eq!(lex(r"\").unwrap(), lex("L").unwrap());
        assert_eq!(lex(r"\").unwrap(), lex("λ").unwrap());
        assert_eq!(lex(r"\").unwrap(), lex("lambda").unwrap());
        assert_eq!(
            lex("t|f = x").unwrap(),
            vec![
                Token::Ident(Identifier::new("t".into())),
                Token::Pipe,
                Token::Ident(Identifier::new("f".into())),
                Token::Equals,
                Token::Ident(Identifier::new("x".into())),
            ]
        );
        assert_eq!(
            lex("unbind plus # drop it\n").unwrap(),
            vec![
                Token::Unbind,
                Token::Ident(Identifier::new("plus".into())),
                Token::Newline,
            ]
        );
        // `envy` is an identifier, not the env keyword plus a suffix.
        assert_eq!(
            lex("envy").unwrap(),
            vec![Token::Ident(Identifier::new("envy".into()))]
        );
        assert!(lex("x?y").is_err());
    }

    fn parse(s: &str) -> Result<String, String> {
        parse_term(s)
            .map(|term| format!("{term}"))
            .map_err(|es| format!("{es:?}"))
    }

    #[test]
    fn test_term_parser() {
        assert_eq!(parse("x").unwrap(), "x");
        assert_eq!(parse("f a b").unwrap(), "((f a) b)");
        assert_eq!(parse("f (a b)").unwrap(), "(f (a b))");
        assert_eq!(parse(r"\x.\y.x y").unwrap(), "(λx. (λy. (x y)))");
        assert_eq!(parse(r"(\x.x) a").unwrap(), "((λx. x) a)");
        assert_eq!(parse("Lx.x").unwrap(), "(λx. x)");
        assert!(parse(r"\x.").is_err());
        assert!(parse("(x").is_err());
    }

    #[test]
    fn test_stmt_parser() {
        let stmts = parse_stmts("id = \\x.x\n\n# comment only\nid y\nenv\nunbind id\nhelp\n")
            .unwrap()
            .iter()
            .map(|stmt| format!("{stmt}"))
            .collect::<Vec<_>>();
        assert_eq!(
            stmts,
            vec!["id = (λx. x)", "(id y)", "env", "unbind id", "help"]
        );
        let stmts = parse_stmts("0|zero = \\f.\\x.x").unwrap();
        match &stmts[0] {
            Stmt::Binding(aliases, _) => {
                assert_eq!(aliases.len(), 2);
                assert_eq!(aliases[0].value().as_str(), "0");
                assert_eq!(aliases[1].value().as_str(), "zero");
            }
            other => panic!("expected a binding, got {other}"),
        }
        assert!(parse_stmts("x = ").is_err());
        assert!(parse_stmts("x == y").is_err());
    }
}
