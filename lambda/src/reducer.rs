use thiserror::Error;

use crate::{logger::Logger, prelude::*, term::Term};

/// Contraction budget per evaluation; tripping it reports divergence
/// instead of hanging on terms like `(\x.x x) (\x.x x)`.
pub const REDUCTION_LIMIT: usize = 10_000;

#[derive(Debug, Error)]
pub enum ReduceError {
    #[error("no normal form after {} reductions, giving up", REDUCTION_LIMIT)]
    Divergence,
}

/// Normal-order reduction: contract the leftmost-outermost redex until no
/// redex remains.
pub fn reduce(mut term: Term, logger: &mut Logger) -> Result<Term, ReduceError> {
    for _ in 0..REDUCTION_LIMIT {
        if !reduce_leftmost(&mut term) {
            return Ok(term);
        }
        logger.vvlog(format_args!("β > {term}"));
    }
    Err(ReduceError::Divergence)
}

/// Contracts the leftmost-outermost redex in place. Returns false when the
/// term is already in normal form.
fn reduce_leftmost(term: &mut Term) -> bool {
    match term {
        Term::Var(_) => false,
        Term::Abs(_, body) => reduce_leftmost(body),
        Term::App(func, arg) => {
            if matches!(func.as_ref(), Term::Abs(_, _)) {
                contract(term);
                true
            } else {
                reduce_leftmost(func) || reduce_leftmost(arg)
            }
        }
    }
}

/// Beta-contracts `(λx. B) A` at this node: every occurrence B binds to `x`
/// is replaced by its own clone of `A`, and the mutated body becomes the
/// new detached root here. The abstraction and application wrappers are
/// dropped.
fn contract(term: &mut Term) {
    let redex = std::mem::replace(term, Term::Var(ident("")));
    let Term::App(func, arg) = redex else {
        unreachable!("contract called on a non-application");
    };
    let Term::Abs(param, mut body) = *func else {
        unreachable!("contract called on a non-redex");
    };
    substitute(&mut body, &param, &arg);
    *term = *body;
}

/// Capture-avoiding substitution of `arg` for the occurrences of `param`
/// not claimed by a shadowing binder. A nested binder whose name occurs
/// free in `arg` is alpha-renamed to a fresh identifier first, so the
/// argument's free variables stay free after splicing.
fn substitute(body: &mut Term, param: &Identifier, arg: &Term) {
    match body {
        Term::Var(name) => {
            if name == param {
                *body = arg.clone();
            }
        }
        Term::App(func, inner_arg) => {
            substitute(func, param, arg);
            substitute(inner_arg, param, arg);
        }
        Term::Abs(binder, _) => {
            let binder = binder.clone();
            if binder == *param {
                // Shadowed: nothing below here is bound by the contracted
                // binder.
                return;
            }
            if arg.free_names().contains(&binder) {
                let mut taken = body.all_names();
                taken.extend(arg.all_names());
                taken.insert(param.clone());
                let fresh = fresh_name(&binder, &taken);
                body.rename_binder(&fresh);
            }
            if let Term::Abs(_, inner) = body {
                substitute(inner, param, arg);
            }
        }
    }
}

/// Smallest of `{base}0`, `{base}1`, … not already taken; stays inside the
/// lowercase-alphanumeric identifier alphabet.
fn fresh_name(base: &Identifier, taken: &std::collections::BTreeSet<Identifier>) -> Identifier {
    let mut i = 0u32;
    loop {
        let candidate = ident(format!("{base}{i}"));
        if !taken.contains(&candidate) {
            return candidate;
        }
        i += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{hasher, logger::Verbosity};

    fn t(s: &str) -> Term {
        crate::parser::parse_term(s).unwrap().value().into()
    }

    fn run(s: &str) -> Result<Term, ReduceError> {
        let mut logger = Logger::with_output(Verbosity::None, Box::new(std::io::sink()));
        reduce(t(s), &mut logger)
    }

    #[test]
    fn test_identity() {
        assert_eq!(run(r"(\x.x) a").unwrap(), t("a"));
    }

    #[test]
    fn test_k_combinator() {
        assert_eq!(run(r"(\x.\y.x) a b").unwrap(), t("a"));
        assert_eq!(run(r"(\x.\y.y) a b").unwrap(), t("b"));
    }

    #[test]
    fn test_each_occurrence_gets_its_own_clone() {
        assert_eq!(run(r"(\x.x x x) (\y.y)").unwrap(), t(r"\y.y"));
    }

    #[test]
    fn test_normal_form_is_a_fixed_point() {
        let normal = run(r"\x.x (\y.y x)").unwrap();
        let mut logger = Logger::with_output(Verbosity::None, Box::new(std::io::sink()));
        assert_eq!(reduce(normal.clone(), &mut logger).unwrap(), normal);
    }

    #[test]
    fn test_no_capture_of_free_argument() {
        // The free `y` must not be grabbed by the body's own binder: the
        // result is `λy'. y` for some fresh name, never `λy. y`.
        let reduct = run(r"(\x.\y.x) y").unwrap();
        assert_eq!(reduct, t(r"\y0.y"));
        assert!(reduct.free_names().iter().any(|n| n.as_str() == "y"));
        assert_eq!(
            hasher::fingerprint(&reduct).identity,
            hasher::fingerprint(&t(r"\w.y")).identity
        );
    }

    #[test]
    fn test_no_capture_through_nested_binders() {
        let reduct = run(r"(\x.\y.\z.x) (y z)").unwrap();
        assert_eq!(
            hasher::fingerprint(&reduct).identity,
            hasher::fingerprint(&t(r"\a.\b.y z")).identity
        );
    }

    #[test]
    fn test_shadowing_binder_stops_substitution() {
        // The inner `\x` rebinds the name, so the argument only reaches the
        // outer occurrence.
        assert_eq!(run(r"(\x.x (\x.x)) a").unwrap(), t(r"a (\x.x)"));
    }

    #[test]
    fn test_normal_order_ignores_diverging_unused_argument() {
        // Applicative order would loop here; leftmost-outermost discards
        // the argument first.
        assert_eq!(run(r"(\x.\y.y) ((\x.x x) (\x.x x))").unwrap(), t(r"\y.y"));
    }

    #[test]
    fn test_divergence_is_reported_not_hung() {
        assert!(matches!(
            run(r"(\x.x x) (\x.x x)"),
            Err(ReduceError::Divergence)
        ));
    }
}
