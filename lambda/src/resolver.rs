use std::rc::Rc;

use rpds::HashTrieMap;
use thiserror::Error;

use crate::{logger::Logger, prelude::*, term::Term};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cyclic definition: `{0}` expands back into itself")]
    CyclicBinding(Identifier),
}

/// Expands free variables that name environment bindings into clones of
/// their definitions, transitively. Variables bound by an enclosing
/// abstraction and names with no binding pass through untouched; a free
/// lambda parameter and a typo are indistinguishable here, and that is
/// deliberate.
///
/// Known limitation: expansion does not rename binders enclosing the
/// splice point, so a definition whose free variables collide with them
/// is captured (`k = y` makes `\y.k` resolve to `\y.y`). The reducer
/// renames during substitution; expansion trusts definitions not to lean
/// on names bound at their use sites.
pub struct Resolver<'a> {
    bindings: &'a HashTrieMap<Identifier, Rc<Term>>,
    logger: &'a mut Logger,
    expanding: Vec<Identifier>,
}

impl<'a> Resolver<'a> {
    pub fn new(bindings: &'a HashTrieMap<Identifier, Rc<Term>>, logger: &'a mut Logger) -> Self {
        Self {
            bindings,
            logger,
            expanding: Vec::new(),
        }
    }

    pub fn resolve(&mut self, term: &mut Term) -> Result<(), ResolveError> {
        self.resolve_rec(term, &mut Vec::new())
    }

    fn resolve_rec(
        &mut self,
        term: &mut Term,
        scope: &mut Vec<Identifier>,
    ) -> Result<(), ResolveError> {
        match term {
            Term::Var(name) => {
                if scope.iter().any(|binder| binder == name) {
                    return Ok(());
                }
                let Some(definition) = self.bindings.get(name) else {
                    return Ok(());
                };
                if self.expanding.iter().any(|seen| seen == name) {
                    return Err(ResolveError::CyclicBinding(name.clone()));
                }
                self.logger.vvlog(format_args!("δ > expanding {name}"));
                // The definition is expanded as a detached root: names it
                // mentions resolve against the environment, not against
                // binders that happen to enclose the splice point.
                let mut replacement = (**definition).clone();
                self.expanding.push(name.clone());
                let expanded = self.resolve_rec(&mut replacement, &mut Vec::new());
                self.expanding.pop();
                expanded?;
                *term = replacement;
                Ok(())
            }
            Term::Abs(param, body) => {
                scope.push(param.clone());
                let resolved = self.resolve_rec(body, scope);
                scope.pop();
                resolved
            }
            Term::App(func, arg) => {
                self.resolve_rec(func, scope)?;
                self.resolve_rec(arg, scope)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::logger::Verbosity;

    fn t(s: &str) -> Term {
        crate::parser::parse_term(s).unwrap().value().into()
    }

    fn env(entries: &[(&str, &str)]) -> HashTrieMap<Identifier, Rc<Term>> {
        let mut bindings = HashTrieMap::new();
        for (name, source) in entries {
            bindings = bindings.insert(ident(*name), Rc::new(t(source)));
        }
        bindings
    }

    fn resolve(bindings: &HashTrieMap<Identifier, Rc<Term>>, s: &str) -> Result<Term, ResolveError> {
        let mut logger = Logger::with_output(Verbosity::None, Box::new(std::io::sink()));
        let mut term = t(s);
        Resolver::new(bindings, &mut logger).resolve(&mut term)?;
        Ok(term)
    }

    #[test]
    fn test_expands_free_names() {
        let bindings = env(&[("id", r"\x.x")]);
        assert_eq!(resolve(&bindings, "id y").unwrap(), t(r"(\x.x) y"));
    }

    #[test]
    fn test_expansion_is_transitive() {
        let bindings = env(&[("two", r"incr one"), ("one", r"incr zero"), ("incr", r"\n.\f.\y.f (n f y)")]);
        let resolved = resolve(&bindings, "two").unwrap();
        assert!(resolved.free_names().iter().all(|n| n.as_str() == "zero"));
    }

    #[test]
    fn test_bound_variables_shadow_bindings() {
        let bindings = env(&[("x", r"\a.a")]);
        assert_eq!(resolve(&bindings, r"\x.x").unwrap(), t(r"\x.x"));
        // A free occurrence of the same name still expands.
        assert_eq!(resolve(&bindings, r"x (\x.x)").unwrap(), t(r"(\a.a) (\x.x)"));
    }

    #[test]
    fn test_unknown_names_pass_through() {
        let bindings = env(&[]);
        assert_eq!(resolve(&bindings, "mystery").unwrap(), t("mystery"));
    }

    #[test]
    fn test_cycle_is_an_error_not_a_hang() {
        let bindings = env(&[("a", "b a"), ("b", r"\x.a")]);
        assert!(matches!(
            resolve(&bindings, "a"),
            Err(ResolveError::CyclicBinding(name)) if name.as_str() == "a"
        ));
    }

    #[test]
    fn test_expansion_under_a_colliding_binder_captures() {
        // Splice-point binders are not renamed: a definition free in `y`
        // expanded under a `\y` gets captured, per the limitation noted on
        // `Resolver`.
        let bindings = env(&[("k", "y")]);
        assert_eq!(resolve(&bindings, r"\y.k").unwrap(), t(r"\y.y"));
    }

    #[test]
    fn test_repeated_name_is_not_a_cycle() {
        // The same binding may be expanded twice side by side; only a chain
        // that re-enters a name still being expanded is cyclic.
        let bindings = env(&[("id", r"\x.x")]);
        assert_eq!(resolve(&bindings, "id id").unwrap(), t(r"(\x.x) (\x.x)"));
    }
}
