use std::collections::BTreeSet;

use crate::{lang, prelude::*};

/// An owned term tree. A variable is bound by the nearest enclosing
/// abstraction carrying the same name and is free when no such abstraction
/// exists; nothing is ever resolved through a stored index or back
/// reference, traversals thread the lexical scope instead.
///
/// Cloning a `Term` is a deep copy: every binding entry expansion and every
/// substituted occurrence gets its own independent subtree.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Term {
    /// `x`
    Var(Identifier),
    /// `λx. t`
    Abs(Identifier, Box<Term>),
    /// `t t`
    App(Box<Term>, Box<Term>),
}

pub trait Visitor {
    type Output;
    fn visit_variable(&mut self, name: &Identifier) -> Self::Output;
    fn visit_abstraction(&mut self, param: &Identifier, body: &Term) -> Self::Output;
    fn visit_application(&mut self, func: &Term, arg: &Term) -> Self::Output;
}

impl Term {
    pub fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Term::Var(name) => visitor.visit_variable(name),
            Term::Abs(param, body) => visitor.visit_abstraction(param, body),
            Term::App(func, arg) => visitor.visit_application(func, arg),
        }
    }

    /// Alpha-renames the binder introduced by this abstraction: its
    /// parameter and exactly the occurrences it binds. Occurrences captured
    /// by a nested shadowing binder of the same name stay untouched.
    /// Does nothing on a non-abstraction.
    pub fn rename_binder(&mut self, new_name: &Identifier) {
        if let Term::Abs(param, body) = self {
            let old = param.clone();
            rename_occurrences(body, &old, new_name);
            *param = new_name.clone();
        }
    }

    /// Names of the variables occurring free anywhere in this subtree.
    pub fn free_names(&self) -> BTreeSet<Identifier> {
        fn rec(term: &Term, scope: &mut Vec<Identifier>, free: &mut BTreeSet<Identifier>) {
            match term {
                Term::Var(name) => {
                    if !scope.iter().any(|bound| bound == name) {
                        free.insert(name.clone());
                    }
                }
                Term::Abs(param, body) => {
                    scope.push(param.clone());
                    rec(body, scope, free);
                    scope.pop();
                }
                Term::App(func, arg) => {
                    rec(func, scope, free);
                    rec(arg, scope, free);
                }
            }
        }
        let mut free = BTreeSet::new();
        rec(self, &mut Vec::new(), &mut free);
        free
    }

    /// Every identifier mentioned in this subtree, as a binder or as an
    /// occurrence, bound or free. Fresh-name generation must avoid all of
    /// them.
    pub fn all_names(&self) -> BTreeSet<Identifier> {
        fn rec(term: &Term, names: &mut BTreeSet<Identifier>) {
            match term {
                Term::Var(name) => {
                    names.insert(name.clone());
                }
                Term::Abs(param, body) => {
                    names.insert(param.clone());
                    rec(body, names);
                }
                Term::App(func, arg) => {
                    rec(func, names);
                    rec(arg, names);
                }
            }
        }
        let mut names = BTreeSet::new();
        rec(self, &mut names);
        names
    }
}

fn rename_occurrences(term: &mut Term, target: &Identifier, new_name: &Identifier) {
    match term {
        Term::Var(name) => {
            if name == target {
                *name = new_name.clone();
            }
        }
        // A same-named nested binder shadows the one being renamed.
        Term::Abs(param, body) => {
            if param != target {
                rename_occurrences(body, target, new_name);
            }
        }
        Term::App(func, arg) => {
            rename_occurrences(func, target, new_name);
            rename_occurrences(arg, target, new_name);
        }
    }
}

impl From<&lang::Term> for Term {
    fn from(term: &lang::Term) -> Self {
        match term {
            lang::Term::Variable(name) => Term::Var(name.value().clone()),
            lang::Term::Abstract(param, body) => {
                Term::Abs(param.value().clone(), Box::new(body.value().into()))
            }
            lang::Term::Apply(lhs, rhs) => Term::App(
                Box::new(lhs.value().into()),
                Box::new(rhs.value().into()),
            ),
        }
    }
}

struct Printer;
impl Visitor for Printer {
    type Output = String;
    fn visit_variable(&mut self, name: &Identifier) -> String {
        name.to_string()
    }
    fn visit_abstraction(&mut self, param: &Identifier, body: &Term) -> String {
        format!("(λ{param}. {})", body.accept(self))
    }
    fn visit_application(&mut self, func: &Term, arg: &Term) -> String {
        format!("({} {})", func.accept(self), arg.accept(self))
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.accept(&mut Printer))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn t(s: &str) -> Term {
        let term = crate::parser::parse_term(s).unwrap();
        term.value().into()
    }

    #[test]
    fn test_display() {
        assert_eq!(t(r"\x.x y").to_string(), "(λx. (x y))");
        assert_eq!(t(r"(\x.x) (\y.y)").to_string(), "((λx. x) (λy. y))");
    }

    #[test]
    fn test_free_names() {
        let names = t(r"\x.x y (\y.y z)").free_names();
        let names: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["y", "z"]);
    }

    #[test]
    fn test_rename_binder_respects_shadowing() {
        let mut term = t(r"\x.x (\x.x)");
        term.rename_binder(&ident("w"));
        assert_eq!(term, t(r"\w.w (\x.x)"));
    }

    #[test]
    fn test_rename_binder_leaves_free_occurrences() {
        // The outer binder of `\x.\y.x` can take any name not free in the
        // body without changing what the body's variables resolve to.
        let mut term = t(r"\x.\y.x");
        term.rename_binder(&ident("k"));
        assert_eq!(term, t(r"\k.\y.k"));
    }
}
