use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::{
    prelude::*,
    term::{Term, Visitor},
};

/// A pair of advisory fingerprints computed in one traversal.
///
/// `identity` is stable under consistent renaming of bound variables and
/// folds in the names of free variables: equal with high probability iff the
/// terms are alpha-equivalent. `structure` is coarser; it sees only the
/// node shape, each bound variable's binding depth, and a bare "free"
/// marker, so terms that differ only in variable names collide on purpose.
///
/// Collisions are accepted: these drive equivalence *reporting*, never the
/// reduction itself.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Fingerprint {
    pub identity: u64,
    pub structure: u64,
}

pub fn fingerprint(term: &Term) -> Fingerprint {
    term.accept(&mut TermHasher::default())
}

const VAR_TAG: u8 = 0;
const ABS_TAG: u8 = 1;
const APP_TAG: u8 = 2;

const FREE_MARK: u64 = 0;
const BOUND_MARK: u64 = 1;

fn combine(tag: u8, parts: &[u64]) -> u64 {
    let mut hasher = DefaultHasher::new();
    tag.hash(&mut hasher);
    for part in parts {
        part.hash(&mut hasher);
    }
    hasher.finish()
}

fn hash_free_name(name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    VAR_TAG.hash(&mut hasher);
    FREE_MARK.hash(&mut hasher);
    name.hash(&mut hasher);
    hasher.finish()
}

#[derive(Default)]
struct TermHasher {
    scope: Vec<Identifier>,
}

impl Visitor for TermHasher {
    type Output = Fingerprint;

    fn visit_variable(&mut self, name: &Identifier) -> Fingerprint {
        match self.scope.iter().rev().position(|binder| binder == name) {
            // Bound: the distance to the binding abstraction is all either
            // hash needs, and it is alpha-invariant.
            Some(depth) => {
                let hash = combine(VAR_TAG, &[BOUND_MARK, depth as u64]);
                Fingerprint {
                    identity: hash,
                    structure: hash,
                }
            }
            // Free: differently named free variables are not
            // alpha-equivalent, so the name reaches the identity hash; the
            // structure hash keeps only the fact of freeness.
            None => Fingerprint {
                identity: hash_free_name(name),
                structure: combine(VAR_TAG, &[FREE_MARK]),
            },
        }
    }

    fn visit_abstraction(&mut self, param: &Identifier, body: &Term) -> Fingerprint {
        self.scope.push(param.clone());
        let body = body.accept(self);
        self.scope.pop();
        Fingerprint {
            identity: combine(ABS_TAG, &[body.identity]),
            structure: combine(ABS_TAG, &[body.structure]),
        }
    }

    fn visit_application(&mut self, func: &Term, arg: &Term) -> Fingerprint {
        let func = func.accept(self);
        let arg = arg.accept(self);
        Fingerprint {
            identity: combine(APP_TAG, &[func.identity, arg.identity]),
            structure: combine(APP_TAG, &[func.structure, arg.structure]),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fp(s: &str) -> Fingerprint {
        let term: Term = crate::parser::parse_term(s).unwrap().value().into();
        fingerprint(&term)
    }

    #[test]
    fn test_alpha_equivalent_terms_share_both_hashes() {
        assert_eq!(fp(r"\x.x"), fp(r"\y.y"));
        assert_eq!(fp(r"\x.\y.x y"), fp(r"\a.\b.a b"));
    }

    #[test]
    fn test_free_names_split_identity_only() {
        let lhs = fp(r"\x.x y");
        let rhs = fp(r"\x.x z");
        assert_ne!(lhs.identity, rhs.identity);
        assert_eq!(lhs.structure, rhs.structure);
    }

    #[test]
    fn test_binding_depth_reaches_structure() {
        let k = fp(r"\x.\y.x");
        let ki = fp(r"\x.\y.y");
        assert_ne!(k.identity, ki.identity);
        assert_ne!(k.structure, ki.structure);
    }

    #[test]
    fn test_shape_reaches_both() {
        assert_ne!(fp(r"\x.x x").identity, fp(r"\x.x").identity);
        assert_ne!(fp(r"\x.x x").structure, fp(r"\x.x").structure);
    }

    #[test]
    fn test_shadowing_resolves_to_nearest_binder() {
        // In `\x.\x.x` the variable belongs to the inner binder, making the
        // term alpha-equivalent to `\y.\x.x`, not to `\x.\y.x`.
        assert_eq!(fp(r"\x.\x.x"), fp(r"\y.\x.x"));
        assert_ne!(fp(r"\x.\x.x").identity, fp(r"\x.\y.x").identity);
    }
}
