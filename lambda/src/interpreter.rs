use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use rpds::HashTrieMap;

use crate::{
    hasher::{self, Fingerprint},
    lang,
    logger::{Logger, Verbosity},
    parser::{self, Stmt},
    prelude::*,
    reducer,
    resolver::Resolver,
    term::Term,
};

/// Church encodings installed at construction, through the ordinary binding
/// statement path. `name1|name2` registers one definition under several
/// aliases.
const PRELUDE: &str = r"
# booleans
true = \t.\f.t
false = \t.\f.f
and = \a.\b.a b a
or = \a.\b.a a b
not = \b.b false true
if = \p.\a.\b.p a b
# pairs and lists
pair|cons = \x.\y.\f.f x y
first|car = \p.p true
second|cdr = \p.p false
nil|empty = \x.true
null|isempty = \p.p (\x.\y.false)
# binary trees
tree = \d.\l.\r.pair d (pair l r)
datum = \t.first t
left = \t.first (second t)
right = \t.second (second t)
# numerals and arithmetic
incr = \n.\f.\y.f (n f y)
plus = \m.\n.m incr n
times = \m.\n.m (plus n) zero
iszero = \n.n (\y.false) true
0|zero = \f.\x.x
1|one = \f.\x.f x
2|two = \f.\x.f (f x)
3|three = \f.\x.f (f (f x))
4|four = \f.\x.f (f (f (f x)))
5|five = \f.\x.f (f (f (f (f x))))
6|six = \f.\x.f (f (f (f (f (f x)))))
7|seven = \f.\x.f (f (f (f (f (f (f x))))))
8|eight = \f.\x.f (f (f (f (f (f (f (f x)))))))
9|nine = \f.\x.f (f (f (f (f (f (f (f (f x))))))))
";

/// One interpreter session: the binding environment, the two fingerprint
/// indices consulted for equivalence reporting, and the output sink. The
/// environment lives exactly as long as this value; there is no implicit
/// global table.
pub struct Interpreter {
    bindings: HashTrieMap<Identifier, Rc<Term>>,
    identity_index: HashMap<u64, BTreeSet<Identifier>>,
    structure_index: HashMap<u64, BTreeSet<Identifier>>,
    logger: Logger,
}

impl Interpreter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self::with_logger(Logger::new(verbosity))
    }

    pub fn with_logger(logger: Logger) -> Self {
        let mut interpreter = Self {
            bindings: HashTrieMap::new(),
            identity_index: HashMap::new(),
            structure_index: HashMap::new(),
            logger,
        };
        interpreter
            .interpret(PRELUDE)
            .expect("the built-in prelude must parse");
        interpreter
    }

    pub fn had_error(&self) -> bool {
        self.logger.had_error
    }

    pub fn clear_error(&mut self) {
        self.logger.had_error = false;
    }

    /// Runs one batch of newline-terminated statements. A lex or parse
    /// error anywhere aborts the whole batch before any statement executes;
    /// once execution starts, a failing statement is reported and the
    /// session moves on, keeping the bindings established so far.
    pub fn interpret(&mut self, source: &str) -> Result<(), Vec<Error<String>>> {
        let stmts = parser::parse_stmts(source)?;
        for stmt in stmts {
            self.logger.vvlog(format_args!("> {stmt}"));
            self.execute(stmt);
        }
        Ok(())
    }

    fn execute(&mut self, stmt: Stmt) {
        match stmt {
            Stmt::Term(term) => self.evaluate(&term),
            Stmt::Binding(aliases, term) => self.bind(&aliases, &term),
            Stmt::Env => self.print_bindings(),
            Stmt::Unbind(name) => self.unbind(name.value()),
            Stmt::Help => self.show_help(),
        }
    }

    fn evaluate(&mut self, surface: &Spanned<lang::Term>) {
        let mut term: Term = surface.value().into();
        self.logger.vlog(format_args!("λ > {term}"));
        if let Err(e) = Resolver::new(&self.bindings, &mut self.logger).resolve(&mut term) {
            self.logger.report_error(e);
            return;
        }
        let reduct = match reducer::reduce(term, &mut self.logger) {
            Ok(reduct) => reduct,
            Err(e) => {
                self.logger.report_error(e);
                return;
            }
        };
        self.logger.log(format_args!(">>> {reduct}"));

        let fp = hasher::fingerprint(&reduct);
        let identical = self
            .identity_index
            .get(&fp.identity)
            .filter(|names| !names.is_empty());
        let structural = self
            .structure_index
            .get(&fp.structure)
            .filter(|names| !names.is_empty());
        if let Some(names) = identical {
            self.logger
                .log(format_args!("    ↳ equal to: {}", join(names)));
        }
        if let Some(names) = structural {
            self.logger
                .log(format_args!("    ↳ structurally equivalent to: {}", join(names)));
        }
        if identical.is_none() && structural.is_none() {
            self.logger.log("");
        }
    }

    fn bind(&mut self, aliases: &[Spanned<Identifier>], surface: &Spanned<lang::Term>) {
        let term = Rc::new(Term::from(surface.value()));
        let fp = hasher::fingerprint(&term);
        for alias in aliases {
            let name = alias.value().clone();
            // Redefinition drops the name's old fingerprints first, or the
            // stale ones would keep reporting equivalence.
            let old_fp = self.bindings.get(&name).map(|old| hasher::fingerprint(old));
            if let Some(old_fp) = old_fp {
                self.remove_hash(&name, old_fp);
            }
            self.bindings = self.bindings.insert(name.clone(), term.clone());
            self.add_hash(&name, fp);
        }
    }

    fn unbind(&mut self, name: &Identifier) {
        let Some(term) = self.bindings.get(name) else {
            self.logger
                .report_error(format_args!("`{name}` is not bound"));
            return;
        };
        let fp = hasher::fingerprint(term);
        self.bindings = self.bindings.remove(name);
        self.remove_hash(name, fp);
    }

    fn add_hash(&mut self, name: &Identifier, fp: Fingerprint) {
        self.identity_index
            .entry(fp.identity)
            .or_default()
            .insert(name.clone());
        self.structure_index
            .entry(fp.structure)
            .or_default()
            .insert(name.clone());
    }

    // The name leaves the membership sets; emptied buckets stay.
    fn remove_hash(&mut self, name: &Identifier, fp: Fingerprint) {
        if let Some(names) = self.identity_index.get_mut(&fp.identity) {
            names.remove(name);
        }
        if let Some(names) = self.structure_index.get_mut(&fp.structure) {
            names.remove(name);
        }
    }

    fn print_bindings(&mut self) {
        let mut entries: Vec<_> = self.bindings.iter().collect();
        entries.sort_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));
        for (name, term) in entries {
            self.logger.log(format_args!("{name}:\t{term}"));
        }
    }

    fn show_help(&mut self) {
        self.logger.log(
            r"
term                 -- reduce a term to normal form
name = term          -- bind a term (name1|name2 = term installs aliases)
env                  -- list the current bindings
unbind name          -- remove a binding
help                 -- show this message
# ...                -- comment to end of line
"
            .trim(),
        );
    }

    #[cfg(test)]
    fn lookup(&self, name: &str) -> Option<&Rc<Term>> {
        self.bindings.get(&name.to_string())
    }
}

fn join(names: &BTreeSet<Identifier>) -> String {
    names
        .iter()
        .map(|name| name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
