//! Registry mechanics: alias binding, resolution, dependency closure.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::RANDOM;

/// One catalog entry: a named signal shape.
#[derive(Debug, Clone, Copy)]
pub struct WaveformFn {
    /// Canonical name (the first registered alias).
    pub canonical: &'static str,
    /// C identifier of the emitted helper function.
    pub func_name: &'static str,
    /// Canonical names of helpers this fragment calls. Must all be
    /// registered before [`Registry::close`] runs; the graph is assumed
    /// acyclic and a cycle is unchecked.
    pub dependencies: &'static [&'static str],
    /// C source fragment emitted into the generated sketch.
    pub fragment: &'static str,
    /// Pure phase evaluator for offline testing. The noise waveform is
    /// stateful and has none.
    pub evaluator: Option<fn(f32) -> f32>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown waveform alias '{0}'")]
    UnknownAlias(String),
}

/// Alias-keyed catalog of waveform functions.
#[derive(Debug, Default)]
pub struct Registry {
    /// Uppercased alias → canonical name.
    aliases: HashMap<&'static str, &'static str>,
    /// Canonical name → entry.
    entries: HashMap<&'static str, WaveformFn>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Bind all `aliases` to one entry; the first alias is canonical.
    ///
    /// A later registration claiming an already-bound alias is silently
    /// ignored — first wins.
    pub(crate) fn register(
        &mut self,
        aliases: &[&'static str],
        dependencies: &'static [&'static str],
        func_name: &'static str,
        fragment: &'static str,
        evaluator: Option<fn(f32) -> f32>,
    ) {
        let Some(&canonical) = aliases.first() else {
            return;
        };
        if aliases.iter().any(|a| self.aliases.contains_key(a)) {
            return;
        }
        for alias in aliases {
            self.aliases.insert(alias, canonical);
        }
        self.entries.insert(
            canonical,
            WaveformFn {
                canonical,
                func_name,
                dependencies,
                fragment,
                evaluator,
            },
        );
    }

    /// Look up an entry by any alias (case-insensitive).
    pub fn resolve(&self, alias: &str) -> Option<&WaveformFn> {
        let canonical = self.aliases.get(alias.to_uppercase().as_str())?;
        self.entries.get(canonical)
    }

    /// Like [`resolve`](Self::resolve) but an unknown alias is an error.
    ///
    /// Code generation uses this: the validator already guarantees every
    /// waveform name resolves, so the error path is unreachable in a
    /// validated pipeline, but generation still propagates rather than
    /// panics.
    pub fn require(&self, alias: &str) -> Result<&WaveformFn, RegistryError> {
        self.resolve(alias)
            .ok_or_else(|| RegistryError::UnknownAlias(alias.to_string()))
    }

    /// Dependency-closed helper list for a set of requested aliases.
    ///
    /// Each entry appears at most once, every entry after its own transitive
    /// dependencies, and the noise fragment first when present (other
    /// fragments and generated globals may consult its `randCache` struct
    /// without a forward declaration). Unknown aliases are skipped.
    pub fn close(&self, requested: &[&str]) -> Vec<&WaveformFn> {
        let mut emitted: HashSet<&'static str> = HashSet::new();
        let mut ordered: Vec<&WaveformFn> = Vec::new();

        if requested
            .iter()
            .any(|a| self.resolve(a).is_some_and(|e| e.canonical == RANDOM))
        {
            self.visit(RANDOM, &mut emitted, &mut ordered);
        }
        for alias in requested {
            if let Some(entry) = self.resolve(alias) {
                self.visit(entry.canonical, &mut emitted, &mut ordered);
            }
        }
        ordered
    }

    /// Post-order walk: dependencies first, then the entry itself.
    fn visit<'a>(
        &'a self,
        canonical: &str,
        emitted: &mut HashSet<&'static str>,
        ordered: &mut Vec<&'a WaveformFn>,
    ) {
        let Some(entry) = self.entries.get(canonical) else {
            return;
        };
        if !emitted.insert(entry.canonical) {
            return;
        }
        for dep in entry.dependencies {
            self.visit(dep, emitted, ordered);
        }
        ordered.push(entry);
    }

    /// All canonical names, for catalog sanity checks.
    pub fn canonical_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}
