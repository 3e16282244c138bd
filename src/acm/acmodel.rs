use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::acm::hmm::Hmm;
use crate::acm::phone_map::{has_context, PhoneMap};
use crate::codec::{HtkAsciiCodec, ModelCodec};
use crate::error::AcModelError;
use crate::types::{
    GlobalOptions, HmmState, Macro, MergeFailure, MergeReport, State, StateRef, Transition,
    TransitionRef,
};

/// An acoustic model: name-unique HMMs plus the macros they may share.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcModel {
    macros: Vec<Macro>,
    hmms: Vec<Hmm>,
}

impl AcModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with `DuplicateName` if two HMMs share a name.
    pub fn from_parts(macros: Vec<Macro>, hmms: Vec<Hmm>) -> Result<Self, AcModelError> {
        if let Some(dup) = first_duplicate(hmms.iter().map(|h| h.name.as_str())) {
            return Err(AcModelError::DuplicateName {
                name: dup.to_string(),
            });
        }
        Ok(Self { macros, hmms })
    }

    /// Loads HTK-ASCII files, typically `macros` then `hmmdefs`.
    pub fn load_htk<I, P>(paths: I) -> Result<Self, AcModelError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self::load_with(&HtkAsciiCodec, paths)
    }

    pub fn load_with<I, P>(codec: &dyn ModelCodec, paths: I) -> Result<Self, AcModelError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths: Vec<PathBuf> = paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect();
        let parsed = codec.parse(&paths)?;
        let model = Self::from_parts(parsed.macros, parsed.hmms)?;
        tracing::info!(
            files = paths.len(),
            macros = model.macros.len(),
            hmms = model.hmms.len(),
            "acmodel: loaded"
        );
        Ok(model)
    }

    pub fn save_htk(&self, path: &Path) -> Result<(), AcModelError> {
        self.save_with(&HtkAsciiCodec, path)
    }

    pub fn save_with(&self, codec: &dyn ModelCodec, path: &Path) -> Result<(), AcModelError> {
        std::fs::write(path, codec.serialize(&self.macros, &self.hmms))
            .map_err(|e| AcModelError::io("write model file", e))?;
        tracing::info!(
            path = %path.display(),
            hmms = self.hmms.len(),
            "acmodel: saved"
        );
        Ok(())
    }

    pub fn to_htk_string(&self) -> String {
        HtkAsciiCodec.serialize(&self.macros, &self.hmms)
    }

    pub fn hmms(&self) -> &[Hmm] {
        &self.hmms
    }

    pub fn macros(&self) -> &[Macro] {
        &self.macros
    }

    pub fn len(&self) -> usize {
        self.hmms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hmms.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.hmms.iter().map(|h| h.name.as_str())
    }

    pub fn options(&self) -> Option<&GlobalOptions> {
        self.macros.iter().find_map(|m| match m {
            Macro::Options(options) => Some(options),
            _ => None,
        })
    }

    /// Replaces the `~o` header, or adds one in front of the other macros.
    pub fn set_options(&mut self, options: GlobalOptions) {
        match self
            .macros
            .iter_mut()
            .find(|m| matches!(m, Macro::Options(_)))
        {
            Some(slot) => *slot = Macro::Options(options),
            None => self.macros.insert(0, Macro::Options(options)),
        }
    }

    /// Acoustic feature kind, e.g. `MFCC_0_D_A`.
    pub fn parameter_kind(&self) -> Option<&str> {
        self.options()?.parameter_kind.as_deref()
    }

    pub fn vec_size(&self) -> Option<usize> {
        self.options()?.vec_size
    }

    pub fn get_hmm(&self, phone: &str) -> Result<&Hmm, AcModelError> {
        let mut matches = self.hmms.iter().filter(|h| h.name == phone);
        let found = matches
            .next()
            .ok_or_else(|| AcModelError::not_found("HMM", phone))?;
        let extra = matches.count();
        if extra > 0 {
            return Err(AcModelError::Ambiguous {
                name: phone.to_string(),
                count: extra + 1,
            });
        }
        Ok(found)
    }

    fn position(&self, phone: &str) -> Option<usize> {
        self.hmms.iter().position(|h| h.name == phone)
    }

    pub fn append_hmm(&mut self, hmm: Hmm) -> Result<(), AcModelError> {
        self.check_appendable(&hmm)?;
        self.hmms.push(hmm);
        Ok(())
    }

    fn check_appendable(&self, hmm: &Hmm) -> Result<(), AcModelError> {
        if hmm.name.is_empty() {
            return Err(AcModelError::invalid_argument("an HMM needs a name"));
        }
        if self.position(&hmm.name).is_some() {
            return Err(AcModelError::DuplicateName {
                name: hmm.name.clone(),
            });
        }
        if hmm.states.is_empty() {
            return Err(AcModelError::Incomplete {
                name: hmm.name.clone(),
                missing: "states",
            });
        }
        if matches!(&hmm.transition, TransitionRef::Inline(t) if t.dim() == 0) {
            return Err(AcModelError::Incomplete {
                name: hmm.name.clone(),
                missing: "transition",
            });
        }
        Ok(())
    }

    pub fn pop_hmm(&mut self, phone: &str) -> Result<Hmm, AcModelError> {
        let pos = self
            .position(phone)
            .ok_or_else(|| AcModelError::not_found("HMM", phone))?;
        Ok(self.hmms.remove(pos))
    }

    /// Inlines every state and transition macro reference, then drops the
    /// state and transition macros. Nothing changes if a reference is missing.
    pub fn fill_hmms(&mut self) -> Result<(), AcModelError> {
        let resolved = self
            .hmms
            .iter()
            .map(|hmm| self.resolve_hmm(hmm))
            .collect::<Result<Vec<_>, _>>()?;

        let inlined = resolved.iter().filter(|(_, count)| *count > 0).count();
        self.hmms = resolved.into_iter().map(|(hmm, _)| hmm).collect();
        let before = self.macros.len();
        self.macros.retain(|m| !m.is_resolvable());
        tracing::debug!(
            hmms_touched = inlined,
            macros_dropped = before - self.macros.len(),
            "acmodel: filled macro references"
        );
        Ok(())
    }

    /// Resolved copy of `hmm` and the number of references it held.
    fn resolve_hmm(&self, hmm: &Hmm) -> Result<(Hmm, usize), AcModelError> {
        let mut references = 0;
        let states = hmm
            .states
            .iter()
            .map(|s| {
                let state = match &s.state {
                    StateRef::Inline(state) => state.clone(),
                    StateRef::Macro(name) => {
                        references += 1;
                        self.state_macro(name)?.clone()
                    }
                };
                Ok::<_, AcModelError>(HmmState {
                    index: s.index,
                    state: StateRef::Inline(state),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let transition = match &hmm.transition {
            TransitionRef::Inline(t) => t.clone(),
            TransitionRef::Macro(name) => {
                references += 1;
                self.transition_macro(name)?.clone()
            }
        };
        Ok((
            Hmm {
                name: hmm.name.clone(),
                states,
                transition: TransitionRef::Inline(transition),
            },
            references,
        ))
    }

    fn state_macro(&self, name: &str) -> Result<&State, AcModelError> {
        self.macros
            .iter()
            .find_map(|m| match m {
                Macro::State {
                    name: n,
                    definition,
                } if n == name => Some(definition),
                _ => None,
            })
            .ok_or_else(|| AcModelError::unresolved("state", name))
    }

    fn transition_macro(&self, name: &str) -> Result<&Transition, AcModelError> {
        self.macros
            .iter()
            .find_map(|m| match m {
                Macro::Transition {
                    name: n,
                    definition,
                } if n == name => Some(definition),
                _ => None,
            })
            .ok_or_else(|| AcModelError::unresolved("transition", name))
    }

    /// Merges `other` into `self`, weighting shared HMMs with `gamma` for
    /// `self` and `1 - gamma` for `other`.
    ///
    /// `other` is never modified and `self` ends up macro-resolved. An HMM
    /// that `append_hmm` would reject aborts the merge before `self` changes.
    /// A shared HMM whose interpolation fails is left as it was, counted as
    /// kept and listed in `MergeReport::failures`.
    pub fn merge_model(
        &mut self,
        other: &AcModel,
        gamma: f64,
    ) -> Result<MergeReport, AcModelError> {
        if !(0.0..=1.0).contains(&gamma) {
            return Err(AcModelError::invalid_argument(format!(
                "gamma must be in [0, 1], got {gamma}"
            )));
        }
        self.check_feature_kind(other)?;

        let mut theirs = other.clone();
        theirs.fill_hmms()?;
        let mut ours = self.clone();
        ours.fill_hmms()?;
        for hmm in &theirs.hmms {
            if ours.position(&hmm.name).is_none() {
                ours.check_appendable(hmm)?;
            }
        }
        *self = ours;

        let mut report = MergeReport {
            kept: self.hmms.len(),
            ..MergeReport::default()
        };
        for hmm in theirs.hmms {
            let Some(pos) = self.position(&hmm.name) else {
                tracing::debug!(hmm = hmm.name.as_str(), "merge: appended");
                self.hmms.push(hmm);
                report.appended += 1;
                continue;
            };

            if gamma == 1.0 {
                continue;
            }
            if gamma == 0.0 {
                tracing::debug!(hmm = hmm.name.as_str(), "merge: replaced");
                self.hmms[pos] = hmm;
                report.changed += 1;
                report.kept -= 1;
                continue;
            }
            match self.hmms[pos].static_linear_interpolation(&hmm, gamma) {
                Ok(()) => {
                    report.interpolated += 1;
                    report.kept -= 1;
                }
                Err(err) => {
                    tracing::warn!(
                        hmm = hmm.name.as_str(),
                        error = %err,
                        "merge: interpolation failed, keeping the original HMM"
                    );
                    report.failures.push(MergeFailure {
                        hmm: hmm.name,
                        reason: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            gamma,
            appended = report.appended,
            interpolated = report.interpolated,
            kept = report.kept,
            changed = report.changed,
            failed = report.failures.len(),
            "merge: done"
        );
        Ok(report)
    }

    fn check_feature_kind(&self, other: &AcModel) -> Result<(), AcModelError> {
        if self.parameter_kind() != other.parameter_kind() {
            return Err(AcModelError::TypeMismatch {
                field: "parameter kind",
                ours: describe(self.parameter_kind()),
                theirs: describe(other.parameter_kind()),
            });
        }
        if self.vec_size() != other.vec_size() {
            return Err(AcModelError::TypeMismatch {
                field: "vector size",
                ours: describe(self.vec_size()),
                theirs: describe(other.vec_size()),
            });
        }
        Ok(())
    }

    /// Renames every HMM through `map`, phone by phone inside context names.
    ///
    /// Nothing is renamed if two HMMs would end up with the same name.
    pub fn replace_phones(&mut self, map: &PhoneMap, reverse: bool) -> Result<usize, AcModelError> {
        let renamed: Vec<String> = self
            .hmms
            .iter()
            .map(|h| map.map_name(&h.name, reverse))
            .collect();

        if let Some(dup) = first_duplicate(renamed.iter().map(String::as_str)) {
            return Err(AcModelError::DuplicateName {
                name: dup.to_string(),
            });
        }

        let mut changed = 0;
        for (hmm, name) in self.hmms.iter_mut().zip(renamed) {
            if hmm.name != name {
                hmm.name = name;
                changed += 1;
            }
        }
        tracing::debug!(changed, reverse, "acmodel: replaced phones");
        Ok(changed)
    }

    /// Drops context-dependent HMMs (`a-b+c`), keeping monophones only.
    pub fn extract_monophones(&mut self) -> usize {
        let before = self.hmms.len();
        self.hmms.retain(|h| !has_context(&h.name));
        let removed = before - self.hmms.len();
        tracing::debug!(removed, kept = self.hmms.len(), "acmodel: extracted monophones");
        removed
    }
}

fn first_duplicate<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.into_iter().find(|name| !seen.insert(*name))
}

fn describe<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "unset".to_string(), |v| v.to_string())
}

#[cfg(test)]
#[path = "acmodel_tests.rs"]
mod tests;
