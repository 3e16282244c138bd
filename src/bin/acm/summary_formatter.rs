use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use acmodel_rs::{AcModel, MergeReport, StateRef, TransitionRef};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ModelSummary {
    pub parameter_kind: Option<String>,
    pub vec_size: Option<usize>,
    pub macro_count: usize,
    pub hmms: Vec<HmmSummary>,
}

#[derive(Debug, Serialize)]
pub struct HmmSummary {
    pub name: String,
    pub state_count: usize,
    pub mixtures: Vec<usize>,
    /// Macro names still referenced instead of inlined.
    pub references: Vec<String>,
}

pub fn summarize(model: &AcModel) -> ModelSummary {
    let hmms = model
        .hmms()
        .iter()
        .map(|hmm| {
            let mut references = Vec::new();
            let mut mixtures: Vec<usize> = Vec::with_capacity(hmm.states.len());
            for s in &hmm.states {
                match &s.state {
                    StateRef::Inline(state) => {
                        mixtures.push(state.streams.iter().map(|st| st.mixtures.len()).sum())
                    }
                    StateRef::Macro(name) => {
                        mixtures.push(0);
                        references.push(name.clone());
                    }
                }
            }
            if let TransitionRef::Macro(name) = &hmm.transition {
                references.push(name.clone());
            }
            HmmSummary {
                name: hmm.name.clone(),
                state_count: hmm.state_count(),
                mixtures,
                references,
            }
        })
        .collect();

    ModelSummary {
        parameter_kind: model.parameter_kind().map(str::to_string),
        vec_size: model.vec_size(),
        macro_count: model.macros().len(),
        hmms,
    }
}

pub fn print_summary(summary: &ModelSummary) {
    println!(
        "kind={} vec_size={} macros={} hmms={}",
        summary.parameter_kind.as_deref().unwrap_or("-"),
        summary
            .vec_size
            .map_or_else(|| "-".to_string(), |v| v.to_string()),
        summary.macro_count,
        summary.hmms.len()
    );
    for hmm in &summary.hmms {
        let refs = if hmm.references.is_empty() {
            String::new()
        } else {
            format!(" refs={}", hmm.references.join(","))
        };
        println!(
            "  {:<12} states={} mixtures={:?}{refs}",
            hmm.name, hmm.state_count, hmm.mixtures
        );
    }
}

pub fn print_merge_report(report: &MergeReport) {
    println!(
        "appended={} interpolated={} kept={} changed={}",
        report.appended, report.interpolated, report.kept, report.changed
    );
    for failure in &report.failures {
        eprintln!("  not interpolated: {} ({})", failure.hmm, failure.reason);
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create output directory '{}': {err}",
                parent.display()
            )
        })?;
    }

    let mut file = File::create(path)
        .map_err(|err| format!("Failed to create JSON file '{}': {err}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, value)
        .map_err(|err| format!("Failed to serialize JSON '{}': {err}", path.display()))?;
    file.write_all(b"\n")
        .map_err(|err| format!("Failed to finalize JSON file '{}': {err}", path.display()))?;
    Ok(())
}
