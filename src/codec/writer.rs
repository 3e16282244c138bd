use std::fmt;

use crate::acm::hmm::Hmm;
use crate::types::{GlobalOptions, Macro, Mixture, State, StateRef, Transition, TransitionRef};

/// Displays macros then HMMs in HTK-ASCII form.
///
/// Floats use Rust's shortest round-trip exponent notation, which HTK's
/// `strtod`-based reader accepts.
pub(crate) struct HtkDocument<'a> {
    pub macros: &'a [Macro],
    pub hmms: &'a [Hmm],
}

impl fmt::Display for HtkDocument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in self.macros {
            write_macro(f, m)?;
        }
        for hmm in self.hmms {
            write_hmm(f, hmm)?;
        }
        Ok(())
    }
}

fn write_macro(f: &mut fmt::Formatter<'_>, m: &Macro) -> fmt::Result {
    match m {
        Macro::Options(options) => write_options(f, options),
        Macro::Variance { name, values } => {
            writeln!(f, "~v \"{name}\"")?;
            writeln!(f, "<VARIANCE> {}", values.len())?;
            write_values(f, values)
        }
        Macro::State { name, definition } => {
            writeln!(f, "~s \"{name}\"")?;
            write_state(f, definition)
        }
        Macro::Transition { name, definition } => {
            writeln!(f, "~t \"{name}\"")?;
            write_transp(f, definition)
        }
    }
}

fn write_options(f: &mut fmt::Formatter<'_>, options: &GlobalOptions) -> fmt::Result {
    writeln!(f, "~o")?;
    if let Some(widths) = &options.stream_info {
        write!(f, "<STREAMINFO> {}", widths.len())?;
        for w in widths {
            write!(f, " {w}")?;
        }
        writeln!(f)?;
    }
    if let Some(vec_size) = options.vec_size {
        write!(f, "<VECSIZE> {vec_size}")?;
    }
    let kinds = [
        &options.duration_kind,
        &options.parameter_kind,
        &options.covariance_kind,
    ];
    for kind in kinds.into_iter().flatten() {
        write!(f, "<{kind}>")?;
    }
    if options.vec_size.is_some() || kinds.iter().any(|k| k.is_some()) {
        writeln!(f)?;
    }
    Ok(())
}

fn write_hmm(f: &mut fmt::Formatter<'_>, hmm: &Hmm) -> fmt::Result {
    writeln!(f, "~h \"{}\"", hmm.name)?;
    writeln!(f, "<BEGINHMM>")?;
    writeln!(f, "<NUMSTATES> {}", hmm.state_count())?;
    for s in &hmm.states {
        writeln!(f, "<STATE> {}", s.index)?;
        match &s.state {
            StateRef::Inline(state) => write_state(f, state)?,
            StateRef::Macro(name) => writeln!(f, "~s \"{name}\"")?,
        }
    }
    match &hmm.transition {
        TransitionRef::Inline(transition) => write_transp(f, transition)?,
        TransitionRef::Macro(name) => writeln!(f, "~t \"{name}\"")?,
    }
    writeln!(f, "<ENDHMM>")
}

fn write_state(f: &mut fmt::Formatter<'_>, state: &State) -> fmt::Result {
    let multi_stream = state.streams.len() > 1;
    if multi_stream || state.streams.iter().any(|s| s.mixtures.len() > 1) {
        write!(f, "<NUMMIXES>")?;
        for stream in &state.streams {
            write!(f, " {}", stream.mixtures.len())?;
        }
        writeln!(f)?;
    }
    if let Some(weights) = &state.weights {
        writeln!(f, "<SWEIGHTS> {}", weights.len())?;
        write_values(f, weights)?;
    }
    for (k, stream) in state.streams.iter().enumerate() {
        if multi_stream {
            writeln!(f, "<STREAM> {}", k + 1)?;
        }
        match stream.mixtures.as_slice() {
            [only] if only.weight.is_none() => write_pdf(f, only)?,
            mixtures => {
                let default_weight = 1.0 / mixtures.len() as f64;
                for (i, mix) in mixtures.iter().enumerate() {
                    writeln!(
                        f,
                        "<MIXTURE> {} {:e}",
                        i + 1,
                        mix.weight.unwrap_or(default_weight)
                    )?;
                    write_pdf(f, mix)?;
                }
            }
        }
    }
    Ok(())
}

fn write_pdf(f: &mut fmt::Formatter<'_>, mix: &Mixture) -> fmt::Result {
    writeln!(f, "<MEAN> {}", mix.mean.len())?;
    write_values(f, &mix.mean)?;
    writeln!(f, "<VARIANCE> {}", mix.variance.len())?;
    write_values(f, &mix.variance)?;
    writeln!(f, "<GCONST> {:e}", mix.gconst)
}

fn write_transp(f: &mut fmt::Formatter<'_>, transition: &Transition) -> fmt::Result {
    writeln!(f, "<TRANSP> {}", transition.dim())?;
    for row in &transition.matrix {
        write_values(f, row)?;
    }
    Ok(())
}

fn write_values(f: &mut fmt::Formatter<'_>, values: &[f64]) -> fmt::Result {
    for v in values {
        write!(f, " {v:e}")?;
    }
    writeln!(f)
}
