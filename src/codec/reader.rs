use crate::acm::hmm::Hmm;
use crate::codec::lexer::{tokenize, Lexeme, Token};
use crate::codec::traits::ParsedModel;
use crate::error::AcModelError;
use crate::types::{
    gconst, GlobalOptions, HmmState, Macro, Mixture, State, StateRef, Stream, Transition,
    TransitionRef,
};

const DURATION_KINDS: [&str; 4] = ["NULLD", "POISSOND", "GAMMAD", "GEND"];
const COVARIANCE_KINDS: [&str; 5] = ["DIAGC", "INVDIAGC", "FULLC", "LLTC", "XFORMC"];
/// Keywords that end an options block.
const STRUCTURE_KEYWORDS: [&str; 2] = ["BEGINHMM", "NUMSTATES"];

/// Parses one HTK-ASCII document (a `macros`, `hmmdefs` or single-HMM file).
pub(crate) fn parse_document(text: &str, source_name: &str) -> Result<ParsedModel, AcModelError> {
    let lexemes = tokenize(text, source_name)?;
    let mut reader = Reader {
        lexemes,
        pos: 0,
        source_name,
    };
    let mut parsed = ParsedModel::default();

    while let Some(token) = reader.next_token() {
        match token {
            Token::Macro('o') => parsed.macros.push(Macro::Options(reader.options()?)),
            Token::Macro('v') => {
                let name = reader.name()?;
                reader.expect_keyword("VARIANCE")?;
                let values = reader.vector()?;
                parsed.macros.push(Macro::Variance { name, values });
            }
            Token::Macro('s') => {
                let name = reader.name()?;
                let definition = reader.state()?;
                parsed.macros.push(Macro::State { name, definition });
            }
            Token::Macro('t') => {
                let name = reader.name()?;
                let definition = reader.transp()?;
                parsed.macros.push(Macro::Transition { name, definition });
            }
            Token::Macro('h') => {
                let name = reader.name()?;
                parsed.hmms.push(reader.hmm(name)?);
            }
            Token::Macro(kind) => {
                return Err(reader.error(format!("unsupported macro kind ~{kind}")));
            }
            other => return Err(reader.error(format!("unexpected {other:?} at top level"))),
        }
    }

    tracing::debug!(
        source = source_name,
        macros = parsed.macros.len(),
        hmms = parsed.hmms.len(),
        "codec: parsed document"
    );
    Ok(parsed)
}

struct Reader<'a> {
    lexemes: Vec<Lexeme>,
    pos: usize,
    source_name: &'a str,
}

impl Reader<'_> {
    fn peek(&self) -> Option<&Token> {
        self.lexemes.get(self.pos).map(|l| &l.token)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Keyword(k)) if k == keyword)
    }

    fn next_token(&mut self) -> Option<Token> {
        let token = self.lexemes.get(self.pos).map(|l| l.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> AcModelError {
        let line = self
            .lexemes
            .get(self.pos.min(self.lexemes.len().saturating_sub(1)))
            .map(|l| l.line)
            .unwrap_or(0);
        AcModelError::format(self.source_name, line, message)
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), AcModelError> {
        match self.next_token() {
            Some(Token::Keyword(k)) if k == keyword => Ok(()),
            other => Err(self.error(format!("expected <{keyword}>, found {other:?}"))),
        }
    }

    fn name(&mut self) -> Result<String, AcModelError> {
        match self.next_token() {
            Some(Token::Quoted(name)) | Some(Token::Word(name)) => Ok(name),
            other => Err(self.error(format!("expected a macro name, found {other:?}"))),
        }
    }

    fn word(&mut self) -> Result<String, AcModelError> {
        match self.next_token() {
            Some(Token::Word(word)) => Ok(word),
            other => Err(self.error(format!("expected a number, found {other:?}"))),
        }
    }

    fn float(&mut self) -> Result<f64, AcModelError> {
        let word = self.word()?;
        word.parse()
            .map_err(|_| self.error(format!("'{word}' is not a number")))
    }

    fn count(&mut self) -> Result<usize, AcModelError> {
        let word = self.word()?;
        word.parse()
            .map_err(|_| self.error(format!("'{word}' is not a count")))
    }

    fn floats(&mut self, n: usize) -> Result<Vec<f64>, AcModelError> {
        (0..n).map(|_| self.float()).collect()
    }

    /// `n v1 .. vn`
    fn vector(&mut self) -> Result<Vec<f64>, AcModelError> {
        let n = self.count()?;
        self.floats(n)
    }

    /// Counts following a keyword until the next non-numeric token.
    fn counts(&mut self) -> Result<Vec<usize>, AcModelError> {
        let mut counts = Vec::new();
        while let Some(Token::Word(_)) = self.peek() {
            counts.push(self.count()?);
        }
        Ok(counts)
    }

    fn options(&mut self) -> Result<GlobalOptions, AcModelError> {
        let mut options = GlobalOptions::default();
        while let Some(Token::Keyword(keyword)) = self.peek().cloned() {
            if STRUCTURE_KEYWORDS.contains(&keyword.as_str()) {
                break;
            }
            self.pos += 1;
            if keyword == "STREAMINFO" {
                let n = self.count()?;
                let widths = (0..n).map(|_| self.count()).collect::<Result<Vec<_>, _>>()?;
                options.stream_info = Some(widths);
            } else if keyword == "VECSIZE" {
                options.vec_size = Some(self.count()?);
            } else if DURATION_KINDS.contains(&keyword.as_str()) {
                options.duration_kind = Some(keyword);
            } else if COVARIANCE_KINDS.contains(&keyword.as_str()) {
                options.covariance_kind = Some(keyword);
            } else {
                options.parameter_kind = Some(keyword);
            }
        }
        Ok(options)
    }

    fn hmm(&mut self, name: String) -> Result<Hmm, AcModelError> {
        self.expect_keyword("BEGINHMM")?;
        // Local options may precede <NUMSTATES>; they must agree with ~o and are not kept.
        self.options()?;
        self.expect_keyword("NUMSTATES")?;
        let state_count = self.count()?;

        let mut states = Vec::new();
        while self.peek_keyword("STATE") {
            self.pos += 1;
            let index = self.count()?;
            let state = if matches!(self.peek(), Some(Token::Macro('s'))) {
                self.pos += 1;
                StateRef::Macro(self.name()?)
            } else {
                StateRef::Inline(self.state()?)
            };
            states.push(HmmState { index, state });
        }
        if states.len() + 2 != state_count {
            return Err(self.error(format!(
                "HMM '{name}' declares {state_count} states but defines {}",
                states.len()
            )));
        }

        let transition = match self.peek() {
            Some(Token::Macro('t')) => {
                self.pos += 1;
                TransitionRef::Macro(self.name()?)
            }
            _ => TransitionRef::Inline(self.transp()?),
        };
        self.expect_keyword("ENDHMM")?;

        Ok(Hmm {
            name,
            states,
            transition,
        })
    }

    fn state(&mut self) -> Result<State, AcModelError> {
        let mut mix_counts = Vec::new();
        let mut weights = None;
        loop {
            if self.peek_keyword("NUMMIXES") {
                self.pos += 1;
                mix_counts = self.counts()?;
            } else if self.peek_keyword("SWEIGHTS") {
                self.pos += 1;
                weights = Some(self.vector()?);
            } else {
                break;
            }
        }

        let mut streams = Vec::new();
        if self.peek_keyword("STREAM") {
            while self.peek_keyword("STREAM") {
                self.pos += 1;
                let k = self.count()?;
                let expected = mix_counts.get(k.saturating_sub(1)).copied().unwrap_or(1);
                streams.push(self.stream(expected)?);
            }
        } else {
            let expected = mix_counts.first().copied().unwrap_or(1);
            streams.push(self.stream(expected)?);
        }

        if let Some(w) = &weights {
            if w.len() != streams.len() {
                return Err(self.error(format!(
                    "<SWEIGHTS> holds {} weights for {} streams",
                    w.len(),
                    streams.len()
                )));
            }
        }
        Ok(State { streams, weights })
    }

    fn stream(&mut self, expected_mixtures: usize) -> Result<Stream, AcModelError> {
        if !self.peek_keyword("MIXTURE") {
            if expected_mixtures > 1 {
                return Err(self.error(format!(
                    "expected {expected_mixtures} <MIXTURE> entries"
                )));
            }
            return Ok(Stream::new(vec![self.pdf(None)?]));
        }

        let mut mixtures = Vec::new();
        while self.peek_keyword("MIXTURE") {
            self.pos += 1;
            let _index = self.count()?;
            let weight = self.float()?;
            mixtures.push(self.pdf(Some(weight))?);
        }
        if mixtures.len() != expected_mixtures {
            return Err(self.error(format!(
                "expected {expected_mixtures} mixtures, found {}",
                mixtures.len()
            )));
        }
        Ok(Stream::new(mixtures))
    }

    fn pdf(&mut self, weight: Option<f64>) -> Result<Mixture, AcModelError> {
        self.expect_keyword("MEAN")?;
        let mean = self.vector()?;
        self.expect_keyword("VARIANCE")?;
        let variance = self.vector()?;
        if mean.len() != variance.len() {
            return Err(self.error(format!(
                "<MEAN> has {} values but <VARIANCE> has {}",
                mean.len(),
                variance.len()
            )));
        }
        let gconst = if self.peek_keyword("GCONST") {
            self.pos += 1;
            self.float()?
        } else {
            gconst(&variance)
        };
        Ok(Mixture {
            weight,
            mean,
            variance,
            gconst,
        })
    }

    fn transp(&mut self) -> Result<Transition, AcModelError> {
        self.expect_keyword("TRANSP")?;
        let dim = self.count()?;
        let matrix = (0..dim)
            .map(|_| self.floats(dim))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Transition::new(matrix))
    }
}
