//! Specification values that override the built-in size constants.
//!
//! A [`SpecRegistry`] is assembled once from an ordered list of
//! [`SpecValues`] layers, later layers shadowing earlier ones, and is
//! read-only afterwards.  Size annotations refer to registry entries by name
//! or through small arithmetic expressions such as `SYNC_COMMITTEE_SIZE/8`.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::*;

use crate::error::{DynSszError, DynSszResult};

/// One layer of named specification values, as loaded from a preset file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecValues(BTreeMap<String, u64>);

impl SpecValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a layer from name/value pairs, rejecting names given twice.
    pub fn try_from_pairs<I, K>(pairs: I) -> DynSszResult<Self>
    where
        I: IntoIterator<Item = (K, u64)>,
        K: Into<String>,
    {
        let mut values = BTreeMap::new();
        for (name, value) in pairs {
            let name = name.into();
            if values.contains_key(&name) {
                return Err(DynSszError::Configuration(format!(
                    "duplicate spec value '{name}'"
                )));
            }
            values.insert(name, value);
        }
        Ok(Self(values))
    }

    /// Sets a value, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: u64) -> Option<u64> {
        self.0.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.0.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, u64>> for SpecValues {
    fn from(value: BTreeMap<String, u64>) -> Self {
        Self(value)
    }
}

/// Collecting keeps the last value of a name given more than once, like
/// [`SpecValues::insert`].  Use [`SpecValues::try_from_pairs`] to reject
/// duplicates instead.
impl<K: Into<String>> FromIterator<(K, u64)> for SpecValues {
    fn from_iter<T: IntoIterator<Item = (K, u64)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Resolved, immutable mapping of specification names to values.
#[derive(Clone, Debug, Default)]
pub struct SpecRegistry {
    values: HashMap<String, u64>,
}

impl SpecRegistry {
    /// A registry without overrides; every annotation uses its default.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merges the layers in order, later layers winning on name collisions.
    pub fn from_layers<I>(layers: I) -> DynSszResult<Self>
    where
        I: IntoIterator<Item = SpecValues>,
    {
        let mut values = HashMap::new();

        for (layer_idx, layer) in layers.into_iter().enumerate() {
            for (name, value) in layer.0 {
                if !is_valid_name(&name) {
                    return Err(DynSszError::Configuration(format!(
                        "malformed spec value name '{name}' in layer {layer_idx}"
                    )));
                }

                if let Some(prev) = values.insert(name.clone(), value)
                    && prev != value
                {
                    debug!(%name, prev, value, layer_idx, "spec value shadowed by later layer");
                }
            }
        }

        Ok(Self { values })
    }

    /// Looks up a single named value.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Evaluates a spec expression.
    ///
    /// Returns `Ok(None)` if the expression is well-formed but references a
    /// name the registry does not hold.
    pub fn eval(&self, expr: &str) -> Result<Option<u64>, SpecExprError> {
        let tokens = tokenize(expr)?;
        let mut parser = ExprParser {
            tokens: &tokens,
            pos: 0,
            registry: self,
        };

        let value = parser.expr()?;
        if let Some(tok) = parser.peek() {
            return Err(SpecExprError::UnexpectedToken(tok.to_string()));
        }

        Ok(value)
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Errors from evaluating a spec expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecExprError {
    #[error("unexpected character '{0}' at {1}")]
    UnexpectedChar(char, usize),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),

    #[error("integer literal '{0}' out of range")]
    BadLiteral(String),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("division by zero")]
    DivisionByZero,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Num(u64),
    Name(&'a str),
    Op(char),
    Open,
    Close,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(n) => write!(f, "{n}"),
            Token::Name(n) => f.write_str(n),
            Token::Op(c) => write!(f, "{c}"),
            Token::Open => f.write_str("("),
            Token::Close => f.write_str(")"),
        }
    }
}

fn tokenize(expr: &str) -> Result<Vec<Token<'_>>, SpecExprError> {
    let bytes = expr.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' => i += 1,
            '+' | '-' | '*' | '/' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            ')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            '0'..='9' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let lit = &expr[start..i];
                let n = lit
                    .parse::<u64>()
                    .map_err(|_| SpecExprError::BadLiteral(lit.to_owned()))?;
                tokens.push(Token::Num(n));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                tokens.push(Token::Name(&expr[start..i]));
            }
            _ => {
                // Report the full char, not the raw byte.
                let ch = expr[i..].chars().next().unwrap_or(c);
                return Err(SpecExprError::UnexpectedChar(ch, i));
            }
        }
    }

    Ok(tokens)
}

/// Recursive descent over `expr := term (('+'|'-') term)*`,
/// `term := factor (('*'|'/') factor)*`, `factor := num | name | '(' expr ')'`.
struct ExprParser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    registry: &'t SpecRegistry,
}

impl ExprParser<'_, '_> {
    fn peek(&self) -> Option<&Token<'_>> {
        self.tokens.get(self.pos)
    }

    fn expr(&mut self) -> Result<Option<u64>, SpecExprError> {
        let mut acc = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.tokens.get(self.pos) {
            let op = *op;
            self.pos += 1;
            let rhs = self.term()?;
            acc = apply(op, acc, rhs)?;
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<Option<u64>, SpecExprError> {
        let mut acc = self.factor()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.tokens.get(self.pos) {
            let op = *op;
            self.pos += 1;
            let rhs = self.factor()?;
            acc = apply(op, acc, rhs)?;
        }
        Ok(acc)
    }

    fn factor(&mut self) -> Result<Option<u64>, SpecExprError> {
        let Some(tok) = self.tokens.get(self.pos) else {
            return Err(SpecExprError::UnexpectedEnd);
        };
        self.pos += 1;

        match tok {
            Token::Num(n) => Ok(Some(*n)),
            Token::Name(name) => Ok(self.registry.get(name)),
            Token::Open => {
                let inner = self.expr()?;
                match self.tokens.get(self.pos) {
                    Some(Token::Close) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    Some(other) => Err(SpecExprError::UnexpectedToken(other.to_string())),
                    None => Err(SpecExprError::UnexpectedEnd),
                }
            }
            other => Err(SpecExprError::UnexpectedToken(other.to_string())),
        }
    }
}

fn apply(op: char, lhs: Option<u64>, rhs: Option<u64>) -> Result<Option<u64>, SpecExprError> {
    let (Some(a), Some(b)) = (lhs, rhs) else {
        return Ok(None);
    };

    let res = match op {
        '+' => a.checked_add(b).ok_or(SpecExprError::Overflow)?,
        '-' => a.checked_sub(b).ok_or(SpecExprError::Overflow)?,
        '*' => a.checked_mul(b).ok_or(SpecExprError::Overflow)?,
        '/' => {
            if b == 0 {
                return Err(SpecExprError::DivisionByZero);
            }
            a / b
        }
        other => return Err(SpecExprError::UnexpectedToken(other.to_string())),
    };

    Ok(Some(res))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(pairs: &[(&str, u64)]) -> SpecRegistry {
        let layer = SpecValues::try_from_pairs(pairs.iter().map(|(k, v)| (*k, *v))).unwrap();
        SpecRegistry::from_layers([layer]).unwrap()
    }

    #[test]
    fn test_later_layer_wins() {
        let base: SpecValues = [("SLOTS_PER_EPOCH", 32u64), ("MAX_VALIDATORS", 64)]
            .into_iter()
            .collect();
        let overlay: SpecValues = [("SLOTS_PER_EPOCH", 8u64)].into_iter().collect();

        let reg = SpecRegistry::from_layers([base, overlay]).unwrap();
        assert_eq!(reg.get("SLOTS_PER_EPOCH"), Some(8));
        assert_eq!(reg.get("MAX_VALIDATORS"), Some(64));
        assert_eq!(reg.get("UNKNOWN"), None);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_empty_registry() {
        let reg = SpecRegistry::from_layers(Vec::new()).unwrap();
        assert!(reg.is_empty());
        assert_eq!(reg.get("ANYTHING"), None);
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let res = SpecValues::try_from_pairs([("A", 1u64), ("B", 2), ("A", 3)]);
        assert!(matches!(res, Err(DynSszError::Configuration(_))));
    }

    #[test]
    fn test_collect_keeps_last_duplicate() {
        let layer: SpecValues = [("A", 1u64), ("B", 2), ("A", 3)].into_iter().collect();
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.get("A"), Some(3));

        let strict = SpecValues::try_from_pairs([("A", 3u64), ("B", 2)]).unwrap();
        assert_eq!(layer, strict);
    }

    #[test]
    fn test_malformed_names_rejected() {
        for bad in ["", "1ABC", "WITH SPACE", "DASH-ED", "A/B"] {
            let layer: SpecValues = [(bad, 1u64)].into_iter().collect();
            let res = SpecRegistry::from_layers([layer]);
            assert!(
                matches!(res, Err(DynSszError::Configuration(_))),
                "name {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_eval_expressions() {
        let reg = registry(&[("SYNC_COMMITTEE_SIZE", 512), ("EPOCHS", 4)]);

        assert_eq!(reg.eval("SYNC_COMMITTEE_SIZE").unwrap(), Some(512));
        assert_eq!(reg.eval("SYNC_COMMITTEE_SIZE/8").unwrap(), Some(64));
        assert_eq!(reg.eval("2 + 3 * EPOCHS").unwrap(), Some(14));
        assert_eq!(reg.eval("(2 + 3) * EPOCHS").unwrap(), Some(20));
        assert_eq!(reg.eval("EPOCHS - 1").unwrap(), Some(3));
        assert_eq!(reg.eval("17").unwrap(), Some(17));
    }

    #[test]
    fn test_eval_unresolved_name() {
        let reg = registry(&[("A", 4)]);
        assert_eq!(reg.eval("MISSING").unwrap(), None);
        assert_eq!(reg.eval("A * MISSING").unwrap(), None);
    }

    #[test]
    fn test_eval_malformed() {
        let reg = registry(&[("A", 4)]);
        assert_eq!(reg.eval(""), Err(SpecExprError::UnexpectedEnd));
        assert_eq!(reg.eval("A +"), Err(SpecExprError::UnexpectedEnd));
        assert_eq!(reg.eval("(A"), Err(SpecExprError::UnexpectedEnd));
        assert!(matches!(reg.eval("A A"), Err(SpecExprError::UnexpectedToken(_))));
        assert!(matches!(reg.eval("A % 2"), Err(SpecExprError::UnexpectedChar('%', 2))));
        assert_eq!(reg.eval("A / 0"), Err(SpecExprError::DivisionByZero));
        assert_eq!(reg.eval("1 - A"), Err(SpecExprError::Overflow));
    }

    #[test]
    fn test_spec_values_from_toml() {
        let layer: SpecValues = toml::from_str(
            r#"
            SLOTS_PER_EPOCH = 8
            SYNC_COMMITTEE_SIZE = 32
            "#,
        )
        .unwrap();

        assert_eq!(layer.get("SLOTS_PER_EPOCH"), Some(8));
        assert_eq!(layer.get("SYNC_COMMITTEE_SIZE"), Some(32));
        assert_eq!(layer.len(), 2);
    }
}
