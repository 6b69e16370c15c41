// Dice formula parsing and rolling
// Formulas look like `3d6 + 1d4 + 5`: terms joined by `+`, spaces ignored.

use std::num::IntErrorKind;

use rand::Rng;
use thiserror::Error;

pub const MAX_DICE: u32 = 100;
pub const MAX_SIDES: u32 = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    /// A term is neither `XdY` nor an integer
    #[error("could not parse term `{0}`")]
    InvalidTerm(String),
    /// Dice count or side count outside the allowed range
    #[error("term `{0}` is out of range (1-100 dice, 1-1000 sides)")]
    OutOfRange(String),
    #[error("total overflowed")]
    Overflow,
}

/// One `+`-separated piece of a formula
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Dice { text: String, count: u32, sides: u32 },
    Modifier(i64),
}

/// Result of rolling a single term
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermRoll {
    Dice { text: String, rolls: Vec<u32>, sum: i64 },
    Modifier(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    pub terms: Vec<TermRoll>,
    pub total: i64,
}

/// Parse and validate a whole formula. Nothing is rolled if any term is invalid.
pub fn parse_formula(formula: &str) -> Result<Vec<Term>, DiceError> {
    let cleaned: String = formula
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    cleaned.split('+').map(parse_term).collect()
}

fn parse_term(part: &str) -> Result<Term, DiceError> {
    let invalid = || DiceError::InvalidTerm(part.to_string());

    if !part.contains('d') {
        let modifier = part.parse::<i64>().map_err(|_| invalid())?;
        return Ok(Term::Modifier(modifier));
    }

    let (count, sides) = part.split_once('d').ok_or_else(invalid)?;
    // `d6` is shorthand for `1d6`
    let count = if count.is_empty() {
        1
    } else {
        parse_bound(count, part)?
    };
    let sides = parse_bound(sides, part)?;

    let in_range = (1..=i64::from(MAX_DICE)).contains(&count)
        && (1..=i64::from(MAX_SIDES)).contains(&sides);
    if !in_range {
        return Err(DiceError::OutOfRange(part.to_string()));
    }

    Ok(Term::Dice {
        text: part.to_string(),
        count: count as u32,
        sides: sides as u32,
    })
}

/// Parse a dice count or side count. A well-formed number too large for
/// `i64` is out of range, not malformed.
fn parse_bound(digits: &str, part: &str) -> Result<i64, DiceError> {
    digits.parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            DiceError::OutOfRange(part.to_string())
        }
        _ => DiceError::InvalidTerm(part.to_string()),
    })
}

/// Roll already validated terms
pub fn roll_terms<R: Rng>(terms: &[Term], rng: &mut R) -> Result<RollOutcome, DiceError> {
    let mut total: i64 = 0;
    let mut rolled = Vec::with_capacity(terms.len());

    for term in terms {
        match term {
            Term::Dice { text, count, sides } => {
                let rolls: Vec<u32> = (0..*count).map(|_| rng.random_range(1..=*sides)).collect();
                let sum: i64 = rolls.iter().map(|&r| i64::from(r)).sum();
                total = total.checked_add(sum).ok_or(DiceError::Overflow)?;
                rolled.push(TermRoll::Dice {
                    text: text.clone(),
                    rolls,
                    sum,
                });
            }
            Term::Modifier(modifier) => {
                total = total.checked_add(*modifier).ok_or(DiceError::Overflow)?;
                rolled.push(TermRoll::Modifier(*modifier));
            }
        }
    }

    Ok(RollOutcome {
        terms: rolled,
        total,
    })
}

/// Parse and roll in one go
pub fn roll<R: Rng>(formula: &str, rng: &mut R) -> Result<RollOutcome, DiceError> {
    let terms = parse_formula(formula)?;
    roll_terms(&terms, rng)
}

impl TermRoll {
    /// One line of the roll breakdown shown to users
    pub fn describe(&self) -> String {
        match self {
            TermRoll::Dice { text, rolls, sum } => {
                format!("`{}`: {:?} (Soma: {})", text, rolls, sum)
            }
            TermRoll::Modifier(modifier) => format!("Modificador: `{:+}`", modifier),
        }
    }
}
