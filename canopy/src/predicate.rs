//! Structured filter predicates.
//!
//! Predicates are built from tagged [`Clause`]s and serialized into the service's SQL-like
//! `where` syntax in one place, the [`Display`] implementation. User supplied text only enters a
//! predicate as a [`Literal`], and a literal is only ever written out through
//! [`escape_literal`], so a value containing quote characters can never break the predicate
//! structure.

use std::fmt::{Display, Formatter};

use crate::feature::FeatureRecord;

/// Doubles every single quote of the value, making it safe to embed between single quotes.
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// String literal of a predicate. Keeps the raw value; it is escaped when serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    raw: String,
}

impl Literal {
    /// Creates a literal from the raw (unescaped) value.
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Unescaped value.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}'", escape_literal(&self.raw))
    }
}

/// A single condition of a predicate.
///
/// Field names come from the application configuration and are written out as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Matches every record: `1=1`.
    MatchAll,
    /// Matches no record: `1=0`.
    MatchNone,
    /// Exact match: `Field = 'value'`.
    Equals {
        /// Field name.
        field: String,
        /// Expected value.
        value: Literal,
    },
    /// Case-insensitive substring match: `LOWER(Field) LIKE LOWER('%value%')`.
    ContainsIgnoreCase {
        /// Field name.
        field: String,
        /// Substring to look for.
        value: Literal,
    },
    /// Membership test: `Field IN ('a','b')`.
    InList {
        /// Field name.
        field: String,
        /// Accepted values. Must not be empty.
        values: Vec<Literal>,
    },
}

impl Clause {
    /// Exact match clause.
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            field: field.into(),
            value: Literal::new(value),
        }
    }

    /// Case-insensitive substring clause.
    pub fn contains_ignore_case(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ContainsIgnoreCase {
            field: field.into(),
            value: Literal::new(value),
        }
    }

    /// Membership clause. An empty value list produces [`Clause::MatchNone`].
    pub fn in_list<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<Literal> = values.into_iter().map(Literal::new).collect();
        if values.is_empty() {
            return Self::MatchNone;
        }

        Self::InList {
            field: field.into(),
            values,
        }
    }

    /// Evaluates the clause against a record. Field names are compared ignoring case.
    pub fn matches(&self, record: &FeatureRecord) -> bool {
        let text = |field: &str| {
            record
                .attribute_ignore_case(field)
                .filter(|v| !v.is_null())
                .map(|v| v.to_string())
        };

        match self {
            Clause::MatchAll => true,
            Clause::MatchNone => false,
            Clause::Equals { field, value } => text(field).is_some_and(|v| v == value.raw()),
            Clause::ContainsIgnoreCase { field, value } => text(field).is_some_and(|v| {
                like(
                    &v.to_lowercase(),
                    &format!("%{}%", value.raw().to_lowercase()),
                )
            }),
            Clause::InList { field, values } => {
                text(field).is_some_and(|v| values.iter().any(|l| l.raw() == v))
            }
        }
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Clause::MatchAll => f.write_str("1=1"),
            Clause::MatchNone => f.write_str("1=0"),
            Clause::Equals { field, value } => write!(f, "{field} = {value}"),
            Clause::ContainsIgnoreCase { field, value } => {
                let pattern = Literal::new(format!("%{}%", value.raw()));
                write!(f, "LOWER({field}) LIKE LOWER({pattern})")
            }
            Clause::InList { field, values } => {
                write!(f, "{field} IN (")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Conjunction of clauses. A predicate without clauses matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    /// Predicate matching every record.
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Predicate matching no record.
    pub fn match_none() -> Self {
        Self::from(Clause::MatchNone)
    }

    /// Adds a clause to the conjunction.
    pub fn and(mut self, clause: Clause) -> Self {
        if clause != Clause::MatchAll {
            self.clauses.push(clause);
        }
        self
    }

    /// Clauses of the predicate.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// True if the predicate has no restricting clause.
    pub fn is_match_all(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluates the predicate against a record.
    pub fn matches(&self, record: &FeatureRecord) -> bool {
        self.clauses.iter().all(|c| c.matches(record))
    }
}

impl From<Clause> for Predicate {
    fn from(clause: Clause) -> Self {
        Self::default().and(clause)
    }
}

impl FromIterator<Clause> for Predicate {
    fn from_iter<T: IntoIterator<Item = Clause>>(iter: T) -> Self {
        iter.into_iter().fold(Self::default(), Self::and)
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.clauses.is_empty() {
            return Clause::MatchAll.fmt(f);
        }

        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{clause}")?;
        }

        Ok(())
    }
}

// SQL LIKE with `%` (any run) and `_` (any single character) wildcards.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    // matched[j]: pattern[..j] matches the processed text prefix
    let mut matched = vec![false; pattern.len() + 1];
    matched[0] = true;
    for j in 1..=pattern.len() {
        matched[j] = matched[j - 1] && pattern[j - 1] == '%';
    }

    for c in text {
        let mut next = vec![false; pattern.len() + 1];
        for j in 1..=pattern.len() {
            next[j] = match pattern[j - 1] {
                '%' => next[j - 1] || matched[j],
                '_' => matched[j - 1],
                p => matched[j - 1] && p == c,
            };
        }
        matched = next;
    }

    matched[pattern.len()]
}
