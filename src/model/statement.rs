//! Graph terms and statements: the output side of the transformation.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Terms
// ============================================================================

/// A globally unique graph identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Iri(pub String);

impl Iri {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Iri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Iri {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Iri {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A literal object value. The variant decides the datatype; `lexical()`
/// produces the canonical text form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Boolean(bool),
    /// Signed decimal (covers the 8/16/32/64-bit signed family).
    Int(i64),
    /// Unsigned decimal (covers the 8/16/32/64-bit unsigned family).
    UInt(u64),
    Float(f32),
    Double(f64),
    Text(String),
    LangText { text: String, lang: String },
    DateTime(DateTime<Utc>),
}

impl Literal {
    /// Text form of the literal, without quoting or datatype decoration.
    pub fn lexical(&self) -> String {
        match self {
            Literal::Boolean(b) => b.to_string(),
            Literal::Int(i) => i.to_string(),
            Literal::UInt(u) => u.to_string(),
            Literal::Float(v) => v.to_string(),
            Literal::Double(v) => v.to_string(),
            Literal::Text(s) => s.clone(),
            Literal::LangText { text, .. } => text.clone(),
            Literal::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Datatype IRI, or `None` for a language-tagged literal (whose type is
    /// implied by the tag).
    pub fn datatype(&self) -> Option<&'static str> {
        match self {
            Literal::Boolean(_) => Some("http://www.w3.org/2001/XMLSchema#boolean"),
            Literal::Int(_) => Some("http://www.w3.org/2001/XMLSchema#long"),
            Literal::UInt(_) => Some("http://www.w3.org/2001/XMLSchema#unsignedLong"),
            Literal::Float(_) => Some("http://www.w3.org/2001/XMLSchema#float"),
            Literal::Double(_) => Some("http://www.w3.org/2001/XMLSchema#double"),
            Literal::Text(_) => Some("http://www.w3.org/2001/XMLSchema#string"),
            Literal::LangText { .. } => None,
            Literal::DateTime(_) => Some("http://www.w3.org/2001/XMLSchema#dateTime"),
        }
    }

    pub fn language(&self) -> Option<&str> {
        match self {
            Literal::LangText { lang, .. } => Some(lang),
            _ => None,
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lexical())
    }
}

/// Either an IRI or a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Term {
    Iri(Iri),
    Literal(Literal),
}

impl From<Iri> for Term {
    fn from(value: Iri) -> Self {
        Term::Iri(value)
    }
}

impl From<Literal> for Term {
    fn from(value: Literal) -> Self {
        Term::Literal(value)
    }
}

// ============================================================================
// Statements
// ============================================================================

/// One subject–predicate–object fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub subject: Iri,
    pub predicate: Iri,
    pub object: Term,
}

/// The append-only statement buffer produced by one transformation run,
/// together with the namespace prefixes registered for serialization.
///
/// Statements are only handed to a sink after the run completes, so an
/// aborted run never exposes a partial set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementSet {
    prefixes: Vec<(String, String)>,
    statements: Vec<Statement>,
}

impl StatementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subject: Iri, predicate: Iri, object: impl Into<Term>) {
        self.statements.push(Statement { subject, predicate, object: object.into() });
    }

    /// Register a serialization prefix. Re-registering a prefix replaces
    /// its namespace.
    pub fn set_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        let prefix = prefix.into();
        let namespace = namespace.into();
        if let Some(entry) = self.prefixes.iter_mut().find(|(p, _)| *p == prefix) {
            entry.1 = namespace;
        } else {
            self.prefixes.push((prefix, namespace));
        }
    }

    pub fn prefixes(&self) -> &[(String, String)] {
        &self.prefixes
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter()
    }

    /// Membership check, order-insensitive.
    pub fn contains(&self, subject: &Iri, predicate: &Iri, object: &Term) -> bool {
        self.statements
            .iter()
            .any(|s| s.subject == *subject && s.predicate == *predicate && s.object == *object)
    }

    /// All objects recorded under (subject, predicate), in insertion order.
    pub fn objects_of(&self, subject: &Iri, predicate: &Iri) -> Vec<&Term> {
        self.statements
            .iter()
            .filter(|s| s.subject == *subject && s.predicate == *predicate)
            .map(|s| &s.object)
            .collect()
    }

    /// Append all statements of `other` (prefixes are not merged).
    pub fn extend(&mut self, other: StatementSet) {
        self.statements.extend(other.statements);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn lexical_forms() {
        assert_eq!(Literal::Boolean(true).lexical(), "true");
        assert_eq!(Literal::Int(-42).lexical(), "-42");
        assert_eq!(Literal::UInt(u64::MAX).lexical(), "18446744073709551615");
        assert_eq!(Literal::Text("hello".into()).lexical(), "hello");
        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(Literal::DateTime(dt).lexical(), "2024-05-01T12:00:00.000Z");
    }

    #[test]
    fn lang_literal_has_no_datatype() {
        let lit = Literal::LangText { text: "Kessel".into(), lang: "de".into() };
        assert_eq!(lit.datatype(), None);
        assert_eq!(lit.language(), Some("de"));
        assert!(Literal::Text("x".into()).language().is_none());
    }

    #[test]
    fn statement_set_queries() {
        let mut set = StatementSet::new();
        let s = Iri::new("http://example.org/s");
        let p = Iri::new("http://example.org/p");
        set.add(s.clone(), p.clone(), Literal::Int(1));
        set.add(s.clone(), p.clone(), Literal::Int(2));

        assert_eq!(set.len(), 2);
        assert!(set.contains(&s, &p, &Term::Literal(Literal::Int(1))));
        assert_eq!(set.objects_of(&s, &p).len(), 2);
    }

    #[test]
    fn prefix_registration_replaces() {
        let mut set = StatementSet::new();
        set.set_prefix("DI", "http://opcfoundation.org/UA/DI/");
        set.set_prefix("DI", "http://opcfoundation.org/UA/DI/v2/");
        assert_eq!(set.prefixes().len(), 1);
        assert_eq!(set.prefixes()[0].1, "http://opcfoundation.org/UA/DI/v2/");
    }
}
