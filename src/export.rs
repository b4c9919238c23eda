//! Statement-set serialization — N-Triples and Turtle over any `Write`.
//!
//! ```text
//! StatementSet → export_ntriples() / export_turtle() → line-based graph text
//!   → load into any triple store, or persist via FileSink
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::model::{Literal, StatementSet, Term};
use crate::Result;

/// Serialization format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    NTriples,
    Turtle,
}

impl GraphFormat {
    pub fn file_extension(&self) -> &'static str {
        match self {
            GraphFormat::NTriples => "nt",
            GraphFormat::Turtle => "ttl",
        }
    }
}

// ============================================================================
// Writers
// ============================================================================

/// Write the set as N-Triples, one statement per line.
pub fn export_ntriples(set: &StatementSet, writer: &mut dyn Write) -> Result<()> {
    for statement in set.iter() {
        writeln!(
            writer,
            "<{}> <{}> {} .",
            statement.subject, statement.predicate,
            format_term(&statement.object)
        )?;
    }
    Ok(())
}

/// Write the set as Turtle with `@prefix` directives for every registered
/// prefix that forms a valid prefix name.
pub fn export_turtle(set: &StatementSet, writer: &mut dyn Write) -> Result<()> {
    let prefixes: Vec<&(String, String)> =
        set.prefixes().iter().filter(|(p, _)| is_valid_prefix(p)).collect();
    for (prefix, namespace) in &prefixes {
        writeln!(writer, "@prefix {prefix}: <{namespace}> .")?;
    }
    if !prefixes.is_empty() {
        writeln!(writer)?;
    }
    for statement in set.iter() {
        let subject = abbreviate(statement.subject.as_str(), &prefixes);
        let predicate = abbreviate(statement.predicate.as_str(), &prefixes);
        let object = match &statement.object {
            Term::Iri(iri) => abbreviate(iri.as_str(), &prefixes),
            literal => format_term(literal),
        };
        writeln!(writer, "{subject} {predicate} {object} .")?;
    }
    Ok(())
}

fn format_term(term: &Term) -> String {
    match term {
        Term::Iri(iri) => format!("<{iri}>"),
        Term::Literal(literal) => format_literal(literal),
    }
}

fn format_literal(literal: &Literal) -> String {
    let quoted = format!("\"{}\"", escape(&literal.lexical()));
    if let Some(lang) = literal.language() {
        return format!("{quoted}@{lang}");
    }
    match literal.datatype() {
        // Simple literals carry xsd:string implicitly.
        Some("http://www.w3.org/2001/XMLSchema#string") | None => quoted,
        Some(datatype) => format!("{quoted}^^<{datatype}>"),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

fn is_valid_prefix(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn abbreviate(iri: &str, prefixes: &[&(String, String)]) -> String {
    for (prefix, namespace) in prefixes {
        if let Some(local) = iri.strip_prefix(namespace.as_str()) {
            if !local.is_empty()
                && local.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return format!("{prefix}:{local}");
            }
        }
    }
    format!("<{iri}>")
}

// ============================================================================
// Sinks
// ============================================================================

/// The persistence seam: accepts one finished statement set.
pub trait GraphSink {
    fn write(&self, set: &StatementSet, format: GraphFormat) -> Result<()>;
}

/// Writes a statement set to a file on disk.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl GraphSink for FileSink {
    fn write(&self, set: &StatementSet, format: GraphFormat) -> Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        match format {
            GraphFormat::NTriples => export_ntriples(set, &mut writer)?,
            GraphFormat::Turtle => export_turtle(set, &mut writer)?,
        }
        writer.flush()?;
        Ok(())
    }
}
