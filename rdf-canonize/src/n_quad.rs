//! Parsing and serialization of line-based RDF (N-Triples / N-Quads).

use std::collections::HashSet;

use regex::Regex;

use crate::error::CanonizeError;

pub const RDF_LANGSTRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

lazy_static::lazy_static! {
    static ref EOLN: Regex = Regex::new(r"(?:\r\n)|(?:\n)|(?:\r)").expect("valid EOLN regex");
    static ref EMPTY: Regex = Regex::new(r"^[ \t]*$").expect("valid EMPTY regex");
    static ref UNESCAPE: Regex =
        Regex::new(r#"(?:\\([tbnrf"'\\]))|(?:\\u([0-9A-Fa-f]{4}))|(?:\\U([0-9A-Fa-f]{8}))"#)
            .expect("valid UNESCAPE regex");
    static ref QUAD: Regex = {
        let pn_chars_base = "A-Za-z\u{00C0}-\u{00D6}\u{00D8}-\u{00F6}\u{00F8}-\u{02FF}\u{0370}-\u{037D}\u{037F}-\u{1FFF}\u{200C}-\u{200D}\u{2070}-\u{218F}\u{2C00}-\u{2FEF}\u{3001}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFFD}";
        let pn_chars_u = format!("{pn_chars_base}_");
        let pn_chars = format!("{pn_chars_u}0-9-\u{00B7}\u{0300}-\u{036F}\u{203F}-\u{2040}");

        let blank_node_label =
            format!("(_:(?:[{pn_chars_u}0-9])(?:(?:[{pn_chars}.])*(?:[{pn_chars}]))?)");
        let iri = "(?:<([^:]+:[^>]*)>)";
        let plain = "\"([^\"\\\\]*(?:\\\\.[^\"\\\\]*)*)\"";
        let data_type = format!("(?:\\^\\^{iri})");
        let language = "(?:@([a-zA-Z]+(?:-[a-zA-Z0-9]+)*))";
        let literal = format!("(?:{plain}(?:{data_type}|{language})?)");
        let ws = "[ \\t]+";
        let wso = "[ \\t]*";

        let subject = format!("(?:{iri}|{blank_node_label}){ws}");
        let property = format!("{iri}{ws}");
        let object = format!("(?:{iri}|{blank_node_label}|{literal}){wso}");
        let graph_name = format!("(?:\\.|(?:(?:{iri}|{blank_node_label}){wso}\\.))");

        Regex::new(&format!("^{wso}{subject}{property}{object}{graph_name}{wso}$"))
            .expect("valid N-Quad regex")
    };
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum TermType {
    NamedNode,
    BlankNode,
    Literal,
    DefaultGraph,
}

/// A single RDF term. Literal datatype/language live on the owning [`Quad`].
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Term {
    term_type: TermType,
    value: String,
}

impl Term {
    pub fn new(term_type: TermType, value: impl Into<String>) -> Self {
        Self {
            term_type,
            value: value.into(),
        }
    }

    pub fn named(iri: impl Into<String>) -> Self {
        Self::new(TermType::NamedNode, iri)
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Self::new(TermType::BlankNode, label)
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self::new(TermType::Literal, value)
    }

    pub fn default_graph() -> Self {
        Self::new(TermType::DefaultGraph, "")
    }

    pub fn term_type(&self) -> TermType {
        self.term_type
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_blank(&self) -> bool {
        self.term_type == TermType::BlankNode
    }
}

/// Datatype IRI and language tag of a literal object.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Literal {
    pub datatype: String,
    pub language: String,
}

impl Literal {
    pub fn typed(datatype: impl Into<String>) -> Self {
        Self {
            datatype: datatype.into(),
            language: String::new(),
        }
    }

    pub fn lang_string(language: impl Into<String>) -> Self {
        Self {
            datatype: RDF_LANGSTRING.to_string(),
            language: language.into(),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Quad {
    subject: Term,
    predicate: Term,
    object: Term,
    graph: Term,
    object_literal: Option<Literal>,
}

impl Quad {
    pub fn new(
        subject: Term,
        predicate: Term,
        object: Term,
        graph: Term,
        object_literal: Option<Literal>,
    ) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph,
            object_literal,
        }
    }

    pub fn subject(&self) -> &Term {
        &self.subject
    }

    pub fn predicate(&self) -> &Term {
        &self.predicate
    }

    pub fn object(&self) -> &Term {
        &self.object
    }

    pub fn graph(&self) -> &Term {
        &self.graph
    }

    pub fn object_literal(&self) -> Option<&Literal> {
        self.object_literal.as_ref()
    }

    /// Same quad with every blank node passed through `relabel`.
    pub(crate) fn map_blank_nodes(&self, mut relabel: impl FnMut(&str) -> String) -> Self {
        let mut map = |term: &Term| {
            if term.is_blank() {
                Term::blank(relabel(term.value()))
            } else {
                term.clone()
            }
        };
        Self {
            subject: map(&self.subject),
            predicate: self.predicate.clone(),
            object: map(&self.object),
            graph: map(&self.graph),
            object_literal: self.object_literal.clone(),
        }
    }
}

pub struct NQuads;

impl NQuads {
    /// Parses N-Quads text. Blank lines are skipped and duplicate quads
    /// (same terms in the same graph) are dropped, keeping first occurrence.
    pub fn parse(input: &str) -> Result<Vec<Quad>, CanonizeError> {
        let mut dataset = Vec::new();
        let mut seen: HashSet<Quad> = HashSet::new();

        for (line_number, line) in EOLN.split(input).enumerate() {
            if EMPTY.is_match(line) {
                continue;
            }

            let quad = Self::parse_line(line).ok_or_else(|| {
                CanonizeError::Parsing(format!(
                    "Failed to match N-Quad pattern on line {}.",
                    line_number + 1
                ))
            })?;

            if seen.insert(quad.clone()) {
                dataset.push(quad);
            }
        }

        Ok(dataset)
    }

    fn parse_line(line: &str) -> Option<Quad> {
        let captures = QUAD.captures(line)?;

        let subject = match captures.get(1) {
            Some(iri) => Term::named(iri.as_str()),
            None => Term::blank(captures.get(2)?.as_str()),
        };

        let predicate = Term::named(captures.get(3)?.as_str());

        let (object, object_literal) = if let Some(iri) = captures.get(4) {
            (Term::named(iri.as_str()), None)
        } else if let Some(label) = captures.get(5) {
            (Term::blank(label.as_str()), None)
        } else {
            let value = Self::unescape(captures.get(6)?.as_str());
            let literal = match (captures.get(7), captures.get(8)) {
                (Some(datatype), _) => Literal::typed(datatype.as_str()),
                (None, Some(language)) => Literal::lang_string(language.as_str()),
                (None, None) => Literal::typed(XSD_STRING),
            };
            (Term::literal(value), Some(literal))
        };

        let graph = if let Some(iri) = captures.get(9) {
            Term::named(iri.as_str())
        } else if let Some(label) = captures.get(10) {
            Term::blank(label.as_str())
        } else {
            Term::default_graph()
        };

        Some(Quad::new(subject, predicate, object, graph, object_literal))
    }

    /// Serializes a quad as one N-Quads line terminated by `" .\n"`.
    pub fn serialize_quad(quad: &Quad) -> Result<String, CanonizeError> {
        Self::serialize_quad_components(
            &quad.subject,
            &quad.predicate,
            &quad.object,
            &quad.graph,
            quad.object_literal.as_ref(),
        )
    }

    pub fn serialize_quad_components(
        s: &Term,
        p: &Term,
        o: &Term,
        g: &Term,
        o_l: Option<&Literal>,
    ) -> Result<String, CanonizeError> {
        let mut nquad = String::new();

        match s.term_type {
            TermType::NamedNode => nquad.push_str(&format!("<{}>", s.value)),
            TermType::BlankNode => nquad.push_str(&s.value),
            _ => {
                return Err(CanonizeError::Serializing(
                    "Subject must be a NamedNode or BlankNode".to_string(),
                ));
            }
        }

        if p.term_type != TermType::NamedNode {
            return Err(CanonizeError::Serializing(
                "Predicate must be a NamedNode".to_string(),
            ));
        }
        nquad.push_str(&format!(" <{}> ", p.value));

        match o.term_type {
            TermType::NamedNode => nquad.push_str(&format!("<{}>", o.value)),
            TermType::BlankNode => nquad.push_str(&o.value),
            TermType::Literal => {
                nquad.push_str(&format!("\"{}\"", Self::escape(&o.value)));
                if let Some(literal) = o_l {
                    if literal.datatype == RDF_LANGSTRING {
                        if !literal.language.is_empty() {
                            nquad.push_str(&format!("@{}", literal.language));
                        }
                    } else if literal.datatype != XSD_STRING {
                        nquad.push_str(&format!("^^<{}>", literal.datatype));
                    }
                }
            }
            TermType::DefaultGraph => {
                return Err(CanonizeError::Serializing(
                    "Object must be a NamedNode, BlankNode, or Literal".to_string(),
                ));
            }
        }

        match g.term_type {
            TermType::NamedNode => nquad.push_str(&format!(" <{}>", g.value)),
            TermType::BlankNode => nquad.push_str(&format!(" {}", g.value)),
            TermType::DefaultGraph => {}
            TermType::Literal => {
                return Err(CanonizeError::Serializing(
                    "Graph must be a NamedNode, BlankNode, or DefaultGraph".to_string(),
                ));
            }
        }

        nquad.push_str(" .\n");
        Ok(nquad)
    }

    fn escape(s: &str) -> String {
        if !s.contains(['"', '\\', '\n', '\r']) {
            return s.to_string();
        }

        let mut escaped = String::with_capacity(s.len() + 8);
        for ch in s.chars() {
            match ch {
                '"' => escaped.push_str("\\\""),
                '\\' => escaped.push_str("\\\\"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    fn unescape(s: &str) -> String {
        if !UNESCAPE.is_match(s) {
            return s.to_string();
        }

        UNESCAPE
            .replace_all(s, |caps: &regex::Captures| {
                if let Some(escaped) = caps.get(1) {
                    match escaped.as_str() {
                        "t" => "\t".to_string(),
                        "b" => "\u{8}".to_string(),
                        "n" => "\n".to_string(),
                        "r" => "\r".to_string(),
                        "f" => "\u{c}".to_string(),
                        other => other.to_string(),
                    }
                } else {
                    let hex = caps.get(2).or_else(|| caps.get(3));
                    hex.and_then(|hex| u32::from_str_radix(hex.as_str(), 16).ok())
                        .and_then(char::from_u32)
                        .map(String::from)
                        // unrepresentable code points stay escaped
                        .unwrap_or_else(|| caps[0].to_string())
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_parse_all_term_kinds() {
        let input = r#"<http://ex.org/s> <http://ex.org/p> <http://ex.org/o> .
_:b0 <http://ex.org/p> "plain" .
_:b0 <http://ex.org/p> "hallo"@de <http://ex.org/g> .
<http://ex.org/s> <http://ex.org/p> "5"^^<http://www.w3.org/2001/XMLSchema#integer> _:g ."#;

        let quads = NQuads::parse(input).unwrap();
        assert_eq!(quads.len(), 4);
        assert_eq!(quads[0].object().term_type(), TermType::NamedNode);
        assert_eq!(quads[1].subject().term_type(), TermType::BlankNode);
        assert_eq!(quads[1].object_literal().unwrap().datatype, XSD_STRING);
        assert_eq!(quads[2].object_literal().unwrap().language, "de");
        assert_eq!(quads[2].graph().value(), "http://ex.org/g");
        assert_eq!(quads[3].graph().term_type(), TermType::BlankNode);
    }

    #[test]
    fn test_parse_drops_duplicates_and_blank_lines() {
        let input = "<http://a> <http://b> \"c\" .\n\n   \n<http://a> <http://b> \"c\" .\n";
        assert_eq!(NQuads::parse(input).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_rejects_malformed_line() {
        let err = NQuads::parse("<http://a> <http://b> .").unwrap_err();
        assert!(matches!(err, CanonizeError::Parsing(msg) if msg.contains("line 1")));
    }

    #[test]
    fn test_serialize_round_trips_escapes() {
        let line = "<http://a> <http://b> \"say \\\"hi\\\"\\nnow\" .";
        let quads = NQuads::parse(line).unwrap();
        assert_eq!(quads[0].object().value(), "say \"hi\"\nnow");
        assert_eq!(
            NQuads::serialize_quad(&quads[0]).unwrap(),
            format!("{line}\n")
        );
    }

    #[test]
    fn test_unescape_unicode() {
        let quads = NQuads::parse("<http://a> <http://b> \"caf\\u00E9\" .").unwrap();
        assert_eq!(quads[0].object().value(), "café");
    }
}
