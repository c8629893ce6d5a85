//! JSON-LD to RDF conversion for the subset of JSON-LD used by knowledge assets.
//!
//! Supported: inline contexts (terms, prefixes, `@vocab`, `@base`, `@language`,
//! `@type` coercion, `@list`/`@set`/`@language` containers, keyword aliases),
//! node objects, value objects, lists, `@graph` and native literals. Remote
//! contexts other than schema.org are rejected.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::{
    error::CanonizeError,
    identifier_issuer::IdentifierIssuer,
    n_quad::{Literal, Quad, Term, XSD_STRING},
};

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

const SCHEMA_ORG_VOCAB: &str = "http://schema.org/";
const SCHEMA_ORG_CONTEXTS: [&str; 4] = [
    "http://schema.org",
    "http://schema.org/",
    "https://schema.org",
    "https://schema.org/",
];

type Result<T> = std::result::Result<T, CanonizeError>;

fn error(message: impl Into<String>) -> CanonizeError {
    CanonizeError::JsonLd(message.into())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TypeMapping {
    Id,
    Vocab,
    Datatype(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    List,
    Set,
    Language,
}

#[derive(Debug, Clone, Default)]
struct TermDefinition {
    /// `None` when the term is explicitly mapped to null.
    id: Option<String>,
    type_mapping: Option<TypeMapping>,
    container: Option<Container>,
    /// `Some(None)` clears the default language for this term.
    language: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
struct Context {
    terms: HashMap<String, TermDefinition>,
    vocab: Option<String>,
    base: Option<String>,
    language: Option<String>,
}

fn is_keyword(value: &str) -> bool {
    value.starts_with('@')
}

fn is_absolute(iri: &str) -> bool {
    match iri.split_once(':') {
        Some((scheme, _)) => {
            scheme
                .as_bytes()
                .first()
                .is_some_and(|byte| byte.is_ascii_alphabetic())
                && scheme
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.')
        }
        None => false,
    }
}

fn resolve_relative(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return base.to_string();
    }
    if relative.starts_with('#') {
        let without_fragment = base.split('#').next().unwrap_or(base);
        return format!("{without_fragment}{relative}");
    }
    if relative.starts_with('/') {
        if let Some(scheme_end) = base.find("://") {
            let authority_end = base[scheme_end + 3..]
                .find('/')
                .map_or(base.len(), |offset| scheme_end + 3 + offset);
            return format!("{}{relative}", &base[..authority_end]);
        }
        return relative.to_string();
    }
    match base.rfind('/') {
        Some(index) => format!("{}{relative}", &base[..=index]),
        None => format!("{base}{relative}"),
    }
}

impl Context {
    fn parse(&self, value: &Value) -> Result<Context> {
        match value {
            Value::Null => Ok(Context::default()),
            Value::String(url) => self.with_remote(url),
            Value::Array(items) => items
                .iter()
                .try_fold(self.clone(), |context, item| context.parse(item)),
            Value::Object(map) => self.with_definitions(map),
            other => Err(error(format!("Invalid @context value: {other}"))),
        }
    }

    fn with_remote(&self, url: &str) -> Result<Context> {
        if !SCHEMA_ORG_CONTEXTS.contains(&url) {
            return Err(error(format!("Remote context {url} cannot be loaded")));
        }

        let mut context = self.clone();
        context.vocab = Some(SCHEMA_ORG_VOCAB.to_string());
        context.terms.insert(
            "schema".to_string(),
            TermDefinition {
                id: Some(SCHEMA_ORG_VOCAB.to_string()),
                ..Default::default()
            },
        );
        for (alias, keyword) in [("id", "@id"), ("type", "@type")] {
            context.terms.insert(
                alias.to_string(),
                TermDefinition {
                    id: Some(keyword.to_string()),
                    ..Default::default()
                },
            );
        }
        Ok(context)
    }

    fn with_definitions(&self, map: &Map<String, Value>) -> Result<Context> {
        let mut context = self.clone();

        if let Some(base) = map.get("@base") {
            context.base = match base {
                Value::Null => None,
                Value::String(iri) if is_absolute(iri) => Some(iri.clone()),
                Value::String(iri) => match &self.base {
                    Some(current) => Some(resolve_relative(current, iri)),
                    None => return Err(error(format!("Relative @base {iri} without a base"))),
                },
                other => return Err(error(format!("Invalid @base value: {other}"))),
            };
        }

        if let Some(vocab) = map.get("@vocab") {
            context.vocab = match vocab {
                Value::Null => None,
                Value::String(iri) => Some(
                    context
                        .expand_iri(iri, true)
                        .ok_or_else(|| error(format!("Invalid @vocab value: {iri}")))?,
                ),
                other => return Err(error(format!("Invalid @vocab value: {other}"))),
            };
        }

        if let Some(language) = map.get("@language") {
            context.language = match language {
                Value::Null => None,
                Value::String(tag) => Some(tag.to_lowercase()),
                other => return Err(error(format!("Invalid @language value: {other}"))),
            };
        }

        let mut defined: HashMap<String, bool> = HashMap::new();
        for term in map.keys() {
            if !is_keyword(term) {
                context.create_term(map, term, &mut defined)?;
            }
        }

        Ok(context)
    }

    fn create_term(
        &mut self,
        local: &Map<String, Value>,
        term: &str,
        defined: &mut HashMap<String, bool>,
    ) -> Result<()> {
        match defined.get(term) {
            Some(true) => return Ok(()),
            Some(false) => return Err(error(format!("Cyclic term definition for {term}"))),
            None => {}
        }
        defined.insert(term.to_string(), false);

        let Some(value) = local.get(term) else {
            defined.insert(term.to_string(), true);
            return Ok(());
        };

        let definition = match value {
            Value::Null => TermDefinition::default(),
            Value::String(iri) => TermDefinition {
                id: Some(self.expand_local(iri, local, defined)?),
                ..Default::default()
            },
            Value::Object(map) => self.expanded_definition(term, map, local, defined)?,
            other => return Err(error(format!("Invalid definition for {term}: {other}"))),
        };

        self.terms.insert(term.to_string(), definition);
        defined.insert(term.to_string(), true);
        Ok(())
    }

    fn expanded_definition(
        &mut self,
        term: &str,
        map: &Map<String, Value>,
        local: &Map<String, Value>,
        defined: &mut HashMap<String, bool>,
    ) -> Result<TermDefinition> {
        if map.contains_key("@reverse") {
            return Err(error(format!("@reverse in definition of {term} is not supported")));
        }
        if map.contains_key("@context") {
            return Err(error(format!("Scoped context in definition of {term} is not supported")));
        }

        let id = match map.get("@id") {
            Some(Value::Null) => None,
            Some(Value::String(iri)) => Some(self.expand_local(iri, local, defined)?),
            Some(other) => return Err(error(format!("Invalid @id for {term}: {other}"))),
            None if term.contains(':') => Some(self.expand_local(term, local, defined)?),
            None => match &self.vocab {
                Some(vocab) => Some(format!("{vocab}{term}")),
                None => return Err(error(format!("Cannot expand term {term} without @vocab"))),
            },
        };

        let type_mapping = match map.get("@type") {
            None => None,
            Some(Value::String(kind)) if kind == "@id" => Some(TypeMapping::Id),
            Some(Value::String(kind)) if kind == "@vocab" => Some(TypeMapping::Vocab),
            Some(Value::String(datatype)) => {
                let iri = self.expand_local(datatype, local, defined)?;
                if !is_absolute(&iri) {
                    return Err(error(format!("Invalid @type mapping for {term}: {datatype}")));
                }
                Some(TypeMapping::Datatype(iri))
            }
            Some(other) => return Err(error(format!("Invalid @type mapping for {term}: {other}"))),
        };

        let containers: Vec<&str> = match map.get("@container") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(container)) => vec![container.as_str()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(other) => return Err(error(format!("Invalid @container for {term}: {other}"))),
        };
        let container = containers.iter().find_map(|container| match *container {
            "@list" => Some(Container::List),
            "@set" => Some(Container::Set),
            "@language" => Some(Container::Language),
            _ => None,
        });

        let language = match map.get("@language") {
            None => None,
            Some(Value::Null) => Some(None),
            Some(Value::String(tag)) => Some(Some(tag.to_lowercase())),
            Some(other) => return Err(error(format!("Invalid @language for {term}: {other}"))),
        };

        Ok(TermDefinition {
            id,
            type_mapping,
            container,
            language,
        })
    }

    /// Expands an IRI inside a context being defined, creating the terms it
    /// depends on first.
    fn expand_local(
        &mut self,
        value: &str,
        local: &Map<String, Value>,
        defined: &mut HashMap<String, bool>,
    ) -> Result<String> {
        if is_keyword(value) {
            return Ok(value.to_string());
        }
        if local.contains_key(value) && defined.get(value) != Some(&true) {
            self.create_term(local, value, defined)?;
        }
        if let Some((prefix, _)) = value.split_once(':')
            && local.contains_key(prefix)
            && defined.get(prefix) != Some(&true)
        {
            self.create_term(local, prefix, defined)?;
        }
        self.expand_iri(value, true)
            .ok_or_else(|| error(format!("Cannot expand {value}")))
    }

    /// Expands a compact IRI, term or relative IRI. Returns `None` when the
    /// value cannot be turned into an absolute IRI or blank node label.
    fn expand_iri(&self, value: &str, vocab: bool) -> Option<String> {
        if is_keyword(value) || value.starts_with("_:") {
            return Some(value.to_string());
        }

        if vocab && let Some(definition) = self.terms.get(value) {
            return definition.id.clone();
        }

        if let Some((prefix, suffix)) = value.split_once(':') {
            if !suffix.starts_with("//")
                && let Some(TermDefinition {
                    id: Some(prefix_iri),
                    ..
                }) = self.terms.get(prefix)
            {
                return Some(format!("{prefix_iri}{suffix}"));
            }
            if is_absolute(value) {
                return Some(value.to_string());
            }
        }

        if vocab && let Some(vocab_iri) = &self.vocab {
            return Some(format!("{vocab_iri}{value}"));
        }

        self.base
            .as_ref()
            .map(|base| resolve_relative(base, value))
    }

    fn keyword_for<'a>(&'a self, key: &'a str) -> &'a str {
        if is_keyword(key) {
            return key;
        }
        match self.terms.get(key) {
            Some(TermDefinition { id: Some(id), .. }) if is_keyword(id) => id,
            _ => key,
        }
    }
}

/// Serializes a double the way JSON-LD does: `1.1E0`, `-2.5E-3`, `1.0E21`.
fn canonical_double(value: f64) -> String {
    let formatted = format!("{value:.15e}");
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let mut mantissa = mantissa.trim_end_matches('0').to_string();
    if mantissa.ends_with('.') {
        mantissa.push('0');
    }
    format!("{mantissa}E{exponent}")
}

struct RdfWriter {
    issuer: IdentifierIssuer,
    quads: Vec<Quad>,
}

type Object = (Term, Option<Literal>);

impl RdfWriter {
    fn new() -> Self {
        Self {
            issuer: IdentifierIssuer::new("_:b"),
            quads: Vec::new(),
        }
    }

    fn term_for(&mut self, iri: &str) -> Term {
        if iri.starts_with("_:") {
            Term::blank(self.issuer.get_id(Some(iri)))
        } else {
            Term::named(iri)
        }
    }

    fn emit(&mut self, subject: Term, predicate: &str, object: Object, graph: &Term) {
        let (object, literal) = object;
        self.quads.push(Quad::new(
            subject,
            Term::named(predicate),
            object,
            graph.clone(),
            literal,
        ));
    }

    fn document(&mut self, value: &Value, context: &Context, graph: &Term) -> Result<()> {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.document(item, context, graph)?;
                }
                Ok(())
            }
            Value::Object(map) => {
                self.node(map, context, graph)?;
                Ok(())
            }
            Value::Null => Ok(()),
            other => Err(error(format!("Top-level value must be an object: {other}"))),
        }
    }

    /// Writes a node object and returns its subject.
    fn node(
        &mut self,
        map: &Map<String, Value>,
        context: &Context,
        graph: &Term,
    ) -> Result<Option<Term>> {
        let scoped;
        let context = match map.get("@context") {
            Some(local) => {
                scoped = context.parse(local)?;
                &scoped
            }
            None => context,
        };

        let mut keys: HashMap<&str, &Value> = HashMap::new();
        let mut properties: Vec<(&str, &Value)> = Vec::new();
        for (key, value) in map {
            match context.keyword_for(key) {
                "@context" => {}
                keyword if is_keyword(keyword) => {
                    keys.insert(keyword, value);
                }
                _ => properties.push((key.as_str(), value)),
            }
        }

        if keys.contains_key("@reverse") {
            return Err(error("@reverse is not supported"));
        }
        if keys.contains_key("@value") || keys.contains_key("@list") {
            return Err(error("Value or list object used as a node"));
        }

        let graph_only = keys.contains_key("@graph")
            && !keys.contains_key("@id")
            && !keys.contains_key("@type")
            && properties.is_empty();
        if graph_only {
            if let Some(items) = keys.get("@graph") {
                self.document(items, context, graph)?;
            }
            return Ok(None);
        }

        let subject = match keys.get("@id") {
            Some(Value::String(id)) => match context.expand_iri(id, false) {
                Some(iri) => self.term_for(&iri),
                None => return Ok(None),
            },
            Some(other) => return Err(error(format!("Invalid @id value: {other}"))),
            None => Term::blank(self.issuer.get_id(None)),
        };

        if let Some(types) = keys.get("@type") {
            for kind in as_items(types) {
                let Value::String(kind) = kind else {
                    return Err(error(format!("Invalid @type value: {kind}")));
                };
                if let Some(iri) = context.expand_iri(kind, true) {
                    let object = (self.term_for(&iri), None);
                    self.emit(subject.clone(), RDF_TYPE, object, graph);
                }
            }
        }

        for (key, value) in properties {
            let Some(predicate) = context.expand_iri(key, true) else {
                continue;
            };
            if !is_absolute(&predicate) {
                continue;
            }
            let definition = context.terms.get(key).cloned().unwrap_or_default();
            for object in self.property_objects(value, &definition, context, graph)? {
                self.emit(subject.clone(), &predicate, object, graph);
            }
        }

        if let Some(items) = keys.get("@graph") {
            self.document(items, context, &subject)?;
        }

        Ok(Some(subject))
    }

    fn property_objects(
        &mut self,
        value: &Value,
        definition: &TermDefinition,
        context: &Context,
        graph: &Term,
    ) -> Result<Vec<Object>> {
        match (definition.container, value) {
            (Some(Container::List), Value::Object(map)) if map.contains_key("@list") => {
                Ok(self
                    .object(value, definition, context, graph)?
                    .into_iter()
                    .collect())
            }
            (Some(Container::List), _) => {
                let items: Vec<&Value> = as_items(value).collect();
                Ok(vec![self.list(&items, definition, context, graph)?])
            }
            (Some(Container::Language), Value::Object(map)) => {
                let mut objects = Vec::new();
                for (language, strings) in map {
                    for string in as_items(strings) {
                        let Value::String(string) = string else {
                            continue;
                        };
                        objects.push((
                            Term::literal(string.as_str()),
                            Some(Literal::lang_string(language.to_lowercase())),
                        ));
                    }
                }
                Ok(objects)
            }
            _ => {
                let mut objects = Vec::new();
                for item in as_items(value) {
                    if let Some(object) = self.object(item, definition, context, graph)? {
                        objects.push(object);
                    }
                }
                Ok(objects)
            }
        }
    }

    fn object(
        &mut self,
        value: &Value,
        definition: &TermDefinition,
        context: &Context,
        graph: &Term,
    ) -> Result<Option<Object>> {
        match value {
            Value::Null => Ok(None),
            Value::String(string) => Ok(self.string_object(string, definition, context)),
            Value::Bool(flag) => Ok(Some(typed_literal(
                flag.to_string(),
                coerced_datatype(definition).unwrap_or(XSD_BOOLEAN),
            ))),
            Value::Number(_) => Ok(Some(number_literal(value, coerced_datatype(definition)))),
            Value::Array(items) => {
                let items: Vec<&Value> = items.iter().collect();
                Ok(Some(self.list(&items, definition, context, graph)?))
            }
            Value::Object(map) => {
                if map.contains_key("@value") {
                    return value_object(map, context);
                }
                if let Some(list) = map.get("@list") {
                    let items: Vec<&Value> = as_items(list).collect();
                    return Ok(Some(self.list(&items, definition, context, graph)?));
                }
                Ok(self.node(map, context, graph)?.map(|subject| (subject, None)))
            }
        }
    }

    fn string_object(
        &mut self,
        string: &str,
        definition: &TermDefinition,
        context: &Context,
    ) -> Option<Object> {
        match &definition.type_mapping {
            Some(TypeMapping::Id) => context
                .expand_iri(string, false)
                .map(|iri| (self.term_for(&iri), None)),
            Some(TypeMapping::Vocab) => context
                .expand_iri(string, true)
                .map(|iri| (self.term_for(&iri), None)),
            Some(TypeMapping::Datatype(datatype)) => Some(typed_literal(string, datatype)),
            None => {
                let language = match &definition.language {
                    Some(language) => language.clone(),
                    None => context.language.clone(),
                };
                Some(match language {
                    Some(language) => (Term::literal(string), Some(Literal::lang_string(language))),
                    None => typed_literal(string, XSD_STRING),
                })
            }
        }
    }

    fn list(
        &mut self,
        items: &[&Value],
        definition: &TermDefinition,
        context: &Context,
        graph: &Term,
    ) -> Result<Object> {
        let item_definition = TermDefinition {
            container: None,
            ..definition.clone()
        };

        let mut objects = Vec::new();
        for item in items {
            if let Some(object) = self.object(item, &item_definition, context, graph)? {
                objects.push(object);
            }
        }

        if objects.is_empty() {
            return Ok((Term::named(RDF_NIL), None));
        }

        let nodes: Vec<Term> = objects
            .iter()
            .map(|_| Term::blank(self.issuer.get_id(None)))
            .collect();
        for (index, object) in objects.into_iter().enumerate() {
            self.emit(nodes[index].clone(), RDF_FIRST, object, graph);
            let rest = match nodes.get(index + 1) {
                Some(next) => next.clone(),
                None => Term::named(RDF_NIL),
            };
            self.emit(nodes[index].clone(), RDF_REST, (rest, None), graph);
        }

        Ok((nodes[0].clone(), None))
    }
}

fn as_items(value: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        Value::Array(items) => Box::new(items.iter().flat_map(as_items)),
        Value::Object(map) if map.contains_key("@set") => match map.get("@set") {
            Some(set) => as_items(set),
            None => Box::new(std::iter::empty()),
        },
        other => Box::new(std::iter::once(other)),
    }
}

fn coerced_datatype(definition: &TermDefinition) -> Option<&str> {
    match &definition.type_mapping {
        Some(TypeMapping::Datatype(datatype)) => Some(datatype.as_str()),
        _ => None,
    }
}

fn typed_literal(value: impl Into<String>, datatype: &str) -> Object {
    (Term::literal(value), Some(Literal::typed(datatype)))
}

fn number_literal(value: &Value, datatype: Option<&str>) -> Object {
    let as_double = value.as_f64().unwrap_or_default();
    let integral = value.is_i64()
        || value.is_u64()
        || (as_double.fract() == 0.0 && as_double.abs() < 1e21);

    if integral && datatype != Some(XSD_DOUBLE) {
        let lexical = match (value.as_i64(), value.as_u64()) {
            (Some(int), _) => int.to_string(),
            (None, Some(uint)) => uint.to_string(),
            // f64 with no fractional part below 1e21
            _ => format!("{as_double:.0}"),
        };
        return typed_literal(lexical, datatype.unwrap_or(XSD_INTEGER));
    }

    typed_literal(canonical_double(as_double), datatype.unwrap_or(XSD_DOUBLE))
}

fn value_object(map: &Map<String, Value>, context: &Context) -> Result<Option<Object>> {
    let datatype = match map.get("@type") {
        None => None,
        Some(Value::String(kind)) => Some(
            context
                .expand_iri(kind, true)
                .ok_or_else(|| error(format!("Invalid value @type: {kind}")))?,
        ),
        Some(other) => return Err(error(format!("Invalid value @type: {other}"))),
    };
    let language = match map.get("@language") {
        Some(Value::String(tag)) => Some(tag.to_lowercase()),
        _ => None,
    };

    match map.get("@value") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(string)) => Ok(Some(match (datatype, language) {
            (Some(datatype), _) => typed_literal(string.as_str(), &datatype),
            (None, Some(language)) => (Term::literal(string.as_str()), Some(Literal::lang_string(language))),
            (None, None) => typed_literal(string.as_str(), XSD_STRING),
        })),
        Some(Value::Bool(flag)) => Ok(Some(typed_literal(
            flag.to_string(),
            datatype.as_deref().unwrap_or(XSD_BOOLEAN),
        ))),
        Some(number @ Value::Number(_)) => Ok(Some(number_literal(number, datatype.as_deref()))),
        Some(other) => Err(error(format!("Invalid @value: {other}"))),
    }
}

/// Converts a JSON-LD document into RDF quads.
pub fn to_rdf(document: &Value) -> Result<Vec<Quad>> {
    let mut writer = RdfWriter::new();
    writer.document(document, &Context::default(), &Term::default_graph())?;
    Ok(writer.quads)
}
