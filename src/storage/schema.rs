//! Validation against W3C XML Schema documents.
//!
//! The XML Schema 1.0 structures this module understands:
//!
//! - global and local `element` declarations (`name`/`type`, `ref`, inline
//!   `complexType`/`simpleType`, `minOccurs`/`maxOccurs`, `form`)
//! - `targetNamespace` with `elementFormDefault`, checked against the
//!   namespace each instance element resolves to
//! - named and inline `complexType` with `sequence`/`choice`/`all` content,
//!   `mixed`, `complexContent` and `simpleContent` extensions
//! - `attribute` declarations (`use`, `fixed`, `type`) and named
//!   `attributeGroup`s
//! - built-in simple types and `simpleType` restrictions with `enumeration`,
//!   `length`, `minLength`, `maxLength` and `pattern` facets
//!
//! Anything else is rejected when the schema is loaded, rather than silently
//! ignored. Documents are validated with an explicit work stack, so nesting
//! depth is bounded only by memory.

use std::{
    borrow::Cow,
    collections::{BTreeSet, HashMap, HashSet},
    fmt,
    path::{Path, PathBuf},
};

use regex::Regex;

use crate::storage::dom::{DomError, Element, local_name};

/// The schema shipped with the converter.
pub const BUNDLED_SCHEMA: &str = include_str!("../../assets/typology.xsd");

const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Errors that can occur when loading a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The schema file could not be read.
    #[error("failed to read schema {}: {source}", .path.display())]
    Io {
        /// The schema location.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The schema is not well-formed XML.
    #[error("malformed schema: {0}")]
    Malformed(String),

    /// The root element is not `xs:schema`.
    #[error("expected an xs:schema root element, found '{0}'")]
    NotASchema(String),

    /// The schema uses a construct this validator does not implement.
    #[error("unsupported schema construct: {0}")]
    Unsupported(String),

    /// A declaration is missing a required attribute.
    #[error("{element} declaration is missing the '{attribute}' attribute")]
    MissingAttribute {
        /// The declaring element.
        element: &'static str,
        /// The missing attribute.
        attribute: &'static str,
    },

    /// An attribute of a declaration has an invalid value.
    #[error("invalid {attribute} value '{value}'")]
    InvalidValue {
        /// The attribute name.
        attribute: &'static str,
        /// The offending value.
        value: String,
    },

    /// A `pattern` facet is not a valid regular expression.
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        /// The pattern as written.
        pattern: String,
        /// The regex compilation error.
        source: regex::Error,
    },

    /// A declaration refers to a type, element or attribute group that is
    /// not defined.
    #[error("schema refers to undefined {kind} '{name}'")]
    UndefinedReference {
        /// What was referred to (`type`, `element` or `attributeGroup`).
        kind: &'static str,
        /// The referenced name.
        name: String,
    },

    /// A complex type extends itself, directly or through its bases.
    #[error("type '{0}' is derived from itself")]
    CircularDerivation(String),
}

impl From<DomError> for SchemaError {
    fn from(error: DomError) -> Self {
        match error {
            DomError::Io { path, source } => Self::Io { path, source },
            DomError::Malformed(message) => Self::Malformed(message),
        }
    }
}

/// A single way in which a document breaks the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Location of the offending element, e.g. `/typology/errorType[2]`.
    pub path: String,
    /// What is wrong.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// The result of validating a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    violations: Vec<Violation>,
}

impl Verdict {
    /// Whether the document conforms to the schema.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Every violation found, in document order.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

/// Built-in simple types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    AnySimpleType,
    String,
    NormalizedString,
    Token,
    NcName,
    Integer,
    Int,
    Long,
    NonNegativeInteger,
    PositiveInteger,
    Decimal,
    Boolean,
}

impl Builtin {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "anySimpleType" => Self::AnySimpleType,
            "string" => Self::String,
            "normalizedString" => Self::NormalizedString,
            "token" => Self::Token,
            "NCName" | "ID" | "IDREF" => Self::NcName,
            "integer" => Self::Integer,
            "int" => Self::Int,
            "long" => Self::Long,
            "nonNegativeInteger" => Self::NonNegativeInteger,
            "positiveInteger" => Self::PositiveInteger,
            "decimal" => Self::Decimal,
            "boolean" => Self::Boolean,
            _ => return None,
        })
    }

    /// Applies the type's whitespace rule.
    fn normalize(self, value: &str) -> Cow<'_, str> {
        match self {
            Self::String | Self::AnySimpleType => Cow::Borrowed(value),
            Self::NormalizedString => Cow::Owned(value.replace(['\t', '\n', '\r'], " ")),
            _ => Cow::Owned(value.split_whitespace().collect::<Vec<_>>().join(" ")),
        }
    }

    fn check(self, value: &str) -> Result<(), String> {
        let valid = match self {
            Self::AnySimpleType | Self::String | Self::NormalizedString | Self::Token => true,
            Self::NcName => is_ncname(value),
            Self::Integer => is_integer(value),
            Self::Int => is_integer(value) && value.parse::<i32>().is_ok(),
            Self::Long => is_integer(value) && value.parse::<i64>().is_ok(),
            Self::NonNegativeInteger => is_integer(value) && !is_negative(value),
            Self::PositiveInteger => {
                is_integer(value) && !is_negative(value) && has_nonzero_digit(value)
            }
            Self::Decimal => is_decimal(value),
            Self::Boolean => matches!(value, "true" | "false" | "1" | "0"),
        };
        if valid {
            Ok(())
        } else {
            Err(format!("'{value}' is not a valid {}", self.label()))
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::AnySimpleType => "anySimpleType",
            Self::String => "string",
            Self::NormalizedString => "normalizedString",
            Self::Token => "token",
            Self::NcName => "NCName",
            Self::Integer => "integer",
            Self::Int => "int",
            Self::Long => "long",
            Self::NonNegativeInteger => "nonNegativeInteger",
            Self::PositiveInteger => "positiveInteger",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
        }
    }
}

fn is_ncname(value: &str) -> bool {
    let mut chars = value.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn has_nonzero_digit(value: &str) -> bool {
    value.bytes().any(|b| (b'1'..=b'9').contains(&b))
}

/// `-0` is zero, not a negative number.
fn is_negative(value: &str) -> bool {
    value.starts_with('-') && has_nonzero_digit(value)
}

fn is_decimal(value: &str) -> bool {
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    !(whole.is_empty() && fraction.is_empty())
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit())
}

/// A simple type: a built-in base narrowed by facets.
#[derive(Debug, Clone)]
struct SimpleType {
    base: Builtin,
    enumeration: Vec<String>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    patterns: Vec<Regex>,
}

impl From<Builtin> for SimpleType {
    fn from(base: Builtin) -> Self {
        Self {
            base,
            enumeration: Vec::new(),
            min_length: None,
            max_length: None,
            patterns: Vec::new(),
        }
    }
}

impl SimpleType {
    fn check(&self, raw: &str) -> Result<(), String> {
        let value = self.base.normalize(raw);
        let value = value.as_ref();
        self.base.check(value)?;

        let length = value.chars().count();
        if let Some(min) = self.min_length.filter(|min| length < *min) {
            return Err(format!("'{value}' is shorter than {min} characters"));
        }
        if let Some(max) = self.max_length.filter(|max| length > *max) {
            return Err(format!("'{value}' is longer than {max} characters"));
        }
        if !self.enumeration.is_empty() && !self.enumeration.iter().any(|e| e == value) {
            return Err(format!(
                "'{value}' is not one of [{}]",
                self.enumeration.join(", ")
            ));
        }
        if let Some(pattern) = self.patterns.iter().find(|p| !p.is_match(value)) {
            return Err(format!("'{value}' does not match pattern {}", pattern.as_str()));
        }
        Ok(())
    }
}

/// The type of an element or attribute.
#[derive(Debug, Clone)]
enum TypeRef {
    /// No constraint (`xs:anyType`, or no type given).
    Any,
    Simple(SimpleType),
    Complex(Box<ComplexType>),
    /// A named type defined at the top level of the schema.
    Named(String),
}

#[derive(Debug, Clone)]
struct ElementDecl {
    name: String,
    /// The namespace instances must be in, `None` for no namespace.
    namespace: Option<String>,
    kind: TypeRef,
}

#[derive(Debug, Clone)]
struct AttributeDecl {
    name: String,
    required: bool,
    fixed: Option<String>,
    kind: TypeRef,
}

/// Attribute declarations plus references to `attributeGroup`s.
#[derive(Debug, Clone, Default)]
struct Attributes {
    declared: Vec<AttributeDecl>,
    groups: Vec<String>,
}

#[derive(Debug, Clone, Default)]
struct ComplexType {
    /// Base of a `complexContent` extension.
    base: Option<String>,
    /// Type of the character data of a `simpleContent` extension.
    simple_content: Option<TypeRef>,
    content: Option<Particle>,
    attributes: Attributes,
    mixed: bool,
}

#[derive(Debug, Clone)]
enum Term {
    Element(ElementDecl),
    Ref(String),
    Sequence(Vec<Particle>),
    Choice(Vec<Particle>),
    /// Every item at most once, in any order. Items are single elements.
    All(Vec<Particle>),
}

impl Term {
    /// The element name matched by an element or element reference.
    fn element_name(&self) -> Option<&str> {
        match self {
            Self::Element(ElementDecl { name, .. }) | Self::Ref(name) => Some(name.as_str()),
            Self::Sequence(_) | Self::Choice(_) | Self::All(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Particle {
    term: Term,
    min: usize,
    /// `None` for `unbounded`.
    max: Option<usize>,
}

enum Resolved<'a> {
    Any,
    Simple(&'a SimpleType),
    Complex(&'a ComplexType),
}

/// A complex type with its base types folded in.
struct Effective<'a> {
    /// Content models of the base chain, outermost base first.
    content: Vec<&'a Particle>,
    attributes: Vec<&'a AttributeDecl>,
    simple: Option<&'a TypeRef>,
    mixed: bool,
}

/// An element whose children are still being validated.
struct Frame<'a> {
    children: std::slice::Iter<'a, Element>,
    content: Vec<&'a Particle>,
    /// Occurrences so far of each child name, for violation paths.
    seen: HashMap<&'a str, usize>,
}

/// A compiled schema.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    elements: HashMap<String, ElementDecl>,
    complex_types: HashMap<String, ComplexType>,
    simple_types: HashMap<String, SimpleType>,
    attribute_groups: HashMap<String, Attributes>,
}

impl Schema {
    /// Compiles the schema shipped with the converter.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled schema is broken.
    pub fn bundled() -> Result<Self, SchemaError> {
        Self::parse(BUNDLED_SCHEMA)
    }

    /// Loads and compiles the schema at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a schema, or uses
    /// unsupported constructs.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let root = Element::load(path)?;
        tracing::debug!("Loaded schema from {}", path.display());
        Self::compile(&root)
    }

    /// Compiles a schema from its text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a schema or uses unsupported
    /// constructs.
    pub fn parse(xsd: &str) -> Result<Self, SchemaError> {
        Self::compile(&Element::parse(xsd)?)
    }

    fn compile(root: &Element) -> Result<Self, SchemaError> {
        if root.local_name() != "schema" || root.namespace.as_deref() != Some(XSD_NAMESPACE) {
            return Err(SchemaError::NotASchema(root.name.clone()));
        }

        let compiler = Compiler {
            xsd_prefix: xsd_prefix(root),
            target_namespace: root.attribute("targetNamespace").map(str::to_string),
            qualified_locals: form(root, "elementFormDefault")?.unwrap_or(false),
        };
        let mut schema = Self::default();

        for child in &root.children {
            match child.local_name() {
                "annotation" => {}
                "element" => {
                    let decl = compiler.element_decl(child, true)?;
                    schema.elements.insert(decl.name.clone(), decl);
                }
                "complexType" => {
                    let name = required_attribute(child, "complexType", "name")?;
                    schema
                        .complex_types
                        .insert(name.to_string(), compiler.complex_type(child)?);
                }
                "simpleType" => {
                    let name = required_attribute(child, "simpleType", "name")?;
                    schema
                        .simple_types
                        .insert(name.to_string(), compiler.simple_type(child)?);
                }
                "attributeGroup" => {
                    let name = required_attribute(child, "attributeGroup", "name")?;
                    schema
                        .attribute_groups
                        .insert(name.to_string(), compiler.attribute_group(child)?);
                }
                other => return Err(SchemaError::Unsupported(format!("top-level {other}"))),
            }
        }

        schema.check_references()?;
        schema.check_derivations()?;
        Ok(schema)
    }

    fn check_references(&self) -> Result<(), SchemaError> {
        for decl in self.elements.values() {
            self.check_type(&decl.kind, false)?;
        }
        for complex in self.complex_types.values() {
            self.check_complex(complex)?;
        }
        for group in self.attribute_groups.values() {
            self.check_attributes(group)?;
        }
        Ok(())
    }

    fn check_type(&self, kind: &TypeRef, simple_only: bool) -> Result<(), SchemaError> {
        match kind {
            TypeRef::Any | TypeRef::Simple(_) => Ok(()),
            TypeRef::Complex(complex) => self.check_complex(complex),
            TypeRef::Named(name) => {
                let defined = self.simple_types.contains_key(name)
                    || (!simple_only && self.complex_types.contains_key(name));
                if defined {
                    Ok(())
                } else {
                    Err(SchemaError::UndefinedReference {
                        kind: "type",
                        name: name.clone(),
                    })
                }
            }
        }
    }

    fn check_complex(&self, complex: &ComplexType) -> Result<(), SchemaError> {
        self.check_attributes(&complex.attributes)?;
        if let Some(base) = &complex.base {
            if !self.complex_types.contains_key(base) {
                return Err(SchemaError::UndefinedReference {
                    kind: "type",
                    name: base.clone(),
                });
            }
        }
        if let Some(kind) = &complex.simple_content {
            self.check_type(kind, true)?;
        }
        complex
            .content
            .as_ref()
            .map_or(Ok(()), |particle| self.check_particle(particle))
    }

    fn check_attributes(&self, attributes: &Attributes) -> Result<(), SchemaError> {
        for attribute in &attributes.declared {
            self.check_type(&attribute.kind, true)?;
        }
        match attributes
            .groups
            .iter()
            .find(|group| !self.attribute_groups.contains_key(*group))
        {
            Some(group) => Err(SchemaError::UndefinedReference {
                kind: "attributeGroup",
                name: group.clone(),
            }),
            None => Ok(()),
        }
    }

    fn check_particle(&self, particle: &Particle) -> Result<(), SchemaError> {
        match &particle.term {
            Term::Element(decl) => self.check_type(&decl.kind, false),
            Term::Ref(name) if self.elements.contains_key(name) => Ok(()),
            Term::Ref(name) => Err(SchemaError::UndefinedReference {
                kind: "element",
                name: name.clone(),
            }),
            Term::Sequence(items) | Term::Choice(items) | Term::All(items) => items
                .iter()
                .try_for_each(|item| self.check_particle(item)),
        }
    }

    /// Rejects extension chains that loop back on themselves.
    fn check_derivations(&self) -> Result<(), SchemaError> {
        for (name, complex) in &self.complex_types {
            let mut chain = HashSet::from([name.as_str()]);
            let mut base = complex.base.as_deref();
            while let Some(current) = base {
                if !chain.insert(current) {
                    return Err(SchemaError::CircularDerivation(name.clone()));
                }
                base = self
                    .complex_types
                    .get(current)
                    .and_then(|complex| complex.base.as_deref());
            }
        }
        Ok(())
    }

    /// Loads the document at `path` and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or is not well-formed.
    /// Schema violations are reported in the [`Verdict`], not as errors.
    pub fn validate_file(&self, path: &Path) -> Result<Verdict, DomError> {
        Ok(self.validate(&Element::load(path)?))
    }

    /// Validates a parsed document.
    #[must_use]
    pub fn validate(&self, document: &Element) -> Verdict {
        let mut violations = Vec::new();

        let Some(decl) = self.elements.get(document.local_name()) else {
            violations.push(Violation {
                path: format!("/{}", document.name),
                message: format!("no declaration for root element '{}'", document.name),
            });
            return Verdict { violations };
        };

        // `trail` holds one path segment per open frame.
        let mut trail = vec![document.name.clone()];
        let mut stack: Vec<Frame<'_>> = Vec::new();
        stack.extend(self.check_element(document, decl, &trail, &mut violations));

        while let Some(frame) = stack.last_mut() {
            let Some(child) = frame.children.next() else {
                stack.pop();
                trail.pop();
                continue;
            };

            let position = frame.seen.entry(child.local_name()).or_default();
            *position += 1;
            let segment = format!("{}[{position}]", child.name);

            let Some(decl) = frame
                .content
                .iter()
                .find_map(|&particle| self.find_decl(particle, child.local_name()))
            else {
                // Already reported as a content model mismatch.
                continue;
            };

            trail.push(segment);
            match self.check_element(child, decl, &trail, &mut violations) {
                Some(frame) => stack.push(frame),
                None => {
                    trail.pop();
                }
            }
        }

        Verdict { violations }
    }

    fn resolve<'a>(&'a self, kind: &'a TypeRef) -> Resolved<'a> {
        match kind {
            TypeRef::Any => Resolved::Any,
            TypeRef::Simple(simple) => Resolved::Simple(simple),
            TypeRef::Complex(complex) => Resolved::Complex(complex),
            TypeRef::Named(name) => self
                .complex_types
                .get(name)
                .map(Resolved::Complex)
                .or_else(|| self.simple_types.get(name).map(Resolved::Simple))
                .unwrap_or(Resolved::Any),
        }
    }

    /// Checks one element against its declaration.
    ///
    /// Returns a frame when the element has element content whose children
    /// still need checking.
    fn check_element<'a>(
        &'a self,
        element: &'a Element,
        decl: &'a ElementDecl,
        trail: &[String],
        violations: &mut Vec<Violation>,
    ) -> Option<Frame<'a>> {
        let mut report = |message: String| {
            violations.push(Violation {
                path: format!("/{}", trail.join("/")),
                message,
            });
        };

        if element.namespace != decl.namespace {
            report(match &decl.namespace {
                Some(expected) => {
                    format!("element '{}' must be in namespace '{expected}'", element.name)
                }
                None => format!("element '{}' must not be in a namespace", element.name),
            });
        }

        let complex = match self.resolve(&decl.kind) {
            Resolved::Any => return None,
            Resolved::Simple(simple) => {
                if let Some((name, _)) = user_attributes(element).next() {
                    report(format!("attribute '{name}' is not allowed"));
                }
                check_simple_content(element, simple, &mut report);
                return None;
            }
            Resolved::Complex(complex) => self.effective(complex),
        };

        self.check_attribute_uses(element, &complex.attributes, &mut report);

        if let Some(kind) = complex.simple {
            if let Resolved::Simple(simple) = self.resolve(kind) {
                check_simple_content(element, simple, &mut report);
            }
            return None;
        }

        if !complex.mixed && !element.text.trim().is_empty() {
            report("text content is not allowed".to_string());
        }

        let names: Vec<&str> = element.children.iter().map(Element::local_name).collect();
        let ends = complex
            .content
            .iter()
            .fold(BTreeSet::from([0]), |positions, particle| {
                positions
                    .into_iter()
                    .flat_map(|position| self.ends(particle, &names, position))
                    .collect()
            });
        if !ends.contains(&names.len()) {
            report(format!(
                "child elements [{}] do not match the content model",
                names.join(", ")
            ));
        }

        Some(Frame {
            children: element.children.iter(),
            content: complex.content,
            seen: HashMap::new(),
        })
    }

    fn check_attribute_uses(
        &self,
        element: &Element,
        uses: &[&AttributeDecl],
        report: &mut impl FnMut(String),
    ) {
        for (name, value) in user_attributes(element) {
            let Some(decl) = uses.iter().find(|decl| decl.name == name) else {
                report(format!("attribute '{name}' is not allowed"));
                continue;
            };
            if let Some(fixed) = decl.fixed.as_deref().filter(|fixed| *fixed != value) {
                report(format!("attribute '{name}' must be '{fixed}', found '{value}'"));
            }
            if let Resolved::Simple(simple) = self.resolve(&decl.kind) {
                if let Err(message) = simple.check(value) {
                    report(format!("attribute '{name}': {message}"));
                }
            }
        }
        for decl in uses.iter().filter(|decl| decl.required) {
            if element.attribute(&decl.name).is_none() {
                report(format!("missing required attribute '{}'", decl.name));
            }
        }
    }

    fn effective<'a>(&'a self, complex: &'a ComplexType) -> Effective<'a> {
        let mut chain = vec![complex];
        let mut current = complex;
        // Extension loops are rejected when the schema is compiled.
        while let Some(base) = current
            .base
            .as_ref()
            .and_then(|name| self.complex_types.get(name))
        {
            chain.push(base);
            current = base;
        }
        chain.reverse();

        Effective {
            content: chain
                .iter()
                .copied()
                .filter_map(|complex| complex.content.as_ref())
                .collect(),
            attributes: chain
                .iter()
                .copied()
                .flat_map(|complex| self.attribute_uses(&complex.attributes))
                .collect(),
            simple: chain
                .iter()
                .copied()
                .rev()
                .find_map(|complex| complex.simple_content.as_ref()),
            mixed: complex.mixed,
        }
    }

    /// Declared attributes plus those of every referenced group.
    fn attribute_uses<'a>(&'a self, attributes: &'a Attributes) -> Vec<&'a AttributeDecl> {
        let mut uses: Vec<&AttributeDecl> = attributes.declared.iter().collect();
        let mut pending: Vec<&str> = attributes.groups.iter().map(String::as_str).collect();
        let mut visited = HashSet::new();

        while let Some(name) = pending.pop() {
            if !visited.insert(name) {
                continue;
            }
            if let Some(group) = self.attribute_groups.get(name) {
                uses.extend(&group.declared);
                pending.extend(group.groups.iter().map(String::as_str));
            }
        }

        uses
    }

    fn find_decl<'a>(&'a self, particle: &'a Particle, name: &str) -> Option<&'a ElementDecl> {
        match &particle.term {
            Term::Element(decl) if decl.name == name => Some(decl),
            Term::Element(_) => None,
            Term::Ref(reference) if reference == name => self.elements.get(reference),
            Term::Ref(_) => None,
            Term::Sequence(items) | Term::Choice(items) | Term::All(items) => {
                items.iter().find_map(|item| self.find_decl(item, name))
            }
        }
    }

    /// Every position in `names` at which a match of `particle` starting at
    /// `start` can end.
    fn ends(&self, particle: &Particle, names: &[&str], start: usize) -> BTreeSet<usize> {
        let mut results = BTreeSet::new();
        if particle.min == 0 {
            results.insert(start);
        }

        let mut explored = BTreeSet::new();
        let mut frontier = BTreeSet::from([start]);
        let mut count = 0;

        while !frontier.is_empty() && particle.max.is_none_or(|max| count < max) {
            count += 1;
            let mut next: BTreeSet<usize> = frontier
                .iter()
                .flat_map(|&position| self.term_ends(&particle.term, names, position))
                .collect();

            if count >= particle.min {
                results.extend(next.iter().copied());
                // Past the minimum, a position already expanded yields nothing new.
                next.retain(|position| explored.insert(*position));
            }
            frontier = next;
        }

        results
    }

    fn term_ends(&self, term: &Term, names: &[&str], start: usize) -> BTreeSet<usize> {
        match term {
            Term::Element(ElementDecl { name, .. }) | Term::Ref(name) => {
                if names.get(start) == Some(&name.as_str()) {
                    BTreeSet::from([start + 1])
                } else {
                    BTreeSet::new()
                }
            }
            Term::Sequence(items) => items.iter().fold(BTreeSet::from([start]), |positions, item| {
                positions
                    .into_iter()
                    .flat_map(|position| self.ends(item, names, position))
                    .collect()
            }),
            Term::Choice(items) => items
                .iter()
                .flat_map(|item| self.ends(item, names, start))
                .collect(),
            Term::All(items) => all_ends(items, names, start),
        }
    }
}

/// Ends of an `all` group: each name consumes the unused item it names, and
/// every position where no required item is left unused is an end.
fn all_ends(items: &[Particle], names: &[&str], start: usize) -> BTreeSet<usize> {
    let mut used = vec![false; items.len()];
    let mut results = BTreeSet::new();
    let mut position = start;

    loop {
        let complete = items
            .iter()
            .zip(&used)
            .all(|(item, used)| *used || item.min == 0);
        if complete {
            results.insert(position);
        }

        let next = names.get(position).and_then(|name| {
            items
                .iter()
                .zip(&used)
                .position(|(item, used)| !used && item.term.element_name() == Some(*name))
        });
        let Some(index) = next else {
            break;
        };
        used[index] = true;
        position += 1;
    }

    results
}

fn check_simple_content(element: &Element, simple: &SimpleType, report: &mut impl FnMut(String)) {
    if let Some(child) = element.children.first() {
        report(format!("element '{}' is not allowed here", child.name));
    }
    if let Err(message) = simple.check(&element.text) {
        report(message);
    }
}

/// Attributes that are subject to validation (namespace declarations and
/// `xsi:` attributes are not).
fn user_attributes(element: &Element) -> impl Iterator<Item = (&str, &str)> {
    element
        .attributes
        .iter()
        .filter(|(name, _)| {
            name != "xmlns" && !name.starts_with("xmlns:") && !name.starts_with("xsi:")
        })
        .map(|(name, value)| (name.as_str(), value.as_str()))
}

/// The prefix bound to the XML Schema namespace (`""` for a default binding).
fn xsd_prefix(root: &Element) -> String {
    root.attributes
        .iter()
        .find(|(_, value)| value == XSD_NAMESPACE)
        .and_then(|(name, _)| {
            if name == "xmlns" {
                Some(String::new())
            } else {
                name.strip_prefix("xmlns:").map(str::to_string)
            }
        })
        .unwrap_or_else(|| "xs".to_string())
}

fn required_attribute<'a>(
    element: &'a Element,
    declaration: &'static str,
    attribute: &'static str,
) -> Result<&'a str, SchemaError> {
    element
        .attribute(attribute)
        .ok_or(SchemaError::MissingAttribute {
            element: declaration,
            attribute,
        })
}

/// Reads a `qualified`/`unqualified` attribute as "is qualified".
fn form(element: &Element, attribute: &'static str) -> Result<Option<bool>, SchemaError> {
    match element.attribute(attribute) {
        None => Ok(None),
        Some("qualified") => Ok(Some(true)),
        Some("unqualified") => Ok(Some(false)),
        Some(other) => Err(SchemaError::InvalidValue {
            attribute,
            value: other.to_string(),
        }),
    }
}

fn parse_count(element: &Element, attribute: &'static str, default: usize) -> Result<usize, SchemaError> {
    element.attribute(attribute).map_or(Ok(default), |value| {
        value.trim().parse().map_err(|_| SchemaError::InvalidValue {
            attribute,
            value: value.to_string(),
        })
    })
}

fn occurrences(element: &Element) -> Result<(usize, Option<usize>), SchemaError> {
    let min = parse_count(element, "minOccurs", 1)?;
    let max = match element.attribute("maxOccurs") {
        Some("unbounded") => None,
        _ => Some(parse_count(element, "maxOccurs", 1)?),
    };
    if max.is_some_and(|max| max < min) {
        return Err(SchemaError::InvalidValue {
            attribute: "maxOccurs",
            value: element.attribute("maxOccurs").unwrap_or_default().to_string(),
        });
    }
    Ok((min, max))
}

/// The `extension` inside a `complexContent`/`simpleContent` element.
fn extension(content: &Element) -> Result<&Element, SchemaError> {
    match content
        .children
        .iter()
        .find(|child| child.local_name() != "annotation")
    {
        Some(derivation) if derivation.local_name() == "extension" => Ok(derivation),
        Some(derivation) => Err(SchemaError::Unsupported(format!(
            "{} in {}",
            derivation.name, content.name
        ))),
        None => Err(SchemaError::Unsupported(format!("empty {}", content.name))),
    }
}

struct Compiler {
    xsd_prefix: String,
    target_namespace: Option<String>,
    /// `elementFormDefault="qualified"`.
    qualified_locals: bool,
}

impl Compiler {
    /// Resolves a `type`/`base` reference to a built-in or named type.
    fn type_ref(&self, qualified: &str) -> Result<TypeRef, SchemaError> {
        let (prefix, name) = qualified.split_once(':').unwrap_or(("", qualified));
        if prefix == self.xsd_prefix {
            if name == "anyType" {
                return Ok(TypeRef::Any);
            }
            if let Some(builtin) = Builtin::from_name(name) {
                return Ok(TypeRef::Simple(builtin.into()));
            }
            if !prefix.is_empty() {
                return Err(SchemaError::Unsupported(format!("built-in type {qualified}")));
            }
        }
        Ok(TypeRef::Named(name.to_string()))
    }

    fn element_decl(&self, element: &Element, global: bool) -> Result<ElementDecl, SchemaError> {
        let name = required_attribute(element, "element", "name")?.to_string();

        let qualified = global || form(element, "form")?.unwrap_or(self.qualified_locals);
        let namespace = if qualified {
            self.target_namespace.clone()
        } else {
            None
        };

        let inline_types: Vec<&Element> = element
            .children
            .iter()
            .filter(|child| child.local_name() != "annotation")
            .collect();

        let kind = match (element.attribute("type"), inline_types.as_slice()) {
            (Some(type_name), []) => self.type_ref(type_name)?,
            (None, []) => TypeRef::Any,
            (None, [inline]) if inline.local_name() == "complexType" => {
                TypeRef::Complex(Box::new(self.complex_type(inline)?))
            }
            (None, [inline]) if inline.local_name() == "simpleType" => {
                TypeRef::Simple(self.simple_type(inline)?)
            }
            (_, [other, ..]) => {
                return Err(SchemaError::Unsupported(format!(
                    "{} inside element '{name}'",
                    other.name
                )));
            }
        };

        Ok(ElementDecl {
            name,
            namespace,
            kind,
        })
    }

    fn complex_type(&self, element: &Element) -> Result<ComplexType, SchemaError> {
        let mut complex = ComplexType {
            mixed: element.attribute("mixed") == Some("true"),
            ..ComplexType::default()
        };

        for child in &element.children {
            match child.local_name() {
                "complexContent" => {
                    let extension = extension(child)?;
                    complex.mixed |= child.attribute("mixed") == Some("true");
                    let base = required_attribute(extension, "extension", "base")?;
                    match self.type_ref(base)? {
                        TypeRef::Any => {}
                        TypeRef::Named(name) => complex.base = Some(name),
                        TypeRef::Simple(_) | TypeRef::Complex(_) => {
                            return Err(SchemaError::Unsupported(format!(
                                "complexContent extension of {base}"
                            )));
                        }
                    }
                    for member in &extension.children {
                        self.complex_member(&mut complex, member, "complexContent")?;
                    }
                }
                "simpleContent" => {
                    let extension = extension(child)?;
                    let base = required_attribute(extension, "extension", "base")?;
                    let kind = self.type_ref(base)?;
                    if matches!(kind, TypeRef::Any) {
                        return Err(SchemaError::Unsupported(format!(
                            "simpleContent extension of {base}"
                        )));
                    }
                    complex.simple_content = Some(kind);
                    for member in &extension.children {
                        self.complex_member(&mut complex, member, "simpleContent")?;
                    }
                }
                _ => self.complex_member(&mut complex, child, "complexType")?,
            }
        }

        Ok(complex)
    }

    fn complex_member(
        &self,
        complex: &mut ComplexType,
        child: &Element,
        context: &str,
    ) -> Result<(), SchemaError> {
        if child.local_name() == "annotation" || self.attribute_use(&mut complex.attributes, child)? {
            return Ok(());
        }
        match child.local_name() {
            "sequence" | "choice" | "all"
                if complex.content.is_none() && complex.simple_content.is_none() =>
            {
                complex.content = Some(self.particle(child)?);
                Ok(())
            }
            other => Err(SchemaError::Unsupported(format!("{other} in {context}"))),
        }
    }

    fn attribute_group(&self, element: &Element) -> Result<Attributes, SchemaError> {
        let mut attributes = Attributes::default();
        for child in &element.children {
            if child.local_name() != "annotation" && !self.attribute_use(&mut attributes, child)? {
                return Err(SchemaError::Unsupported(format!(
                    "{} in attributeGroup",
                    child.local_name()
                )));
            }
        }
        Ok(attributes)
    }

    /// Adds an `attribute` declaration or `attributeGroup` reference. Returns
    /// `false` for any other element.
    fn attribute_use(&self, attributes: &mut Attributes, child: &Element) -> Result<bool, SchemaError> {
        match child.local_name() {
            "attribute" => attributes.declared.push(self.attribute_decl(child)?),
            "attributeGroup" => {
                let reference = required_attribute(child, "attributeGroup", "ref")?;
                attributes.groups.push(local_name(reference).to_string());
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn particle(&self, element: &Element) -> Result<Particle, SchemaError> {
        let (min, max) = occurrences(element)?;

        let term = match element.local_name() {
            "element" => match element.attribute("ref") {
                Some(reference) => Term::Ref(local_name(reference).to_string()),
                None => Term::Element(self.element_decl(element, false)?),
            },
            group @ ("sequence" | "choice" | "all") => {
                let items = element
                    .children
                    .iter()
                    .filter(|child| child.local_name() != "annotation")
                    .map(|child| self.particle(child))
                    .collect::<Result<Vec<_>, _>>()?;
                match group {
                    "sequence" => Term::Sequence(items),
                    "choice" => Term::Choice(items),
                    _ => {
                        let repeated = items
                            .iter()
                            .any(|item| item.term.element_name().is_none() || item.max != Some(1));
                        if repeated || max != Some(1) {
                            return Err(SchemaError::Unsupported(
                                "all group with repeated or nested items".to_string(),
                            ));
                        }
                        Term::All(items)
                    }
                }
            }
            other => return Err(SchemaError::Unsupported(format!("{other} in content model"))),
        };

        Ok(Particle { term, min, max })
    }

    fn attribute_decl(&self, element: &Element) -> Result<AttributeDecl, SchemaError> {
        if element.attribute("ref").is_some() {
            return Err(SchemaError::Unsupported("attribute ref".to_string()));
        }
        let name = required_attribute(element, "attribute", "name")?.to_string();

        let inline = element
            .children
            .iter()
            .find(|child| child.local_name() == "simpleType");
        let kind = match (element.attribute("type"), inline) {
            (_, Some(simple)) => TypeRef::Simple(self.simple_type(simple)?),
            (Some(type_name), None) => self.type_ref(type_name)?,
            (None, None) => TypeRef::Simple(Builtin::AnySimpleType.into()),
        };
        if matches!(kind, TypeRef::Any) {
            return Err(SchemaError::Unsupported(format!(
                "attribute '{name}' of complex type"
            )));
        }

        let required = match element.attribute("use") {
            None | Some("optional") => false,
            Some("required") => true,
            Some(other) => {
                return Err(SchemaError::InvalidValue {
                    attribute: "use",
                    value: other.to_string(),
                });
            }
        };

        Ok(AttributeDecl {
            name,
            required,
            fixed: element.attribute("fixed").map(str::to_string),
            kind,
        })
    }

    fn simple_type(&self, element: &Element) -> Result<SimpleType, SchemaError> {
        let restriction = element
            .children
            .iter()
            .find(|child| child.local_name() != "annotation")
            .ok_or(SchemaError::MissingAttribute {
                element: "simpleType",
                attribute: "restriction",
            })?;
        if restriction.local_name() != "restriction" {
            return Err(SchemaError::Unsupported(format!(
                "{} in simpleType",
                restriction.name
            )));
        }

        let base = required_attribute(restriction, "restriction", "base")?;
        let mut simple = match self.type_ref(base)? {
            TypeRef::Simple(simple) => simple,
            _ => {
                return Err(SchemaError::Unsupported(format!(
                    "restriction of non-built-in type {base}"
                )));
            }
        };

        for facet in &restriction.children {
            let value = || required_attribute(facet, "facet", "value");
            match facet.local_name() {
                "annotation" => {}
                "enumeration" => simple.enumeration.push(value()?.to_string()),
                "length" => {
                    let length = parse_count(facet, "value", 0)?;
                    simple.min_length = Some(length);
                    simple.max_length = Some(length);
                }
                "minLength" => simple.min_length = Some(parse_count(facet, "value", 0)?),
                "maxLength" => simple.max_length = Some(parse_count(facet, "value", 0)?),
                "pattern" => {
                    let pattern = value()?;
                    let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
                        SchemaError::Pattern {
                            pattern: pattern.to_string(),
                            source,
                        }
                    })?;
                    simple.patterns.push(regex);
                }
                other => return Err(SchemaError::Unsupported(format!("{other} facet"))),
            }
        }

        Ok(simple)
    }
}
