//! A minimal element tree for reading XML documents back in.

use std::path::{Path, PathBuf};

use quick_xml::{
    events::{BytesStart, Event},
    name::ResolveResult,
    reader::NsReader,
};

/// Errors that can occur when loading an XML document.
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The document location.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The text is not well-formed XML.
    #[error("malformed XML: {0}")]
    Malformed(String),
}

/// An XML element with its attributes, character data and child elements.
///
/// Character data directly inside the element is concatenated into `text`;
/// comments and processing instructions are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// The qualified name as written, including any prefix.
    pub name: String,
    /// The namespace the name resolves to, if any.
    pub namespace: Option<String>,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<Element>,
    /// Character data directly inside this element.
    pub text: String,
}

impl Element {
    /// Loads and parses the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not well-formed.
    pub fn load(path: &Path) -> Result<Self, DomError> {
        let content = std::fs::read_to_string(path).map_err(|source| DomError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parses a document, returning its root element.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Malformed`] if the text is not well-formed XML or
    /// has no root element.
    pub fn parse(xml: &str) -> Result<Self, DomError> {
        let mut reader = NsReader::from_str(xml);

        let mut stack: Vec<Self> = Vec::new();
        let mut root: Option<Self> = None;

        loop {
            match reader.read_resolved_event() {
                Ok((namespace, Event::Start(start))) => {
                    stack.push(Self::open(&start, namespace)?);
                }
                Ok((namespace, Event::Empty(start))) => {
                    let element = Self::open(&start, namespace)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok((_, Event::End(_))) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| DomError::Malformed("unmatched end tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok((_, Event::Text(text))) => {
                    let text = text
                        .unescape()
                        .map_err(|e| DomError::Malformed(e.to_string()))?;
                    match stack.last_mut() {
                        Some(current) => current.text.push_str(&text),
                        None if text.trim().is_empty() => {}
                        None => {
                            return Err(DomError::Malformed(
                                "text outside the root element".to_string(),
                            ));
                        }
                    }
                }
                Ok((_, Event::CData(data))) => {
                    let data = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&data);
                    }
                }
                Ok((_, Event::Eof)) => break,
                Ok(_) => {}
                Err(e) => return Err(DomError::Malformed(e.to_string())),
            }
        }

        if !stack.is_empty() {
            return Err(DomError::Malformed("unexpected end of document".to_string()));
        }
        root.ok_or_else(|| DomError::Malformed("no root element found".to_string()))
    }

    fn open(start: &BytesStart<'_>, namespace: ResolveResult<'_>) -> Result<Self, DomError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let namespace = match namespace {
            ResolveResult::Bound(namespace) => {
                Some(String::from_utf8_lossy(namespace.as_ref()).into_owned())
            }
            ResolveResult::Unbound => None,
            ResolveResult::Unknown(prefix) => {
                return Err(DomError::Malformed(format!(
                    "unbound namespace prefix '{}'",
                    String::from_utf8_lossy(&prefix)
                )));
            }
        };
        let attributes = start
            .attributes()
            .map(|attribute| {
                let attribute = attribute.map_err(|e| DomError::Malformed(e.to_string()))?;
                let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
                let value = attribute
                    .unescape_value()
                    .map_err(|e| DomError::Malformed(e.to_string()))?
                    .into_owned();
                Ok((key, value))
            })
            .collect::<Result<_, DomError>>()?;

        Ok(Self {
            name,
            namespace,
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    /// The name without its namespace prefix.
    #[must_use]
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Looks up an attribute by its qualified name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Child elements with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> {
        self.children
            .iter()
            .filter(move |child| child.local_name() == name)
    }
}

impl Drop for Element {
    // Deeply nested documents would otherwise be dropped recursively.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut child) = pending.pop() {
            pending.append(&mut child.children);
        }
    }
}

/// Strips a namespace prefix from a qualified name.
#[must_use]
pub fn local_name(qualified: &str) -> &str {
    qualified
        .split_once(':')
        .map_or(qualified, |(_, local)| local)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<(), DomError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_some() {
        return Err(DomError::Malformed(
            "more than one root element".to_string(),
        ));
    } else {
        *root = Some(element);
    }
    Ok(())
}
