//! Serialization of a typology hierarchy to XML.
//!
//! The document has the shape:
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <typology edition="MQM2021">
//! 	<errorType name="Accuracy" id="ACC" PID="1" level="0">
//! 		<description>...</description>
//! 		<notes>...</notes>
//! 		<examples>...</examples>
//! 		<errorType name="Mistranslation" id="ACC-MT" PID="1.1" level="1">
//! 			...
//! 		</errorType>
//! 	</errorType>
//! </typology>
//! ```

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::domain::{IssueNode, Step, Walk};

/// Name of the document root element.
pub const ROOT_ELEMENT: &str = "typology";

/// Name of the element written for each issue type.
pub const ISSUE_ELEMENT: &str = "errorType";

/// Errors that can occur when writing a document.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The XML writer failed.
    #[error("failed to serialize XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The document could not be written to disk.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        /// The destination.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
}

/// Serializes a walk into `writer`, indenting one tab per level.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn write_document<W: Write>(walk: &Walk<'_>, edition: &str, writer: W) -> Result<W, WriteError> {
    let mut writer = Writer::new_with_indent(writer, b'\t', 1);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut root = BytesStart::new(ROOT_ELEMENT);
    root.push_attribute(("edition", edition));
    writer.write_event(Event::Start(root))?;

    for step in &walk.steps {
        match step {
            Step::Open(node) => write_issue(&mut writer, node)?,
            Step::Close => writer.write_event(Event::End(BytesEnd::new(ISSUE_ELEMENT)))?,
        }
    }

    writer.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))?;
    Ok(writer.into_inner())
}

fn write_issue<W: Write>(writer: &mut Writer<W>, node: &IssueNode<'_>) -> Result<(), WriteError> {
    let record = node.record;
    let level = node.depth.to_string();

    let mut element = BytesStart::new(ISSUE_ELEMENT);
    element.push_attribute(("name", record.name()));
    element.push_attribute(("id", record.id()));
    element.push_attribute(("PID", record.process_id()));
    element.push_attribute(("level", level.as_str()));
    writer.write_event(Event::Start(element))?;

    write_text_element(writer, "description", record.description())?;
    write_text_element(writer, "notes", record.notes())?;
    write_text_element(writer, "examples", record.examples())?;

    Ok(())
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<(), WriteError> {
    if text.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(name)))?;
    } else {
        writer.write_event(Event::Start(BytesStart::new(name)))?;
        writer.write_event(Event::Text(BytesText::new(text)))?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
    }
    Ok(())
}

/// Serializes a walk to an in-memory buffer.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render(walk: &Walk<'_>, edition: &str) -> Result<Vec<u8>, WriteError> {
    write_document(walk, edition, Vec::new())
}

/// Serializes a walk and writes it to `path`.
///
/// The whole document is rendered before the file is created, so a failure
/// while rendering leaves nothing on disk. Parent directories are created if
/// they don't exist.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
pub fn save(walk: &Walk<'_>, edition: &str, path: &Path) -> Result<(), WriteError> {
    let document = render(walk, edition)?;

    let io_error = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, document).map_err(io_error)?;

    tracing::info!("Wrote {}", path.display());
    Ok(())
}
