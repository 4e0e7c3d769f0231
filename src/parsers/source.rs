//! Raw source loading: XML reports as an element tree, text reports as-is.
//!
//! The loader has no knowledge of any tool's format. It only guarantees
//! that an XML source is well-formed UTF-8. Text sources are decoded
//! lossily, so stray bytes never make a text report unreadable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::errors::ReportError;

/// How a report file must be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    Xml,
    Text,
}

/// Element of a parsed XML document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    text: String,
}

impl XmlElement {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Character data directly inside this element, untrimmed.
    pub fn raw_text(&self) -> &str {
        &self.text
    }

    /// Character data directly inside this element, trimmed.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First descendant (not self) with the given name, in document order.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants (not self) with the given name, in document order.
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut out = Vec::new();
        self.collect(name, &mut out);
        out
    }

    fn collect<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
        for child in &self.children {
            if child.name == name {
                out.push(child);
            }
            child.collect(name, out);
        }
    }
}

/// A loaded report file.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Xml { path: PathBuf, root: XmlElement },
    Text { path: PathBuf, content: String },
}

impl Source {
    pub fn path(&self) -> &Path {
        match self {
            Self::Xml { path, .. } | Self::Text { path, .. } => path,
        }
    }

    pub fn kind(&self) -> FormatKind {
        match self {
            Self::Xml { .. } => FormatKind::Xml,
            Self::Text { .. } => FormatKind::Text,
        }
    }

    pub fn as_xml(&self) -> Option<&XmlElement> {
        match self {
            Self::Xml { root, .. } => Some(root),
            Self::Text { .. } => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { content, .. } => Some(content),
            Self::Xml { .. } => None,
        }
    }

    /// The XML root, or a malformed-source error naming what was expected.
    pub fn require_xml(&self) -> Result<&XmlElement, ReportError> {
        self.as_xml().ok_or_else(|| self.mismatch(FormatKind::Xml))
    }

    pub fn require_text(&self) -> Result<&str, ReportError> {
        self.as_text().ok_or_else(|| self.mismatch(FormatKind::Text))
    }

    fn mismatch(&self, expected: FormatKind) -> ReportError {
        ReportError::malformed(
            self.path(),
            format!("expected {expected:?} source, found {:?}", self.kind()),
        )
    }
}

/// Read a file from disk and expose it in the requested shape.
pub fn load(path: &Path, kind: FormatKind) -> Result<Source, ReportError> {
    let bytes = std::fs::read(path).map_err(|source| ReportError::UnreadableSource {
        path: path.to_path_buf(),
        source,
    })?;
    match kind {
        // Invalid bytes in raw bodies and paths become U+FFFD.
        FormatKind::Text => Ok(Source::Text {
            path: path.to_path_buf(),
            content: String::from_utf8_lossy(&bytes).into_owned(),
        }),
        FormatKind::Xml => {
            let content = String::from_utf8(bytes)
                .map_err(|e| ReportError::malformed(path, format!("invalid UTF-8: {e}")))?;
            Ok(Source::Xml {
                path: path.to_path_buf(),
                root: parse_xml(path, &content)?,
            })
        }
    }
}

/// Build an element tree from XML text. Fails on anything not well-formed.
pub fn parse_xml(path: &Path, text: &str) -> Result<XmlElement, ReportError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            ReportError::malformed(
                path,
                format!("XML error at byte {}: {e}", reader.buffer_position()),
            )
        })?;

        match event {
            Event::Start(e) => stack.push(element(path, &e)?),
            Event::Empty(e) => {
                let el = element(path, &e)?;
                attach(path, &mut stack, &mut root, el)?;
            }
            Event::End(_) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| ReportError::malformed(path, "unexpected closing tag"))?;
                attach(path, &mut stack, &mut root, el)?;
            }
            Event::Text(e) => {
                if let Some(current) = stack.last_mut() {
                    let raw = String::from_utf8_lossy(&e);
                    let text = quick_xml::escape::unescape(&raw)
                        .map_err(|e| ReportError::malformed(path, e.to_string()))?;
                    current.text.push_str(&text);
                }
            }
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::GeneralRef(e) => {
                if let Some(current) = stack.last_mut() {
                    let reference = format!("&{};", String::from_utf8_lossy(&e));
                    let text = quick_xml::escape::unescape(&reference)
                        .map_err(|e| ReportError::malformed(path, e.to_string()))?;
                    current.text.push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ReportError::malformed(
            path,
            format!("unclosed element <{}>", open.name),
        ));
    }
    root.ok_or_else(|| ReportError::malformed(path, "no root element"))
}

fn element(path: &Path, start: &BytesStart<'_>) -> Result<XmlElement, ReportError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ReportError::malformed(path, e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = String::from_utf8_lossy(&attr.value);
        let value = quick_xml::escape::unescape(&raw)
            .map_err(|e| ReportError::malformed(path, e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        ..XmlElement::default()
    })
}

fn attach(
    path: &Path,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    el: XmlElement,
) -> Result<(), ReportError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(el);
        return Ok(());
    }
    if root.is_some() {
        return Err(ReportError::malformed(path, "multiple root elements"));
    }
    *root = Some(el);
    Ok(())
}

/// Per-call cache of loaded sources, keyed by path and format kind.
///
/// Lets several adapters probe the same file with a single disk read.
#[derive(Debug, Default)]
pub struct SourceCache {
    sources: HashMap<(PathBuf, FormatKind), Source>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&mut self, path: &Path, kind: FormatKind) -> Result<&Source, ReportError> {
        let key = (path.to_path_buf(), kind);
        if self.sources.contains_key(&key) {
            tracing::debug!(path = %path.display(), ?kind, "Source cache hit");
        } else {
            let source = load(path, kind)?;
            self.sources.insert(key.clone(), source);
        }
        Ok(&self.sources[&key])
    }

    /// Remove a loaded source, handing ownership to the caller.
    pub fn take(&mut self, path: &Path, kind: FormatKind) -> Option<Source> {
        self.sources.remove(&(path.to_path_buf(), kind))
    }
}
