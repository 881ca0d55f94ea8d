//! Namespace-aware XML element tree built on quick-xml.

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

/// XML parsing errors
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("document has no root element")]
    NoRoot,

    #[error("element <{0}> is not closed")]
    Unclosed(String),
}

/// An owned XML element with resolved namespace and local names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    /// Namespace URI the element is bound to, if any
    pub namespace: Option<String>,

    /// Local name (prefix removed)
    pub name: String,

    /// Attributes by local name; namespace declarations are dropped
    pub attributes: Vec<(String, String)>,

    /// Character data directly inside this element; trimmed chunks are
    /// joined with a single space
    pub text: String,

    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Parse a document and return its root element
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let (resolved, event) = reader.read_resolved_event_into(&mut buf)?;
            let namespace = match resolved {
                ResolveResult::Bound(Namespace(ns)) => Some(String::from_utf8_lossy(ns).into_owned()),
                _ => None,
            };

            match event {
                // trailing content after the root element
                Event::Start(_) | Event::Empty(_) if root.is_some() => {}
                Event::Start(e) => {
                    stack.push(Self::open(namespace, &e)?);
                }
                Event::Empty(e) => {
                    let element = Self::open(namespace, &e)?;
                    Self::close(element, &mut stack, &mut root);
                }
                Event::End(_) => {
                    if let Some(element) = stack.pop() {
                        Self::close(element, &mut stack, &mut root);
                    }
                }
                Event::Text(e) => {
                    if let Some(current) = stack.last_mut() {
                        current.push_text(&e.unescape()?);
                    }
                }
                Event::CData(e) => {
                    if let Some(current) = stack.last_mut() {
                        current.push_text(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if let Some(open) = stack.pop() {
            return Err(XmlError::Unclosed(open.name));
        }
        root.ok_or(XmlError::NoRoot)
    }

    fn open(
        namespace: Option<String>,
        start: &quick_xml::events::BytesStart<'_>,
    ) -> Result<Self, XmlError> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            namespace,
            name,
            attributes,
            ..Default::default()
        })
    }

    fn push_text(&mut self, chunk: &str) {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(chunk);
    }

    fn close(element: XmlElement, stack: &mut [XmlElement], root: &mut Option<XmlElement>) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => *root = Some(element),
        }
    }

    /// This element or the first descendant with the given local name (depth-first)
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Value of an attribute by local name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the element has neither attributes nor children
    pub fn is_leaf(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty()
    }
}
