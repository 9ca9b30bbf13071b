/// Minimal XML element tree for scraping SOS responses.
///
/// SOS documents are read by exact qualified tag name (`sos:procedure`,
/// `gml:coordinates`, ...) in document order, the way a DOM
/// `getElementsByTagName` lookup works. Nothing here interprets namespaces
/// or schema structure; a prefix is just part of the name.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::model::SosError;

#[derive(Debug, Clone, PartialEq)]
enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Qualified tag name, prefix included.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of the attribute with this exact qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated text of every descendant text node, in order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(el) => el.collect_text(out),
            }
        }
    }

    /// Descendants (not including `self`) named `tag`, in document order.
    pub fn elements_by_tag<'a>(&'a self, tag: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        self.collect_named(tag, &mut found);
        found
    }

    /// First descendant named `tag`.
    pub fn first_by_tag(&self, tag: &str) -> Option<&XmlElement> {
        self.elements_by_tag(tag).into_iter().next()
    }

    fn collect_named<'a>(&'a self, tag: &str, found: &mut Vec<&'a XmlElement>) {
        for child in &self.children {
            if let XmlNode::Element(el) = child {
                if el.name == tag {
                    found.push(el);
                }
                el.collect_named(tag, found);
            }
        }
    }
}

/// A parsed, well-formed document with exactly one root element.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    pub fn parse(xml: &str) -> Result<XmlDocument, SosError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => stack.push(element_from_start(e)?),
                Ok(Event::Empty(ref e)) => {
                    let element = element_from_start(e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack.pop().ok_or_else(|| {
                        SosError::ParseError("closing tag without matching opening tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(ref t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| SosError::ParseError(format!("bad text content: {}", e)))?;
                    push_text(&mut stack, text.into_owned())?;
                }
                Ok(Event::CData(c)) => {
                    let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    push_text(&mut stack, text)?;
                }
                Ok(Event::Eof) => break,
                Ok(_) => {} // declaration, comments, processing instructions, doctype
                Err(e) => {
                    return Err(SosError::ParseError(format!(
                        "malformed XML at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(SosError::ParseError(format!(
                "unexpected end of document inside <{}>",
                open.name
            )));
        }

        root.map(|root| XmlDocument { root })
            .ok_or_else(|| SosError::ParseError("document has no root element".to_string()))
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Every element named `tag`, root included, in document order.
    pub fn elements_by_tag<'a>(&'a self, tag: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        if self.root.name == tag {
            found.push(&self.root);
        }
        self.root.collect_named(tag, &mut found);
        found
    }

    pub fn first_by_tag(&self, tag: &str) -> Option<&XmlElement> {
        self.elements_by_tag(tag).into_iter().next()
    }

    /// The service's error message if this document is an OWS exception
    /// report rather than a real answer.
    pub fn exception_report(&self) -> Option<String> {
        if !self.root.name.ends_with("ExceptionReport") {
            return None;
        }

        let texts: Vec<String> = self
            .elements_by_tag("ows:ExceptionText")
            .iter()
            .map(|el| el.text_content().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        if texts.is_empty() {
            Some("service returned an exception report".to_string())
        } else {
            Some(texts.join("; "))
        }
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, SosError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();

    for attr in start.attributes() {
        let attr = attr
            .map_err(|e| SosError::ParseError(format!("bad attribute on <{}>: {}", name, e)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| SosError::ParseError(format!("bad attribute value on <{}>: {}", name, e)))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), SosError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(SosError::ParseError("more than one root element".to_string()))
    }
}

fn push_text(stack: &mut [XmlElement], text: String) -> Result<(), SosError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmlNode::Text(text));
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(SosError::ParseError("text outside the root element".to_string())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
