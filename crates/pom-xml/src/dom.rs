//! Minimal element tree built from `quick-xml` events.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// One XML element with its element children and concatenated text.
///
/// Whitespace-only text is kept in `text` but never produces a child, so
/// pretty-printed envelopes walk the same as compact ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    fn from_start(event: &BytesStart<'_>) -> Self {
        Element {
            name: String::from_utf8_lossy(event.name().as_ref()).into_owned(),
            ..Element::default()
        }
    }

    /// First direct child named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn first_child(&self) -> Option<&Element> {
        self.children.first()
    }

    /// First element named `name` in document order, including `self`.
    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Text content, empty when the element has none.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn has_content(&self) -> bool {
        !self.children.is_empty() || !self.text.is_empty()
    }
}

/// Deepest element nesting accepted in a document.
pub const MAX_DEPTH: usize = 512;

/// Failure to build an element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The text is not well-formed XML.
    Syntax(String),
    /// Elements nest deeper than [`MAX_DEPTH`].
    TooDeep,
}

impl From<String> for ParseError {
    fn from(message: String) -> Self {
        ParseError::Syntax(message)
    }
}

/// Parse `xml` and return its document element.
pub fn parse_document(xml: &str) -> Result<Element, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.check_end_names(true);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(ParseError::TooDeep);
                }
                stack.push(Element::from_start(&e));
            }
            Ok(Event::Empty(e)) => {
                attach(Element::from_start(&e), &mut stack, &mut root)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "unexpected closing tag".to_string())?;
                attach(element, &mut stack, &mut root)?;
            }
            Ok(Event::Text(e)) => {
                if let Some(current) = stack.last_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| ParseError::Syntax(err.to_string()))?;
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(ParseError::Syntax(err.to_string())),
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::Syntax(format!(
            "unclosed element <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| ParseError::Syntax("document has no root element".to_string()))
}

fn attach(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(format!("second root element <{}>", element.name))
    }
}
