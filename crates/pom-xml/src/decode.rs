//! Reply envelope decoding into a [`Node`] tree.

use pom_value::{Array, Node, Params, Scalar, ScalarKind, Struct};
use tracing::debug;

use crate::dom::{self, Element};
use crate::{DecodeError, Malformed};

/// Decode the success value of a reply envelope.
///
/// This does not look for faults; use [`crate::parse_response`] when the reply
/// may be a fault.
pub fn decode_response(xml: &str) -> Result<Node, DecodeError> {
    let document = dom::parse_document(xml).map_err(|err| DecodeError::from_parse(err, xml))?;
    decode_document(&document).map_err(|reason| DecodeError::malformed(reason, xml))
}

/// Walk `methodResponse > params > param > value` and decode the value.
pub fn decode_document(document: &Element) -> Result<Node, Malformed> {
    let response = document
        .find("methodResponse")
        .ok_or(Malformed::MissingMethodResponse)?;
    let params = response.child("params").ok_or(Malformed::MissingParams)?;
    let param = params.child("param").ok_or(Malformed::MissingParam)?;
    let value = param.child("value").ok_or(Malformed::MissingValue)?;
    let node = decode_value(value)?;
    debug!(root = node.type_name(), "decoded reply");
    Ok(node)
}

/// Decode the content of a `value` element.
///
/// The first element child selects the variant. A value holding only text is
/// a plain string.
pub fn decode_value(value: &Element) -> Result<Node, Malformed> {
    match value.first_child() {
        Some(typed) => decode_element(typed),
        None if !value.text().is_empty() => Ok(Node::string(value.text())),
        None => Err(Malformed::EmptyValue),
    }
}

/// Decode a typed element such as `<array>`, `<struct>` or `<i4>`.
pub fn decode_element(element: &Element) -> Result<Node, Malformed> {
    match element.name.as_str() {
        "array" => {
            let data = element.child("data").ok_or(Malformed::MissingData)?;
            let array = data
                .children
                .iter()
                .map(decode_item)
                .collect::<Result<Array, _>>()?;
            Ok(Node::Array(array))
        }
        "params" => {
            let mut params = Params::new();
            for item in &element.children {
                params.push(decode_item(item)?);
            }
            Ok(Node::Params(params))
        }
        "struct" => {
            let mut members = Struct::new();
            for member in &element.children {
                let name = member.child("name").map(Element::text).unwrap_or_default();
                let value = member
                    .child("value")
                    .ok_or_else(|| Malformed::MissingMemberValue {
                        name: name.to_string(),
                    })?;
                members.insert(name, decode_value(value)?);
            }
            Ok(Node::Struct(members))
        }
        tag => {
            let mut scalar = Scalar::new(ScalarKind::from_wire_tag(tag));
            scalar.set_raw(element.text());
            Ok(Node::Scalar(scalar))
        }
    }
}

/// Decode one entry of an array `data` or a `params` list.
///
/// Entries are normally `<value>` elements, but `<param><value>` wrappers and
/// producers that double-wrap array items are unwrapped by one level.
fn decode_item(item: &Element) -> Result<Node, Malformed> {
    if !item.has_content() {
        return Err(Malformed::EmptyArrayItem);
    }
    match item.first_child() {
        Some(inner) if inner.name == "value" => decode_value(inner),
        _ => decode_value(item),
    }
}
