//! Serialization of value trees into call envelopes.

use pom_value::{Node, Params};
use quick_xml::escape::escape;
use tracing::debug;

/// Serialize any node into `out`.
pub fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Scalar(scalar) => {
            let tag = scalar.kind().wire_tag();
            out.push('<');
            out.push_str(tag);
            out.push('>');
            out.push_str(&escape(scalar.raw()));
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        Node::Array(array) => {
            out.push_str("<array><data>");
            for child in array.children() {
                out.push_str("<value>");
                write_node(child, out);
                out.push_str("</value>\n");
            }
            out.push_str("</data></array>");
        }
        Node::Struct(members) => {
            out.push_str("<struct>");
            for (name, child) in members.iter() {
                out.push_str("<member><name>");
                out.push_str(&escape(name));
                out.push_str("</name><value>");
                write_node(child, out);
                out.push_str("</value></member>");
            }
            out.push_str("</struct>");
        }
        Node::Params(params) => write_params(params, out),
    }
}

fn write_params(params: &Params, out: &mut String) {
    out.push_str("<params>");
    for child in params.children() {
        out.push_str("<param><value>");
        write_node(child, out);
        out.push_str("</value></param>\n");
    }
    out.push_str("</params>");
}

/// Serialize a single node.
pub fn encode_node(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

/// Serialize a params list.
pub fn encode_params(params: &Params) -> String {
    let mut out = String::new();
    write_params(params, &mut out);
    out
}

/// Build the full `methodCall` body for `method`.
pub fn encode_call(method: &str, params: &Params) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?><methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName>");
    write_params(params, &mut out);
    out.push_str("</methodCall>");
    debug!(method, args = params.len(), bytes = out.len(), "encoded call");
    out
}
