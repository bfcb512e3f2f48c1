use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use pom_rpc::{Node, NodeValue, ScalarValue};
use serde::Serialize;
use serde_json::{json, Value};

/// Read a reply body from `path`, or stdin when no path is given.
pub fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
        }
        None => {
            let mut body = String::new();
            io::stdin()
                .read_to_string(&mut body)
                .context("read reply from stdin")?;
            Ok(body)
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialise JSON output")?;
    println!("{text}");
    Ok(())
}

/// JSON form of a decoded tree. Numbers that fail to parse become `null`.
pub fn node_to_json(node: &Node) -> Value {
    match node.value() {
        NodeValue::Scalar(scalar) => match scalar {
            ScalarValue::String(text) | ScalarValue::Base64(text) => json!(text),
            ScalarValue::Integer(value) => json!(value),
            ScalarValue::Double(value) => json!(value),
            ScalarValue::Boolean(value) => json!(value),
            ScalarValue::Opaque { raw, .. } => json!(raw),
            ScalarValue::NotANumber { .. } => Value::Null,
        },
        NodeValue::Sequence(children) => Value::Array(children.iter().map(node_to_json).collect()),
        NodeValue::Mapping(members) => Value::Object(
            members
                .iter()
                .map(|(name, child)| (name.to_string(), node_to_json(child)))
                .collect(),
        ),
    }
}

/// Indented text listing of a decoded tree, one node per line.
pub fn render_tree(node: &Node) -> String {
    let mut out = String::new();
    render_into(node, None, 0, &mut out);
    out
}

fn render_into(node: &Node, label: Option<&str>, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let label = label.map(|name| format!("{name}: ")).unwrap_or_default();
    match node {
        Node::Scalar(scalar) => {
            let _ = writeln!(
                out,
                "{indent}{label}{} = {:?}",
                scalar.kind(),
                scalar.raw()
            );
        }
        Node::Struct(members) => {
            let _ = writeln!(out, "{indent}{label}struct ({} members)", members.len());
            for (name, child) in members.iter() {
                render_into(child, Some(name), depth + 1, out);
            }
        }
        Node::Array(_) | Node::Params(_) => {
            let children = node.children();
            let _ = writeln!(
                out,
                "{indent}{label}{} ({} items)",
                node.type_name(),
                children.len()
            );
            for (index, child) in children.iter().enumerate() {
                render_into(child, Some(&index.to_string()), depth + 1, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pom_rpc::{Array, Struct};

    fn sample() -> Node {
        let mut members = Struct::new();
        members.insert("name", Node::string("eth0"));
        members.insert("snaplen", Node::integer(1500));
        members.insert("bad", Node::scalar("int", "n/a").unwrap());
        let list: Array = [Node::boolean(true)].into_iter().collect();
        members.insert("flags", Node::Array(list));
        Node::Struct(members)
    }

    #[test]
    fn json_conversion() {
        let value = node_to_json(&sample());
        assert_eq!(value["name"], json!("eth0"));
        assert_eq!(value["snaplen"], json!(1500));
        assert_eq!(value["bad"], Value::Null);
        assert_eq!(value["flags"], json!([true]));
    }

    #[test]
    fn tree_rendering() {
        let text = render_tree(&sample());
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "struct (4 members)");
        assert_eq!(lines[1], "  name: string = \"eth0\"");
        assert_eq!(lines[2], "  snaplen: i4 = \"1500\"");
        assert_eq!(lines[4], "  flags: array (1 items)");
        assert_eq!(lines[5], "    0: boolean = \"1\"");
    }
}
