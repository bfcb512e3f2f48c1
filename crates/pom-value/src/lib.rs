//! XML-RPC value tree: typed scalars and composite nodes exchanged with the core.

use std::fmt;

use thiserror::Error;
use tracing::trace;

/// Error type produced by value tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The requested scalar tag is not part of the registered tag table.
    #[error("unknown scalar type: {0}")]
    UnknownType(String),
    /// A value was assigned to a composite node.
    #[error("cannot set a value on composite node: {0}")]
    InvalidOperation(String),
    /// Numeric text could not be coerced for the given tag.
    #[error("not a number for {tag}: {raw:?}")]
    NotANumber { tag: String, raw: String },
    /// A flat argument list ended with a type tag lacking its value.
    #[error("argument of type {0} has no value")]
    UnpairedArgument(String),
}

/// Scalar kinds known to the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Text payload.
    String,
    /// Base-10 integer, `i4`/`int`/`integer` on the wire.
    Integer,
    /// Floating point number.
    Double,
    /// `true`/`1` or anything else.
    Boolean,
    /// Base64 text passed through undecoded.
    Base64,
    /// Tag read off the wire that has no registered kind.
    Opaque(String),
}

impl ScalarKind {
    /// Resolve a tag against the registered table.
    ///
    /// Only the fixed protocol tags are accepted; anything else is
    /// [`ValueError::UnknownType`].
    pub fn from_tag(tag: &str) -> Result<Self, ValueError> {
        match tag {
            "string" => Ok(ScalarKind::String),
            "i4" | "int" | "integer" => Ok(ScalarKind::Integer),
            "double" => Ok(ScalarKind::Double),
            "boolean" => Ok(ScalarKind::Boolean),
            "base64" => Ok(ScalarKind::Base64),
            other => Err(ValueError::UnknownType(other.to_string())),
        }
    }

    /// Resolve a tag found in a reply, keeping unknown tags as opaque scalars.
    pub fn from_wire_tag(tag: &str) -> Self {
        Self::from_tag(tag).unwrap_or_else(|_| ScalarKind::Opaque(tag.to_string()))
    }

    /// Tag written on the request side.
    pub fn wire_tag(&self) -> &str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "i4",
            ScalarKind::Double => "double",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Base64 => "base64",
            ScalarKind::Opaque(tag) => tag,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_tag())
    }
}

/// Leaf value holding the raw wire text of one scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    kind: ScalarKind,
    payload: String,
}

/// Typed view of a scalar after coercion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue<'a> {
    String(&'a str),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    Base64(&'a str),
    Opaque { tag: &'a str, raw: &'a str },
    /// Integer or double payload that failed to parse.
    NotANumber { tag: &'a str, raw: &'a str },
}

impl Scalar {
    /// Create an empty scalar of the given kind.
    pub fn new(kind: ScalarKind) -> Self {
        Scalar {
            kind,
            payload: String::new(),
        }
    }

    /// Create a scalar from a registered tag and payload.
    pub fn with_tag(tag: &str, payload: impl Into<String>) -> Result<Self, ValueError> {
        let kind = ScalarKind::from_tag(tag)?;
        Ok(Scalar {
            kind,
            payload: payload.into(),
        })
    }

    pub fn kind(&self) -> &ScalarKind {
        &self.kind
    }

    /// Raw payload text as stored.
    pub fn raw(&self) -> &str {
        &self.payload
    }

    pub fn set_raw(&mut self, payload: impl Into<String>) {
        self.payload = payload.into();
    }

    /// Typed value coerced according to the scalar kind.
    pub fn value(&self) -> ScalarValue<'_> {
        let raw = self.payload.as_str();
        match &self.kind {
            ScalarKind::String => ScalarValue::String(raw),
            ScalarKind::Base64 => ScalarValue::Base64(raw),
            ScalarKind::Boolean => ScalarValue::Boolean(parse_bool(raw)),
            ScalarKind::Integer => match raw.trim().parse::<i64>() {
                Ok(value) => ScalarValue::Integer(value),
                Err(_) => ScalarValue::NotANumber {
                    tag: self.kind.wire_tag(),
                    raw,
                },
            },
            ScalarKind::Double => match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => ScalarValue::Double(value),
                _ => ScalarValue::NotANumber {
                    tag: self.kind.wire_tag(),
                    raw,
                },
            },
            ScalarKind::Opaque(tag) => ScalarValue::Opaque {
                tag: tag.as_str(),
                raw,
            },
        }
    }

    /// Payload as text; every kind has a textual form.
    pub fn as_str(&self) -> &str {
        &self.payload
    }

    /// Integer value, also accepting integral doubles.
    pub fn as_i64(&self) -> Result<i64, ValueError> {
        match self.value() {
            ScalarValue::Integer(value) => Ok(value),
            ScalarValue::Double(value)
                if value.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&value) =>
            {
                Ok(value as i64)
            }
            ScalarValue::Boolean(value) => Ok(i64::from(value)),
            _ => Err(self.not_a_number()),
        }
    }

    pub fn as_f64(&self) -> Result<f64, ValueError> {
        match self.value() {
            ScalarValue::Double(value) => Ok(value),
            ScalarValue::Integer(value) => Ok(value as f64),
            _ => Err(self.not_a_number()),
        }
    }

    /// Boolean coercion; non-boolean kinds use the same `true`/`1` rule.
    pub fn as_bool(&self) -> bool {
        parse_bool(&self.payload)
    }

    fn not_a_number(&self) -> ValueError {
        ValueError::NotANumber {
            tag: self.kind.wire_tag().to_string(),
            raw: self.payload.clone(),
        }
    }
}

/// 2^63; integral doubles in `-2^63..2^63` convert to `i64` exactly.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn parse_bool(raw: &str) -> bool {
    raw == "true" || raw == "1"
}

/// Ordered, heterogeneous list of nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Array {
    children: Vec<Node>,
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child; order is preserved.
    pub fn push(&mut self, node: Node) {
        self.children.push(node);
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl FromIterator<Node> for Array {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Array {
            children: iter.into_iter().collect(),
        }
    }
}

/// Named members with unique, case-sensitive keys.
///
/// Members keep the position of their first insertion; inserting an existing
/// name replaces its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Struct {
    members: Vec<(String, Node)>,
}

impl Struct {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the member called `name`.
    pub fn insert(&mut self, name: impl Into<String>, node: Node) {
        let name = name.into();
        if let Some(slot) = self.members.iter_mut().find(|(key, _)| *key == name) {
            trace!(member = %name, "overwriting struct member");
            slot.1 = node;
        } else {
            self.members.push((name, node));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.members
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, node)| node)
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.members.iter().map(|(key, node)| (key.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Top-level argument list of an outbound call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    children: Vec<Node>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) {
        self.children.push(node);
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Build a params list with one scalar per `(tag, raw)` pair, in order.
    pub fn from_pairs<I, T, V>(pairs: I) -> Result<Self, ValueError>
    where
        I: IntoIterator<Item = (T, V)>,
        T: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Params::new();
        for (tag, raw) in pairs {
            params.push(Node::Scalar(Scalar::with_tag(tag.as_ref(), raw)?));
        }
        Ok(params)
    }

    /// Build a params list from an alternating `tag, value, tag, value...` list.
    pub fn from_flat<S: AsRef<str>>(args: &[S]) -> Result<Self, ValueError> {
        let mut chunks = args.chunks_exact(2);
        let pairs = chunks
            .by_ref()
            .map(|pair| (pair[0].as_ref(), pair[1].as_ref().to_string()))
            .collect::<Vec<_>>();
        if let [tag] = chunks.remainder() {
            return Err(ValueError::UnpairedArgument(tag.as_ref().to_string()));
        }
        Self::from_pairs(pairs)
    }
}

/// One value of the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Array(Array),
    Struct(Struct),
    Params(Params),
}

/// Borrowed view returned by [`Node::value`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeValue<'a> {
    Scalar(ScalarValue<'a>),
    Sequence(&'a [Node]),
    Mapping(&'a Struct),
}

impl Node {
    /// Create an empty scalar node for a registered tag.
    pub fn create_scalar(tag: &str) -> Result<Self, ValueError> {
        Ok(Node::Scalar(Scalar::new(ScalarKind::from_tag(tag)?)))
    }

    /// Create a scalar node for a registered tag with its payload.
    pub fn scalar(tag: &str, payload: impl Into<String>) -> Result<Self, ValueError> {
        Ok(Node::Scalar(Scalar::with_tag(tag, payload)?))
    }

    pub fn string(payload: impl Into<String>) -> Self {
        Node::Scalar(Scalar {
            kind: ScalarKind::String,
            payload: payload.into(),
        })
    }

    pub fn integer(value: i64) -> Self {
        Node::Scalar(Scalar {
            kind: ScalarKind::Integer,
            payload: value.to_string(),
        })
    }

    /// Finite doubles only; NaN and infinities have no wire form.
    pub fn double(value: f64) -> Result<Self, ValueError> {
        if !value.is_finite() {
            return Err(ValueError::NotANumber {
                tag: ScalarKind::Double.wire_tag().to_string(),
                raw: value.to_string(),
            });
        }
        Ok(Node::Scalar(Scalar {
            kind: ScalarKind::Double,
            payload: value.to_string(),
        }))
    }

    pub fn boolean(value: bool) -> Self {
        Node::Scalar(Scalar {
            kind: ScalarKind::Boolean,
            payload: if value { "1" } else { "0" }.to_string(),
        })
    }

    /// Tag name of the node as used on the wire.
    pub fn type_name(&self) -> &str {
        match self {
            Node::Scalar(scalar) => scalar.kind.wire_tag(),
            Node::Array(_) => "array",
            Node::Struct(_) => "struct",
            Node::Params(_) => "params",
        }
    }

    /// Composite nodes reject [`Node::set_value`].
    pub fn is_composite(&self) -> bool {
        !matches!(self, Node::Scalar(_))
    }

    /// Replace the payload of a scalar node.
    pub fn set_value(&mut self, payload: impl Into<String>) -> Result<(), ValueError> {
        match self {
            Node::Scalar(scalar) => {
                scalar.set_raw(payload);
                Ok(())
            }
            other => Err(ValueError::InvalidOperation(other.type_name().to_string())),
        }
    }

    /// Typed scalar value or the underlying container of a composite.
    pub fn value(&self) -> NodeValue<'_> {
        match self {
            Node::Scalar(scalar) => NodeValue::Scalar(scalar.value()),
            Node::Array(array) => NodeValue::Sequence(array.children()),
            Node::Params(params) => NodeValue::Sequence(params.children()),
            Node::Struct(members) => NodeValue::Mapping(members),
        }
    }

    /// Append to an array or params node.
    pub fn add_child(&mut self, node: Node) -> Result<(), ValueError> {
        match self {
            Node::Array(array) => array.push(node),
            Node::Params(params) => params.push(node),
            other => return Err(ValueError::InvalidOperation(other.type_name().to_string())),
        }
        Ok(())
    }

    /// Insert or overwrite a member of a struct node.
    pub fn add_member(&mut self, name: impl Into<String>, node: Node) -> Result<(), ValueError> {
        match self {
            Node::Struct(members) => {
                members.insert(name, node);
                Ok(())
            }
            other => Err(ValueError::InvalidOperation(other.type_name().to_string())),
        }
    }

    /// Children of an array or params node; empty for other kinds.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Array(array) => array.children(),
            Node::Params(params) => params.children(),
            _ => &[],
        }
    }

    /// Struct member lookup.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.as_struct().and_then(|members| members.get(name))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Node::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Node::Struct(members) => Some(members),
            _ => None,
        }
    }

    pub fn as_params(&self) -> Option<&Params> {
        match self {
            Node::Params(params) => Some(params),
            _ => None,
        }
    }
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Node::Scalar(scalar)
    }
}

impl From<Array> for Node {
    fn from(array: Array) -> Self {
        Node::Array(array)
    }
}

impl From<Struct> for Node {
    fn from(members: Struct) -> Self {
        Node::Struct(members)
    }
}

impl From<Params> for Node {
    fn from(params: Params) -> Self {
        Node::Params(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_aliases_share_a_kind() {
        for tag in ["i4", "int", "integer"] {
            let node = Node::scalar(tag, "7").expect("integer alias");
            assert_eq!(node.value(), NodeValue::Scalar(ScalarValue::Integer(7)));
            assert_eq!(node.type_name(), "i4");
        }
    }

    #[test]
    fn unknown_tag_is_rejected_on_construction() {
        let err = Node::create_scalar("dateTime.iso8601").unwrap_err();
        assert_eq!(err, ValueError::UnknownType("dateTime.iso8601".into()));
        assert_eq!(
            ScalarKind::from_wire_tag("dateTime.iso8601"),
            ScalarKind::Opaque("dateTime.iso8601".into())
        );
    }

    #[test]
    fn boolean_coercion() {
        for raw in ["true", "1"] {
            let scalar = Scalar::with_tag("boolean", raw).unwrap();
            assert_eq!(scalar.value(), ScalarValue::Boolean(true), "{raw}");
        }
        for raw in ["false", "0", "", "TRUE"] {
            let scalar = Scalar::with_tag("boolean", raw).unwrap();
            assert_eq!(scalar.value(), ScalarValue::Boolean(false), "{raw}");
        }
    }

    #[test]
    fn numeric_coercion_yields_sentinel() {
        let scalar = Scalar::with_tag("int", "abc").unwrap();
        assert!(matches!(
            scalar.value(),
            ScalarValue::NotANumber { tag: "i4", raw: "abc" }
        ));
        let err = scalar.as_i64().unwrap_err();
        assert!(matches!(err, ValueError::NotANumber { .. }));

        let double = Scalar::with_tag("double", " 2.5 ").unwrap();
        assert_eq!(double.as_f64().expect("double"), 2.5);
        let bad = Scalar::with_tag("double", "").unwrap();
        assert!(bad.as_f64().is_err());
    }

    #[test]
    fn non_finite_doubles_are_not_numbers() {
        for raw in ["NaN", "inf", "-infinity", "+Infinity"] {
            let scalar = Scalar::with_tag("double", raw).unwrap();
            assert!(
                matches!(scalar.value(), ScalarValue::NotANumber { tag: "double", .. }),
                "{raw}"
            );
            assert!(scalar.as_f64().is_err(), "{raw}");
        }
        assert!(matches!(
            Node::double(f64::NAN),
            Err(ValueError::NotANumber { .. })
        ));
        assert!(Node::double(f64::NEG_INFINITY).is_err());
        let node = Node::double(0.25).expect("finite double");
        assert_eq!(node.value(), NodeValue::Scalar(ScalarValue::Double(0.25)));
    }

    #[test]
    fn integral_doubles_convert_only_within_range() {
        let scalar = Scalar::with_tag("double", "1e30").unwrap();
        assert!(matches!(
            scalar.as_i64(),
            Err(ValueError::NotANumber { .. })
        ));
        let scalar = Scalar::with_tag("double", "9223372036854775808").unwrap();
        assert!(scalar.as_i64().is_err());
        let scalar = Scalar::with_tag("double", "-9223372036854775808").unwrap();
        assert_eq!(scalar.as_i64().expect("i64::MIN"), i64::MIN);
        let scalar = Scalar::with_tag("double", "1024.0").unwrap();
        assert_eq!(scalar.as_i64().expect("integral"), 1024);
        let scalar = Scalar::with_tag("double", "1.5").unwrap();
        assert!(scalar.as_i64().is_err());
    }

    #[test]
    fn composites_reject_set_value() {
        let mut node = Node::Array(Array::new());
        let err = node.set_value("x").unwrap_err();
        assert_eq!(err, ValueError::InvalidOperation("array".into()));
        let mut node = Node::Struct(Struct::new());
        assert!(node.set_value("x").is_err());

        let mut scalar = Node::create_scalar("string").expect("string");
        scalar.set_value("hello").expect("set scalar");
        assert_eq!(scalar.value(), NodeValue::Scalar(ScalarValue::String("hello")));
    }

    #[test]
    fn struct_last_write_wins() {
        let mut members = Struct::new();
        members.insert("name", Node::string("first"));
        members.insert("other", Node::integer(1));
        members.insert("name", Node::string("second"));
        assert_eq!(members.len(), 2);
        let value = members.get("name").and_then(Node::as_scalar).unwrap();
        assert_eq!(value.as_str(), "second");
        let order: Vec<_> = members.iter().map(|(key, _)| key).collect();
        assert_eq!(order, ["name", "other"]);
        assert!(members.get("Name").is_none());
    }

    #[test]
    fn array_keeps_order() {
        let mut node = Node::Array(Array::new());
        node.add_child(Node::integer(1)).unwrap();
        node.add_child(Node::string("two")).unwrap();
        match node.value() {
            NodeValue::Sequence(children) => {
                assert_eq!(children.len(), 2);
                assert_eq!(children[0].as_scalar().unwrap().as_i64().unwrap(), 1);
                assert_eq!(children[1].type_name(), "string");
            }
            other => panic!("unexpected value: {other:?}"),
        }
        assert!(node.add_member("x", Node::integer(0)).is_err());
    }

    #[test]
    fn params_from_flat_pairs() {
        let params = Params::from_flat(&["string", "ping", "integer", "3"]).expect("params");
        assert_eq!(params.len(), 2);
        assert_eq!(params.children()[0].type_name(), "string");
        assert_eq!(params.children()[1].type_name(), "i4");

        let err = Params::from_flat(&["string", "ping", "int"]).unwrap_err();
        assert_eq!(err, ValueError::UnpairedArgument("int".into()));
        let err = Params::from_pairs([("float", "1.0")]).unwrap_err();
        assert!(matches!(err, ValueError::UnknownType(_)));
    }
}
