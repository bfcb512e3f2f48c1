//! XML-RPC wire layer for the POM core using quick-xml.
//!
//! Replies are parsed into a small element tree, checked for faults and then
//! decoded into [`pom_value::Node`] trees. Outbound calls are rendered from
//! [`pom_value::Params`].

pub mod decode;
pub mod dom;
pub mod encode;
pub mod fault;

use pom_value::Node;
use thiserror::Error;

pub use decode::{decode_document, decode_response, decode_value};
pub use encode::{encode_call, encode_node, encode_params};
pub use fault::{find_fault, Fault};

/// Structural link missing from a reply envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Malformed {
    #[error("no methodResponse element")]
    MissingMethodResponse,
    #[error("cannot find params")]
    MissingParams,
    #[error("cannot find param")]
    MissingParam,
    #[error("cannot find value")]
    MissingValue,
    #[error("value element has no content")]
    EmptyValue,
    #[error("array has no data element")]
    MissingData,
    #[error("array item has no content")]
    EmptyArrayItem,
    #[error("struct member {name:?} has no value")]
    MissingMemberValue { name: String },
    #[error("fault has no faultString")]
    MalformedFault,
    #[error("elements nest deeper than {limit} levels")]
    TooDeep { limit: usize },
}

/// Error type produced while reading a reply envelope.
///
/// Every variant keeps the raw reply text for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The reply is not well-formed XML.
    #[error("xml: {message}: {raw}")]
    Xml { message: String, raw: String },
    /// The reply lacks an expected element.
    #[error("malformed response ({reason}): {raw}")]
    Malformed { reason: Malformed, raw: String },
}

impl DecodeError {
    pub(crate) fn malformed(reason: Malformed, raw: &str) -> Self {
        DecodeError::Malformed {
            reason,
            raw: raw.to_string(),
        }
    }

    pub(crate) fn from_parse(err: dom::ParseError, raw: &str) -> Self {
        match err {
            dom::ParseError::Syntax(message) => DecodeError::Xml {
                message,
                raw: raw.to_string(),
            },
            dom::ParseError::TooDeep => DecodeError::malformed(
                Malformed::TooDeep {
                    limit: dom::MAX_DEPTH,
                },
                raw,
            ),
        }
    }

    /// Raw reply text that failed to decode.
    pub fn raw(&self) -> &str {
        match self {
            DecodeError::Xml { raw, .. } | DecodeError::Malformed { raw, .. } => raw,
        }
    }

    /// Structural reason, when the reply was well-formed XML.
    pub fn reason(&self) -> Option<&Malformed> {
        match self {
            DecodeError::Malformed { reason, .. } => Some(reason),
            DecodeError::Xml { .. } => None,
        }
    }
}

/// Outcome of a completed call.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The call returned a value.
    Success(Node),
    /// The core declined the call.
    Fault(Fault),
}

impl Response {
    /// Success value, or the fault as an error.
    pub fn into_result(self) -> Result<Node, Fault> {
        match self {
            Response::Success(node) => Ok(node),
            Response::Fault(fault) => Err(fault),
        }
    }
}

/// Classify and decode a reply envelope.
///
/// Faults are detected first; the success decoder never runs on a fault reply.
pub fn parse_response(xml: &str) -> Result<Response, DecodeError> {
    let document = dom::parse_document(xml).map_err(|err| DecodeError::from_parse(err, xml))?;
    if let Some(fault) = fault::find_fault(&document).map_err(|r| DecodeError::malformed(r, xml))? {
        return Ok(Response::Fault(fault));
    }
    let node = decode_document(&document).map_err(|r| DecodeError::malformed(r, xml))?;
    Ok(Response::Success(node))
}
