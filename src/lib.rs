#![cfg_attr(docsrs, feature(doc_cfg))]
//! POM console RPC facade that re-exports the workspace crates and provides
//! call/reply helpers.
//!
//! ```rust
//! use pom_rpc::{handle_reply, MethodCall, Response};
//!
//! let call = MethodCall::with_args("main.getLogs", [("int", "0")])?;
//! assert!(call.to_xml().starts_with("<?xml version=\"1.0\"?><methodCall>"));
//!
//! let reply = "<methodResponse><params><param><value><i4>7</i4></value></param></params></methodResponse>";
//! match handle_reply(reply)? {
//!     Response::Success(node) => assert_eq!(node.as_scalar().unwrap().as_i64()?, 7),
//!     Response::Fault(fault) => eprintln!("{}", fault.describe("getLogs")),
//! }
//! # Ok::<(), pom_rpc::RpcError>(())
//! ```

pub use pom_value as value;
pub use pom_xml as xml;

pub use pom_value::{Array, Node, NodeValue, Params, Scalar, ScalarKind, ScalarValue, Struct};
pub use pom_xml::{DecodeError, Fault, Malformed, Response};

use thiserror::Error;
use tracing::debug;

/// Path the core serves XML-RPC requests on.
pub const RPC_PATH: &str = "/RPC2";
/// Content type of call and reply bodies.
pub const CONTENT_TYPE: &str = "text/xml";

/// Error type for the facade.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Value(#[from] pom_value::ValueError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// One outbound call: method name and its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub params: Params,
}

impl MethodCall {
    /// Call without arguments.
    pub fn new(method: impl Into<String>) -> Self {
        MethodCall {
            method: method.into(),
            params: Params::new(),
        }
    }

    /// Call whose arguments are built from `(tag, raw)` pairs.
    pub fn with_args<I, T, V>(method: impl Into<String>, args: I) -> Result<Self, RpcError>
    where
        I: IntoIterator<Item = (T, V)>,
        T: AsRef<str>,
        V: Into<String>,
    {
        Ok(MethodCall {
            method: method.into(),
            params: Params::from_pairs(args)?,
        })
    }

    /// Append an argument.
    pub fn push(&mut self, node: Node) -> &mut Self {
        self.params.push(node);
        self
    }

    /// Request body to POST to [`RPC_PATH`].
    pub fn to_xml(&self) -> String {
        pom_xml::encode_call(&self.method, &self.params)
    }
}

/// Check a reply body for a fault, then decode it.
pub fn handle_reply(body: &str) -> Result<Response, RpcError> {
    let response = pom_xml::parse_response(body)?;
    if let Response::Fault(fault) = &response {
        debug!(code = ?fault.code, "call faulted");
    }
    Ok(response)
}
