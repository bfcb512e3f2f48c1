//! Detection of application-level faults in reply envelopes.

use std::fmt;

use tracing::debug;

use crate::decode::decode_value;
use crate::dom::Element;
use crate::Malformed;

/// Fault reported by the core in place of a success value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// `faultCode` member when the core supplied one.
    pub code: Option<i64>,
    /// `faultString` member, verbatim.
    pub message: String,
}

impl Fault {
    /// Operator notice for a failed `action`.
    pub fn describe(&self, action: &str) -> String {
        format!("Cannot complete {action} due to: {}", self.message)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Look for a `fault` element and extract its message.
///
/// Returns `Ok(None)` when the document carries no fault.
pub fn find_fault(document: &Element) -> Result<Option<Fault>, Malformed> {
    let Some(fault) = document.find("fault") else {
        return Ok(None);
    };
    let value = fault.child("value").ok_or(Malformed::MalformedFault)?;
    let node = decode_value(value).map_err(|_| Malformed::MalformedFault)?;
    let members = node.as_struct().ok_or(Malformed::MalformedFault)?;
    let message = members
        .get("faultString")
        .and_then(|node| node.as_scalar())
        .ok_or(Malformed::MalformedFault)?
        .as_str()
        .to_string();
    let code = members
        .get("faultCode")
        .and_then(|node| node.as_scalar())
        .and_then(|scalar| scalar.as_i64().ok());
    debug!(?code, %message, "reply carries a fault");
    Ok(Some(Fault { code, message }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;

    const FAULT: &str = "<?xml version=\"1.0\"?>\
        <methodResponse><fault><value><struct>\
          <member><name>faultCode</name><value><int>-501</int></value></member>\
          <member><name>faultString</name><value><string>Rule not found</string></value></member>\
        </struct></value></fault></methodResponse>";

    #[test]
    fn extracts_message_and_code() {
        let document = parse_document(FAULT).expect("parse");
        let fault = find_fault(&document).expect("well formed").expect("fault");
        assert_eq!(fault.message, "Rule not found");
        assert_eq!(fault.code, Some(-501));
        assert_eq!(fault.to_string(), "Rule not found");
        assert_eq!(
            fault.describe("Remove Rule"),
            "Cannot complete Remove Rule due to: Rule not found"
        );
    }

    #[test]
    fn success_reply_has_no_fault() {
        let document = parse_document(
            "<methodResponse><params><param><value><i4>1</i4></value></param></params></methodResponse>",
        )
        .expect("parse");
        assert_eq!(find_fault(&document), Ok(None));
    }

    #[test]
    fn fault_without_message_is_malformed() {
        let document = parse_document(
            "<methodResponse><fault><value><struct>\
               <member><name>faultCode</name><value><int>1</int></value></member>\
             </struct></value></fault></methodResponse>",
        )
        .expect("parse");
        assert_eq!(find_fault(&document), Err(Malformed::MalformedFault));

        let document =
            parse_document("<methodResponse><fault><value><i4>1</i4></value></fault></methodResponse>")
                .expect("parse");
        assert_eq!(find_fault(&document), Err(Malformed::MalformedFault));
    }
}
