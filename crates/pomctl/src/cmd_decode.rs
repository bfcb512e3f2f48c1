use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use pom_rpc::{handle_reply, Response};
use tracing::{info, warn};

use crate::common;

pub fn run(input: Option<PathBuf>, action: Option<String>, json: bool) -> Result<()> {
    let body = common::read_input(input.as_ref())?;
    info!(bytes = body.len(), "decoding reply");
    let response = handle_reply(&body).context("decode reply")?;

    match response {
        Response::Success(node) => {
            if json {
                common::print_json(&common::node_to_json(&node))?;
            } else {
                print!("{}", common::render_tree(&node));
            }
            Ok(())
        }
        Response::Fault(fault) => {
            warn!(code = ?fault.code, "core reported a fault");
            let action = action.as_deref().unwrap_or("call");
            bail!("{}", fault.describe(action));
        }
    }
}
