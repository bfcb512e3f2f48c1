use anyhow::{Context, Result};
use pom_rpc::{MethodCall, Params, CONTENT_TYPE, RPC_PATH};
use serde::Serialize;
use tracing::info;

use crate::common;

#[derive(Serialize)]
struct CallBody<'a> {
    path: &'a str,
    content_type: &'a str,
    method: &'a str,
    body: String,
}

pub fn run(method: String, args: Vec<String>, json: bool) -> Result<()> {
    let params = Params::from_flat(&args)
        .with_context(|| format!("build arguments for {method}"))?;
    info!(method = %method, args = params.len(), "encoding call");
    let call = MethodCall { method, params };
    let body = call.to_xml();

    if json {
        let payload = CallBody {
            path: RPC_PATH,
            content_type: CONTENT_TYPE,
            method: &call.method,
            body,
        };
        common::print_json(&payload)?;
    } else {
        println!("{body}");
    }

    Ok(())
}
