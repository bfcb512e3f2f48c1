pub mod cmd_call;
pub mod cmd_decode;
pub mod common;
