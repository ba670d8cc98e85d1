#![allow(dead_code)]

use std::sync::Arc;

use command_core::Interpreter;
use shared::{error::ResponseCode, protocol::Response};
use topology::{LayoutConfig, Topology};

pub fn interpreter(layout: &str) -> Interpreter {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
    let config = LayoutConfig::from_toml_str(layout).expect("parse layout");
    let topology = Arc::new(Topology::from_config(&config).expect("topology"));
    Interpreter::standard(topology).expect("interpreter")
}

#[track_caller]
pub fn ok(interpreter: &Interpreter, line: &str) -> Response {
    let response = interpreter.interpret(line);
    assert!(response.is_ok(), "{line} -> {response}");
    response
}

#[track_caller]
pub fn fails(interpreter: &Interpreter, line: &str, code: ResponseCode) -> Response {
    let response = interpreter.interpret(line);
    assert_eq!(response.code, code, "{line} -> {response}");
    response
}

/// One stop, one stack of capacity 2, one track joining them.
pub const SMALL_RIG: &str = r#"
[[stops]]
id = "S1"

[[stacks]]
id = "K1"
capacity = 2

[[tracks]]
id = "T1"
slots = 3
from = "S1"
to = "K1"
"#;

/// Two lines that do not touch: S1-T1-K1-T2-S2 and the island S3.
pub const SPLIT_RIG: &str = r#"
[[stops]]
id = "S1"
[[stops]]
id = "S2"
[[stops]]
id = "S3"

[[stacks]]
id = "K1"
capacity = 1
[[stacks]]
id = "K2"
capacity = 3

[[tracks]]
id = "T1"
slots = 2
from = "S1"
to = "K1"

[[tracks]]
id = "T2"
slots = 2
from = "K1"
to = "S2"

[[tracks]]
id = "T3"
slots = 1
from = "S2"
to = "K2"
"#;
