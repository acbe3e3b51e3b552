//! Integration tests running the parameter bridge over an external program.
#![cfg(unix)]

use std::sync::Arc;

use cellbridge_config::{CodecError, CommandCodec, ConfigCodec, ConfigError, ConfigParamBridge};
use cellbridge_core::{Cell, CellBuilder, boc};
use serde_json::json;

fn shell(script: &str) -> CommandCodec {
    CommandCodec::with_args("sh", vec!["-c".into(), script.into(), "codec".into()])
}

fn param_cell() -> Arc<Cell> {
    let mut inner = CellBuilder::new();
    inner.store_uint(0x0102_0304, 32).unwrap();
    let mut outer = CellBuilder::new();
    outer.store_uint(0x11, 8).unwrap();
    outer.store_ref(Arc::new(inner.build().unwrap())).unwrap();
    Arc::new(outer.build().unwrap())
}

#[test]
fn boc_to_json_sees_canonical_base64() {
    let bridge = ConfigParamBridge::new(shell(r#"printf '{"p%s":{"boc":"%s"}}' "$2" "$(cat)""#));
    let cell = param_cell();

    let value = bridge.boc_to_json(&cell, 15).unwrap();

    assert_eq!(value, json!({ "boc": boc::to_base64(&cell).unwrap() }));
}

#[test]
fn json_to_boc_decodes_program_output() {
    let cell = param_cell();
    let script = format!(
        r#"input=$(cat); [ "$input" = '{{"p15":{{"a":1}}}}' ] || exit 1; echo '{}'"#,
        boc::to_base64(&cell).unwrap()
    );
    let bridge = ConfigParamBridge::new(shell(&script));

    let back = bridge.json_to_boc(json!({ "a": 1 }), 15).unwrap();

    assert_eq!(back, cell);
    assert_eq!(back.refs().len(), 1);
}

#[test]
fn wrong_key_in_reply() {
    let bridge = ConfigParamBridge::new(shell(r#"cat >/dev/null; echo '{"p1":{}}'"#));
    match bridge.boc_to_json(&param_cell(), 2) {
        Err(ConfigError::MissingKey(key)) => assert_eq!(key, "p2"),
        other => panic!("expected missing key, got {:?}", other),
    }
}

#[test]
fn garbage_cells_from_program() {
    let bridge = ConfigParamBridge::new(shell("cat >/dev/null; echo 'bm90IGEgYm9j'"));
    assert!(matches!(
        bridge.json_to_boc(json!(null), 0),
        Err(ConfigError::Cell(_))
    ));
}

#[test]
fn program_failure_propagates() {
    let codec: Box<dyn ConfigCodec> = Box::new(shell("cat >/dev/null; echo 'bad param' >&2; exit 1"));
    let bridge = ConfigParamBridge::new(codec);
    match bridge.json_to_boc(json!({}), 99) {
        Err(ConfigError::Codec(CodecError::Failed { stderr, .. })) => assert_eq!(stderr, "bad param"),
        other => panic!("expected codec failure, got {:?}", other),
    }
}
