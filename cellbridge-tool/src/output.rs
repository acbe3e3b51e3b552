use cellbridge_core::boc;
use cellbridge_stack::StackValue;

use crate::error::ToolError;

/// Formats a keyed account tuple as `name: value` lines.
///
/// Cells print as base64 bags of cells, integers in decimal.
pub fn render_account(tuple: &StackValue) -> Result<String, ToolError> {
    let StackValue::Tuple(pairs) = tuple else {
        return Err(ToolError::Result(format!("expected a tuple, got {}", tuple.type_name())));
    };

    let mut out = String::new();
    for pair in pairs {
        let (key, value) = match pair {
            StackValue::Tuple(kv) => match kv.as_slice() {
                [StackValue::Atom(key), value] => (key, value),
                _ => return Err(ToolError::Result(format!("malformed pair {}", pair))),
            },
            other => return Err(ToolError::Result(format!("malformed pair {}", other))),
        };

        let rendered = match value {
            StackValue::Cell(cell) => boc::to_base64(cell)?,
            StackValue::Int(n) => n.to_string(),
            other => {
                return Err(ToolError::Result(format!(
                    "unexpected {} for {}",
                    other.type_name(),
                    key
                )));
            }
        };
        out.push_str(key.name().trim_start_matches('.'));
        out.push_str(": ");
        out.push_str(&rendered);
        out.push('\n');
    }
    Ok(out)
}
