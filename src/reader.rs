use crate::evaluator::EvalError;
use crate::parser::{CHAR_TAG, REGEX_TAG, TreeNode};
use crate::types::Value;

const DELIMITERS: [&str; 4] = ["(", ")", "{", "}"];

/// Converts a labeled parse tree into an expression `Value`.
///
/// Number leaves that do not fit in an `i64` read as an `Error` value, which
/// the evaluator then propagates like any other error.
pub fn read(node: &TreeNode) -> Value {
    if node.tag.contains("number") {
        return read_number(&node.contents);
    }
    if node.tag.contains("symbol") {
        return Value::Symbol(node.contents.clone());
    }

    let items = node
        .children
        .iter()
        .filter(|child| !is_structural(child))
        .map(read)
        .collect();

    if node.tag.contains("qexpression") {
        Value::QExpression(items)
    } else {
        // The root (`>`) and `sexpression` groups
        Value::SExpression(items)
    }
}

fn read_number(text: &str) -> Value {
    text.parse::<i64>()
        .map_or_else(|_| EvalError::InvalidNumber.into(), Value::Number)
}

// Delimiters, regex anchors and whitespace `char` leaves carry no data.
fn is_structural(node: &TreeNode) -> bool {
    if !node.children.is_empty() {
        return false;
    }
    node.tag == REGEX_TAG
        || DELIMITERS.contains(&node.contents.as_str())
        || (node.tag == CHAR_TAG && node.contents.trim().is_empty())
}
