use serde_json::{Value, json};

const ACCOUNT_QUERY: &str = r#"
    query {
      blockchain {
        account(address: {address}) {
          info { code, data, balance(format: HEX) }
        }
      }
    }
"#;

/// Builds the account info query for `address`, with all whitespace removed.
pub fn build_query(address: &str) -> String {
    // A JSON string literal is also a valid GraphQL string literal.
    let quoted = Value::from(address).to_string();
    strip_whitespace(&ACCOUNT_QUERY.replace("{address}", &quoted))
}

pub fn strip_whitespace(query: &str) -> String {
    query.chars().filter(|c| !c.is_whitespace()).collect()
}

/// The POST body carrying `query`.
pub fn request_body(query: &str) -> Value {
    json!({
        "query": query,
        "variables": {}
    })
}
