//! Function-call request that extracts URLs from free text.

use serde::Deserialize;

use parley_types::llm::{FunctionCall, FunctionDefinition, Message};

pub const FIND_URLS_FUNCTION: &str = "find_urls";

/// Typed arguments of the `find_urls` function call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FindUrlsArguments {
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Schema advertised to the service: one required `urls: string[]` parameter.
pub fn find_urls_function() -> FunctionDefinition {
    FunctionDefinition {
        name: FIND_URLS_FUNCTION.to_string(),
        description: "Find urls in text".to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "urls": {
                    "type": "array",
                    "description": "List of urls to summarize",
                    "items": { "type": "string" }
                }
            },
            "required": ["urls"]
        }),
    }
}

/// The free text goes out as the only message.
pub fn find_urls_messages(text: &str) -> Vec<Message> {
    vec![Message::user(text)]
}

/// Decode the arguments of a `find_urls` call.
pub fn decode_find_urls(call: &FunctionCall) -> Result<FindUrlsArguments, String> {
    if call.name != FIND_URLS_FUNCTION {
        return Err(format!("unexpected function call '{}'", call.name));
    }
    serde_json::from_str(&call.arguments).map_err(|e| format!("malformed arguments: {e}"))
}
