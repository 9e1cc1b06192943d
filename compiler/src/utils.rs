use crate::{error::WireError, tokenizer::Token};

/// Quote `text` as a JSON string literal, which is also how names appear in
/// diagnostics.
pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

pub fn lex_error(msg: &str, line: usize, column: usize) -> WireError {
    WireError::Lex {
        msg: msg.to_owned(),
        line,
        column,
    }
}

/// A parse diagnostic located at `token`.
pub fn parse_error(msg: &str, token: &Token) -> WireError {
    WireError::Parse {
        msg:    msg.to_owned(),
        file:   token.file.clone(),
        line:   token.line,
        column: token.column,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes() {
        assert_eq!(quote("Point"), "\"Point\"");
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
    }
}
