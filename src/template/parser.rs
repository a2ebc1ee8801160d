//! Tokenizer for `{{ ... }}` blocks.

use crate::{Error, ErrorContext, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static VARIABLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("variable name pattern"));

static FUNCTION_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .expect("function name pattern")
});

const BLOCK_START: &str = "{{";
const BLOCK_END: &str = "}}";

/// Argument passed to a function referenced from a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    /// No argument: the function receives the current `input`.
    Input,
    Variable(String),
    Literal(String),
}

/// One parsed piece of a prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Text(String),
    Variable(String),
    Code { function: String, argument: Argument },
}

pub(crate) fn tokenize(text: &str) -> Result<Vec<Block>> {
    let mut blocks = Vec::new();
    let mut rest = text;
    let mut offset = 0;

    while let Some(start) = rest.find(BLOCK_START) {
        let after_start = &rest[start + BLOCK_START.len()..];
        let Some(end) = after_start.find(BLOCK_END) else {
            break;
        };

        if start > 0 {
            blocks.push(Block::Text(rest[..start].to_string()));
        }
        let position = offset + start;
        blocks.push(parse_block(&after_start[..end], position)?);

        let consumed = start + BLOCK_START.len() + end + BLOCK_END.len();
        rest = &rest[consumed..];
        offset += consumed;
    }

    if !rest.is_empty() {
        blocks.push(Block::Text(rest.to_string()));
    }
    Ok(blocks)
}

fn parse_block(content: &str, position: usize) -> Result<Block> {
    let content = content.trim();
    if content.is_empty() {
        return Err(block_error("Empty template block", content, position));
    }

    if let Some(name) = content.strip_prefix('$') {
        return parse_variable(name, content, position).map(Block::Variable);
    }

    let (function, remainder) = match content.split_once(char::is_whitespace) {
        Some((function, remainder)) => (function, remainder.trim()),
        None => (content, ""),
    };
    if !FUNCTION_NAME.is_match(function) {
        return Err(block_error(
            format!("Invalid function name '{}'", function),
            content,
            position,
        ));
    }

    let argument = if remainder.is_empty() {
        Argument::Input
    } else if let Some(name) = remainder.strip_prefix('$') {
        if name.split_whitespace().count() > 1 {
            return Err(block_error(
                "Functions accept a single argument",
                content,
                position,
            ));
        }
        Argument::Variable(parse_variable(name, content, position)?)
    } else {
        Argument::Literal(parse_literal(remainder, content, position)?)
    };

    Ok(Block::Code {
        function: function.to_string(),
        argument,
    })
}

fn parse_variable(name: &str, content: &str, position: usize) -> Result<String> {
    if name.is_empty() {
        return Err(block_error("Variable name is missing", content, position));
    }
    if !VARIABLE_NAME.is_match(name) {
        return Err(block_error(
            format!("Invalid variable name '{}'", name),
            content,
            position,
        ));
    }
    Ok(name.to_lowercase())
}

fn parse_literal(raw: &str, content: &str, position: usize) -> Result<String> {
    let mut chars = raw.chars();
    let quote = match chars.next() {
        Some(q @ ('\'' | '"')) => q,
        _ => {
            return Err(block_error(
                "Function argument must be a $variable or a quoted value",
                content,
                position,
            ))
        }
    };
    if raw.len() < 2 || !raw.ends_with(quote) {
        return Err(block_error("Unterminated quoted value", content, position));
    }
    let inner = &raw[1..raw.len() - 1];
    if inner.contains(quote) {
        return Err(block_error(
            "Functions accept a single argument",
            content,
            position,
        ));
    }
    Ok(inner.to_string())
}

fn block_error(msg: impl Into<String>, content: &str, position: usize) -> Error {
    Error::template_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(format!("template[{}]", position))
            .with_details(format!("{{{{{}}}}}", content))
            .with_source("template_parser"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_one_block() {
        let blocks = tokenize("no blocks here").unwrap();
        assert_eq!(blocks, vec![Block::Text("no blocks here".to_string())]);
    }

    #[test]
    fn test_variable_and_text() {
        let blocks = tokenize("{{$input}}\n\nOne line TLDR with the fewest words.").unwrap();
        assert_eq!(
            blocks,
            vec![
                Block::Variable("input".to_string()),
                Block::Text("\n\nOne line TLDR with the fewest words.".to_string()),
            ]
        );
    }

    #[test]
    fn test_whitespace_inside_block_is_ignored() {
        let blocks = tokenize("{{  $Input  }}").unwrap();
        assert_eq!(blocks, vec![Block::Variable("input".to_string())]);
    }

    #[test]
    fn test_code_blocks() {
        let blocks =
            tokenize("{{summarize}} {{writer.translate $lang}} {{echo 'hello world'}}").unwrap();
        assert_eq!(
            blocks[0],
            Block::Code {
                function: "summarize".to_string(),
                argument: Argument::Input,
            }
        );
        assert_eq!(
            blocks[2],
            Block::Code {
                function: "writer.translate".to_string(),
                argument: Argument::Variable("lang".to_string()),
            }
        );
        assert_eq!(
            blocks[4],
            Block::Code {
                function: "echo".to_string(),
                argument: Argument::Literal("hello world".to_string()),
            }
        );
    }

    #[test]
    fn test_unterminated_block_is_text() {
        let blocks = tokenize("a {{$input}} b {{ c").unwrap();
        assert_eq!(
            blocks,
            vec![
                Block::Text("a ".to_string()),
                Block::Variable("input".to_string()),
                Block::Text(" b {{ c".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_blocks() {
        for template in [
            "{{}}",
            "{{ $ }}",
            "{{$in put}}",
            "{{$1st}}",
            "{{my-func}}",
            "{{f $a $b}}",
            "{{f 'open}}",
            "{{f bare}}",
            "{{f 'a' 'b'}}",
        ] {
            let err = tokenize(template).unwrap_err();
            assert!(
                matches!(err, Error::Template { .. }),
                "'{}' should be rejected",
                template
            );
        }
    }

    #[test]
    fn test_error_carries_position() {
        let err = tokenize("abc {{}}").unwrap_err();
        let ctx = err.context().unwrap();
        assert_eq!(ctx.field_path.as_deref(), Some("template[4]"));
    }
}
