//! Prompt templates.
//!
//! A template is plain text with `{{ ... }}` blocks:
//!
//! | Block | Renders as |
//! |-------|------------|
//! | `{{$name}}` | the value of variable `name` (empty when unset) |
//! | `{{fn}}` | output of function `fn` called with the current `input` |
//! | `{{skill.fn $name}}` | output of `skill.fn` called with variable `name` |
//! | `{{fn 'text'}}` | output of `fn` called with the literal `text` |
//!
//! Text outside blocks, and variable values, are copied verbatim.

mod parser;

pub use parser::{Argument, Block};

use crate::context::ContextVariables;
use crate::Result;
use async_trait::async_trait;
use tracing::warn;

/// Resolves `{{function}}` blocks while rendering.
#[async_trait]
pub trait FunctionResolver: Send + Sync {
    /// Call the function named `function` with `context` and return its output.
    async fn call(&self, function: &str, context: ContextVariables) -> Result<String>;
}

/// Resolver for templates that must not call functions.
pub struct NoFunctions;

#[async_trait]
impl FunctionResolver for NoFunctions {
    async fn call(&self, function: &str, _context: ContextVariables) -> Result<String> {
        let (skill, name) = crate::function::split_function_name(function);
        Err(crate::Error::function_not_found(skill, name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    blocks: Vec<Block>,
}

impl PromptTemplate {
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let blocks = parser::tokenize(&source)?;
        Ok(Self { source, blocks })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Variable names referenced by the template, in first-use order.
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for block in &self.blocks {
            let name = match block {
                Block::Variable(name) => name.as_str(),
                Block::Code {
                    argument: Argument::Variable(name),
                    ..
                } => name.as_str(),
                _ => continue,
            };
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    pub fn has_function_calls(&self) -> bool {
        self.blocks
            .iter()
            .any(|b| matches!(b, Block::Code { .. }))
    }

    /// Render the template, calling referenced functions through `functions`.
    pub async fn render(
        &self,
        variables: &ContextVariables,
        functions: &dyn FunctionResolver,
    ) -> Result<String> {
        let mut prompt = String::with_capacity(self.source.len() + variables.input().len());
        for block in &self.blocks {
            match block {
                Block::Text(text) => prompt.push_str(text),
                Block::Variable(name) => prompt.push_str(lookup(variables, name)),
                Block::Code { function, argument } => {
                    let mut context = variables.clone();
                    match argument {
                        Argument::Input => {}
                        Argument::Variable(name) => {
                            let value = lookup(variables, name).to_string();
                            context.update(value);
                        }
                        Argument::Literal(value) => context.update(value.clone()),
                    }
                    let output = functions.call(function, context).await?;
                    prompt.push_str(&output);
                }
            }
        }
        Ok(prompt)
    }
}

impl std::str::FromStr for PromptTemplate {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn lookup<'a>(variables: &'a ContextVariables, name: &str) -> &'a str {
    match variables.get(name) {
        Some(value) => value,
        None => {
            warn!(variable = %name, "Template variable not set, rendering empty");
            ""
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl FunctionResolver for Recording {
        async fn call(&self, function: &str, context: ContextVariables) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((function.to_string(), context.input().to_string()));
            Ok(format!("<{}>", function))
        }
    }

    #[tokio::test]
    async fn test_multiline_input_is_substituted_verbatim() {
        let text = "1st Law - Energy cannot be created or destroyed.\n\
                    2nd Law - Entropy increases.\n\
                    3rd Law - \"Zero\" entropy at {0 K}.\n";
        let template = PromptTemplate::parse("{{$input}}\n\nOne line TLDR with the fewest words.")
            .unwrap();
        let rendered = template
            .render(&ContextVariables::new(text), &NoFunctions)
            .await
            .unwrap();
        assert_eq!(
            rendered,
            format!("{}\n\nOne line TLDR with the fewest words.", text)
        );
    }

    #[tokio::test]
    async fn test_missing_variable_renders_empty() {
        let template = PromptTemplate::parse("[{{$style}}]{{$input}}").unwrap();
        let rendered = template
            .render(&ContextVariables::new("x"), &NoFunctions)
            .await
            .unwrap();
        assert_eq!(rendered, "[]x");
    }

    #[tokio::test]
    async fn test_code_blocks_receive_their_argument() {
        let resolver = Recording {
            calls: Mutex::new(Vec::new()),
        };
        let template =
            PromptTemplate::parse("{{first}}|{{text.second $lang}}|{{third \"quoted\"}}").unwrap();
        let vars = ContextVariables::new("the input").with("lang", "French");

        let rendered = template.render(&vars, &resolver).await.unwrap();

        assert_eq!(rendered, "<first>|<text.second>|<third>");
        let calls = resolver.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                ("first".to_string(), "the input".to_string()),
                ("text.second".to_string(), "French".to_string()),
                ("third".to_string(), "quoted".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_functions_resolver_rejects_calls() {
        let template = PromptTemplate::parse("{{translate}}").unwrap();
        let err = template
            .render(&ContextVariables::default(), &NoFunctions)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::FunctionNotFound { .. }));
    }

    #[test]
    fn test_variables_are_listed_once() {
        let template = PromptTemplate::parse("{{$input}} {{f $lang}} {{$LANG}} {{$input}}").unwrap();
        assert_eq!(template.variables(), vec!["input", "lang"]);
        assert!(template.has_function_calls());
    }

    #[test]
    fn test_from_str() {
        let template: PromptTemplate = "{{$input}}\n\nTranslate the text to math.".parse().unwrap();
        assert!(!template.has_function_calls());
        assert_eq!(template.source(), "{{$input}}\n\nTranslate the text to math.");
    }

    #[test]
    fn test_blocks_preserve_template_order() {
        let template = PromptTemplate::parse("{{$input}}\n\n{{summarize 'tl;dr'}}").unwrap();
        let blocks = template.blocks();
        assert_eq!(blocks.len(), 3);
        assert!(matches!(&blocks[0], Block::Variable(name) if name.eq_ignore_ascii_case("input")));
        assert_eq!(blocks[1], Block::Text("\n\n".to_string()));
        assert!(matches!(
            &blocks[2],
            Block::Code { function, argument: Argument::Literal(text) }
                if function == "summarize" && text == "tl;dr"
        ));
    }
}
