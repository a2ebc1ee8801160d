//! Semantic functions: a prompt template bound to completion settings.

use crate::completion::CompleteRequestSettings;
use crate::template::PromptTemplate;

/// Skill that holds functions registered without an explicit skill name.
pub const GLOBAL_SKILL: &str = "_GLOBAL_FUNCTIONS_";

/// Split `skill.name` into its parts; a bare name belongs to [`GLOBAL_SKILL`].
pub fn split_function_name(full_name: &str) -> (&str, &str) {
    match full_name.split_once('.') {
        Some((skill, name)) => (skill, name),
        None => (GLOBAL_SKILL, full_name),
    }
}

/// Options for registering a semantic function.
#[derive(Debug, Clone, Default)]
pub struct FunctionOptions {
    pub skill_name: Option<String>,
    pub function_name: Option<String>,
    pub description: String,
    pub settings: CompleteRequestSettings,
    /// Completion service to use; `None` selects the kernel default.
    pub service_id: Option<String>,
}

impl FunctionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skill(mut self, skill: impl Into<String>) -> Self {
        self.skill_name = Some(skill.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn settings(mut self, settings: CompleteRequestSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn service(mut self, service_id: impl Into<String>) -> Self {
        self.service_id = Some(service_id.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct SemanticFunction {
    skill_name: String,
    name: String,
    description: String,
    template: PromptTemplate,
    settings: CompleteRequestSettings,
    service_id: Option<String>,
}

impl SemanticFunction {
    pub(crate) fn new(
        skill_name: String,
        name: String,
        template: PromptTemplate,
        options: FunctionOptions,
    ) -> Self {
        Self {
            skill_name,
            name,
            description: options.description,
            template,
            settings: options.settings,
            service_id: options.service_id,
        }
    }

    pub fn skill_name(&self) -> &str {
        &self.skill_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `skill.name`, the form templates use to reference this function.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.skill_name, self.name)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn settings(&self) -> &CompleteRequestSettings {
        &self.settings
    }

    pub fn service_id(&self) -> Option<&str> {
        self.service_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_function_name() {
        assert_eq!(split_function_name("writer.translate"), ("writer", "translate"));
        assert_eq!(split_function_name("summarize"), (GLOBAL_SKILL, "summarize"));
    }
}
