//! The kernel: completion services, the function registry, and invocation.

use crate::completion::TextCompletion;
use crate::config::{KernelConfig, ServiceEntry};
use crate::context::ContextVariables;
use crate::function::{split_function_name, FunctionOptions, SemanticFunction, GLOBAL_SKILL};
use crate::template::{FunctionResolver, PromptTemplate};
use crate::{Error, ErrorContext, Result};
use async_recursion::async_recursion;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Nesting limit for functions called from templates.
pub const MAX_CALL_DEPTH: usize = 8;

/// Builder for [`Kernel`].
pub struct KernelBuilder {
    config: KernelConfig,
}

impl KernelBuilder {
    pub fn new() -> Self {
        Self {
            config: KernelConfig::new(),
        }
    }

    pub fn with_config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a completion backend directly.
    pub fn with_completion(
        mut self,
        service_id: impl Into<String>,
        backend: Arc<dyn TextCompletion>,
    ) -> Result<Self> {
        self.config.add_text_completion_service(service_id, backend)?;
        Ok(self)
    }

    /// Build the kernel, instantiating every configured service.
    pub fn build(self) -> Result<Kernel> {
        let default_service = self
            .config
            .default_service()
            .map(str::to_string)
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "No text completion service configured",
                    ErrorContext::new().with_field_path("config.default_service"),
                )
            })?;

        let mut services: HashMap<String, Arc<dyn TextCompletion>> = HashMap::new();
        for (service_id, entry) in self.config.entries() {
            let backend: Arc<dyn TextCompletion> = match entry {
                ServiceEntry::OpenAi(settings) => Arc::new(settings.build_backend()?),
                ServiceEntry::Custom(backend) => Arc::clone(backend),
            };
            services.insert(service_id.clone(), backend);
        }

        Ok(Kernel {
            config: self.config,
            services,
            default_service,
            functions: HashMap::new(),
        })
    }
}

impl Default for KernelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns completion services and registered semantic functions.
///
/// Registration takes `&mut self`; invocation takes `&self`, so a fully
/// registered kernel can be shared freely.
pub struct Kernel {
    config: KernelConfig,
    services: HashMap<String, Arc<dyn TextCompletion>>,
    default_service: String,
    // skill (lowercase) -> name (lowercase) -> function
    functions: HashMap<String, HashMap<String, Arc<SemanticFunction>>>,
}

impl Kernel {
    pub fn builder() -> KernelBuilder {
        KernelBuilder::new()
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Register `template` as a global function with a generated name.
    pub fn create_semantic_function(&mut self, template: &str) -> Result<Arc<SemanticFunction>> {
        self.create_semantic_function_with(template, FunctionOptions::default())
    }

    pub fn create_semantic_function_with(
        &mut self,
        template: &str,
        options: FunctionOptions,
    ) -> Result<Arc<SemanticFunction>> {
        let template = PromptTemplate::parse(template)?;

        if let Some(service_id) = options.service_id.as_deref() {
            if !self.services.contains_key(service_id) {
                return Err(Error::configuration_with_context(
                    format!("Unknown completion service '{}'", service_id),
                    ErrorContext::new().with_field_path("function.service_id"),
                ));
            }
        }

        let skill = options
            .skill_name
            .clone()
            .unwrap_or_else(|| GLOBAL_SKILL.to_string());
        let name = options
            .function_name
            .clone()
            .unwrap_or_else(|| format!("func{}", Uuid::new_v4().simple()));

        let skill_key = skill.to_lowercase();
        let name_key = name.to_lowercase();
        if self
            .functions
            .get(&skill_key)
            .is_some_and(|fns| fns.contains_key(&name_key))
        {
            return Err(Error::configuration_with_context(
                format!("Function '{}.{}' is already registered", skill, name),
                ErrorContext::new().with_field_path("function.name"),
            ));
        }

        let function = Arc::new(SemanticFunction::new(skill, name, template, options));
        debug!(
            function = %function.qualified_name(),
            "Registered semantic function"
        );
        self.functions
            .entry(skill_key)
            .or_default()
            .insert(name_key, Arc::clone(&function));
        Ok(function)
    }

    /// Look up a registered function; names are case-insensitive.
    pub fn function(&self, skill: &str, name: &str) -> Result<Arc<SemanticFunction>> {
        self.functions
            .get(&skill.to_lowercase())
            .and_then(|fns| fns.get(&name.to_lowercase()))
            .cloned()
            .ok_or_else(|| Error::function_not_found(skill, name))
    }

    pub fn functions(&self) -> impl Iterator<Item = &Arc<SemanticFunction>> {
        self.functions.values().flat_map(|fns| fns.values())
    }

    /// Invoke `function` on `input` and return the completion text.
    pub async fn invoke(&self, function: &SemanticFunction, input: &str) -> Result<String> {
        let context = self
            .invoke_with_context(function, ContextVariables::new(input))
            .await?;
        Ok(context.input().to_string())
    }

    /// Invoke `function`; its output replaces `input` in the returned context.
    pub async fn invoke_with_context(
        &self,
        function: &SemanticFunction,
        context: ContextVariables,
    ) -> Result<ContextVariables> {
        self.invoke_at_depth(function, context, 0).await
    }

    /// Run `pipeline` in order, feeding each output to the next function.
    ///
    /// Only the final context is returned. The first failure stops the run.
    pub async fn run(
        &self,
        input: impl Into<ContextVariables>,
        pipeline: &[&SemanticFunction],
    ) -> Result<ContextVariables> {
        let mut context = input.into();
        for (step, function) in pipeline.iter().enumerate() {
            debug!(
                step,
                function = %function.qualified_name(),
                "Running pipeline step"
            );
            context = self.invoke_with_context(function, context).await?;
        }
        Ok(context)
    }

    #[async_recursion]
    async fn invoke_at_depth(
        &self,
        function: &SemanticFunction,
        mut context: ContextVariables,
        depth: usize,
    ) -> Result<ContextVariables> {
        if depth > MAX_CALL_DEPTH {
            return Err(Error::runtime_with_context(
                format!("Function call depth exceeded {}", MAX_CALL_DEPTH),
                ErrorContext::new().with_details(function.qualified_name()),
            ));
        }

        let service = self.service_for(function)?;
        let frame = CallFrame {
            kernel: self,
            depth,
        };
        let prompt = function.template().render(&context, &frame).await?;

        debug!(
            function = %function.qualified_name(),
            depth,
            prompt_chars = prompt.chars().count(),
            "Invoking semantic function"
        );
        let output = service.complete(&prompt, function.settings()).await?;
        context.update(output);
        Ok(context)
    }

    fn service_for(&self, function: &SemanticFunction) -> Result<Arc<dyn TextCompletion>> {
        let service_id = function
            .service_id()
            .unwrap_or(self.default_service.as_str());
        self.services.get(service_id).cloned().ok_or_else(|| {
            Error::configuration_with_context(
                format!("Unknown completion service '{}'", service_id),
                ErrorContext::new().with_details(function.qualified_name()),
            )
        })
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("config", &self.config)
            .field("functions", &self.functions().count())
            .finish()
    }
}

/// Resolves template function calls one level deeper than the caller.
struct CallFrame<'k> {
    kernel: &'k Kernel,
    depth: usize,
}

#[async_trait]
impl<'k> FunctionResolver for CallFrame<'k> {
    async fn call(&self, function: &str, context: ContextVariables) -> Result<String> {
        let (skill, name) = split_function_name(function);
        let target = self.kernel.function(skill, name)?;
        let context = self
            .kernel
            .invoke_at_depth(&target, context, self.depth + 1)
            .await?;
        Ok(context.input().to_string())
    }
}
