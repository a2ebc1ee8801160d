//! Kernel configuration: which completion services exist and which is the default.

use crate::completion::{OpenAiTextCompletion, TextCompletion};
use crate::{Error, ErrorContext, Result};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

pub const DEFAULT_MODEL_ID: &str = "text-davinci-003";

/// OpenAI connection settings.
///
/// Environment overrides:
/// - `SK_MODEL_ID` (default `text-davinci-003`)
/// - `OPENAI_API_KEY` (default empty)
/// - `OPENAI_ORG_ID`
/// - `OPENAI_BASE_URL` (default `https://api.openai.com`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiSettings {
    pub model_id: String,
    pub api_key: String,
    pub org_id: Option<String>,
    pub base_url: Option<String>,
}

impl OpenAiSettings {
    pub fn new(model_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            api_key: api_key.into(),
            org_id: None,
            base_url: None,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`OpenAiSettings::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            model_id: lookup("SK_MODEL_ID")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            api_key: lookup("OPENAI_API_KEY").unwrap_or_default(),
            org_id: lookup("OPENAI_ORG_ID").filter(|s| !s.is_empty()),
            base_url: lookup("OPENAI_BASE_URL").filter(|s| !s.is_empty()),
        }
    }

    pub fn with_org_id(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub(crate) fn build_backend(&self) -> Result<OpenAiTextCompletion> {
        let mut builder = OpenAiTextCompletion::builder()
            .model(&self.model_id)
            .api_key(&self.api_key);
        if let Some(org) = &self.org_id {
            builder = builder.org_id(org);
        }
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url);
        }
        builder.build()
    }
}

#[derive(Clone)]
pub(crate) enum ServiceEntry {
    OpenAi(OpenAiSettings),
    Custom(Arc<dyn TextCompletion>),
}

/// Registered completion services keyed by service id.
#[derive(Clone, Default)]
pub struct KernelConfig {
    services: HashMap<String, ServiceEntry>,
    default_service: Option<String>,
}

impl KernelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an OpenAI completion service under its model id.
    pub fn add_openai_text_completion_service(
        &mut self,
        model_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<&mut Self> {
        let settings = OpenAiSettings::new(model_id, api_key);
        let service_id = settings.model_id.clone();
        self.add_openai_settings(service_id, settings)
    }

    pub fn add_openai_settings(
        &mut self,
        service_id: impl Into<String>,
        settings: OpenAiSettings,
    ) -> Result<&mut Self> {
        if settings.model_id.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "Model id must not be empty",
                ErrorContext::new().with_field_path("model_id"),
            ));
        }
        self.add_service(service_id.into(), ServiceEntry::OpenAi(settings))
    }

    /// Register any [`TextCompletion`] backend.
    pub fn add_text_completion_service(
        &mut self,
        service_id: impl Into<String>,
        backend: Arc<dyn TextCompletion>,
    ) -> Result<&mut Self> {
        self.add_service(service_id.into(), ServiceEntry::Custom(backend))
    }

    fn add_service(&mut self, service_id: String, entry: ServiceEntry) -> Result<&mut Self> {
        if service_id.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "Service id must not be empty",
                ErrorContext::new().with_field_path("service_id"),
            ));
        }
        if self.services.contains_key(&service_id) {
            return Err(Error::configuration_with_context(
                format!("Completion service '{}' is already registered", service_id),
                ErrorContext::new().with_field_path("service_id"),
            ));
        }
        // The first registered service becomes the default.
        if self.default_service.is_none() {
            self.default_service = Some(service_id.clone());
        }
        self.services.insert(service_id, entry);
        Ok(self)
    }

    pub fn set_default_service(&mut self, service_id: &str) -> Result<&mut Self> {
        if !self.services.contains_key(service_id) {
            return Err(Error::configuration_with_context(
                format!("Unknown completion service '{}'", service_id),
                ErrorContext::new().with_field_path("default_service"),
            ));
        }
        self.default_service = Some(service_id.to_string());
        Ok(self)
    }

    pub fn default_service(&self) -> Option<&str> {
        self.default_service.as_deref()
    }

    pub fn has_service(&self, service_id: &str) -> bool {
        self.services.contains_key(service_id)
    }

    pub fn service_ids(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&String, &ServiceEntry)> {
        self.services.iter()
    }
}

impl std::fmt::Debug for KernelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&str> = self.service_ids().collect();
        ids.sort_unstable();
        f.debug_struct("KernelConfig")
            .field("services", &ids)
            .field("default_service", &self.default_service)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_service_is_default() {
        let mut config = KernelConfig::new();
        config
            .add_openai_text_completion_service("text-davinci-003", "")
            .unwrap();
        config
            .add_openai_text_completion_service("text-curie-001", "")
            .unwrap();
        assert_eq!(config.default_service(), Some("text-davinci-003"));
        assert!(config.has_service("text-curie-001"));
        assert!(!config.has_service("text-ada-001"));

        config.set_default_service("text-curie-001").unwrap();
        assert_eq!(config.default_service(), Some("text-curie-001"));
    }

    #[test]
    fn test_duplicate_service_is_rejected() {
        let mut config = KernelConfig::new();
        config
            .add_openai_text_completion_service("text-davinci-003", "k")
            .unwrap();
        let err = config
            .add_openai_text_completion_service("text-davinci-003", "k")
            .unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_empty_model_is_rejected() {
        let mut config = KernelConfig::new();
        assert!(config.add_openai_text_completion_service(" ", "k").is_err());
        assert!(config.default_service().is_none());
    }

    #[test]
    fn test_unknown_default_is_rejected() {
        let mut config = KernelConfig::new();
        assert!(config.set_default_service("missing").is_err());
    }

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_settings_defaults_when_environment_is_empty() {
        let settings = OpenAiSettings::from_lookup(lookup_from(&[]));
        assert_eq!(settings.model_id, "text-davinci-003");
        assert_eq!(settings.model_id, DEFAULT_MODEL_ID);
        assert_eq!(settings.api_key, "");
        assert!(settings.org_id.is_none());
        assert!(settings.base_url.is_none());
    }

    #[test]
    fn test_blank_model_id_falls_back_to_default() {
        let settings = OpenAiSettings::from_lookup(lookup_from(&[
            ("SK_MODEL_ID", "   "),
            ("OPENAI_ORG_ID", ""),
            ("OPENAI_BASE_URL", ""),
        ]));
        assert_eq!(settings.model_id, "text-davinci-003");
        assert!(settings.org_id.is_none());
        assert!(settings.base_url.is_none());
    }

    #[test]
    fn test_settings_read_every_variable() {
        let settings = OpenAiSettings::from_lookup(lookup_from(&[
            ("SK_MODEL_ID", "text-curie-001"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_ORG_ID", "org-1"),
            ("OPENAI_BASE_URL", "http://localhost:8080"),
        ]));
        assert_eq!(settings.model_id, "text-curie-001");
        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.org_id.as_deref(), Some("org-1"));
        assert_eq!(settings.base_url.as_deref(), Some("http://localhost:8080"));
    }
}
