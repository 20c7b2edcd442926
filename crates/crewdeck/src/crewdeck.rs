use crate::{
  CoordinatorConfig, CrewdeckPlugin, Error, ModelValidator, PluginManager, Result,
  SharedBackend, WorkflowContext, WorkflowTarget,
};

/// Entry point: a backend, a configuration and the registered plugins.
pub struct Crewdeck {
  backend: SharedBackend,
  config: CoordinatorConfig,
  plugins: PluginManager,
  validator: ModelValidator,
}

impl Crewdeck {
  pub fn builder() -> CrewdeckBuilder {
    CrewdeckBuilder::new()
  }

  pub fn config(&self) -> &CoordinatorConfig {
    &self.config
  }

  pub fn register_plugin(&self, plugin: CrewdeckPlugin) {
    self.plugins.register(plugin);
  }

  pub fn unregister_plugin(&self, name: &'static str) {
    self.plugins.unregister(name);
  }

  pub fn plugins(&self) -> PluginManager {
    self.plugins.clone()
  }

  /// Opens a context for one workflow. Drop it when the workflow changes.
  pub fn workflow_context(&self, target: WorkflowTarget) -> WorkflowContext {
    WorkflowContext::new(
      target,
      self.backend.clone(),
      self.config.clone(),
      self.plugins.clone(),
    )
  }

  /// Validator shared by every model of this instance.
  pub fn model_validator(&self) -> ModelValidator {
    self.validator.clone()
  }
}

pub struct CrewdeckBuilder {
  backend: Option<SharedBackend>,
  config: Option<CoordinatorConfig>,
  plugins: Vec<CrewdeckPlugin>,
}

impl CrewdeckBuilder {
  pub fn new() -> Self {
    CrewdeckBuilder {
      backend: None,
      config: None,
      plugins: Vec::new(),
    }
  }

  pub fn backend(mut self, backend: SharedBackend) -> Self {
    self.backend = Some(backend);
    self
  }

  pub fn config(mut self, config: CoordinatorConfig) -> Self {
    self.config = Some(config);
    self
  }

  pub fn plugin(mut self, plugin: CrewdeckPlugin) -> Self {
    self.plugins.push(plugin);
    self
  }

  pub fn build(self) -> Result<Crewdeck> {
    let backend = self
      .backend
      .ok_or_else(|| Error::config_error("Backend is not set in crewdeck builder"))?;
    let config = self.config.unwrap_or_default();

    let plugins = PluginManager::new();
    for plugin in self.plugins {
      plugins.register(plugin);
    }

    let validator = ModelValidator::new(backend.clone(), plugins.clone(), &config);

    Ok(Crewdeck {
      backend,
      config,
      plugins,
      validator,
    })
  }
}

impl Default for CrewdeckBuilder {
  fn default() -> Self {
    Self::new()
  }
}
