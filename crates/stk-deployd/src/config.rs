use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use stk_model::{ParameterDescriptor, PollingConfig, StackParameter, Tag};
use stk_observe::LoggerConfig;

/// Environment variable naming the JSON config file.
pub const CONFIG_ENV: &str = "STK_DEPLOYD_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeploydConfig {
    pub logger: LoggerConfig,
    pub polling: PollingConfig,
    pub stack_name: String,
    /// Template to deploy; the bundled demo template when absent.
    pub template_path: Option<PathBuf>,
    /// Values overriding template defaults, by parameter key.
    pub parameters: BTreeMap<String, String>,
    pub capabilities: Vec<String>,
    pub tags: BTreeMap<String, String>,
}

impl Default for DeploydConfig {
    fn default() -> Self {
        Self {
            logger: LoggerConfig::default(),
            polling: PollingConfig::default(),
            stack_name: "stk-demo".to_string(),
            template_path: None,
            parameters: BTreeMap::new(),
            capabilities: Vec::new(),
            tags: BTreeMap::new(),
        }
    }
}

impl DeploydConfig {
    /// Load from the file named by [`CONFIG_ENV`], or defaults when it is unset.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.stack_name.trim().is_empty(), "stackName must not be empty");
        self.polling
            .backoff
            .validate()
            .context("invalid polling configuration")?;
        Ok(())
    }

    /// Parameter values for a template: configured overrides first, then declared defaults.
    ///
    /// Fails if a parameter without default has no configured value.
    pub fn resolve_parameters(
        &self,
        declared: &[ParameterDescriptor],
    ) -> anyhow::Result<Vec<StackParameter>> {
        let mut out = Vec::with_capacity(declared.len());
        for p in declared {
            let value = self
                .parameters
                .get(&p.parameter_key)
                .or(p.default_value.as_ref())
                .with_context(|| format!("parameter {} has no default and no configured value", p.parameter_key))?;
            out.push(StackParameter::new(p.parameter_key.clone(), value.clone()));
        }
        Ok(out)
    }

    pub fn stack_tags(&self) -> Vec<Tag> {
        self.tags.iter().map(|(k, v)| Tag::new(k.as_str(), v.as_str())).collect()
    }
}
