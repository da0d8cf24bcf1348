use async_trait::async_trait;
use serde_yaml::{Mapping, Value};
use tracing::trace;

use stk_core::deploy::{ClientError, TemplateParameterSource};
use stk_model::ParameterDescriptor;

use crate::LocalError;

/// Reads the `Parameters` section of a YAML or JSON template.
///
/// Parameters come back in declaration order. Scalar defaults and allowed values are
/// stringified; list defaults are joined with commas, as for `CommaDelimitedList`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalTemplateParser;

impl LocalTemplateParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse `template_body` and return its declared parameters.
    pub fn parse(&self, template_body: &str) -> Result<Vec<ParameterDescriptor>, LocalError> {
        let root: Value = serde_yaml::from_str(template_body)?;
        let root = match root {
            Value::Mapping(m) => m,
            Value::Null => return Ok(Vec::new()),
            _ => return Err(LocalError::InvalidTemplate("top level must be a mapping".into())),
        };

        let params = match root.get("Parameters") {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Mapping(m)) => m,
            Some(_) => {
                return Err(LocalError::InvalidTemplate(
                    "Parameters must be a mapping".into(),
                ));
            }
        };

        params
            .iter()
            .map(|(key, def)| {
                let key = scalar(key).ok_or_else(|| {
                    LocalError::InvalidTemplate("parameter names must be scalars".into())
                })?;
                descriptor(key, def)
            })
            .collect()
    }
}

#[async_trait]
impl TemplateParameterSource for LocalTemplateParser {
    async fn template_parameters(
        &self,
        template_body: &str,
    ) -> Result<Vec<ParameterDescriptor>, ClientError> {
        let params = self.parse(template_body)?;
        trace!(count = params.len(), "parsed template parameters");
        Ok(params)
    }
}

fn descriptor(key: String, def: &Value) -> Result<ParameterDescriptor, LocalError> {
    let invalid = |reason: &str| LocalError::InvalidParameter {
        key: key.clone(),
        reason: reason.to_string(),
    };

    let def: &Mapping = def
        .as_mapping()
        .ok_or_else(|| invalid("definition must be a mapping"))?;

    let parameter_type = def
        .get("Type")
        .and_then(scalar)
        .ok_or_else(|| invalid("missing Type"))?;

    let default_value = match def.get("Default") {
        None | Some(Value::Null) => None,
        Some(Value::Sequence(items)) => Some(
            items
                .iter()
                .map(|v| scalar(v).ok_or_else(|| invalid("list Default must hold scalars")))
                .collect::<Result<Vec<_>, _>>()?
                .join(","),
        ),
        Some(v) => Some(scalar(v).ok_or_else(|| invalid("Default must be a scalar or list"))?),
    };

    let allowed_values = match def.get("AllowedValues") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|v| scalar(v).ok_or_else(|| invalid("AllowedValues must hold scalars")))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(invalid("AllowedValues must be a list")),
    };

    let no_echo = match def.get("NoEcho") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(_) => return Err(invalid("NoEcho must be a boolean")),
    };

    Ok(ParameterDescriptor {
        parameter_key: key,
        default_value,
        parameter_type,
        description: def.get("Description").and_then(scalar),
        no_echo,
        allowed_values,
    })
}

/// Stringify a scalar node; `None` for mappings, sequences and null.
fn scalar(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(t) => scalar(&t.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}
