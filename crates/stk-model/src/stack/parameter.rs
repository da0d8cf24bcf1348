use serde::{Deserialize, Serialize};

/// Input value for one template parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackParameter {
    pub parameter_key: String,
    pub parameter_value: String,
    #[serde(default)]
    pub use_previous_value: bool,
}

impl StackParameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            parameter_key: key.into(),
            parameter_value: value.into(),
            use_previous_value: false,
        }
    }

    /// Build a request list from key/value pairs, stringifying every value.
    ///
    /// ```rust
    /// use stk_model::StackParameter;
    ///
    /// let params = StackParameter::from_pairs([("NodeCount", 3), ("Replicas", 2)]);
    /// assert_eq!(params[0].parameter_value, "3");
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Vec<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        pairs
            .into_iter()
            .map(|(k, v)| Self::new(k, v.to_string()))
            .collect()
    }

    /// Mark the parameter to keep whatever value the existing stack already has.
    pub fn use_previous(mut self) -> Self {
        self.use_previous_value = true;
        self
    }
}

/// A parameter declared by a template.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterDescriptor {
    pub parameter_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub parameter_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub no_echo: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
}

impl ParameterDescriptor {
    /// A parameter without a default has to be supplied by the caller.
    pub fn is_required(&self) -> bool {
        self.default_value.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pairs_stringifies_values() {
        let params = StackParameter::from_pairs([("Encrypted", true.to_string()), ("Env", "prod".into())]);
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].parameter_key, "Encrypted");
        assert_eq!(params[0].parameter_value, "true");
        assert!(!params[1].use_previous_value);
    }

    #[test]
    fn use_previous_sets_flag() {
        let p = StackParameter::new("Env", "").use_previous();
        assert!(p.use_previous_value);

        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["UsePreviousValue"], true);
    }

    #[test]
    fn descriptor_required_when_no_default() {
        let d = ParameterDescriptor {
            parameter_key: "Password".into(),
            parameter_type: "String".into(),
            no_echo: true,
            ..Default::default()
        };
        assert!(d.is_required());
    }
}
