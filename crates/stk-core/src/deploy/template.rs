use std::path::Path;

use tracing::{debug, instrument};

use stk_model::ParameterDescriptor;

use super::{DeployError, TemplateParameterSource};

/// Read a template from disk and ask `source` for its declared parameters.
#[instrument(level = "debug", skip(source, path), fields(path = %path.as_ref().display()))]
pub async fn retrieve_parameters_from_file(
    source: &dyn TemplateParameterSource,
    path: impl AsRef<Path>,
) -> Result<Vec<ParameterDescriptor>, DeployError> {
    let path = path.as_ref();
    let body = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DeployError::Template {
            path: path.to_path_buf(),
            source,
        })?;

    let params = source
        .template_parameters(&body)
        .await
        .map_err(DeployError::Parameters)?;
    debug!(count = params.len(), "template parameters retrieved");
    Ok(params)
}

/// Collect the declared parameters of several templates, concatenated in path order.
///
/// Stops at the first template that cannot be read or parsed.
pub async fn load_parameters<P: AsRef<Path>>(
    source: &dyn TemplateParameterSource,
    paths: &[P],
) -> Result<Vec<ParameterDescriptor>, DeployError> {
    let mut out = Vec::new();
    for path in paths {
        out.extend(retrieve_parameters_from_file(source, path).await?);
    }
    Ok(out)
}
