use std::path::Path;

use crate::input::InputError;
use crate::input::reader::open_maybe_gz;
use crate::model::metrics::MetricsBundle;

pub fn load_metrics_bundle(path: &Path) -> Result<MetricsBundle, InputError> {
    let reader = open_maybe_gz(path)?;
    let bundle: MetricsBundle = serde_json::from_reader(reader).map_err(|e| InputError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    if bundle.is_empty() {
        return Err(InputError::InvalidInput(format!(
            "metrics bundle {} has no teams",
            path.display()
        )));
    }
    tracing::info!(
        path = %path.display(),
        teams = bundle.len(),
        "loaded metrics bundle"
    );
    Ok(bundle)
}
