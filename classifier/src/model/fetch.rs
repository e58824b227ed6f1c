use super::LoadError;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Error)]
#[error("failed to fetch {url}: {reason}")]
pub struct FetchError {
    pub url: String,
    pub reason: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Retrieves model files. The browser build implements this over `fetch`.
#[allow(async_fn_in_trait)]
pub trait ModelFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// `model.json` layout: an optional main file followed by weight shards,
/// all relative to the manifest and concatenated in order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelManifest {
    #[serde(default)]
    pub model_file: Option<String>,
    #[serde(default)]
    pub weights_manifest: Vec<WeightGroup>,
    /// Present in TF.js `layers-model` / `graph-model` exports.
    #[serde(default)]
    pub model_topology: Option<serde_json::Value>,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightGroup {
    pub paths: Vec<String>,
}

impl ModelManifest {
    pub fn is_tfjs(&self) -> bool {
        self.model_topology.is_some() || self.format.is_some()
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.model_file
            .iter()
            .map(String::as_str)
            .chain(self.weights_manifest.iter().flat_map(|g| g.paths.iter().map(String::as_str)))
    }
}

/// Downloads the serialized model behind `url`.
///
/// A body that parses as a [`ModelManifest`] is expanded into its sibling
/// files; any other body is taken to be the model itself.
pub async fn fetch_artifact<F: ModelFetcher>(fetcher: &F, url: &str) -> Result<Vec<u8>, LoadError> {
    let body = fetcher.fetch(url).await?;

    let manifest = match serde_json::from_slice::<ModelManifest>(&body) {
        Ok(manifest) => manifest,
        Err(_) => return Ok(body),
    };

    if manifest.is_tfjs() {
        return Err(LoadError::Manifest(format!(
            "{url} is a TF.js model, which is not supported; export it as ONNX or a frozen TensorFlow graph"
        )));
    }

    let files: Vec<&str> = manifest.files().collect();
    if files.is_empty() {
        return Err(LoadError::Manifest(format!("{url} lists no model files")));
    }

    let mut artifact = Vec::new();
    for path in files {
        let shard_url = resolve_sibling(url, path)?;
        log::debug!("Fetching model shard {}", shard_url);
        let shard = fetcher.fetch(&shard_url).await?;
        artifact.extend_from_slice(&shard);
    }
    Ok(artifact)
}

/// Resolves `path` against the directory holding `manifest_url`.
pub fn resolve_sibling(manifest_url: &str, path: &str) -> Result<String, LoadError> {
    if Url::parse(path).is_ok() {
        return Ok(path.to_string());
    }

    let invalid = |e: url::ParseError| LoadError::Manifest(format!("cannot resolve {path} against {manifest_url}: {e}"));

    match Url::parse(manifest_url) {
        Ok(base) => Ok(base.join(path).map_err(invalid)?.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            // Resolve against a placeholder origin, then drop it again.
            let origin = Url::parse("http://localhost/").map_err(invalid)?;
            let joined = origin.join(manifest_url).and_then(|base| base.join(path)).map_err(invalid)?;
            let mut resolved = joined.path().to_string();
            if let Some(query) = joined.query() {
                resolved.push('?');
                resolved.push_str(query);
            }
            if !manifest_url.starts_with('/') {
                resolved.remove(0);
            }
            Ok(resolved)
        }
        Err(e) => Err(invalid(e)),
    }
}
