use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
	#[error("failed to read {}: {source}", path.display())]
	Io { path: PathBuf, #[source] source: std::io::Error },

	#[error("failed to parse {}: {source}", path.display())]
	Json { path: PathBuf, #[source] source: serde_json::Error },

	#[error("component record for object {object} exceeded 255 words ({words} words)")]
	OversizeComponent { object: u16, words: usize },

	#[error("asset converter for {} exited with status {status}", path.display())]
	ConverterFailed { path: PathBuf, status: i32 },

	#[error("scene binary error: {0}")]
	Scene(#[from] scene::loader::SceneLoadError),
}

pub type Result<T> = std::result::Result<T, BuildError>;

pub(crate) fn read_to_string(path: &std::path::Path) -> Result<String> {
	std::fs::read_to_string(path).map_err(|source| BuildError::Io { path: path.to_path_buf(), source })
}

pub(crate) fn write(path: &std::path::Path, contents: &[u8]) -> Result<()> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).map_err(|source| BuildError::Io { path: path.to_path_buf(), source })?;
	}
	std::fs::write(path, contents).map_err(|source| BuildError::Io { path: path.to_path_buf(), source })
}
