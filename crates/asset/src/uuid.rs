use sha2::{Digest, Sha256};

/// Stable 64-bit identity for an asset, derived from a namespaced string (an
/// absolute source path for content assets, a path+nonce for generated
/// scripts). Stable across rebuilds as long as the input string is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetUuid(pub u64);

impl AssetUuid {
	/// Truncates a SHA-256 digest to 64 bits by big-endian-accumulating its
	/// first 8 bytes, matching `sha256_64bit` in the original asset pipeline.
	pub fn from_str(s: &str) -> Self {
		let digest = Sha256::digest(s.as_bytes());
		let mut acc: u64 = 0;
		for &byte in &digest[..8] {
			acc = (acc << 8) | byte as u64;
		}
		AssetUuid(acc)
	}

	pub fn for_content_path(path: &str) -> Self {
		Self::from_str(&format!("ASSET:{path}"))
	}

	pub fn for_script(path: &str, nonce: u64) -> Self {
		Self::from_str(&format!("CODE:{path}:{nonce}"))
	}

	pub fn as_u64(self) -> u64 {
		self.0
	}
}

impl std::fmt::Display for AssetUuid {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:016x}", self.0)
	}
}

/// Mints a random 64-bit component UUID, for editor-side identity that has
/// no stable source path to hash (e.g. a component instance).
pub fn random_uuid() -> u64 {
	rand::random::<u64>()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn same_path_hashes_to_same_uuid() {
		let a = AssetUuid::for_content_path("/project/assets/hero.glb");
		let b = AssetUuid::for_content_path("/project/assets/hero.glb");
		assert_eq!(a, b);
	}

	#[test]
	fn different_paths_hash_differently() {
		let a = AssetUuid::for_content_path("/project/assets/hero.glb");
		let b = AssetUuid::for_content_path("/project/assets/villain.glb");
		assert_ne!(a, b);
	}
}
