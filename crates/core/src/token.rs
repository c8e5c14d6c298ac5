//! Persistence for the authentication token VTube Studio issues to a plugin.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

/// Storage for a single opaque token.
///
/// `load` returns `Ok(None)` when no token has been saved.
pub trait TokenStore: Send + Sync {
	fn load(&self) -> io::Result<Option<String>>;
	fn save(&self, token: &str) -> io::Result<()>;
	fn delete(&self) -> io::Result<()>;
}

/// Token kept in a single text file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
	path: PathBuf,
}

impl FileTokenStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// `<config dir>/vts/token`, if the platform has a config dir.
	pub fn default_path() -> Option<PathBuf> {
		dirs::config_dir().map(|dir| dir.join("vts").join("token"))
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl TokenStore for FileTokenStore {
	fn load(&self) -> io::Result<Option<String>> {
		match fs::read_to_string(&self.path) {
			Ok(text) => {
				let token = text.trim();
				Ok((!token.is_empty()).then(|| token.to_string()))
			}
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e),
		}
	}

	fn save(&self, token: &str) -> io::Result<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)?;
		}
		let mut file = open_private(&self.path)?;
		file.write_all(token.as_bytes())
	}

	fn delete(&self) -> io::Result<()> {
		match fs::remove_file(&self.path) {
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
			other => other,
		}
	}
}

/// Opens `path` for writing, readable by the owner only on Unix.
#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
	use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

	let file = fs::OpenOptions::new()
		.write(true)
		.create(true)
		.truncate(true)
		.mode(0o600)
		.open(path)?;
	// `mode` only applies on creation; tighten files left by older versions.
	file.set_permissions(fs::Permissions::from_mode(0o600))?;
	Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
	fs::File::create(path)
}

/// Process-local token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
	token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_token(token: impl Into<String>) -> Self {
		Self {
			token: Mutex::new(Some(token.into())),
		}
	}
}

impl TokenStore for MemoryTokenStore {
	fn load(&self) -> io::Result<Option<String>> {
		Ok(self.token.lock().clone())
	}

	fn save(&self, token: &str) -> io::Result<()> {
		*self.token.lock() = Some(token.to_string());
		Ok(())
	}

	fn delete(&self) -> io::Result<()> {
		self.token.lock().take();
		Ok(())
	}
}
