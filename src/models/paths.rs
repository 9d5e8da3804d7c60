use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;

/// Subdirectory of the data root that holds everything game related.
pub const GAME_DIR_NAME: &str = "minecraft-bedrock";

pub const WORLDS_DIR: &str = "worlds";
pub const RESOURCE_PACKS_DIR: &str = "resource_packs";
pub const BEHAVIOR_PACKS_DIR: &str = "behavior_packs";

/// On-disk layout rooted at the configured data directory.
///
/// ```text
/// <data_root>/
///   imports/
///   minecraft-bedrock/
///     versions/<name>/{worlds,resource_packs,behavior_packs}/
///     profiles/<name>/
///     logs/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    data_root: Utf8PathBuf,
}

impl DataLayout {
    pub fn new<P: AsRef<Utf8Path>>(data_root: P) -> Self {
        Self {
            data_root: data_root.as_ref().to_path_buf(),
        }
    }

    pub fn data_root(&self) -> &Utf8Path {
        &self.data_root
    }

    pub fn game_root(&self) -> Utf8PathBuf {
        self.data_root.join(GAME_DIR_NAME)
    }

    pub fn versions_root(&self) -> Utf8PathBuf {
        self.game_root().join("versions")
    }

    pub fn profiles_root(&self) -> Utf8PathBuf {
        self.game_root().join("profiles")
    }

    pub fn logs_dir(&self) -> Utf8PathBuf {
        self.game_root().join("logs")
    }

    /// Staging area for files copied in from outside the data root.
    pub fn imports_dir(&self) -> Utf8PathBuf {
        self.data_root.join("imports")
    }

    pub fn version_dir(&self, name: &str) -> Utf8PathBuf {
        self.versions_root().join(name)
    }

    pub fn profile_dir(&self, name: &str) -> Utf8PathBuf {
        self.profiles_root().join(name)
    }

    pub fn worlds_dir(&self, version: &str) -> Utf8PathBuf {
        self.version_dir(version).join(WORLDS_DIR)
    }

    pub fn resource_packs_dir(&self, version: &str) -> Utf8PathBuf {
        self.version_dir(version).join(RESOURCE_PACKS_DIR)
    }

    pub fn behavior_packs_dir(&self, version: &str) -> Utf8PathBuf {
        self.version_dir(version).join(BEHAVIOR_PACKS_DIR)
    }

    /// Create the versions, profiles, logs and imports directories.
    pub fn ensure_exists(&self) -> io::Result<()> {
        for dir in [
            self.versions_root(),
            self.profiles_root(),
            self.logs_dir(),
            self.imports_dir(),
        ] {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

/// Check that `name` can be used as a single directory name under the
/// versions root.
pub fn is_valid_version_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = DataLayout::new("/data");
        assert_eq!(
            layout.version_dir("1.21"),
            Utf8PathBuf::from("/data/minecraft-bedrock/versions/1.21")
        );
        assert_eq!(
            layout.profile_dir("1.21"),
            Utf8PathBuf::from("/data/minecraft-bedrock/profiles/1.21")
        );
        assert_eq!(layout.imports_dir(), Utf8PathBuf::from("/data/imports"));
        assert_eq!(
            layout.resource_packs_dir("x"),
            Utf8PathBuf::from("/data/minecraft-bedrock/versions/x/resource_packs")
        );
    }

    #[test]
    fn test_ensure_exists() {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let layout = DataLayout::new(&root);

        layout.ensure_exists().unwrap();
        layout.ensure_exists().unwrap();

        assert!(layout.versions_root().is_dir());
        assert!(layout.profiles_root().is_dir());
        assert!(layout.logs_dir().is_dir());
        assert!(layout.imports_dir().is_dir());
    }

    #[test]
    fn test_version_name_validation() {
        assert!(is_valid_version_name("1.21.0.3"));
        assert!(is_valid_version_name("My Version"));
        assert!(!is_valid_version_name(""));
        assert!(!is_valid_version_name("   "));
        assert!(!is_valid_version_name(".."));
        assert!(!is_valid_version_name("a/b"));
        assert!(!is_valid_version_name("a\\b"));
    }
}
