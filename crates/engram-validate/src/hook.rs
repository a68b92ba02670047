//! commit-msg hook management.
//!
//! The hook rejects a commit by exiting non-zero from `engram validate
//! check`, which reads the message file git hands the hook. An existing
//! commit-msg hook is renamed to `commit-msg.pre-engram` and chained
//! before ours, and restored on uninstall.

use std::fs;
use std::path::Path;

use crate::error::ValidateError;

const HOOK_NAME: &str = "commit-msg";
const MARKER: &str = "engram validate check";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookState {
    Installed,
    NotInstalled,
    /// A commit-msg hook exists but is not ours.
    Foreign,
}

impl std::fmt::Display for HookState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HookState::Installed => "installed",
            HookState::NotInstalled => "not installed",
            HookState::Foreign => "foreign hook present",
        };
        write!(f, "{s}")
    }
}

/// Install the commit-msg hook, backing up and chaining any existing one.
pub fn install_hook(git_dir: &Path) -> Result<(), ValidateError> {
    let hooks_dir = git_dir.join("hooks");
    fs::create_dir_all(&hooks_dir).map_err(engram_core::CoreError::from)?;

    let hook_path = hooks_dir.join(HOOK_NAME);
    let backup_path = hooks_dir.join(format!("{HOOK_NAME}.pre-engram"));

    if hook_path.exists() {
        let content =
            fs::read_to_string(&hook_path).map_err(engram_core::CoreError::from)?;
        if !content.contains(MARKER) {
            fs::rename(&hook_path, &backup_path).map_err(engram_core::CoreError::from)?;
        }
    }

    let script = hook_script(backup_path.exists());
    fs::write(&hook_path, script).map_err(engram_core::CoreError::from)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&hook_path, fs::Permissions::from_mode(0o755))
            .map_err(engram_core::CoreError::from)?;
    }
    Ok(())
}

/// Remove our hook and restore a backed-up original, if any.
pub fn uninstall_hook(git_dir: &Path) -> Result<(), ValidateError> {
    let hooks_dir = git_dir.join("hooks");
    let hook_path = hooks_dir.join(HOOK_NAME);
    let backup_path = hooks_dir.join(format!("{HOOK_NAME}.pre-engram"));

    if hook_path.exists() {
        let content = fs::read_to_string(&hook_path).unwrap_or_default();
        if content.contains(MARKER) {
            fs::remove_file(&hook_path).map_err(engram_core::CoreError::from)?;
        }
    }
    if backup_path.exists() {
        fs::rename(&backup_path, &hook_path).map_err(engram_core::CoreError::from)?;
    }
    Ok(())
}

pub fn hook_state(git_dir: &Path) -> HookState {
    let hook_path = git_dir.join("hooks").join(HOOK_NAME);
    if !hook_path.exists() {
        return HookState::NotInstalled;
    }
    match fs::read_to_string(&hook_path) {
        Ok(content) if content.contains(MARKER) => HookState::Installed,
        _ => HookState::Foreign,
    }
}

fn hook_script(has_backup: bool) -> String {
    let mut script = String::from("#!/bin/sh\n");
    script.push_str("# Engram commit-msg hook — auto-generated, do not edit\n\n");

    if has_backup {
        script.push_str(&format!(
            "# Run original hook first\n\
             if [ -x \"$(dirname \"$0\")/{HOOK_NAME}.pre-engram\" ]; then\n\
             \t\"$(dirname \"$0\")/{HOOK_NAME}.pre-engram\" \"$@\"\n\
             \tHOOK_EXIT=$?\n\
             \tif [ $HOOK_EXIT -ne 0 ]; then\n\
             \t\texit $HOOK_EXIT\n\
             \tfi\n\
             fi\n\n"
        ));
    }

    // The validator's exit code is the commit's fate, so no || true here.
    script.push_str(&format!(
        "if command -v engram >/dev/null 2>&1; then\n\
         \tengram validate check --message-file \"$1\"\n\
         fi\n"
    ));
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn git_dir() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("hooks")).unwrap();
        tmp
    }

    #[test]
    fn test_install_and_state() {
        let tmp = git_dir();
        assert_eq!(hook_state(tmp.path()), HookState::NotInstalled);

        install_hook(tmp.path()).unwrap();
        assert_eq!(hook_state(tmp.path()), HookState::Installed);

        let content =
            fs::read_to_string(tmp.path().join("hooks").join(HOOK_NAME)).unwrap();
        assert!(content.contains(MARKER));
        assert!(content.contains("--message-file \"$1\""));
    }

    #[test]
    fn test_install_chains_existing_hook() {
        let tmp = git_dir();
        let hook = tmp.path().join("hooks").join(HOOK_NAME);
        fs::write(&hook, "#!/bin/sh\necho original\n").unwrap();
        assert_eq!(hook_state(tmp.path()), HookState::Foreign);

        install_hook(tmp.path()).unwrap();

        let backup = tmp.path().join("hooks").join("commit-msg.pre-engram");
        assert!(fs::read_to_string(&backup).unwrap().contains("echo original"));
        let content = fs::read_to_string(&hook).unwrap();
        assert!(content.contains("pre-engram"));
        assert!(content.contains(MARKER));
    }

    #[test]
    fn test_uninstall_restores_original() {
        let tmp = git_dir();
        let hook = tmp.path().join("hooks").join(HOOK_NAME);
        fs::write(&hook, "#!/bin/sh\necho original\n").unwrap();

        install_hook(tmp.path()).unwrap();
        uninstall_hook(tmp.path()).unwrap();

        assert!(fs::read_to_string(&hook).unwrap().contains("echo original"));
        assert!(!tmp.path().join("hooks").join("commit-msg.pre-engram").exists());
    }

    #[test]
    fn test_reinstall_does_not_clobber_backup() {
        let tmp = git_dir();
        let hook = tmp.path().join("hooks").join(HOOK_NAME);
        fs::write(&hook, "#!/bin/sh\necho original\n").unwrap();

        install_hook(tmp.path()).unwrap();
        install_hook(tmp.path()).unwrap();

        let backup = tmp.path().join("hooks").join("commit-msg.pre-engram");
        assert!(fs::read_to_string(&backup).unwrap().contains("echo original"));
    }
}
