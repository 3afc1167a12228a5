use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};

pub fn abbreviate_home(path: &Path) -> String {
    let Some(base_dirs) = BaseDirs::new() else {
        return path.display().to_string();
    };
    let home = base_dirs.home_dir();
    if let Ok(rest) = path.strip_prefix(home) {
        if rest.as_os_str().is_empty() {
            "~".to_string()
        } else {
            format!("~/{}", rest.display())
        }
    } else {
        path.display().to_string()
    }
}

/// Timestamped default filename offered in the export prompt.
pub fn default_export_name(extension: &str) -> String {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("updated_data_{stamp}.{extension}")
}

/// Log destination for TUI sessions, where stderr is covered by the
/// alternate screen.
pub fn log_file_path() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "gridmate")?;
    Some(dirs.data_dir().join("gridmate.log"))
}
