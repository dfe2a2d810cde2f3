use sha2::{Digest, Sha256};
use std::env;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Calculates the SHA256 hash of a file.
pub fn calculate_hash(path: &Path) -> Result<String, io::Error> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0; 8192]; // 8KB buffer
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME").or_else(|| env::var_os("USERPROFILE")).map(PathBuf::from)
}

/// Lists the platform font directories, in lookup order.
pub fn font_search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if cfg!(windows) {
        let windir = env::var_os("WINDIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(r"C:\Windows"));
        dirs.push(windir.join("Fonts"));
    } else if cfg!(target_os = "macos") {
        dirs.push(PathBuf::from("/Library/Fonts"));
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        if let Some(home) = home_dir() {
            dirs.push(home.join("Library/Fonts"));
        }
    } else {
        let data_dirs = env::var("XDG_DATA_DIRS")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "/usr/local/share:/usr/share".to_owned());
        dirs.extend(data_dirs.split(':').filter(|d| !d.is_empty()).map(|d| Path::new(d).join("fonts")));

        let data_home = env::var_os("XDG_DATA_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| home_dir().map(|h| h.join(".local/share")));
        if let Some(data_home) = data_home {
            dirs.push(data_home.join("fonts"));
        }
        if let Some(home) = home_dir() {
            dirs.push(home.join(".fonts"));
        }
    }
    dirs
}

/// Resolves a font lookup name to a file.
/// The name is tried as a path first, then searched for in `search_dirs`.
pub fn find_font_file(name: &str, search_dirs: &[PathBuf]) -> Option<PathBuf> {
    let mut candidates = vec![name.to_owned()];
    if Path::new(name).extension().is_none() {
        candidates.push(format!("{}.ttf", name));
    }

    for candidate in &candidates {
        let direct = Path::new(candidate);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }
    }

    for dir in search_dirs.iter().filter(|d| d.is_dir()) {
        // Unreadable entries are skipped.
        for entry in WalkDir::new(dir).follow_links(true).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            if candidates.iter().any(|c| file_name.eq_ignore_ascii_case(c)) {
                return Some(entry.into_path());
            }
        }
    }
    None
}
