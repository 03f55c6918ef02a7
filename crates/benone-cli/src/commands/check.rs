use std::fs::File;
use std::path::{Path, PathBuf};

use benone_core::{AppConfig, UploadCheck, check_upload};

/// Where the stored counterpart of `file` lives.
fn stored_path(file: &Path, name: Option<&str>, against: Option<&str>, config: &AppConfig) -> PathBuf {
    if let Some(against) = against {
        return PathBuf::from(against);
    }
    let name = match name {
        Some(name) => PathBuf::from(name),
        None => file.file_name().map(PathBuf::from).unwrap_or_default(),
    };
    config.upload_folder.join(name)
}

pub fn run(file: &str, name: Option<&str>, against: Option<&str>, config: &AppConfig) {
    let file = Path::new(file);
    let candidate = File::open(file)
        .unwrap_or_else(|e| super::fail(format!("cannot open {}: {e}", file.display())));
    let stored = stored_path(file, name, against, config);

    match check_upload(&stored, candidate) {
        Ok(UploadCheck::New) => println!("new: nothing stored at {}", stored.display()),
        Ok(UploadCheck::Duplicate) => {
            println!("duplicate: {} has the same content", stored.display())
        }
        Ok(UploadCheck::Conflict) => {
            println!(
                "conflict: {} exists with different content",
                stored.display()
            );
            std::process::exit(1);
        }
        Err(e) => super::fail(format!("cannot compare with {}: {e}", stored.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_path_defaults_to_upload_folder() {
        let config = AppConfig {
            upload_folder: PathBuf::from("uploads"),
            ..AppConfig::default()
        };
        assert_eq!(
            stored_path(Path::new("/tmp/x/data.csv"), None, None, &config),
            PathBuf::from("uploads/data.csv")
        );
        assert_eq!(
            stored_path(Path::new("data.csv"), Some("other.csv"), None, &config),
            PathBuf::from("uploads/other.csv")
        );
        assert_eq!(
            stored_path(Path::new("data.csv"), Some("other.csv"), Some("/a/b.csv"), &config),
            PathBuf::from("/a/b.csv")
        );
    }
}
