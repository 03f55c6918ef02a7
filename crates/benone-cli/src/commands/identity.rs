use std::path::Path;

use benone_core::{Format, file_id};

pub fn run(path: &str, hint: &str) {
    let path = Path::new(path);
    if !path.is_file() {
        super::fail(format!("file {} does not exist", path.display()));
    }
    let format = Format::resolve(path, hint);
    match file_id(path, format) {
        Ok(id) => println!("{id}"),
        Err(e) => super::fail(format!("failed to hash {}: {e}", path.display())),
    }
}
