use benone_core::{Format, SUPPORTED_EXTENSIONS};

pub fn run() {
    println!("Supported formats:");
    for ext in SUPPORTED_EXTENSIONS {
        let delimiter = match Format::from_extension(ext).and_then(Format::delimiter) {
            Some(b'\t') => "tab",
            Some(b',') => "comma",
            _ => "?",
        };
        println!("  {ext:<6} {delimiter}-separated");
    }
    println!("  other  one field per line");
}
