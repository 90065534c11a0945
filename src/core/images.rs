use std::path::PathBuf;

/// Environment variable naming the primary artwork directory.
pub const IMAGES_DIR_ENV: &str = "CARD_IMAGES_DIR";

/// Directories searched for card artwork, highest priority first: configured
/// directories, then `./images`, then `./data/images`.
pub fn search_roots(configured: &[String]) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = configured.iter().map(PathBuf::from).collect();
    roots.push(PathBuf::from("images"));
    roots.push(PathBuf::from("data").join("images"));
    roots
}

/// Resolve a card's image filename against the search roots. A missing file
/// degrades to no thumbnail, it is never an error.
pub fn resolve_card_image(file_name: &str, roots: &[PathBuf]) -> Option<PathBuf> {
    let file_name = file_name.trim();
    if file_name.is_empty() {
        return None;
    }

    for root in roots {
        let candidate = root.join(file_name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}
