//! Filesystem-safe product slugs.

use sha2::{Digest, Sha256};

/// Lowercase `input`, collapse every run of non-alphanumeric characters into a
/// single hyphen and strip hyphens from both ends.
///
/// Alphanumeric is Unicode-aware, so accented letters survive as-is:
/// `"Café Mug"` becomes `"café-mug"`, not `"cafe-mug"`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// File name used for a freshly generated (or placeholder) source image.
/// Names that slug to nothing become `untitled-<hash>`, keyed on the raw name
/// so that distinct symbol-only products keep distinct files.
pub fn generated_file_name(product: &str) -> String {
    let slug = slugify(product);
    if slug.is_empty() {
        let digest = Sha256::digest(product.as_bytes());
        format!("untitled-{}.png", hex::encode(&digest[..4]))
    } else {
        format!("{slug}.png")
    }
}
