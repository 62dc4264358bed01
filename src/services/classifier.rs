const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];
const AUDIO_EXTENSIONS: [&str; 6] = [".mp3", ".m4a", ".aac", ".amr", ".wav", ".ogg"];

/// Decides whether a part is an image or audio attachment.
///
/// The declared content type wins when it is `image/*` or `audio/*`. Parts
/// stored with a generic type are still accepted when their stored path
/// carries a known media extension. A part with no declared type at all is
/// never media.
pub fn is_media(declared_type: Option<&str>, stored_path: Option<&str>) -> bool {
    let Some(ct) = declared_type else {
        return false;
    };
    if ct.starts_with("image/") || ct.starts_with("audio/") {
        return true;
    }

    match stored_path {
        Some(path) => {
            let path = path.to_lowercase();
            IMAGE_EXTENSIONS
                .iter()
                .chain(AUDIO_EXTENSIONS.iter())
                .any(|ext| path.ends_with(ext))
        }
        None => false,
    }
}
