use std::path::Path;

/// Client URL for a backend artifact: `{prefix}/{kind}/{file name}`.
pub(crate) fn media_url(prefix: &str, kind: &str, artifact_path: &str) -> String {
    let name = Path::new(artifact_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(artifact_path);
    format!("{}/{kind}/{name}", prefix.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_uses_the_file_name_only() {
        assert_eq!(
            media_url("/media", "audio", "/srv/outputs/audio/20250101_vex.wav"),
            "/media/audio/20250101_vex.wav"
        );
        assert_eq!(
            media_url("https://cdn.example.com/", "video", "clip.mp4"),
            "https://cdn.example.com/video/clip.mp4"
        );
    }
}
