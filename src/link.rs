//! Download links and inline players as self-contained `data:` URIs.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::Result;

/// Label used when the caller does not name the file.
pub const DEFAULT_LABEL: &str = "File";

/// Read `path` and return an HTML anchor that downloads its bytes.
///
/// The file is re-read on every call. A missing file is an I/O error; callers
/// check existence first.
pub fn encode_download_link(path: impl AsRef<Path>, label: &str) -> Result<String> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let payload = STANDARD.encode(&data);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(format!(
        r#"<a href="data:application/octet-stream;base64,{payload}" download="{}">Download {}</a>"#,
        escape_html(&file_name),
        escape_html(label),
    ))
}

/// An `<audio>` element that plays `wav_bytes` inline.
pub fn inline_player(wav_bytes: &[u8]) -> String {
    format!(
        r#"<audio controls src="data:audio/wav;base64,{}"></audio>"#,
        STANDARD.encode(wav_bytes)
    )
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_of(html: &str) -> &str {
        let start = html.find("base64,").unwrap() + "base64,".len();
        let end = start + html[start..].find('"').unwrap();
        &html[start..end]
    }

    #[test]
    fn test_link_decodes_to_file_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio_0.wav");
        let bytes: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        std::fs::write(&path, &bytes).unwrap();

        let html = encode_download_link(&path, "Audio").unwrap();
        assert!(html.starts_with(r#"<a href="data:application/octet-stream;base64,"#));
        assert!(html.contains(r#"download="audio_0.wav""#));
        assert!(html.ends_with(">Download Audio</a>"));
        assert_eq!(STANDARD.decode(payload_of(&html)).unwrap(), bytes);
    }

    #[test]
    fn test_link_reflects_current_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"first").unwrap();
        let first = encode_download_link(&path, DEFAULT_LABEL).unwrap();
        std::fs::write(&path, b"second").unwrap();
        let second = encode_download_link(&path, DEFAULT_LABEL).unwrap();
        assert_ne!(first, second);
        assert_eq!(STANDARD.decode(payload_of(&second)).unwrap(), b"second");
        assert!(second.ends_with(">Download File</a>"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = encode_download_link(dir.path().join("gone.wav"), "Audio").unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }

    #[test]
    fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();
        let html = encode_download_link(&path, "x").unwrap();
        assert_eq!(payload_of(&html), "");
    }

    #[test]
    fn test_label_is_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        std::fs::write(&path, b"x").unwrap();
        let html = encode_download_link(&path, "<b>").unwrap();
        assert!(html.ends_with(">Download &lt;b&gt;</a>"));
    }

    #[test]
    fn test_inline_player() {
        let html = inline_player(b"RIFF");
        assert_eq!(
            html,
            r#"<audio controls src="data:audio/wav;base64,UklGRg=="></audio>"#
        );
    }
}
