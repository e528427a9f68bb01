use crate::models::ResourceType;
use std::collections::HashSet;

lazy_static::lazy_static! {
    /// Extensions that disqualify a text/* MIME type from being a plain note.
    static ref TEXT_CODE_EXTENSIONS: HashSet<&'static str> = [
        "js", "ts", "py", "java", "cpp", "c", "html", "css", "json", "xml",
    ]
    .into_iter()
    .collect();

    static ref ARCHIVE_EXTENSIONS: HashSet<&'static str> = [
        "zip", "rar", "7z", "tar", "gz", "bz2",
    ]
    .into_iter()
    .collect();

    static ref SOFTWARE_EXTENSIONS: HashSet<&'static str> = [
        "exe", "msi", "dmg", "pkg", "deb", "rpm", "app",
    ]
    .into_iter()
    .collect();

    static ref CODE_EXTENSIONS: HashSet<&'static str> = [
        "js", "ts", "tsx", "jsx", "py", "java", "cpp", "c", "h", "hpp", "cs",
        "go", "rs", "rb", "php", "swift", "kt", "scala", "html", "css", "scss",
        "sass", "less", "json", "xml", "yaml", "yml", "md", "sql",
    ]
    .into_iter()
    .collect();
}

/// Classifies an uploaded file into one of the nine resource categories.
///
/// Total and deterministic: precedence is PDF MIME, then video/image/audio
/// MIME families, then text/* (unless the extension marks it as code), then
/// archive, installer and code extensions, falling back to `Other`.
pub fn classify(mime_type: &str, file_name: &str) -> ResourceType {
    let ext = extension_of(file_name);

    if mime_type.starts_with("application/pdf") {
        return ResourceType::Pdf;
    }
    if mime_type.starts_with("video/") {
        return ResourceType::Video;
    }
    if mime_type.starts_with("image/") {
        return ResourceType::Image;
    }
    if mime_type.starts_with("audio/") {
        return ResourceType::Audio;
    }
    if mime_type.starts_with("text/") && !TEXT_CODE_EXTENSIONS.contains(ext.as_str()) {
        return ResourceType::Note;
    }

    if ARCHIVE_EXTENSIONS.contains(ext.as_str()) {
        return ResourceType::Archive;
    }
    if SOFTWARE_EXTENSIONS.contains(ext.as_str()) {
        return ResourceType::Software;
    }
    if CODE_EXTENSIONS.contains(ext.as_str()) {
        return ResourceType::Code;
    }

    ResourceType::Other
}

/// MIME type for an upload: the client-declared type when present, otherwise
/// guessed from the filename.
pub fn resolve_mime_type(declared: Option<&str>, file_name: &str) -> String {
    match declared {
        Some(mime) if !mime.is_empty() => mime.to_string(),
        _ => mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}

fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Human-readable byte size: powers of 1024, two decimals with trailing
/// zeros trimmed ("0 B", "1 KB", "1.46 KB").
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut exp = 0;
    let mut scale = 1u64;
    while exp < UNITS.len() - 1 && bytes >= scale * 1024 {
        scale *= 1024;
        exp += 1;
    }
    let value = bytes as f64 / scale as f64;
    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exp])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_mime_wins_over_extension() {
        assert_eq!(classify("application/pdf", "report.docx"), ResourceType::Pdf);
        assert_eq!(classify("application/pdf", "slides.pdf"), ResourceType::Pdf);
    }

    #[test]
    fn mime_families_map_directly() {
        assert_eq!(classify("video/mp4", "lecture.mp4"), ResourceType::Video);
        assert_eq!(classify("image/png", "diagram.png"), ResourceType::Image);
        assert_eq!(classify("audio/mpeg", "podcast.mp3"), ResourceType::Audio);
    }

    #[test]
    fn plain_text_is_a_note() {
        assert_eq!(classify("text/plain", "summary.txt"), ResourceType::Note);
        assert_eq!(classify("text/markdown", "notes.md"), ResourceType::Note);
    }

    #[test]
    fn code_extension_excludes_text_from_notes() {
        assert_eq!(classify("text/plain", "script.py"), ResourceType::Code);
        assert_eq!(classify("text/html", "index.html"), ResourceType::Code);
    }

    #[test]
    fn archives_installers_and_code_by_extension() {
        assert_eq!(
            classify("application/octet-stream", "dataset.zip"),
            ResourceType::Archive
        );
        assert_eq!(
            classify("application/octet-stream", "setup.MSI"),
            ResourceType::Software
        );
        assert_eq!(
            classify("application/octet-stream", "main.rs"),
            ResourceType::Code
        );
    }

    #[test]
    fn unknown_inputs_fall_back_to_other() {
        assert_eq!(classify("", ""), ResourceType::Other);
        assert_eq!(
            classify("application/x-mystery", "blob.bin"),
            ResourceType::Other
        );
    }

    #[test]
    fn resolve_mime_prefers_declared_type() {
        assert_eq!(resolve_mime_type(Some("video/mp4"), "x.bin"), "video/mp4");
        assert_eq!(resolve_mime_type(None, "paper.pdf"), "application/pdf");
        assert_eq!(
            resolve_mime_type(Some(""), "mystery"),
            "application/octet-stream"
        );
    }

    #[test]
    fn formats_file_sizes() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1500), "1.46 KB");
        assert_eq!(format_file_size(1024 * 1024), "1 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024), "5 GB");
    }
}
