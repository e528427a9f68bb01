use studyvault_rs::models::ResourceType;
use studyvault_rs::services::classifier::{classify, format_file_size};

#[test]
fn test_classifier_is_total() {
    let mimes = [
        "application/pdf",
        "video/webm",
        "image/jpeg",
        "audio/ogg",
        "text/plain",
        "application/zip",
        "application/octet-stream",
        "",
        "garbage",
    ];
    let names = ["a.pdf", "b.PY", "c", "d.tar", "e.exe", "weird.name.gz", ""];

    for mime in mimes {
        for name in names {
            // Classification never panics and always lands in the enum
            let t = classify(mime, name);
            assert!(ResourceType::ALL.contains(&t));
        }
    }
}

#[test]
fn test_pdf_mime_beats_any_extension() {
    for name in ["paper.pdf", "paper.zip", "paper.py", "paper"] {
        assert_eq!(classify("application/pdf", name), ResourceType::Pdf);
    }
}

#[test]
fn test_python_text_file_is_code_not_note() {
    assert_eq!(classify("text/plain", "solver.py"), ResourceType::Code);
}

#[test]
fn test_extensions_are_case_insensitive() {
    assert_eq!(
        classify("application/octet-stream", "DATA.ZIP"),
        ResourceType::Archive
    );
    assert_eq!(classify("text/plain", "Main.JAVA"), ResourceType::Code);
}

#[test]
fn test_file_size_display_examples() {
    assert_eq!(format_file_size(0), "0 B");
    assert_eq!(format_file_size(1024), "1 KB");
    assert_eq!(format_file_size(1500), "1.46 KB");
}
