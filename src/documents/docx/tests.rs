use super::*;
use std::io::Write;
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;

const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Vacation Policy</w:t></w:r></w:p>
    <w:p>
      <w:r><w:t xml:space="preserve">Employees receive </w:t></w:r>
      <w:r><w:rPr><w:b/></w:rPr><w:t>15</w:t></w:r>
      <w:r><w:t xml:space="preserve"> vacation days annually.</w:t></w:r>
    </w:p>
    <w:p><w:r><w:t>Q&amp;A:</w:t><w:tab/><w:t>see &lt;HR portal&gt;</w:t><w:br/><w:t>Ext. &#x31;&#50;3</w:t></w:r></w:p>
    <w:sectPr/>
  </w:body>
</w:document>"#;

fn write_docx(parts: &[(&str, &str)]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("should create temp file");
    {
        let mut writer = zip::ZipWriter::new(file.as_file_mut());
        for (name, content) in parts {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("should start zip entry");
            writer
                .write_all(content.as_bytes())
                .expect("should write zip entry");
        }
        writer.finish().expect("should finish zip");
    }
    file
}

#[test]
fn paragraphs_become_blank_line_separated() {
    let text = document_xml_to_text(SAMPLE_XML);

    assert_eq!(
        text,
        "Vacation Policy\n\nEmployees receive 15 vacation days annually.\n\nQ&A:\tsee <HR portal>\nExt. 123"
    );
}

#[test]
fn text_outside_runs_is_ignored() {
    let xml = "<w:document><w:body><w:p>stray<w:r><w:t>kept</w:t></w:r></w:p></w:body></w:document>";

    assert_eq!(document_xml_to_text(xml), "kept");
}

#[test]
fn unknown_entities_are_preserved() {
    let xml = "<w:p><w:r><w:t>a &bogus; b &amp c</w:t></w:r></w:p>";

    assert_eq!(document_xml_to_text(xml), "a &bogus; b &amp c");
}

#[test]
fn tab_stop_definitions_are_not_text() {
    let xml = r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/><w:tab w:val="right" w:pos="9360"/></w:tabs></w:pPr><w:r><w:t>Name</w:t></w:r><w:r><w:tab/><w:t>Value</w:t></w:r></w:p>"#;

    assert_eq!(document_xml_to_text(xml), "Name\tValue");
}

#[test]
fn extracts_text_from_container() {
    let file = write_docx(&[
        ("[Content_Types].xml", "<Types/>"),
        ("word/document.xml", SAMPLE_XML),
    ]);

    let text = extract_text(file.path()).expect("docx should extract");

    assert!(text.starts_with("Vacation Policy"));
    assert!(text.contains("15 vacation days"));
}

#[test]
fn missing_document_part_is_an_error() {
    let file = write_docx(&[("word/styles.xml", "<w:styles/>")]);

    let error = extract_text(file.path()).expect_err("missing body should fail");

    assert!(error.to_string().contains("word/document.xml"));
}

#[test]
fn non_zip_input_is_an_error() {
    let mut file = NamedTempFile::new().expect("should create temp file");
    file.write_all(b"plain text pretending to be a docx")
        .expect("should write temp file");

    assert!(extract_text(file.path()).is_err());
}
