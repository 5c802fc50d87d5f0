//! Serializes a [`Document`] into an in-memory `.docx` (OPC zip) archive.

use std::io::{Cursor, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::relationships::{Relationships, TargetMode};
use super::{
    CoreProperties, Document, Paragraph, ParagraphChild, Run, RunContent, RunProperties,
    SectionProperties, is_xml_char,
};

const WORDPROCESSING_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PACKAGE_RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/></Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:eastAsia="Calibri" w:cs="Calibri"/><w:sz w:val="22"/><w:szCs w:val="22"/><w:lang w:val="fr-FR"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="200" w:line="276" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style></w:styles>"#;

const APP_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>calendrier</Application></Properties>"#;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("erreur de sérialisation XML : {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("erreur d'archive ZIP : {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("erreur d'entrée/sortie : {0}")]
    Io(#[from] std::io::Error),
    #[error("caractère U+{code:04X} interdit en XML dans <{element}>")]
    InvalidChar { element: String, code: u32 },
}

type XmlWriter = Writer<Vec<u8>>;

/// Write every part of the package and return the archive bytes.
pub fn write_package(document: &Document) -> Result<Vec<u8>, PackageError> {
    let parts: [(&str, Vec<u8>); 7] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes().to_vec()),
        ("_rels/.rels", PACKAGE_RELS_XML.as_bytes().to_vec()),
        ("word/document.xml", document_xml(document)?),
        ("word/styles.xml", STYLES_XML.as_bytes().to_vec()),
        (
            "word/_rels/document.xml.rels",
            relationships_xml(document.relationships())?,
        ),
        ("docProps/core.xml", core_properties_xml(&document.properties)?),
        ("docProps/app.xml", APP_XML.as_bytes().to_vec()),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, bytes) in parts {
        zip.start_file(name, options)?;
        zip.write_all(&bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}

/// `word/document.xml`.
pub fn document_xml(document: &Document) -> Result<Vec<u8>, PackageError> {
    let mut writer = Writer::new(Vec::new());
    write_declaration(&mut writer)?;

    let mut root = BytesStart::new("w:document");
    root.push_attribute(("xmlns:w", WORDPROCESSING_NS));
    root.push_attribute(("xmlns:r", RELATIONSHIPS_NS));
    writer.write_event(Event::Start(root))?;
    start(&mut writer, "w:body", &[])?;

    for paragraph in document.paragraphs() {
        write_paragraph(&mut writer, paragraph)?;
    }
    // Only the final section is carried by the body; the model keeps one.
    if let Some(section) = document.sections().last() {
        write_section(&mut writer, section)?;
    }

    end(&mut writer, "w:body")?;
    end(&mut writer, "w:document")?;
    Ok(writer.into_inner())
}

/// `word/_rels/document.xml.rels`.
pub fn relationships_xml(relationships: &Relationships) -> Result<Vec<u8>, PackageError> {
    let mut writer = Writer::new(Vec::new());
    write_declaration(&mut writer)?;
    start(
        &mut writer,
        "Relationships",
        &[("xmlns", PACKAGE_RELATIONSHIPS_NS)],
    )?;

    for relationship in relationships.iter() {
        let mut attributes = vec![
            ("Id", relationship.id.as_str()),
            ("Type", relationship.kind),
            ("Target", relationship.target.as_str()),
        ];
        if relationship.mode == TargetMode::External {
            attributes.push(("TargetMode", "External"));
        }
        empty(&mut writer, "Relationship", &attributes)?;
    }

    end(&mut writer, "Relationships")?;
    Ok(writer.into_inner())
}

fn core_properties_xml(properties: &CoreProperties) -> Result<Vec<u8>, PackageError> {
    let mut writer = Writer::new(Vec::new());
    write_declaration(&mut writer)?;
    start(
        &mut writer,
        "cp:coreProperties",
        &[
            (
                "xmlns:cp",
                "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
            ),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    )?;

    if let Some(title) = properties.title.as_deref() {
        text_element(&mut writer, "dc:title", &[], title)?;
    }
    if let Some(creator) = properties.creator.as_deref() {
        text_element(&mut writer, "dc:creator", &[], creator)?;
    }
    if let Some(created) = properties.created {
        let stamp = created.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        text_element(
            &mut writer,
            "dcterms:created",
            &[("xsi:type", "dcterms:W3CDTF")],
            &stamp,
        )?;
    }

    end(&mut writer, "cp:coreProperties")?;
    Ok(writer.into_inner())
}

fn write_paragraph(writer: &mut XmlWriter, paragraph: &Paragraph) -> Result<(), PackageError> {
    start(writer, "w:p", &[])?;
    if let Some(alignment) = paragraph.alignment {
        start(writer, "w:pPr", &[])?;
        empty(writer, "w:jc", &[("w:val", alignment.as_str())])?;
        end(writer, "w:pPr")?;
    }

    for child in &paragraph.children {
        match child {
            ParagraphChild::Run(run) => write_run(writer, run)?,
            ParagraphChild::Hyperlink(link) => {
                start(writer, "w:hyperlink", &[("r:id", link.relationship.as_str())])?;
                for run in &link.runs {
                    write_run(writer, run)?;
                }
                end(writer, "w:hyperlink")?;
            }
        }
    }

    end(writer, "w:p")
}

fn write_run(writer: &mut XmlWriter, run: &Run) -> Result<(), PackageError> {
    start(writer, "w:r", &[])?;
    if !run.properties.is_empty() {
        write_run_properties(writer, &run.properties)?;
    }
    for item in &run.content {
        match item {
            RunContent::Text(text) => {
                text_element(writer, "w:t", &[("xml:space", "preserve")], text)?
            }
            RunContent::Break => empty(writer, "w:br", &[])?,
        }
    }
    end(writer, "w:r")
}

/// Children follow the `CT_RPr` sequence order.
fn write_run_properties(
    writer: &mut XmlWriter,
    properties: &RunProperties,
) -> Result<(), PackageError> {
    start(writer, "w:rPr", &[])?;
    if let Some(font) = properties.font.as_deref() {
        empty(writer, "w:rFonts", &[("w:ascii", font), ("w:hAnsi", font)])?;
    }
    if properties.bold {
        empty(writer, "w:b", &[])?;
    }
    if properties.italic {
        empty(writer, "w:i", &[])?;
    }
    if let Some(color) = properties.color {
        empty(writer, "w:color", &[("w:val", color.hex().as_str())])?;
    }
    if let Some(size) = properties.size {
        empty(writer, "w:sz", &[("w:val", size.half_points().to_string().as_str())])?;
    }
    if let Some(underline) = properties.underline {
        empty(writer, "w:u", &[("w:val", underline.as_str())])?;
    }
    end(writer, "w:rPr")
}

fn write_section(writer: &mut XmlWriter, section: &SectionProperties) -> Result<(), PackageError> {
    let margins = section.margins;
    start(writer, "w:sectPr", &[])?;
    empty(
        writer,
        "w:pgSz",
        &[
            ("w:w", section.page_width.to_string().as_str()),
            ("w:h", section.page_height.to_string().as_str()),
        ],
    )?;
    empty(
        writer,
        "w:pgMar",
        &[
            ("w:top", margins.top.to_string().as_str()),
            ("w:right", margins.right.to_string().as_str()),
            ("w:bottom", margins.bottom.to_string().as_str()),
            ("w:left", margins.left.to_string().as_str()),
            ("w:header", margins.header.to_string().as_str()),
            ("w:footer", margins.footer.to_string().as_str()),
            ("w:gutter", margins.gutter.to_string().as_str()),
        ],
    )?;
    end(writer, "w:sectPr")
}

fn write_declaration(writer: &mut XmlWriter) -> Result<(), PackageError> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(())
}

fn element<'a>(name: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
    let mut element = BytesStart::new(name);
    for &attribute in attributes {
        element.push_attribute(attribute);
    }
    element
}

fn check_text(name: &str, text: &str) -> Result<(), PackageError> {
    match text.chars().find(|&c| !is_xml_char(c)) {
        Some(c) => Err(PackageError::InvalidChar {
            element: name.to_string(),
            code: c as u32,
        }),
        None => Ok(()),
    }
}

fn check_attributes(name: &str, attributes: &[(&str, &str)]) -> Result<(), PackageError> {
    attributes
        .iter()
        .try_for_each(|&(_, value)| check_text(name, value))
}

fn start(writer: &mut XmlWriter, name: &str, attributes: &[(&str, &str)]) -> Result<(), PackageError> {
    check_attributes(name, attributes)?;
    writer.write_event(Event::Start(element(name, attributes)))?;
    Ok(())
}

fn empty(writer: &mut XmlWriter, name: &str, attributes: &[(&str, &str)]) -> Result<(), PackageError> {
    check_attributes(name, attributes)?;
    writer.write_event(Event::Empty(element(name, attributes)))?;
    Ok(())
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<(), PackageError> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn text_element(
    writer: &mut XmlWriter,
    name: &str,
    attributes: &[(&str, &str)],
    text: &str,
) -> Result<(), PackageError> {
    check_text(name, text)?;
    start(writer, name, attributes)?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    end(writer, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::{Alignment, FontSize, Rgb, RunProperties};

    fn as_text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).expect("utf-8 xml")
    }

    #[test]
    fn test_run_properties_are_written_in_schema_order() {
        let mut document = Document::new();
        let mut paragraph = Paragraph::aligned(Alignment::Center);
        paragraph.add_text(
            "Lundi 1 septembre",
            RunProperties::new()
                .font("Arial")
                .bold()
                .color(Rgb::new(150, 29, 19))
                .size(FontSize::from_points(15.0)),
        );
        document.add_paragraph(paragraph);

        let xml = as_text(document_xml(&document).unwrap());
        assert!(xml.contains(r#"<w:jc w:val="center"/>"#));
        assert!(xml.contains(
            r#"<w:rPr><w:rFonts w:ascii="Arial" w:hAnsi="Arial"/><w:b/><w:color w:val="961D13"/><w:sz w:val="30"/></w:rPr>"#
        ));
        assert!(xml.contains(r#"<w:t xml:space="preserve">Lundi 1 septembre</w:t>"#));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut document = Document::new();
        let mut paragraph = Paragraph::new();
        paragraph.add_text("R&D <2025>", RunProperties::new());
        document.add_paragraph(paragraph);

        let xml = as_text(document_xml(&document).unwrap());
        assert!(xml.contains("R&amp;D &lt;2025&gt;"));
    }

    #[test]
    fn test_control_character_in_text_is_refused() {
        let mut document = Document::new();
        let mut paragraph = Paragraph::new();
        paragraph.add_text("Bonjour\u{1}monde", RunProperties::new());
        document.add_paragraph(paragraph);

        match document_xml(&document) {
            Err(PackageError::InvalidChar { element, code }) => {
                assert_eq!(element, "w:t");
                assert_eq!(code, 0x1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_control_character_in_link_target_is_refused() {
        let mut relationships = Relationships::new();
        crate::docx::RelationshipRegistry::relate_external(
            &mut relationships,
            "http://example.org/\u{B}",
            crate::docx::HYPERLINK_RELATIONSHIP,
        );

        assert!(matches!(
            relationships_xml(&relationships),
            Err(PackageError::InvalidChar { code: 0xB, .. })
        ));
    }

    #[test]
    fn test_tabs_and_newlines_are_kept() {
        let mut document = Document::new();
        let mut paragraph = Paragraph::new();
        paragraph.add_text("a\tb\nc", RunProperties::new());
        document.add_paragraph(paragraph);

        assert!(document_xml(&document).is_ok());
    }

    #[test]
    fn test_unformatted_break_run_has_no_properties() {
        let mut document = Document::new();
        let mut paragraph = Paragraph::new();
        paragraph.add_break();
        document.add_paragraph(paragraph);

        let xml = as_text(document_xml(&document).unwrap());
        assert!(xml.contains("<w:r><w:br/></w:r>"));
    }

    #[test]
    fn test_external_relationships_carry_target_mode() {
        let mut relationships = Relationships::new();
        crate::docx::RelationshipRegistry::relate_external(
            &mut relationships,
            "http://example.org/?a=1&b=2",
            crate::docx::HYPERLINK_RELATIONSHIP,
        );

        let xml = as_text(relationships_xml(&relationships).unwrap());
        assert!(xml.contains(r#"Target="styles.xml"/>"#));
        assert!(xml.contains(r#"Target="http://example.org/?a=1&amp;b=2" TargetMode="External"/>"#));
    }

    #[test]
    fn test_section_margins() {
        let mut document = Document::new();
        for section in document.sections_mut() {
            section.set_uniform_margins(1440);
        }
        let xml = as_text(document_xml(&document).unwrap());
        assert!(xml.contains(
            r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/>"#
        ));
    }

    #[test]
    fn test_package_is_a_zip_with_all_parts() {
        let bytes = write_package(&Document::new()).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "docProps/app.xml",
                "docProps/core.xml",
                "word/_rels/document.xml.rels",
                "word/document.xml",
                "word/styles.xml",
            ]
        );
    }
}
