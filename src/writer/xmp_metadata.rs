//! XMP metadata packets.
//!
//! The `/Metadata` stream of the catalog holds an XMP packet (ISO
//! 32000-1:2008, §14.3.2). Packets are either supplied by the caller, in
//! which case they are checked for well-formedness, or generated here from
//! the document information.

use crate::error::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

const NS_X: &str = "adobe:ns:meta/";
const NS_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
const NS_XMP: &str = "http://ns.adobe.com/xap/1.0/";
const NS_PDF: &str = "http://ns.adobe.com/pdf/1.3/";

/// Properties written into a generated packet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmpMetadata {
    pub title: Option<String>,
    pub creators: Vec<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub creator_tool: Option<String>,
    pub producer: Option<String>,
    /// ISO 8601
    pub create_date: Option<String>,
    /// ISO 8601
    pub modify_date: Option<String>,
    pub language: Option<String>,
}

/// XMP packet builder.
pub struct XmpWriter {
    metadata: XmpMetadata,
}

impl XmpWriter {
    /// Create a writer for the given properties.
    pub fn new(metadata: XmpMetadata) -> Self {
        Self { metadata }
    }

    /// Build the packet as bytes.
    pub fn build_bytes(self) -> Vec<u8> {
        self.to_xml().into_bytes()
    }

    fn to_xml(&self) -> String {
        let m = &self.metadata;
        let mut xml = String::new();
        xml.push_str("<?xpacket begin=\"\u{feff}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>\n");
        xml.push_str(&format!("<x:xmpmeta xmlns:x=\"{}\">\n", NS_X));
        xml.push_str(&format!("  <rdf:RDF xmlns:rdf=\"{}\">\n", NS_RDF));
        xml.push_str("    <rdf:Description rdf:about=\"\"\n");
        xml.push_str(&format!("        xmlns:dc=\"{}\"\n", NS_DC));
        xml.push_str(&format!("        xmlns:xmp=\"{}\"\n", NS_XMP));
        xml.push_str(&format!("        xmlns:pdf=\"{}\">\n", NS_PDF));

        xml.push_str("      <dc:format>application/pdf</dc:format>\n");
        if let Some(title) = &m.title {
            push_alt(&mut xml, "dc:title", title);
        }
        if !m.creators.is_empty() {
            xml.push_str("      <dc:creator>\n        <rdf:Seq>\n");
            for creator in &m.creators {
                xml.push_str(&format!("          <rdf:li>{}</rdf:li>\n", escape_xml(creator)));
            }
            xml.push_str("        </rdf:Seq>\n      </dc:creator>\n");
        }
        if let Some(desc) = &m.description {
            push_alt(&mut xml, "dc:description", desc);
        }
        if let Some(lang) = &m.language {
            xml.push_str(&format!(
                "      <dc:language>\n        <rdf:Bag>\n          <rdf:li>{}</rdf:li>\n        </rdf:Bag>\n      </dc:language>\n",
                escape_xml(lang)
            ));
        }
        push_simple(&mut xml, "xmp:CreatorTool", m.creator_tool.as_deref());
        push_simple(&mut xml, "xmp:CreateDate", m.create_date.as_deref());
        push_simple(&mut xml, "xmp:ModifyDate", m.modify_date.as_deref());
        push_simple(&mut xml, "pdf:Producer", m.producer.as_deref());
        push_simple(&mut xml, "pdf:Keywords", m.keywords.as_deref());

        xml.push_str("    </rdf:Description>\n");
        xml.push_str("  </rdf:RDF>\n");
        xml.push_str("</x:xmpmeta>\n");
        xml.push_str("<?xpacket end=\"w\"?>");
        xml
    }
}

fn push_alt(xml: &mut String, tag: &str, value: &str) {
    xml.push_str(&format!(
        "      <{tag}>\n        <rdf:Alt>\n          <rdf:li xml:lang=\"x-default\">{}</rdf:li>\n        </rdf:Alt>\n      </{tag}>\n",
        escape_xml(value)
    ));
}

fn push_simple(xml: &mut String, tag: &str, value: Option<&str>) {
    if let Some(v) = value {
        xml.push_str(&format!("      <{tag}>{}</{tag}>\n", escape_xml(v)));
    }
}

/// Escape XML special characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Check that a caller-supplied packet is well-formed XML.
pub fn validate_xmp(data: &[u8]) -> Result<()> {
    let mut reader = Reader::from_reader(data);
    reader.check_end_names(true);
    let mut buf = Vec::new();
    let mut depth = 0usize;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Ok(_) => {},
            Err(e) => {
                return Err(Error::Configuration(format!(
                    "XMP metadata is not well-formed at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            },
        }
        buf.clear();
    }
    if depth != 0 {
        return Err(Error::Configuration("XMP metadata has unclosed elements".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_packet() {
        let meta = XmpMetadata {
            title: Some("Q&A".to_string()),
            creators: vec!["Jo".to_string()],
            producer: Some("pdf_quill".to_string()),
            create_date: Some("2000-01-01T00:00:00Z".to_string()),
            ..Default::default()
        };
        let bytes = XmpWriter::new(meta).build_bytes();
        let xml = String::from_utf8(bytes.clone()).unwrap();
        assert!(xml.contains("Q&amp;A"));
        assert!(xml.contains("<rdf:li>Jo</rdf:li>"));
        assert!(xml.contains("<xmp:CreateDate>2000-01-01T00:00:00Z</xmp:CreateDate>"));
        assert!(!xml.contains("pdf:Keywords"));
        assert!(validate_xmp(&bytes).is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed() {
        assert!(validate_xmp(b"<x:xmpmeta><rdf:RDF></x:xmpmeta>").is_err());
        assert!(validate_xmp(b"<a><b/>").is_err());
        assert!(validate_xmp(b"<a><b/></a>").is_ok());
    }
}
