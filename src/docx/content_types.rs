//! `[Content_Types].xml` handling

use super::xml::{attr, escape, parse_events};
use crate::error::Result;
use quick_xml::events::Event;
use std::fmt::Write as FmtWrite;

/// Part name of the content-type stream
pub const PART_NAME: &str = "[Content_Types].xml";

const NAMESPACE: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Default (by extension) and override (by part name) content types
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Parse the content-type stream.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut types = Self::default();
        for event in parse_events(bytes)? {
            let (Event::Start(e) | Event::Empty(e)) = &event else {
                continue;
            };
            match e.local_name().as_ref() {
                b"Default" => {
                    if let (Some(ext), Some(ct)) = (attr(e, b"Extension"), attr(e, b"ContentType"))
                    {
                        types.defaults.push((ext, ct));
                    }
                }
                b"Override" => {
                    if let (Some(part), Some(ct)) = (attr(e, b"PartName"), attr(e, b"ContentType"))
                    {
                        types.overrides.push((part, ct));
                    }
                }
                _ => {}
            }
        }
        Ok(types)
    }

    /// Content type registered for `part_name`.
    pub fn content_type_of(&self, part_name: &str) -> Option<&str> {
        let absolute = format!("/{}", part_name.trim_start_matches('/'));
        if let Some((_, ct)) = self
            .overrides
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&absolute))
        {
            return Some(ct);
        }

        let ext = absolute.rsplit_once('.')?.1;
        self.defaults
            .iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(ext))
            .map(|(_, ct)| ct.as_str())
    }

    /// Register a default for `extension` unless one exists. Returns whether anything changed.
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) -> bool {
        if self
            .defaults
            .iter()
            .any(|(e, _)| e.eq_ignore_ascii_case(extension))
        {
            return false;
        }
        self.defaults
            .push((extension.to_ascii_lowercase(), content_type.to_string()));
        true
    }

    /// Serialize back to XML.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.overrides.len() * 128);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str("\r\n");
        let _ = write!(xml, r#"<Types xmlns="{NAMESPACE}">"#);
        for (ext, ct) in &self.defaults {
            let _ = write!(
                xml,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape(ext),
                escape(ct)
            );
        }
        for (part, ct) in &self.overrides {
            let _ = write!(
                xml,
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape(part),
                escape(ct)
            );
        }
        xml.push_str("</Types>");
        xml
    }
}
