use std::io::Cursor;
use quick_xml::events::{BytesEnd, BytesStart, BytesDecl, Event};
use quick_xml::reader::Reader;
use quick_xml::Writer;
use crate::models::{ImportError, TypeDescriptor, TypesManifest};

/// Tag of the root element and of every type entry in `types.xml`
pub const OBJECT_TAG: &str = "object";

/// Root attributes written on exported manifests
pub const TYPES_TOOL_NAME: &str = "portal_types";
pub const TYPES_TOOL_META_TYPE: &str = "Plone Types Tool";

impl TypesManifest {
    /// Parse a `types.xml` document
    ///
    /// Fails with [`ImportError::DocumentFormat`] unless the document is
    /// well-formed XML with a single `object` root in no namespace. Only
    /// immediate `object` children of the root are collected; children
    /// that declare a default namespace are not `object` entries.
    pub fn parse(source: &[u8]) -> Result<Self, ImportError> {
        let mut reader = Reader::from_reader(source);
        let mut buf = Vec::with_capacity(1024);
        let mut manifest = TypesManifest::default();
        let mut depth = 0usize;
        let mut root_seen = false;

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                ImportError::DocumentFormat(format!(
                    "{} (at byte {})",
                    e,
                    reader.buffer_position()
                ))
            })?;

            match event {
                Event::Start(ref e) => {
                    manifest.visit_element(e, depth, &mut root_seen)?;
                    depth += 1;
                }
                Event::Empty(ref e) => {
                    manifest.visit_element(e, depth, &mut root_seen)?;
                }
                Event::End(_) => {
                    depth = depth.checked_sub(1).ok_or_else(|| {
                        ImportError::DocumentFormat("unmatched closing tag".to_string())
                    })?;
                }
                Event::Text(ref e) => {
                    if depth == 0 && !e.iter().all(u8::is_ascii_whitespace) {
                        return Err(ImportError::DocumentFormat(
                            "text outside the root element".to_string(),
                        ));
                    }
                }
                Event::CData(_) if depth == 0 => {
                    return Err(ImportError::DocumentFormat(
                        "CDATA outside the root element".to_string(),
                    ));
                }
                Event::Eof => break,
                _ => {}
            }

            buf.clear();
        }

        if !root_seen {
            return Err(ImportError::DocumentFormat("document has no root element".to_string()));
        }
        if depth != 0 {
            return Err(ImportError::DocumentFormat("document ends inside an element".to_string()));
        }

        Ok(manifest)
    }

    fn visit_element(
        &mut self,
        element: &BytesStart<'_>,
        depth: usize,
        root_seen: &mut bool,
    ) -> Result<(), ImportError> {
        let tag = element.name();
        match depth {
            0 => {
                if *root_seen {
                    return Err(ImportError::DocumentFormat(
                        "more than one root element".to_string(),
                    ));
                }
                *root_seen = true;
                if tag.as_ref() != OBJECT_TAG.as_bytes() {
                    return Err(ImportError::DocumentFormat(format!(
                        "root element is <{}>, expected <{}>",
                        String::from_utf8_lossy(tag.as_ref()),
                        OBJECT_TAG
                    )));
                }
                if let Some(ns) = default_namespace(element)? {
                    return Err(ImportError::DocumentFormat(format!(
                        "root element is in namespace {}, expected none",
                        ns
                    )));
                }
                let (name, meta_type) = read_attributes(element)?;
                self.name = name;
                self.meta_type = meta_type;
            }
            1 if tag.as_ref() == OBJECT_TAG.as_bytes() => {
                if default_namespace(element)?.is_some() {
                    return Ok(());
                }
                let (name, meta_type) = read_attributes(element)?;
                let name = name.ok_or_else(|| {
                    ImportError::DocumentFormat(format!(
                        "type entry #{} has no name attribute",
                        self.types.len() + 1
                    ))
                })?;
                self.types.push(TypeDescriptor {
                    name,
                    meta_type: meta_type.unwrap_or_default(),
                });
            }
            _ => {}
        }
        Ok(())
    }

    /// Serialize as a `types.xml` document
    pub fn to_xml(&self) -> Result<Vec<u8>, ImportError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 1);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(write_err)?;

        let mut root = BytesStart::new(OBJECT_TAG);
        if let Some(ref name) = self.name {
            root.push_attribute(("name", name.as_str()));
        }
        if let Some(ref meta_type) = self.meta_type {
            root.push_attribute(("meta_type", meta_type.as_str()));
        }
        writer.write_event(Event::Start(root)).map_err(write_err)?;

        for descriptor in &self.types {
            let mut child = BytesStart::new(OBJECT_TAG);
            child.push_attribute(("name", descriptor.name.as_str()));
            child.push_attribute(("meta_type", descriptor.meta_type.as_str()));
            writer.write_event(Event::Empty(child)).map_err(write_err)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(OBJECT_TAG)))
            .map_err(write_err)?;

        Ok(writer.into_inner().into_inner())
    }
}

fn write_err(e: impl std::fmt::Display) -> ImportError {
    ImportError::Archive(format!("Failed to write types.xml: {}", e))
}

/// Non-empty `xmlns` declared on an element
fn default_namespace(element: &BytesStart<'_>) -> Result<Option<String>, ImportError> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| ImportError::DocumentFormat(format!("bad attribute: {}", e)))?;
        if attr.key.as_ref() == b"xmlns" {
            let value = attr
                .unescape_value()
                .map_err(|e| ImportError::DocumentFormat(format!("bad attribute value: {}", e)))?;
            return Ok(Some(value.into_owned()).filter(|ns| !ns.is_empty()));
        }
    }
    Ok(None)
}

/// Extract the `name` and `meta_type` attributes of an element
fn read_attributes(
    element: &BytesStart<'_>,
) -> Result<(Option<String>, Option<String>), ImportError> {
    let mut name = None;
    let mut meta_type = None;

    for attr in element.attributes() {
        let attr = attr.map_err(|e| ImportError::DocumentFormat(format!("bad attribute: {}", e)))?;
        let target = match attr.key.as_ref() {
            b"name" => &mut name,
            b"meta_type" => &mut meta_type,
            _ => continue,
        };
        let value = attr
            .unescape_value()
            .map_err(|e| ImportError::DocumentFormat(format!("bad attribute value: {}", e)))?;
        *target = Some(value.into_owned());
    }

    Ok((name, meta_type))
}
