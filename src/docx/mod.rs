//! WordprocessingML document access
//!
//! A [`Document`] is an opened DOCX package whose main part is held as a
//! quick-xml event stream. Reading goes through [`Document::inline_shapes`];
//! the only edits supported are swapping a drawing out of its run and
//! embedding a new picture in its place.

mod content_types;
mod package;
mod picture;
mod relationships;
mod shape;
mod xml;

pub use content_types::ContentTypes;
pub use package::{Package, Part};
pub use relationships::{Relationship, Relationships};
pub use shape::{EMU_PER_INCH, EMU_PER_POINT, Emu, Extent, InlineShape, InlineShapes, ShapePosition};

use crate::error::{Error, Result};
use picture::PictureSpec;
use quick_xml::events::Event;
use std::path::Path;

const DEFAULT_MAIN_PART: &str = "word/document.xml";

/// An opened word-processing document
#[derive(Debug, Clone)]
pub struct Document {
    package: Package,
    main_part: String,
    events: Vec<Event<'static>>,
    relationships: Relationships,
    content_types: ContentTypes,
    /// Pictures embedded during this session, keyed by their bytes
    embedded: Vec<(Vec<u8>, String)>,
    /// Highest `wp:docPr` id used by the headers and footers
    related_doc_pr_max: u32,
    dirty: bool,
}

/// Result of embedding a picture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedPicture {
    /// Relationship id referenced by `a:blip/@r:embed`
    pub r_id: String,
    /// Part name holding the image bytes
    pub part_name: String,
    /// `wp:docPr/@id` of the inserted drawing
    pub doc_pr_id: u32,
}

impl Document {
    /// Open a document from disk. The file is only read.
    pub fn open(path: &Path) -> Result<Self> {
        let document = Self::from_package(Package::open(path)?)?;
        tracing::info!(path = %path.display(), part = %document.main_part, "Opened document");
        Ok(document)
    }

    /// Open a document from the bytes of a DOCX file.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    /// Wrap an already loaded package.
    pub fn from_package(package: Package) -> Result<Self> {
        let content_types = match package.part(content_types::PART_NAME) {
            Some(bytes) => ContentTypes::parse(bytes)?,
            None => {
                return Err(Error::InvalidDocument(format!(
                    "Package has no {}",
                    content_types::PART_NAME
                )));
            }
        };

        let main_part = Self::locate_main_part(&package)?;
        let main_bytes = package.part(&main_part).ok_or_else(|| {
            Error::InvalidDocument(format!("Main document part '{main_part}' is missing"))
        })?;
        let events = xml::parse_events(main_bytes)
            .map_err(|e| Error::InvalidDocument(format!("{main_part}: {e}")))?;

        let relationships = match package.part(&rels_part_for(&main_part)) {
            Some(bytes) => Relationships::parse(bytes)?,
            None => Relationships::default(),
        };

        let related_doc_pr_max = related_doc_pr_max(&package, &main_part, &relationships);

        Ok(Self {
            package,
            main_part,
            events,
            relationships,
            content_types,
            embedded: Vec::new(),
            related_doc_pr_max,
            dirty: false,
        })
    }

    fn locate_main_part(package: &Package) -> Result<String> {
        if let Some(bytes) = package.part("_rels/.rels") {
            let root = Relationships::parse(bytes)?;
            if let Some(rel) = root.first_of_type(relationships::OFFICE_DOCUMENT) {
                return Ok(rel.target.trim_start_matches('/').to_string());
            }
        }
        if package.contains(DEFAULT_MAIN_PART) {
            return Ok(DEFAULT_MAIN_PART.to_string());
        }
        Err(Error::InvalidDocument(
            "No officeDocument relationship and no word/document.xml".to_string(),
        ))
    }

    /// Name of the main document part (usually `word/document.xml`).
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Underlying package. Parts reflect the state of the last save while edits are pending.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Relationships of the main document part.
    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    /// Whether the in-memory document differs from what was loaded.
    pub fn is_modified(&self) -> bool {
        self.dirty
    }

    /// Walk all inline shapes in document order. Every call starts over.
    pub fn inline_shapes(&self) -> InlineShapes<'_> {
        InlineShapes::new(&self.events)
    }

    /// Bytes of the picture an inline shape displays.
    pub fn image_bytes(&self, shape: &InlineShape) -> Option<&[u8]> {
        let rel = self.relationships.get(shape.embed.as_deref()?)?;
        if rel.target_mode.as_deref() == Some("External") {
            return None;
        }
        self.package
            .part(&resolve_target(part_dir(&self.main_part), &rel.target))
    }

    /// Detach the shape's `w:drawing` from its run, returning where it stood.
    ///
    /// The run itself and its properties stay in place. Fails with
    /// [`Error::Structural`] when the drawing has no parent run or the shape's
    /// recorded span no longer matches the event stream.
    pub fn remove_drawing(&mut self, shape: &InlineShape) -> Result<usize> {
        let span = shape.drawing;
        let run = shape.owner_run.ok_or_else(|| {
            Error::Structural(format!(
                "drawing at event {} is not owned by a w:r run",
                span.start
            ))
        })?;

        if run >= span.start
            || span.start > span.end
            || !event_is(&self.events, run, b"w:r", false)
            || !event_is(&self.events, span.start, b"w:drawing", false)
            || !event_is(&self.events, span.end, b"w:drawing", true)
            || !is_balanced(&self.events[span.start..=span.end])
        {
            return Err(Error::Structural(format!(
                "shape span {}..={} is stale or does not describe a drawing inside a run",
                span.start, span.end
            )));
        }

        self.events.drain(span.start..=span.end);
        self.dirty = true;
        tracing::debug!(at = span.start, run, "Removed drawing from run");
        Ok(span.start)
    }

    /// Embed the image at `image_path` as a new inline picture inserted at event `at`.
    ///
    /// The image bytes are read immediately; identical bytes embedded earlier
    /// in this session reuse the same media part and relationship.
    pub fn insert_picture(
        &mut self,
        at: usize,
        image_path: &Path,
        extent: Extent,
        description: &str,
    ) -> Result<EmbeddedPicture> {
        if at > self.events.len() {
            return Err(Error::Structural(format!(
                "insertion point {at} is past the end of {}",
                self.main_part
            )));
        }

        let bytes = std::fs::read(image_path)?;
        let (r_id, part_name) = self.embed_image(bytes)?;
        let doc_pr_id = self.next_doc_pr_id();

        let name = format!("QR Code {doc_pr_id}");
        let fragment = PictureSpec {
            doc_pr_id,
            name: &name,
            description,
            r_id: &r_id,
            extent,
        }
        .to_xml();
        let new_events = xml::parse_events(fragment.as_bytes())?;
        self.events.splice(at..at, new_events);
        self.dirty = true;

        tracing::debug!(%r_id, %part_name, doc_pr_id, %extent, "Inserted picture");
        Ok(EmbeddedPicture {
            r_id,
            part_name,
            doc_pr_id,
        })
    }

    fn embed_image(&mut self, bytes: Vec<u8>) -> Result<(String, String)> {
        if let Some((_, r_id)) = self.embedded.iter().find(|(data, _)| *data == bytes) {
            let part = self
                .relationships
                .get(r_id)
                .map(|rel| resolve_target(part_dir(&self.main_part), &rel.target))
                .unwrap_or_default();
            return Ok((r_id.clone(), part));
        }

        let format = image::guess_format(&bytes)?;
        let extension = format.extensions_str().first().copied().unwrap_or("png");
        let mime = format.to_mime_type();

        let dir = part_dir(&self.main_part);
        let (part_name, target) = (1..)
            .map(|n| {
                let target = format!("media/qrsplice{n}.{extension}");
                (resolve_target(dir, &target), target)
            })
            .find(|(part, _)| !self.package.contains(part))
            .ok_or_else(|| Error::Other("media part names exhausted".to_string()))?;

        if self.content_types.ensure_default(extension, mime) {
            tracing::debug!(extension, mime, "Registered image content type");
        }
        let r_id = self.relationships.add(relationships::IMAGE, &target);
        self.package.set_part(&part_name, bytes.clone());
        self.embedded.push((bytes, r_id.clone()));
        Ok((r_id, part_name))
    }

    /// Drawing ids are shared by the body, headers and footers.
    fn next_doc_pr_id(&self) -> u32 {
        max_doc_pr_id(&self.events).max(self.related_doc_pr_max) + 1
    }

    fn sync_parts(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let main = xml::write_events(&self.events)?;
        self.package.set_part(&self.main_part.clone(), main);
        self.package.set_part(
            &rels_part_for(&self.main_part),
            self.relationships.to_xml().into_bytes(),
        );
        self.package.set_part(
            content_types::PART_NAME,
            self.content_types.to_xml().into_bytes(),
        );
        self.dirty = false;
        Ok(())
    }

    /// Serialize the document to DOCX bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.sync_parts()?;
        self.package.to_bytes()
    }

    /// Persist the document to `path`. Parts that were never edited are written back verbatim.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.sync_parts()?;
        self.package.save(path)?;
        tracing::info!(path = %path.display(), "Saved document");
        Ok(())
    }
}

fn max_doc_pr_id(events: &[Event<'static>]) -> u32 {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"docPr" => {
                xml::attr(e, b"id")?.parse::<u32>().ok()
            }
            _ => None,
        })
        .max()
        .unwrap_or(0)
}

/// Highest drawing id in the header and footer parts of `main_part`.
///
/// Parts that are missing or unreadable are skipped; they hold no ids to collide with.
fn related_doc_pr_max(package: &Package, main_part: &str, relationships: &Relationships) -> u32 {
    let dir = part_dir(main_part);
    [relationships::HEADER, relationships::FOOTER]
        .into_iter()
        .flat_map(|rel_type| relationships.of_type(rel_type))
        .filter(|rel| rel.target_mode.as_deref() != Some("External"))
        .filter_map(|rel| {
            let name = resolve_target(dir, &rel.target);
            let bytes = package.part(&name)?;
            match xml::parse_events(bytes) {
                Ok(events) => Some(max_doc_pr_id(&events)),
                Err(e) => {
                    tracing::warn!(part = %name, error = %e, "Skipping unreadable part");
                    None
                }
            }
        })
        .max()
        .unwrap_or(0)
}

fn event_is(events: &[Event<'static>], index: usize, name: &[u8], end: bool) -> bool {
    events.get(index).is_some_and(|event| {
        matches!(event, Event::End(_)) == end && xml::qualified_name(event) == Some(name)
    })
}

/// Whether `events` form exactly one well-nested element.
fn is_balanced(events: &[Event<'static>]) -> bool {
    let mut depth = 0usize;
    for (i, event) in events.iter().enumerate() {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth = match depth.checked_sub(1) {
                    Some(depth) => depth,
                    None => return false,
                };
                if depth == 0 && i + 1 != events.len() {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// `word/_rels/document.xml.rels` for `word/document.xml`
fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Directory of a part name, without trailing slash
fn part_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve a relationship target against the source part's directory.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Minimal DOCX packages for unit tests

    use super::Package;

    pub(crate) const PLACEHOLDER_PNG: &[u8] = &[
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0,
    ];

    pub(crate) fn inline(descr: Option<&str>, id: u32, cx: i64, cy: i64) -> String {
        let descr = descr.map(|d| format!(r#" descr="{d}""#)).unwrap_or_default();
        format!(
            concat!(
                r#"<w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{id}" name="Picture {id}"{descr}/>"#,
                r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic><pic:blipFill><a:blip r:embed="rId1"/></pic:blipFill></pic:pic>"#,
                r#"</a:graphicData></a:graphic></wp:inline></w:drawing>"#,
            ),
            cx = cx,
            cy = cy,
            id = id,
            descr = descr,
        )
    }

    pub(crate) fn docx(body: &str) -> Vec<u8> {
        let mut package = Package::default();
        package.set_part(
            "[Content_Types].xml",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
                r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
                r#"<Default Extension="xml" ContentType="application/xml"/>"#,
                r#"<Default Extension="png" ContentType="image/png"/>"#,
                r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
                r#"</Types>"#,
            )
            .as_bytes()
            .to_vec(),
        );
        package.set_part(
            "_rels/.rels",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
                r#"</Relationships>"#,
            )
            .as_bytes()
            .to_vec(),
        );
        package.set_part(
            "word/document.xml",
            format!(
                concat!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                    r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
                    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
                    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
                    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture" "#,
                    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
                    r#"<w:body>{}<w:sectPr/></w:body></w:document>"#,
                ),
                body
            )
            .into_bytes(),
        );
        package.set_part(
            "word/_rels/document.xml.rels",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>"#,
                r#"</Relationships>"#,
            )
            .as_bytes()
            .to_vec(),
        );
        package.set_part("word/media/image1.png", PLACEHOLDER_PNG.to_vec());
        package.to_bytes().expect("serialize fixture")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{PLACEHOLDER_PNG, docx, inline};
    use super::*;

    fn single_placeholder() -> Document {
        let body = format!(
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Text us:</w:t>{}</w:r></w:p>"#,
            inline(Some("QRCODE_PLACEHOLDER"), 7, 1_828_800, 1_828_800)
        );
        Document::from_bytes(docx(&body)).unwrap()
    }

    fn png_file(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("qr.png");
        crate::qr::QrEncoder::new().produce("hello", &path).unwrap();
        path
    }

    #[test]
    fn resolves_targets() {
        assert_eq!(resolve_target("word", "media/a.png"), "word/media/a.png");
        assert_eq!(resolve_target("word", "../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(resolve_target("word", "/word/media/b.png"), "word/media/b.png");
        assert_eq!(rels_part_for("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(part_dir("document.xml"), "");
    }

    #[test]
    fn opens_and_reads_placeholder_image() {
        let document = single_placeholder();
        assert_eq!(document.main_part(), "word/document.xml");
        assert!(!document.is_modified());

        let shape = document.inline_shapes().next().unwrap();
        assert_eq!(document.image_bytes(&shape), Some(PLACEHOLDER_PNG));
    }

    #[test]
    fn rejects_package_without_content_types() {
        let mut package = Package::default();
        package.set_part("word/document.xml", b"<w:document/>".to_vec());
        let err = Document::from_package(package).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }

    #[test]
    fn unmodified_save_keeps_parts_verbatim() {
        let original = docx("<w:p><w:r><w:t>plain</w:t></w:r></w:p>");
        let mut document = Document::from_bytes(original.clone()).unwrap();
        let saved = Package::from_bytes(document.to_bytes().unwrap()).unwrap();
        let before = Package::from_bytes(original).unwrap();

        for part in before.parts() {
            assert_eq!(saved.part(part.name()), Some(part.data()), "{}", part.name());
        }
    }

    #[test]
    fn remove_then_insert_keeps_run_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let image = png_file(dir.path());

        let mut document = single_placeholder();
        let shape = document.inline_shapes().next().unwrap();
        let extent = shape.extent.unwrap();

        let at = document.remove_drawing(&shape).unwrap();
        assert_eq!(document.inline_shapes().count(), 0);

        let embedded = document.insert_picture(at, &image, extent, "").unwrap();
        assert_eq!(embedded.r_id, "rId2");
        assert_eq!(embedded.part_name, "word/media/qrsplice1.png");
        assert_eq!(embedded.doc_pr_id, 1);

        let bytes = document.to_bytes().unwrap();
        let reopened = Document::from_bytes(bytes).unwrap();
        let shapes: Vec<_> = reopened.inline_shapes().collect();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].extent, Some(extent));
        assert_eq!(shapes[0].position, shape.position);
        assert_eq!(shapes[0].description.as_deref(), Some(""));
        assert_eq!(
            reopened.image_bytes(&shapes[0]),
            Some(std::fs::read(&image).unwrap().as_slice())
        );

        let main = String::from_utf8(reopened.package().part("word/document.xml").unwrap().to_vec())
            .unwrap();
        assert!(main.contains("<w:rPr><w:b/></w:rPr><w:t>Text us:</w:t><w:drawing>"));
    }

    #[test]
    fn identical_images_share_one_part() {
        let dir = tempfile::tempdir().unwrap();
        let image = png_file(dir.path());
        let extent = Extent {
            width: Emu(100),
            height: Emu(100),
        };

        let mut document = Document::from_bytes(docx("<w:p><w:r/></w:p>")).unwrap();
        let first = document.insert_picture(0, &image, extent, "").unwrap();
        let second = document.insert_picture(0, &image, extent, "").unwrap();

        assert_eq!(first.r_id, second.r_id);
        assert_eq!(first.part_name, second.part_name);
        assert_ne!(first.doc_pr_id, second.doc_pr_id);
    }

    #[test]
    fn drawing_outside_run_is_structural_error() {
        let body = format!(
            "<w:p>{}</w:p>",
            inline(Some("QRCODE_PLACEHOLDER"), 1, 10, 10)
        );
        let mut document = Document::from_bytes(docx(&body)).unwrap();
        let shape = document.inline_shapes().next().unwrap();

        assert!(matches!(
            document.remove_drawing(&shape),
            Err(Error::Structural(_))
        ));
    }

    #[test]
    fn unbalanced_span_is_rejected() {
        let body = format!(
            concat!(
                r#"<w:p><w:r><w:drawing><wp:inline><wp:extent cx="3000000" cy="3000000"/>"#,
                r#"<wp:docPr id="1" name="Text Box 1" descr="Box"/><a:graphic><a:graphicData>"#,
                r#"<w:txbxContent><w:p><w:r>{}</w:r></w:p></w:txbxContent>"#,
                r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
            ),
            inline(Some("QRCODE_PLACEHOLDER"), 2, 914_400, 914_400)
        );
        let mut document = Document::from_bytes(docx(&body)).unwrap();
        let shapes: Vec<_> = document.inline_shapes().collect();
        assert_eq!(shapes.len(), 2);

        // outer start paired with the inner end
        let mut torn = shapes[1].clone();
        torn.drawing.end = shapes[0].drawing.end;
        assert!(matches!(
            document.remove_drawing(&torn),
            Err(Error::Structural(_))
        ));
        assert!(!document.is_modified());

        document.remove_drawing(&shapes[0]).unwrap();
        let remaining: Vec<_> = document.inline_shapes().collect();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].has_description("Box"));
    }

    #[test]
    fn new_ids_avoid_header_drawings() {
        let dir = tempfile::tempdir().unwrap();
        let image = png_file(dir.path());

        let mut package = Package::from_bytes(docx("<w:p><w:r/></w:p>")).unwrap();
        package.set_part(
            "word/_rels/document.xml.rels",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>"#,
                r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/>"#,
                r#"</Relationships>"#,
            )
            .as_bytes()
            .to_vec(),
        );
        package.set_part(
            "word/header1.xml",
            format!(
                r#"<w:hdr xmlns:w="w" xmlns:wp="wp" xmlns:a="a" xmlns:pic="pic" xmlns:r="r"><w:p><w:r>{}</w:r></w:p></w:hdr>"#,
                inline(Some("logo"), 41, 10, 10)
            )
            .into_bytes(),
        );

        let mut document = Document::from_package(package).unwrap();
        let extent = Extent {
            width: Emu(100),
            height: Emu(100),
        };
        let embedded = document.insert_picture(0, &image, extent, "").unwrap();
        assert_eq!(embedded.doc_pr_id, 42);
        assert_eq!(embedded.r_id, "rId3");
    }

    #[test]
    fn stale_shape_is_rejected() {
        let mut document = single_placeholder();
        let shape = document.inline_shapes().next().unwrap();
        document.remove_drawing(&shape).unwrap();

        assert!(matches!(
            document.remove_drawing(&shape),
            Err(Error::Structural(_))
        ));
    }
}
