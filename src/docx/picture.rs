//! Markup for a freshly embedded inline picture

use super::shape::Extent;
use super::xml::escape;
use std::fmt::Write as FmtWrite;

const NSDECLS: &str = concat!(
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#,
);

/// Everything needed to describe one embedded picture
#[derive(Debug, Clone)]
pub(crate) struct PictureSpec<'a> {
    pub doc_pr_id: u32,
    pub name: &'a str,
    pub description: &'a str,
    pub r_id: &'a str,
    pub extent: Extent,
}

impl PictureSpec<'_> {
    /// `w:drawing` element holding a `wp:inline` picture sized to `extent`.
    ///
    /// Namespaces are declared on `wp:inline` so the fragment stays valid no
    /// matter which prefixes the host document root declares.
    pub(crate) fn to_xml(&self) -> String {
        let cx = self.extent.width.0;
        let cy = self.extent.height.0;
        let name = escape(self.name);
        let descr = escape(self.description);
        let r_id = escape(self.r_id);

        let mut xml = String::with_capacity(1024);
        let _ = write!(
            xml,
            concat!(
                r#"<w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0" {nsdecls}>"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
                r#"<wp:effectExtent l="0" t="0" r="0" b="0"/>"#,
                r#"<wp:docPr id="{id}" name="{name}" descr="{descr}"/>"#,
                r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
                r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="0" name="{name}" descr="{descr}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{r_id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
                r#"</a:graphicData></a:graphic></wp:inline></w:drawing>"#,
            ),
            nsdecls = NSDECLS,
            cx = cx,
            cy = cy,
            id = self.doc_pr_id,
            name = name,
            descr = descr,
            r_id = r_id,
        );
        xml
    }
}
