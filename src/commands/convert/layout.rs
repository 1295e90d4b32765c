use std::path::Path;
use std::process::Command;

use roxmltree::{Document, Node, ParsingOptions};
use serde::Serialize;

use crate::error::ExtractError;

/// A positioned run of text, as laid out on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    pub page: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub pages: Vec<PageSize>,
    pub fragments: Vec<Fragment>,
}

/// Runs `pdftotext -bbox-layout` over a PDF and returns the XHTML it prints.
pub fn convert_pdf_to_layout(pdf_path: &Path) -> Result<String, ExtractError> {
    let output = Command::new("pdftotext")
        .arg("-bbox-layout")
        .arg("-htmlmeta")
        .arg(pdf_path)
        .arg("-")
        .output()
        .map_err(|err| {
            ExtractError::conversion(pdf_path, format!("failed to execute pdftotext: {err}"))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractError::conversion(
            pdf_path,
            format!("pdftotext exited with {}: {}", output.status, stderr.trim()),
        ));
    }

    let xhtml = String::from_utf8_lossy(&output.stdout).replace('\u{0000}', "");
    if xhtml.trim().is_empty() {
        return Err(ExtractError::conversion(pdf_path, "pdftotext produced no output"));
    }

    Ok(xhtml)
}

/// Reads every `block` of every `page` in a bbox-layout document into a
/// fragment, sorted by page, then top edge, then left edge.
pub fn extract_fragments(xhtml: &str) -> Result<Layout, ExtractError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xhtml, options)
        .map_err(|err| ExtractError::malformed(format!("layout is not well-formed XML: {err}")))?;

    let mut layout = Layout::default();

    let pages = doc
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == "page");

    for (page_index, page) in pages.enumerate() {
        layout.pages.push(PageSize {
            width: numeric_attribute(page, "width", "page", page_index)?,
            height: numeric_attribute(page, "height", "page", page_index)?,
        });

        let blocks = page
            .descendants()
            .filter(|node| node.is_element() && node.tag_name().name() == "block");

        for block in blocks {
            let fragment = Fragment {
                page: page_index,
                x_min: numeric_attribute(block, "xMin", "block", page_index)?,
                x_max: numeric_attribute(block, "xMax", "block", page_index)?,
                y_min: numeric_attribute(block, "yMin", "block", page_index)?,
                y_max: numeric_attribute(block, "yMax", "block", page_index)?,
                text: block_text(block),
            };

            if fragment.x_min > fragment.x_max || fragment.y_min > fragment.y_max {
                return Err(ExtractError::malformed(format!(
                    "block on page {} has an inverted bounding box: '{}'",
                    page_index + 1,
                    fragment.text
                )));
            }

            layout.fragments.push(fragment);
        }
    }

    sort_fragments(&mut layout.fragments);
    Ok(layout)
}

pub fn sort_fragments(fragments: &mut [Fragment]) {
    fragments.sort_by(|a, b| {
        a.page
            .cmp(&b.page)
            .then(a.y_min.total_cmp(&b.y_min))
            .then(a.x_min.total_cmp(&b.x_min))
    });
}

fn block_text(block: Node<'_, '_>) -> String {
    block
        .descendants()
        .filter(|node| node.is_text())
        .filter_map(|node| node.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<&str>>()
        .join(" ")
}

fn numeric_attribute(
    node: Node<'_, '_>,
    name: &str,
    element: &str,
    page_index: usize,
) -> Result<f64, ExtractError> {
    let raw = node.attribute(name).ok_or_else(|| {
        ExtractError::malformed(format!(
            "{element} on page {} is missing '{name}'",
            page_index + 1
        ))
    })?;

    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ExtractError::malformed(format!(
            "{element} on page {} has non-numeric '{name}': {raw}",
            page_index + 1
        ))),
    }
}
