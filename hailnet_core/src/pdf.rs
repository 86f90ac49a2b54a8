//! # PDF Export
//!
//! Renders a [`Quotation`] to PDF with Typst.
//!
//! ## Architecture
//!
//! - The Typst template is an embedded string constant
//! - Quotation fields are escaped and substituted into `{placeholder}` slots
//! - Only the fonts bundled by `typst-assets` are used, loaded once per process
//! - Output is raw PDF bytes (`Vec<u8>`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use hailnet_core::parameters::{AdvancedParameters, Estimator};
//! use hailnet_core::pdf::export_quotation;
//! use hailnet_core::quotation::Quotation;
//!
//! let estimator = Estimator::new(AdvancedParameters::default());
//! let quote = Quotation::advanced(estimator.params(), estimator.result(), Utc::now());
//! let path = export_quotation(&quote, std::path::Path::new("quotes"))?;
//! println!("wrote {}", path.display());
//! # Ok::<(), hailnet_core::errors::CalcError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use tracing::info;
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::errors::{CalcError, CalcResult};
use crate::quotation::{CostRow, Quotation, Row};

// ============================================================================
// Typst World Implementation
// ============================================================================

/// Fonts shipped with typst-assets, parsed once
static FONTS: Lazy<Vec<Font>> = Lazy::new(|| {
    typst_assets::fonts()
        .flat_map(|font_bytes| Font::iter(Bytes::new(font_bytes.to_vec())))
        .collect()
});

/// A minimal Typst world compiling one in-memory document.
struct PdfWorld {
    main: Source,
    book: LazyHash<FontBook>,
    library: LazyHash<Library>,
}

impl PdfWorld {
    fn new(source: String) -> Self {
        PdfWorld {
            main: Source::detached(source),
            book: LazyHash::new(FontBook::from_fonts(FONTS.iter())),
            library: LazyHash::new(Library::default()),
        }
    }
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        FONTS.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(now.year(), now.month().try_into().ok()?, now.day().try_into().ok()?)
    }
}

// ============================================================================
// Template
// ============================================================================

const QUOTATION_TEMPLATE: &str = r##"
#set page(paper: "a4", margin: (x: 1.6cm, y: 1.4cm))
#set text(font: "Libertinus Serif", size: 10pt)

#block(width: 100%, fill: rgb("#dc3545"), inset: 8pt)[
  #align(center)[#text(fill: white, weight: "bold", size: 11pt)[{banner}]]
]

#v(10pt)
#grid(
  columns: (1fr, auto),
  text(size: 20pt, weight: "bold", fill: rgb("#1976d2"))[{title}],
  text(size: 14pt, fill: rgb("#dc3545"))[{tag}],
)
#text(style: "italic", fill: gray)[{subtitle}]

#block(width: 100%, fill: rgb("#f0f8ff"), inset: 8pt)[
  #text(weight: "bold", fill: rgb("#1976d2"))[Customer: {customer}]
]
{header_lines}

== Project Overview
#table(
  columns: (auto, 1fr),
  inset: 6pt,
  stroke: 0.5pt + gray,
  fill: (_, y) => if y == 0 { rgb("#1976d2") },
  table.header([#text(fill: white)[*Project Parameter*]], [#text(fill: white)[*Value*]]),
{parameter_rows}
)

== Material List
#table(
  columns: (1fr, auto, auto, auto, auto),
  inset: 6pt,
  stroke: 0.5pt + gray,
  align: (left, right, right, right, right),
  table.header([*Net Type*], [*Quantity*], [*Unit Price*], [*Coverage Area*], [*Subtotal*]),
{net_row}
)

=== Accessories
#table(
  columns: (1fr, auto, auto, auto),
  inset: 6pt,
  stroke: 0.5pt + gray,
  align: (left, right, right, right),
  table.header([*Accessory Item*], [*Quantity*], [*Unit Price*], [*Subtotal*]),
{accessory_rows}
)

== Cost Summary
#table(
  columns: (1fr, auto),
  inset: 6pt,
  stroke: 0.5pt + gray,
  align: (left, right),
  table.header([*Cost Item*], [*Amount*]),
{cost_rows}
)
{per_hectare}
#v(1fr)
#block(width: 100%, fill: rgb("#ffc107"), inset: 6pt)[
  #align(center)[#text(weight: "bold", size: 9pt)[{warning}]]
]
#text(size: 8pt, fill: gray)[
{footer}
]
"##;

/// Escape text for Typst markup mode
fn escape_typst(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '*' => "\\*".to_string(),
            '_' => "\\_".to_string(),
            '#' => "\\#".to_string(),
            '$' => "\\$".to_string(),
            '@' => "\\@".to_string(),
            '<' => "\\<".to_string(),
            '>' => "\\>".to_string(),
            '[' => "\\[".to_string(),
            ']' => "\\]".to_string(),
            '~' => "\\~".to_string(),
            '{' => "\\{".to_string(),
            '}' => "\\}".to_string(),
            '/' => "\\/".to_string(),
            '\\' => "\\\\".to_string(),
            '`' => "\\`".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

fn cells(values: &[&str]) -> String {
    let cells: Vec<String> = values.iter().map(|v| format!("[{}]", escape_typst(v))).collect();
    format!("  {},", cells.join(", "))
}

fn label_value_rows(rows: &[Row]) -> String {
    rows.iter()
        .map(|row| cells(&[row.label.as_str(), row.value.as_str()]))
        .collect::<Vec<_>>()
        .join("\n")
}

fn cost_rows(rows: &[CostRow]) -> String {
    rows.iter()
        .map(|row| {
            if row.highlight {
                format!(
                    "  table.cell(fill: rgb(\"#1976d2\"))[#text(fill: white, weight: \"bold\", size: 12pt)[{}]], table.cell(fill: rgb(\"#1976d2\"))[#text(fill: white, weight: \"bold\", size: 12pt)[{}]],",
                    escape_typst(&row.label),
                    escape_typst(&row.amount)
                )
            } else {
                cells(&[row.label.as_str(), row.amount.as_str()])
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn per_hectare_section(rows: &[Row]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    format!(
        "\n== Per Hectare Analysis\n#table(\n  columns: (1fr, auto),\n  inset: 6pt,\n  stroke: 0.5pt + gray,\n  align: (left, right),\n  table.header([*Cost Analysis*], [*Amount per Hectare*]),\n{}\n)\n",
        label_value_rows(rows)
    )
}

/// Typst source for a quotation
fn quotation_source(quote: &Quotation) -> String {
    let header_lines = quote
        .header_lines
        .iter()
        .map(|line| format!("{} \\", escape_typst(line)))
        .collect::<Vec<_>>()
        .join("\n");

    let net = &quote.net_line;
    let net_row = cells(&[
        net.name.as_str(),
        net.quantity.as_str(),
        net.unit_price.as_str(),
        net.coverage.as_str(),
        net.subtotal.as_str(),
    ]);

    let accessory_rows = quote
        .accessories
        .iter()
        .map(|row| cells(&[row.name.as_str(), row.quantity.as_str(), row.unit_price.as_str(), row.subtotal.as_str()]))
        .collect::<Vec<_>>()
        .join("\n");

    let footer = quote
        .footer
        .iter()
        .map(|line| format!("  {} \\", escape_typst(line)))
        .collect::<Vec<_>>()
        .join("\n");

    QUOTATION_TEMPLATE
        .replace("{banner}", &escape_typst(quote.banner))
        .replace("{title}", &escape_typst(quote.title))
        .replace("{tag}", &escape_typst(quote.tag))
        .replace("{subtitle}", &escape_typst(quote.subtitle))
        .replace("{customer}", &escape_typst(&quote.customer))
        .replace("{header_lines}", &header_lines)
        .replace("{parameter_rows}", &label_value_rows(&quote.parameters))
        .replace("{net_row}", &net_row)
        .replace("{accessory_rows}", &accessory_rows)
        .replace("{cost_rows}", &cost_rows(&quote.costs))
        .replace("{per_hectare}", &per_hectare_section(&quote.per_hectare))
        .replace("{warning}", &escape_typst(quote.warning))
        .replace("{footer}", &footer)
}

// ============================================================================
// Rendering
// ============================================================================

/// Render a quotation to PDF bytes.
pub fn render_quotation_pdf(quote: &Quotation) -> CalcResult<Vec<u8>> {
    let world = PdfWorld::new(quotation_source(quote));

    let warned = typst::compile(&world);
    let document = warned.output.map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CalcError::export_failed(format!("Typst compilation failed: {}", error_msgs.join("; ")))
    })?;

    typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CalcError::export_failed(format!("PDF rendering failed: {}", error_msgs.join("; ")))
    })
}

/// Render `quote` and write it into `dir` under its export filename.
pub fn export_quotation(quote: &Quotation, dir: &Path) -> CalcResult<PathBuf> {
    let bytes = render_quotation_pdf(quote)?;

    fs::create_dir_all(dir).map_err(|e| CalcError::export_failed(format!("{}: {}", dir.display(), e)))?;
    let path = dir.join(&quote.file_name);
    fs::write(&path, &bytes).map_err(|e| CalcError::export_failed(format!("{}: {}", path.display(), e)))?;

    info!(path = %path.display(), bytes = bytes.len(), "quotation exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::compute;
    use crate::parameters::{AdvancedParameters, BasicParameters, ParameterSet};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn advanced_quote(customer: &str) -> Quotation {
        let mut params = AdvancedParameters::default();
        params.set_farm_area(100.0);
        params.customer_name = customer.to_string();
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap();
        Quotation::advanced(&params, &compute(&params.to_input()), at)
    }

    #[test]
    fn test_escape_typst() {
        assert_eq!(escape_typst("$1,000"), "\\$1,000");
        assert_eq!(escape_typst("[INTERNAL]"), "\\[INTERNAL\\]");
        assert_eq!(escape_typst("a_b*c"), "a\\_b\\*c");
        assert_eq!(escape_typst("¥12.5/m²"), "¥12.5\\/m²");
    }

    #[test]
    fn test_source_contains_sections() {
        let source = quotation_source(&advanced_quote("Valley Orchards"));
        assert!(source.contains("Customer: Valley Orchards"));
        assert!(source.contains("Bulk Discount"));
        assert!(source.contains("Per Hectare Analysis"));
        assert!(!source.contains("{cost_rows}"));
    }

    #[test]
    fn test_pdf_generation() {
        let pdf = render_quotation_pdf(&advanced_quote("Hostile *Name* #[x] $5"));
        assert!(pdf.is_ok(), "PDF generation failed: {:?}", pdf.err());

        let pdf_bytes = pdf.unwrap();
        assert!(pdf_bytes.starts_with(b"%PDF"), "Output is not a valid PDF");
        assert!(pdf_bytes.len() > 1000, "PDF seems too small");
    }

    #[test]
    fn test_export_writes_named_file() {
        let dir = TempDir::new().unwrap();
        let params = BasicParameters::default();
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap();
        let quote = Quotation::basic(&params, &compute(&params.to_input()), at);

        let path = export_quotation(&quote, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap().to_string_lossy(), quote.file_name);
        assert!(fs::read(&path).unwrap().starts_with(b"%PDF"));
    }
}
