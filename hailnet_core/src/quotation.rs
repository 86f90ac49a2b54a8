//! # Quotation
//!
//! Presentation model for one estimate: everything the terminal breakdown
//! and the PDF export show, already formatted. Built from a parameter set
//! plus the result computed from it; never feeds back into the engine.
//!
//! Display values never show `NaN` or `inf`. A degenerate money value reads
//! `$0.00` (or `¥0.00`), a degenerate area reads `0.00`.
//!
//! ## Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use hailnet_core::parameters::{BasicParameters, Estimator};
//! use hailnet_core::quotation::Quotation;
//!
//! let estimator = Estimator::new(BasicParameters::default());
//! let at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();
//! let quote = Quotation::basic(estimator.params(), estimator.result(), at);
//!
//! assert_eq!(quote.customer, "Not Specified");
//! assert_eq!(quote.file_name, "内部报价单_未指定客户_standard_2024-06-01.pdf");
//! println!("{}", quote);
//! ```

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::calculations::area::square_meters_to_hectares;
use crate::calculations::{CalculationMode, CalculationResult};
use crate::catalog::{Currency, Variant};
use crate::parameters::{AdvancedParameters, BasicParameters};

pub const TITLE: &str = "HAIL NET MATERIAL QUOTATION";
pub const SUBTITLE: &str = "Professional Agricultural Protection Solution";
pub const ADVANCED_BANNER: &str = "⚠ INTERNAL USE ONLY - CONFIDENTIAL PRICING ⚠";
pub const BASIC_BANNER: &str = "⚠ INTERNAL USE ONLY - PROFIT INFORMATION - DO NOT SHARE ⚠";
pub const FOOTER_WARNING: &str = "⚠ WARNING: This document contains confidential pricing for internal evaluation only ⚠";
pub const VALIDITY_NOTE: &str = "This quotation is valid for 30 days from the date of issue.";
pub const TAGLINE: &str = "Professional Agricultural Hail Protection Solutions";

const UNSPECIFIED_CUSTOMER: &str = "Not Specified";

// ============================================================================
// Number formatting
// ============================================================================

/// Group the integer part with commas and keep at most two fraction digits,
/// dropping trailing zeros (`1234.5` → `1,234.5`).
pub fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let negative = value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if negative { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

/// Money with currency symbol; non-finite values read as zero
pub fn format_money(value: f64, currency: Currency) -> String {
    if value.is_finite() {
        format!("{}{}", currency.symbol(), group_thousands(value))
    } else {
        format!("{}0.00", currency.symbol())
    }
}

/// Catalog unit price, always two decimals (`$0.10`)
pub fn format_unit_price(value: f64, currency: Currency) -> String {
    if value.is_finite() {
        format!("{}{:.2}", currency.symbol(), value)
    } else {
        format!("{}0.00", currency.symbol())
    }
}

/// Area or length; non-finite values read `0.00`
pub fn format_area(value: f64) -> String {
    if value.is_finite() {
        group_thousands(value)
    } else {
        "0.00".to_string()
    }
}

pub fn format_count(count: u64) -> String {
    group_thousands(count as f64)
}

/// Fraction as a percentage with one decimal (`0.02` → `2.0%`)
pub fn format_percent(fraction: f64) -> String {
    if fraction.is_finite() {
        format!("{:.1}%", fraction * 100.0)
    } else {
        "0.0%".to_string()
    }
}

/// Replace every character that is not an ASCII letter, digit or CJK
/// ideograph with `_`.
pub fn sanitize_file_component(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || ('\u{4e00}'..='\u{9fa5}').contains(&c) {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Export filename: `<prefix>_<customer>_<net type>_<YYYY-MM-DD>.pdf`
pub fn quote_file_name(variant: Variant, customer_name: &str, net_type: &str, date: NaiveDate) -> String {
    let (prefix, fallback) = match variant {
        Variant::Advanced => ("Internal_Quote", "Unknown_Customer"),
        Variant::Basic => ("内部报价单", "未指定客户"),
    };
    let trimmed = customer_name.trim();
    let customer = if trimmed.is_empty() { fallback } else { trimmed };
    format!(
        "{}_{}_{}_{}.pdf",
        prefix,
        sanitize_file_component(customer),
        net_type,
        date.format("%Y-%m-%d")
    )
}

// ============================================================================
// Model
// ============================================================================

/// Label/value pair in a two-column table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub label: String,
    pub value: String,
}

impl Row {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Row {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetLine {
    pub name: String,
    /// `"N rolls"`, or `"Custom"` when no roll count applies
    pub quantity: String,
    pub unit_price: String,
    pub coverage: String,
    pub subtotal: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessoryRow {
    pub name: String,
    pub quantity: String,
    pub unit_price: String,
    pub subtotal: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostRow {
    pub label: String,
    pub amount: String,
    /// Grand total row
    pub highlight: bool,
}

/// A fully formatted quotation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quotation {
    pub variant: Variant,
    pub banner: &'static str,
    pub title: &'static str,
    /// `[INTERNAL ASSESSMENT]` or `[INTERNAL VERSION]`
    pub tag: &'static str,
    pub subtitle: &'static str,
    pub customer: String,
    pub date: NaiveDate,
    /// Quote date, net type and mode or installation
    pub header_lines: Vec<String>,
    pub parameters: Vec<Row>,
    pub net_line: NetLine,
    pub accessories: Vec<AccessoryRow>,
    pub costs: Vec<CostRow>,
    /// Empty when the mode has no per-hectare analysis
    pub per_hectare: Vec<Row>,
    pub net_share: f64,
    pub accessory_share: f64,
    pub warning: &'static str,
    pub footer: Vec<String>,
    pub file_name: String,
}

fn customer_display(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        UNSPECIFIED_CUSTOMER.to_string()
    } else {
        trimmed.to_string()
    }
}

fn accessory_rows(result: &CalculationResult) -> Vec<AccessoryRow> {
    result
        .accessories
        .iter()
        .map(|line| AccessoryRow {
            name: line.kind.display_name().to_string(),
            quantity: format_count(line.count),
            unit_price: format_unit_price(line.unit_price, result.currency),
            subtotal: format_money(line.cost, result.currency),
        })
        .collect()
}

fn footer_lines(generated_at: DateTime<Utc>, edition: &str) -> Vec<String> {
    vec![
        VALIDITY_NOTE.to_string(),
        TAGLINE.to_string(),
        format!("Generated on {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        format!("{} - Internal Assessment Tool", edition),
    ]
}

impl Quotation {
    /// Quotation for the advanced (USD) calculator
    pub fn advanced(params: &AdvancedParameters, result: &CalculationResult, generated_at: DateTime<Utc>) -> Self {
        let currency = result.currency;
        let money = |value: f64| format_money(value, currency);
        let date = generated_at.date_naive();
        let net = result.net_type;

        let header_lines = vec![
            format!("Quote Date: {}", date.format("%Y-%m-%d")),
            format!("Net Type: {} - {}", net.label, net.description),
            format!("Calculation Mode: {}", result.mode.display_name()),
        ];

        let margin = format!("{} markup", params.price_margin.display_name());
        let package = format!("{} Package", params.accessory_package.display_name());
        let parameters = match result.mode {
            CalculationMode::Precise => vec![
                Row::new("Row Count", format!("{} rows", params.row_count)),
                Row::new("Row Length", format!("{} m", format_area(params.row_length_m))),
                Row::new("Row Spacing", format!("{} m", format_area(params.row_spacing_m))),
                Row::new("Net Width", format!("{} m", format_area(result.net_width_m))),
                Row::new("Net Length", format!("{} m", format_area(result.net_length_m))),
                Row::new("Total Area", format!("{} m²", format_area(result.total_area_m2))),
                Row::new("Price Margin", margin),
                Row::new("Accessory Package", package),
            ],
            // the engine snaps the stored area; show the one it priced
            _ => vec![
                Row::new(
                    "Farm Area",
                    format!("{} hectares", format_area(square_meters_to_hectares(result.total_area_m2))),
                ),
                Row::new("Base Coverage Area", format!("{} m²", format_area(result.total_area_m2))),
                Row::new("Actual Net Area (x1.155)", format!("{} m²", format_area(result.actual_net_area_m2))),
                Row::new("Price Margin", margin),
                Row::new("Accessory Package", package),
            ],
        };

        let quantity = if result.rolls_needed > 0 {
            format!("{} rolls", result.rolls_needed)
        } else {
            "Custom".to_string()
        };
        let net_line = NetLine {
            name: net.label.to_string(),
            quantity,
            unit_price: format!("{}/m²", money(result.unit_price)),
            coverage: format!("{} m²", format_area(result.actual_net_area_m2)),
            subtotal: money(result.net_cost),
        };

        let mut costs = vec![
            CostRow { label: "Net Cost".into(), amount: money(result.net_cost), highlight: false },
            CostRow { label: "Accessories Cost".into(), amount: money(result.accessories_cost), highlight: false },
            CostRow { label: "Subtotal".into(), amount: money(result.subtotal), highlight: false },
        ];
        if result.has_discount() {
            costs.push(CostRow {
                label: "Bulk Discount".into(),
                amount: format!("-{} ({})", money(result.discount_amount), format_percent(result.bulk_discount_rate)),
                highlight: false,
            });
        }
        costs.push(CostRow { label: "TOTAL AMOUNT".into(), amount: money(result.total_price), highlight: true });

        let per_ha = result.per_hectare;
        let per_hectare = match result.mode {
            CalculationMode::Fuzzy => vec![
                Row::new("Net Cost per Hectare", money(per_ha.net.unwrap_or(f64::NAN))),
                Row::new("Accessories Cost per Hectare", money(per_ha.accessories.unwrap_or(f64::NAN))),
                Row::new("Total Cost per Hectare", money(per_ha.total)),
            ],
            _ => Vec::new(),
        };

        Quotation {
            variant: Variant::Advanced,
            banner: ADVANCED_BANNER,
            title: TITLE,
            tag: "[INTERNAL ASSESSMENT]",
            subtitle: SUBTITLE,
            customer: customer_display(&params.customer_name),
            date,
            header_lines,
            parameters,
            net_line,
            accessories: accessory_rows(result),
            costs,
            per_hectare,
            net_share: result.net_share(),
            accessory_share: result.accessory_share(),
            warning: FOOTER_WARNING,
            footer: footer_lines(generated_at, "Export Version"),
            file_name: quote_file_name(Variant::Advanced, &params.customer_name, net.label, date),
        }
    }

    /// Quotation for the basic (CNY) calculator
    pub fn basic(params: &BasicParameters, result: &CalculationResult, generated_at: DateTime<Utc>) -> Self {
        let currency = result.currency;
        let money = |value: f64| format_money(value, currency);
        let date = generated_at.date_naive();
        let net = result.net_type;
        let installation = params.installation.description();

        let header_lines = vec![
            format!("Quote Date: {}", date.format("%Y-%m-%d")),
            format!("Net Type: {}", net.description),
            format!("Installation: {}", installation),
        ];

        let parameters = vec![
            Row::new("Farm Area", format!("{} hectares", format_area(params.farm_area_ha))),
            Row::new("Coverage Area", format!("{} m²", format_area(result.total_area_m2))),
            Row::new("Net Type", net.description),
            Row::new("Installation", installation),
            Row::new("Rolls Needed", format!("{} rolls", result.rolls_needed)),
        ];

        let net_line = NetLine {
            name: net.description.to_string(),
            quantity: format!("{} rolls", result.rolls_needed),
            unit_price: format!("{}/m²", money(result.unit_price)),
            coverage: format!("{} m²", format_area(result.total_area_m2)),
            subtotal: money(result.net_cost),
        };

        let costs = vec![
            CostRow { label: "Net Cost".into(), amount: money(result.net_cost), highlight: false },
            CostRow { label: "Accessories Cost".into(), amount: money(result.accessories_cost), highlight: false },
            CostRow { label: "TOTAL AMOUNT".into(), amount: money(result.total_price), highlight: true },
            CostRow {
                label: "Cost per Hectare".into(),
                amount: money(result.per_hectare.total),
                highlight: false,
            },
        ];

        Quotation {
            variant: Variant::Basic,
            banner: BASIC_BANNER,
            title: TITLE,
            tag: "[INTERNAL VERSION]",
            subtitle: SUBTITLE,
            customer: customer_display(&params.customer_name),
            date,
            header_lines,
            parameters,
            net_line,
            accessories: accessory_rows(result),
            costs,
            per_hectare: Vec::new(),
            net_share: result.net_share(),
            accessory_share: result.accessory_share(),
            warning: FOOTER_WARNING,
            footer: footer_lines(generated_at, "Basic Version"),
            file_name: quote_file_name(Variant::Basic, &params.customer_name, net.id, date),
        }
    }

    /// The highlighted grand total row
    pub fn total_row(&self) -> Option<&CostRow> {
        self.costs.iter().find(|row| row.highlight)
    }
}

impl fmt::Display for Quotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.banner)?;
        writeln!(f, "{}  {}", self.title, self.tag)?;
        writeln!(f, "Customer: {}", self.customer)?;
        for line in &self.header_lines {
            writeln!(f, "{}", line)?;
        }

        writeln!(f)?;
        writeln!(f, "PROJECT OVERVIEW")?;
        for row in &self.parameters {
            writeln!(f, "  {:<28} {}", row.label, row.value)?;
        }

        writeln!(f)?;
        writeln!(f, "MATERIAL LIST")?;
        writeln!(
            f,
            "  {:<28} {:>12} {:>14} {:>16} {:>16}",
            self.net_line.name,
            self.net_line.quantity,
            self.net_line.unit_price,
            self.net_line.coverage,
            self.net_line.subtotal
        )?;
        for row in &self.accessories {
            writeln!(f, "  {:<28} {:>12} {:>14} {:>16}", row.name, row.quantity, row.unit_price, row.subtotal)?;
        }

        writeln!(f)?;
        writeln!(f, "COST SUMMARY")?;
        for row in &self.costs {
            if row.highlight {
                writeln!(f, "  {:<28} {}  <==", row.label, row.amount)?;
            } else {
                writeln!(f, "  {:<28} {}", row.label, row.amount)?;
            }
        }
        writeln!(
            f,
            "  Net {} / Accessories {}",
            format_percent(self.net_share),
            format_percent(self.accessory_share)
        )?;

        if !self.per_hectare.is_empty() {
            writeln!(f)?;
            writeln!(f, "PER HECTARE ANALYSIS")?;
            for row in &self.per_hectare {
                writeln!(f, "  {:<28} {}", row.label, row.value)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "{}", self.warning)?;
        for line in &self.footer {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
