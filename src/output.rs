//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Ingest
//!
//! ```text
//! Original 640x480
//!     Path: site/abc/9f86d0…-640-480.jpg
//! ```
//!
//! ## Resize (fit / fill / reframe)
//!
//! ```text
//! Variant 100x75 (x 0-100, y 0-100)
//!     Image: site/abc/9f86d0…-640-480.jpg (640x480)
//!     Path: site/abc/9f86d0…-640-480-100-75-0-100-0-100.jpg
//!     URL: /variants/site/abc/9f86d0…-640-480-100-75-0-100-0-100.jpg?q=…
//! ```
//!
//! ## Warm
//!
//! ```text
//! Warm: 1 cached, 2 generated, 1 failed (4 total)
//!     FAILED site/abc/…-9-9-0-100-0-100.jpg: Variant … has not been authenticated
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::engine::{Delivery, WarmReport};
use crate::original::Original;
use crate::variant::VariantDescriptor;
use serde::Serialize;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn dims(width: u32, height: u32) -> String {
    format!("{}x{}", width, height)
}

// ============================================================================
// Ingest
// ============================================================================

pub fn format_original(original: &Original) -> Vec<String> {
    vec![
        format!("Original {}", dims(original.width(), original.height())),
        format!("{}Path: {}", indent(1), original.path()),
    ]
}

pub fn print_original(original: &Original) {
    for line in format_original(original) {
        println!("{}", line);
    }
}

// ============================================================================
// Resize
// ============================================================================

pub fn format_descriptor(d: &VariantDescriptor) -> Vec<String> {
    vec![
        format!(
            "Variant {} (x {}-{}, y {}-{})",
            dims(d.width, d.height),
            d.x1,
            d.x2,
            d.y1,
            d.y2
        ),
        format!(
            "{}Image: {} ({})",
            indent(1),
            d.image.path(),
            dims(d.image.width(), d.image.height())
        ),
        format!("{}Path: {}", indent(1), d.path),
        format!("{}URL: {}", indent(1), d.url),
    ]
}

pub fn print_descriptor(d: &VariantDescriptor) {
    for line in format_descriptor(d) {
        println!("{}", line);
    }
}

// ============================================================================
// Show
// ============================================================================

/// Summary of a delivered variant written to `dest`.
pub fn format_delivery(delivery: &Delivery, dest: &str) -> String {
    format!(
        "Wrote {} bytes ({}) \u{2192} {}",
        delivery.bytes.len(),
        delivery.mime_type,
        dest
    )
}

// ============================================================================
// Warm
// ============================================================================

pub fn format_warm_report(report: &WarmReport) -> Vec<String> {
    let mut lines = vec![format!("Warm: {}", report.stats)];
    for (path, error) in &report.failures {
        lines.push(format!("{}FAILED {}: {}", indent(1), path, error));
    }
    lines
}

pub fn print_warm_report(report: &WarmReport) {
    for line in format_warm_report(report) {
        println!("{}", line);
    }
}

/// Pretty JSON for `--json` output.
pub fn print_json(value: &impl Serialize) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
