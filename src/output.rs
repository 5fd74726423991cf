//! CLI output formatting.
//!
//! Every photo is shown by its 1-based position in the filmstrip and its file
//! name; details follow on indented lines or after an arrow.
//!
//! # Output Format
//!
//! ## Load
//!
//! ```text
//! Loaded 2 of 3 photos (replace, 2 in filmstrip)
//!     001 dawn.jpg 1390x927
//!     002 broken.jpg failed: failed to decode broken.jpg: ...
//!     003 tower.jpg 618x927
//! ```
//!
//! ## Inspect
//!
//! ```text
//! 001 dawn.jpg 1390x927
//!     Overlay: 50mm | f/2.8 | ISO200
//! 002 tower.jpg 618x927
//!     Overlay: (none)
//! ```
//!
//! ## Render
//!
//! ```text
//! 001 dawn.jpg → out/dawn_mat.jpeg (1440x1440, 312 KB)
//! 002 tower.jpg failed: export failed: ...
//!
//! Exported 1 frame to out/
//! ```
//!
//! # Architecture
//!
//! Each `format_*` function is pure and returns the lines; `print_*` wrappers
//! write them to stdout.

use crate::export::ExportReceipt;
use crate::metadata::format_overlay;
use crate::session::BatchReport;
use crate::store::StoreSnapshot;
use std::path::Path;

/// Format a 0-based position as a 1-based, 3-digit zero-padded index.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos + 1)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Human-readable size: bytes below 1 KiB, KB below 1 MiB, else MB.
fn format_size(bytes: usize) -> String {
    const KIB: usize = 1024;
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < KIB * KIB {
        format!("{} KB", bytes / KIB)
    } else {
        format!("{:.1} MB", bytes as f64 / (KIB * KIB) as f64)
    }
}

// ============================================================================
// Load
// ============================================================================

pub fn format_batch_report(report: &BatchReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Loaded {} of {} ({}, {} in filmstrip)",
        report.loaded(),
        plural(report.files.len(), "photo"),
        report.mode,
        report.store_len
    )];
    for file in &report.files {
        let detail = match &file.result {
            Ok((w, h)) => format!("{w}x{h}"),
            Err(e) => format!("failed: {e}"),
        };
        lines.push(format!(
            "    {} {} {}",
            format_index(file.index),
            file.name,
            detail
        ));
    }
    lines
}

pub fn print_batch_report(report: &BatchReport) {
    for line in format_batch_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Inspect
// ============================================================================

pub fn format_inspect(snapshot: &StoreSnapshot) -> Vec<String> {
    let mut lines = Vec::new();
    for (pos, record) in snapshot.records.iter().enumerate() {
        lines.push(format!(
            "{} {} {}x{}",
            format_index(pos),
            record.name(),
            record.width(),
            record.height()
        ));
        let overlay = format_overlay(record.metadata());
        if overlay.is_empty() {
            lines.push("    Overlay: (none)".to_string());
        } else {
            lines.push(format!("    Overlay: {overlay}"));
        }
    }
    lines
}

pub fn print_inspect(snapshot: &StoreSnapshot) {
    for line in format_inspect(snapshot) {
        println!("{}", line);
    }
}

// ============================================================================
// Render
// ============================================================================

pub fn format_export_line(pos: usize, receipt: &ExportReceipt) -> String {
    format!(
        "{} {} \u{2192} {} ({}x{}, {})",
        format_index(pos),
        receipt.source,
        receipt.path.display(),
        receipt.width,
        receipt.height,
        format_size(receipt.bytes)
    )
}

pub fn format_export_failure(pos: usize, name: &str, error: &dyn std::error::Error) -> String {
    format!("{} {} failed: {}", format_index(pos), name, error)
}

pub fn format_export_summary(exported: usize, failed: usize, dir: &Path) -> String {
    let mut line = format!(
        "Exported {} to {}",
        plural(exported, "frame"),
        dir.display()
    );
    if failed > 0 {
        line.push_str(&format!(" ({failed} failed)"));
    }
    line
}
