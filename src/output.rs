//! CLI output formatting.
//!
//! Output is an inventory of the page: sections in page order with their
//! entry counts, then whatever needs attention. Paths are secondary context
//! on indented lines.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Sections
//! 001 Social (2 of 3 links)
//! 002 Main (3 links)
//! 003 Projects (empty)
//!
//! Icons
//!     Missing: blog (not found: assets/img/icons/blog.svg)
//!
//! Site
//!     Profile: yes
//!     Metadata: yes
//! ```
//!
//! ## Build
//!
//! ```text
//! Page → dist/index.html
//! 001 Social (2 links)
//! 002 Main (3 links)
//!
//! Assets
//!     assets/img/ada.jpg
//!
//! Built 5 links, 1 asset
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::page::{BuildReport, CheckReport};
use crate::render::Section;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Section header: positional index, name and how many entries render.
///
/// ```text
/// 001 Main (3 links)
/// 002 Social (2 of 3 links)
/// 003 Books (empty)
/// ```
fn section_line(index: usize, section: Section, total: usize, rendered: usize) -> String {
    let detail = if total == 0 {
        "empty".to_string()
    } else if rendered == total {
        plural(total, "link")
    } else {
        format!("{rendered} of {}", plural(total, "link"))
    };
    format!("{} {} ({})", format_index(index), section.name(), detail)
}

fn yes_no(v: bool) -> &'static str {
    if v { "yes" } else { "no" }
}

pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let mut lines = vec!["Sections".to_string()];
    for (i, (section, total, rendered)) in report.sections.iter().enumerate() {
        lines.push(section_line(i + 1, *section, *total, *rendered));
    }

    if !report.missing_icons.is_empty() {
        lines.push(String::new());
        lines.push("Icons".to_string());
        for (name, reason) in &report.missing_icons {
            lines.push(format!("{}Missing: {} ({})", indent(1), name, reason));
        }
    }

    lines.push(String::new());
    lines.push("Site".to_string());
    lines.push(format!("{}Profile: {}", indent(1), yes_no(report.has_profile)));
    lines.push(format!("{}Metadata: {}", indent(1), yes_no(report.has_site)));
    lines
}

pub fn print_check_output(report: &CheckReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}

pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines = vec![format!("Page → {}", report.index.display())];
    if report.failed {
        lines.push(format!(
            "{}Content failed to render; the page shows an error message",
            indent(1)
        ));
    }

    let mut index = 0;
    for (section, rendered) in &report.sections {
        if *rendered > 0 {
            index += 1;
            lines.push(section_line(index, *section, *rendered, *rendered));
        }
    }

    if !report.assets.is_empty() {
        lines.push(String::new());
        lines.push("Assets".to_string());
        for asset in &report.assets {
            lines.push(format!("{}{}", indent(1), asset.display()));
        }
    }

    let links: usize = report.sections.iter().map(|(_, n)| n).sum();
    lines.push(String::new());
    lines.push(format!(
        "Built {}, {}",
        plural(links, "link"),
        plural(report.assets.len(), "asset")
    ));
    lines
}

pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}
