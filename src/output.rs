//! CLI output formatting.
//!
//! Every command prints through a pure `format_*` function (returns
//! `Vec<String>`) and a thin `print_*` wrapper that writes to stdout, so the
//! layout is tested without capturing output.
//!
//! Entities lead with a 3-digit positional index and their name; details sit
//! on indented context lines underneath.
//!
//! ## Check
//!
//! ```text
//! Projects
//! 001 Riverside House (4 images)
//!     Type: New Construction
//!     Hero: promoted to first
//!     Duplicate: /img/riverside/02.jpg
//!
//! Images
//!     ok      /img/riverside/01.jpg (1600x1067)
//!     FAILED  /img/riverside/03.jpg: network error: No such file
//! Checked 4 images, 1 failed
//!
//! Unreferenced
//!     img/riverside/old.jpg
//! ```
//!
//! ## Replay
//!
//! ```text
//! 001 open p1 → Loading, image 1
//!     show modal: Riverside House (4 images)
//!     probe gallery-1 /img/riverside/02.jpg
//! 002 settle → Open, image 1
//!     main image: /img/riverside/02.jpg
//! ```

use crate::assets::ImageCheck;
use crate::gallery::GalleryState;
use crate::script::StepReport;
use crate::sim::RecordedOp;
use crate::types::{HeroStatus, ProjectAudit};
use std::path::PathBuf;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Positional index + name, with an optional image count.
fn entity_header(index: usize, name: &str, count: Option<usize>) -> String {
    match count {
        Some(1) => format!("{} {} (1 image)", format_index(index), name),
        Some(n) => format!("{} {} ({} images)", format_index(index), name, n),
        None => format!("{} {}", format_index(index), name),
    }
}

/// Truncate to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    }
}

// ============================================================================
// check
// ============================================================================

pub fn format_audit(audits: &[ProjectAudit]) -> Vec<String> {
    let mut lines = vec!["Projects".to_string()];
    for (i, audit) in audits.iter().enumerate() {
        lines.push(entity_header(i + 1, &audit.name, Some(audit.image_count)));
        if audit.name != audit.id {
            lines.push(format!("{}Id: {}", indent(1), audit.id));
        }
        if !audit.type_label.is_empty() {
            lines.push(format!("{}Type: {}", indent(1), audit.type_label));
        }
        let hero = match audit.hero {
            HeroStatus::None => None,
            HeroStatus::AlreadyFirst => Some("already first"),
            HeroStatus::Promoted => Some("promoted to first"),
            HeroStatus::NotInImages => Some("not in images, ignored"),
        };
        if let Some(hero) = hero {
            lines.push(format!("{}Hero: {}", indent(1), hero));
        }
        for dup in &audit.duplicates {
            lines.push(format!("{}Duplicate: {}", indent(1), dup));
        }
        if audit.image_count == 0 {
            lines.push(format!("{}Warning: no images, opening will fail", indent(1)));
        }
    }
    lines
}

pub fn format_image_checks(checks: &[ImageCheck]) -> Vec<String> {
    let mut lines = vec!["Images".to_string()];
    for check in checks {
        match &check.result {
            Ok(dims) => lines.push(format!(
                "{}ok      {} ({}x{})",
                indent(1),
                check.src,
                dims.width,
                dims.height
            )),
            Err(failure) => lines.push(format!("{}FAILED  {}: {}", indent(1), check.src, failure)),
        }
    }
    let failed = checks.iter().filter(|c| !c.is_ok()).count();
    lines.push(format!("Checked {} images, {} failed", checks.len(), failed));
    lines
}

pub fn format_orphans(orphans: &[PathBuf]) -> Vec<String> {
    let mut lines = vec!["Unreferenced".to_string()];
    if orphans.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for path in orphans {
        let shown = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        lines.push(format!("{}{}", indent(1), shown));
    }
    lines
}

pub fn print_check(
    audits: &[ProjectAudit],
    checks: Option<&[ImageCheck]>,
    orphans: Option<&[PathBuf]>,
) {
    let mut lines = format_audit(audits);
    if let Some(checks) = checks {
        lines.push(String::new());
        lines.extend(format_image_checks(checks));
    }
    if let Some(orphans) = orphans {
        lines.push(String::new());
        lines.extend(format_orphans(orphans));
    }
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// replay
// ============================================================================

fn state_label(state: GalleryState) -> &'static str {
    match state {
        GalleryState::Attaching => "Attaching",
        GalleryState::Disabled => "Disabled",
        GalleryState::Closed => "Closed",
        GalleryState::Loading => "Loading",
        GalleryState::Open => "Open",
    }
}

/// One platform call as a transcript line.
pub fn format_op(op: &RecordedOp) -> String {
    match op {
        RecordedOp::BeginProbe { ticket, src } => format!("probe {} {}", ticket, truncate(src, 60)),
        RecordedOp::Schedule { timer, delay } => {
            format!("schedule {:?} in {}ms", timer, delay.as_millis())
        }
        RecordedOp::SetSource { key, src } => format!("source {} = {}", key, truncate(src, 60)),
        RecordedOp::SetLoadState { key, state } => format!("state {} = {:?}", key, state),
        RecordedOp::FadeIn(key) => format!("fade in {}", key),
        RecordedOp::Observe(key) => format!("observe {}", key),
        RecordedOp::Unobserve(key) => format!("unobserve {}", key),
        RecordedOp::DisconnectObserver => "disconnect observer".to_string(),
        RecordedOp::ShowModal(header) => {
            format!("show modal: {} ({} images)", header.title, header.image_count)
        }
        RecordedOp::HideModal => "hide modal".to_string(),
        RecordedOp::SetMainImage { src, .. } => format!("main image: {}", truncate(src, 60)),
        RecordedOp::MainImageLoading(on) => format!("main image loading: {}", on),
        RecordedOp::RenderThumbnails(sources) => format!("render {} thumbnails", sources.len()),
        RecordedOp::ActiveThumbnail(i) => format!("active thumbnail {}", i + 1),
        RecordedOp::ScrollThumbnail(i) => format!("scroll to thumbnail {}", i + 1),
        RecordedOp::Counter { current, total } => format!("counter {} / {}", current, total),
        RecordedOp::NavEnabled(on) => format!("navigation enabled: {}", on),
        RecordedOp::NoScroll(on) => format!("no-scroll: {}", on),
        RecordedOp::Fullscreen(on) => format!("fullscreen: {}", on),
        RecordedOp::Focus(key) => format!("focus {}", key),
        RecordedOp::Notify(notice) => format!("notice: {}", notice),
        RecordedOp::OpenWindow { src, allowed } => {
            let verdict = if *allowed { "opened" } else { "blocked" };
            format!("window {}: {}", verdict, truncate(src, 60))
        }
    }
}

/// Transcript of a replayed session. With `verbose` off, only the ops a
/// viewer would notice are listed (no probes, timers, or element states).
pub fn format_transcript(reports: &[StepReport], verbose: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for report in reports {
        let position = match report.index {
            Some(i) => format!(", image {}", i + 1),
            None => String::new(),
        };
        lines.push(format!(
            "{} {} → {}{}",
            format_index(report.line),
            report.step,
            state_label(report.state),
            position
        ));
        for op in report.ops.iter().filter(|op| verbose || is_visible(op)) {
            lines.push(format!("{}{}", indent(1), format_op(op)));
        }
    }
    lines
}

fn is_visible(op: &RecordedOp) -> bool {
    !matches!(
        op,
        RecordedOp::BeginProbe { .. }
            | RecordedOp::Schedule { .. }
            | RecordedOp::SetLoadState { .. }
            | RecordedOp::Observe(_)
            | RecordedOp::Unobserve(_)
            | RecordedOp::MainImageLoading(_)
    )
}

pub fn print_transcript(reports: &[StepReport], verbose: bool) {
    for line in format_transcript(reports, verbose) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Dimensions, ElementKey, LoadFailure, Notice, ProbeOwner, ProbeTicket};
    use crate::script::ScriptStep;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn entity_header_counts() {
        assert_eq!(entity_header(1, "Loft", Some(1)), "001 Loft (1 image)");
        assert_eq!(entity_header(2, "Barn", Some(4)), "002 Barn (4 images)");
        assert_eq!(entity_header(3, "Shed", None), "003 Shed");
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 3), "ééé...");
    }

    fn audit(id: &str, count: usize, hero: HeroStatus, duplicates: &[&str]) -> ProjectAudit {
        ProjectAudit {
            id: id.to_string(),
            name: id.to_string(),
            type_label: "New Construction".to_string(),
            image_count: count,
            duplicates: duplicates.iter().map(|s| s.to_string()).collect(),
            hero,
        }
    }

    #[test]
    fn audit_lists_findings() {
        let lines = format_audit(&[
            audit("loft", 3, HeroStatus::Promoted, &["b.jpg"]),
            audit("empty", 0, HeroStatus::NotInImages, &[]),
        ]);
        assert_eq!(
            lines,
            vec![
                "Projects",
                "001 loft (3 images)",
                "    Type: New Construction",
                "    Hero: promoted to first",
                "    Duplicate: b.jpg",
                "002 empty (0 images)",
                "    Type: New Construction",
                "    Hero: not in images, ignored",
                "    Warning: no images, opening will fail",
            ]
        );
    }

    #[test]
    fn image_checks_summarize_failures() {
        let checks = vec![
            ImageCheck {
                src: "a.jpg".into(),
                result: Ok(Dimensions {
                    width: 10,
                    height: 5,
                }),
            },
            ImageCheck {
                src: "b.jpg".into(),
                result: Err(LoadFailure::ZeroDimensions),
            },
        ];
        let lines = format_image_checks(&checks);
        assert_eq!(lines[1], "    ok      a.jpg (10x5)");
        assert_eq!(lines[2], "    FAILED  b.jpg: image has zero dimensions");
        assert_eq!(lines[3], "Checked 2 images, 1 failed");
    }

    #[test]
    fn orphans_use_forward_slashes() {
        let lines = format_orphans(&[PathBuf::from("img").join("old.jpg")]);
        assert_eq!(lines, vec!["Unreferenced", "    img/old.jpg"]);
        assert_eq!(format_orphans(&[])[1], "    (none)");
    }

    #[test]
    fn transcript_hides_plumbing_unless_verbose() {
        let reports = vec![StepReport {
            line: 1,
            step: ScriptStep::Next,
            ops: vec![
                RecordedOp::BeginProbe {
                    ticket: ProbeTicket {
                        owner: ProbeOwner::Gallery,
                        seq: 4,
                    },
                    src: "b.jpg".into(),
                },
                RecordedOp::Focus(ElementKey(3)),
                RecordedOp::Notify(Notice::PopupBlocked),
            ],
            state: GalleryState::Open,
            index: Some(1),
        }];

        let quiet = format_transcript(&reports, false);
        assert_eq!(quiet[0], "001 next → Open, image 2");
        assert_eq!(quiet.len(), 3);
        assert_eq!(quiet[1], "    focus #3");

        let verbose = format_transcript(&reports, true);
        assert_eq!(verbose.len(), 4);
        assert_eq!(verbose[1], "    probe gallery-4 b.jpg");
    }

    #[test]
    fn long_sources_are_truncated() {
        let op = RecordedOp::SetMainImage {
            src: format!("data:image/svg+xml,{}", "x".repeat(200)),
            alt: String::new(),
        };
        let line = format_op(&op);
        assert!(line.ends_with("..."));
        assert!(line.len() < 90);
    }
}
