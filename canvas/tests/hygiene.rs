//! Hygiene: enforces coding standards at test time
//!
//! These tests scan the canvas crate source tree for antipatterns. Pointer
//! handling must never fail, so anything that can crash or silently swallow an
//! error is budgeted (ideally zero). Library output goes through `tracing`,
//! never straight to stdout/stderr. If you must add one, you have to fix an
//! existing one first. The budget never grows.
#![allow(clippy::absurd_extreme_comparisons)]

use std::fs;
use std::path::Path;

// Panics crash the host page.
const MAX_UNWRAP: usize = 0;
const MAX_EXPECT: usize = 0;
const MAX_PANIC: usize = 0;
const MAX_UNREACHABLE: usize = 0;
const MAX_TODO: usize = 0;
const MAX_UNIMPLEMENTED: usize = 0;

// Silent loss: discards errors without inspecting.
const MAX_SILENT_DISCARD: usize = 0;
const MAX_DOT_OK: usize = 0;

// Output goes through `tracing`.
const MAX_PRINTLN: usize = 0;
const MAX_EPRINTLN: usize = 0;
const MAX_DBG: usize = 0;

// Style / structure.
const MAX_ALLOW_DEAD_CODE: usize = 0;

struct SourceFile {
    path: String,
    content: String,
}

/// Collect `.rs` files from `canvas/src/`.
fn all_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

/// Production files only: everything except `*_test.rs`.
fn source_files() -> Vec<SourceFile> {
    all_files().into_iter().filter(|f| !f.path.ends_with("_test.rs")).collect()
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs") {
            if let Ok(content) = fs::read_to_string(&path) {
                out.push(SourceFile { path: path.to_string_lossy().to_string(), content });
            }
        }
    }
}

fn count_in_source(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file.content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then(|| (file.path.clone(), count))
        })
        .collect()
}

fn format_hits(hits: &[(String, usize)]) -> String {
    hits.iter()
        .map(|(path, count)| format!("  {path}: {count}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn assert_budget(pattern: &str, max: usize) {
    let hits = count_in_source(&source_files(), pattern);
    let count: usize = hits.iter().map(|(_, c)| c).sum();
    assert!(
        count <= max,
        "`{pattern}` budget exceeded: found {count}, max {max}.\n{}",
        format_hits(&hits)
    );
}

#[test]
fn unwrap_budget() {
    assert_budget(".unwrap()", MAX_UNWRAP);
}

#[test]
fn expect_budget() {
    assert_budget(".expect(", MAX_EXPECT);
}

#[test]
fn panic_budget() {
    assert_budget("panic!(", MAX_PANIC);
}

#[test]
fn unreachable_budget() {
    assert_budget("unreachable!(", MAX_UNREACHABLE);
}

#[test]
fn todo_budget() {
    assert_budget("todo!(", MAX_TODO);
}

#[test]
fn unimplemented_budget() {
    assert_budget("unimplemented!(", MAX_UNIMPLEMENTED);
}

#[test]
fn silent_discard_budget() {
    assert_budget("let _ =", MAX_SILENT_DISCARD);
}

#[test]
fn dot_ok_budget() {
    assert_budget(".ok()", MAX_DOT_OK);
}

#[test]
fn println_budget() {
    assert_budget("println!(", MAX_PRINTLN);
}

#[test]
fn eprintln_budget() {
    assert_budget("eprintln!(", MAX_EPRINTLN);
}

#[test]
fn dbg_budget() {
    assert_budget("dbg!(", MAX_DBG);
}

#[test]
fn allow_dead_code_budget() {
    assert_budget("#[allow(dead_code)]", MAX_ALLOW_DEAD_CODE);
}

/// Every `x_test.rs` must be wired from `x.rs` with `#[path = "x_test.rs"]`,
/// otherwise its tests silently never run.
#[test]
fn every_test_file_is_wired() {
    let files = all_files();
    let unwired: Vec<&str> = files
        .iter()
        .filter(|f| f.path.ends_with("_test.rs"))
        .filter(|test| {
            let name = Path::new(&test.path).file_name().unwrap_or_default().to_string_lossy();
            let attr = format!("#[path = \"{name}\"]");
            let owner = test.path.replace("_test.rs", ".rs");
            !files.iter().any(|f| f.path == owner && f.content.contains(&attr))
        })
        .map(|f| f.path.as_str())
        .collect();
    assert!(unwired.is_empty(), "test files not wired into their module:\n  {}", unwired.join("\n  "));
}
