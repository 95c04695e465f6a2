#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! AST-level test to keep event channels bounded.
//!
//! Live visitor frames arrive as fast as the server sends them. With a bounded
//! channel the subscription waits for the UI to catch up; an unbounded one
//! just grows.
//!
//! Example of bad code:
//! ```ignore
//! let (tx, rx) = mpsc::unbounded();
//! ```
//!
//! Example of correct code:
//! ```ignore
//! let (tx, rx) = mpsc::channel(32);
//! tx.send(event).await?;  // Waits while the buffer is full
//! ```

use std::fs;
use std::path::Path;
use syn::visit::Visit;
use syn::{Expr, ExprCall, File};
use walkdir::WalkDir;

const UNBOUNDED_CONSTRUCTORS: &[&str] = &["unbounded", "unbounded_channel"];

struct UnboundedVisitor {
    current_file: String,
    violations: Vec<(String, String)>,
}

impl<'ast> Visit<'ast> for UnboundedVisitor {
    fn visit_expr_call(&mut self, call: &'ast ExprCall) {
        if let Expr::Path(path) = &*call.func {
            if let Some(last) = path.path.segments.last() {
                let name = last.ident.to_string();
                if UNBOUNDED_CONSTRUCTORS.contains(&name.as_str()) {
                    let full = path
                        .path
                        .segments
                        .iter()
                        .map(|s| s.ident.to_string())
                        .collect::<Vec<_>>()
                        .join("::");
                    self.violations
                        .push((self.current_file.clone(), format!("{}()", full)));
                }
            }
        }
        syn::visit::visit_expr_call(self, call);
    }
}

fn analyze_source(name: &str, content: &str) -> Vec<(String, String)> {
    let syntax: File = match syn::parse_file(content) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Warning: Failed to parse {}: {}", name, e);
            return vec![];
        }
    };
    let mut visitor = UnboundedVisitor {
        current_file: name.to_string(),
        violations: Vec::new(),
    };
    visitor.visit_file(&syntax);
    visitor.violations
}

#[test]
fn detects_unbounded_constructors() {
    let bad_code = r#"
        fn example() {
            let (tx, rx) = futures::channel::mpsc::unbounded::<u64>();
            let (a, b) = tokio::sync::mpsc::unbounded_channel::<u64>();
        }
    "#;
    let violations = analyze_source("test.rs", bad_code);
    assert_eq!(violations.len(), 2);
    assert_eq!(violations[0].1, "futures::channel::mpsc::unbounded()");
}

#[test]
fn allows_bounded_channels() {
    let good_code = r#"
        fn example() {
            let (tx, rx) = mpsc::channel(32);
        }
    "#;
    assert!(analyze_source("test.rs", good_code).is_empty());
}

#[test]
fn no_unbounded_channel_violations() {
    let src_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");

    let mut all_violations = Vec::new();
    for entry in WalkDir::new(&src_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
    {
        if let Ok(content) = fs::read_to_string(entry.path()) {
            all_violations.extend(analyze_source(&entry.path().display().to_string(), &content));
        }
    }

    if !all_violations.is_empty() {
        let mut error_msg = String::from(
            "\n\nFound unbounded channel constructors!\n\
             Use a bounded channel so producers wait for the consumer.\n\n\
             Violations:\n",
        );
        for (file, context) in &all_violations {
            error_msg.push_str(&format!("  - {}: {}\n", file, context));
        }
        panic!("{}", error_msg);
    }
}
