#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! AST-level test to detect `.await` while holding a `RefCell` borrow or a
//! signal/lock guard.
//!
//! Everything in the dashboard runs on one thread and shares state through
//! `Rc<RefCell<_>>` and Dioxus signals. A borrow held across an await point
//! panics at runtime as soon as another task touches the same cell while this
//! one is suspended.
//!
//! Example of bad code:
//! ```ignore
//! // BAD: borrow held across await point
//! let mut entries = self.entries.borrow_mut();
//! fetch().await;  // Another task borrowing `entries` panics
//! ```
//!
//! Example of correct code:
//! ```ignore
//! // GOOD: copy out what you need, then await
//! let pending = {
//!     let entries = self.entries.borrow();
//!     entries.get(&key).cloned()
//! };
//! fetch().await;
//! ```

use std::fs;
use std::path::Path;
use syn::visit::Visit;
use syn::{Expr, ExprAwait, File, Local, Pat};
use walkdir::WalkDir;

/// Tracks live borrows and detects awaits while they're held
struct BorrowAcrossAwaitVisitor {
    current_file: String,
    /// Names of variables holding a borrow
    active_guards: Vec<String>,
    scope_depth: usize,
    /// (guard name, depth when created)
    guard_scopes: Vec<(String, usize)>,
    violations: Vec<(String, String)>,
}

impl BorrowAcrossAwaitVisitor {
    fn new(file: String) -> Self {
        Self {
            current_file: file,
            active_guards: Vec::new(),
            scope_depth: 0,
            guard_scopes: Vec::new(),
            violations: Vec::new(),
        }
    }

    fn is_borrow_method(method: &str) -> bool {
        matches!(
            method,
            "borrow" | "borrow_mut" | "read" | "write" | "lock" | "try_borrow" | "try_borrow_mut"
        )
    }

    /// `x.borrow()` / `x.write()` bound directly, or awaited (`lock().await`)
    fn is_borrow_call(expr: &Expr) -> bool {
        match expr {
            Expr::Await(await_expr) => match &*await_expr.base {
                Expr::MethodCall(call) => Self::is_borrow_method(&call.method.to_string()),
                _ => false,
            },
            Expr::MethodCall(call) => Self::is_borrow_method(&call.method.to_string()),
            _ => false,
        }
    }

    fn guard_name(pat: &Pat) -> Option<String> {
        match pat {
            Pat::Ident(ident) => Some(ident.ident.to_string()),
            Pat::Type(typed) => Self::guard_name(&typed.pat),
            _ => None,
        }
    }
}

impl<'ast> Visit<'ast> for BorrowAcrossAwaitVisitor {
    fn visit_local(&mut self, local: &'ast Local) {
        if let Some(init) = &local.init {
            if Self::is_borrow_call(&init.expr) {
                if let Some(name) = Self::guard_name(&local.pat) {
                    self.active_guards.push(name.clone());
                    self.guard_scopes.push((name, self.scope_depth));
                }
            }
        }
        syn::visit::visit_local(self, local);
    }

    fn visit_expr_await(&mut self, await_expr: &'ast ExprAwait) {
        // Acquiring an async lock is itself an await
        if let Expr::MethodCall(call) = &*await_expr.base {
            if Self::is_borrow_method(&call.method.to_string()) {
                syn::visit::visit_expr_await(self, await_expr);
                return;
            }
        }

        if !self.active_guards.is_empty() {
            self.violations.push((
                self.current_file.clone(),
                format!(".await while holding borrow(s): {}", self.active_guards.join(", ")),
            ));
        }

        syn::visit::visit_expr_await(self, await_expr);
    }

    fn visit_block(&mut self, block: &'ast syn::Block) {
        self.scope_depth += 1;
        syn::visit::visit_block(self, block);

        self.guard_scopes
            .retain(|(_, depth)| *depth < self.scope_depth);
        self.active_guards = self
            .guard_scopes
            .iter()
            .map(|(name, _)| name.clone())
            .collect();

        self.scope_depth -= 1;
    }

    fn visit_expr_call(&mut self, call: &'ast syn::ExprCall) {
        if let Expr::Path(path) = &*call.func {
            if path.path.is_ident("drop") {
                if let Some(Expr::Path(arg_path)) = call.args.first() {
                    if let Some(ident) = arg_path.path.get_ident() {
                        let name = ident.to_string();
                        self.active_guards.retain(|g| g != &name);
                        self.guard_scopes.retain(|(g, _)| g != &name);
                    }
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

    let mut visitor = BorrowAcrossAwaitVisitor::new(name.to_string());
    visitor.visit_file(&syntax);
    visitor.violations
}

fn analyze_file(path: &Path) -> Vec<(String, String)> {
    match fs::read_to_string(path) {
        Ok(content) => analyze_source(&path.display().to_string(), &content),
        Err(_) => vec![],
    }
}

#[test]
fn detects_borrow_held_across_await() {
    let bad_code = r#"
        async fn example(cache: &Cache) {
            let mut entries = cache.entries.borrow_mut();
            fetch().await;  // BAD
        }
    "#;
    assert!(!analyze_source("test.rs", bad_code).is_empty());
}

#[test]
fn detects_signal_read_held_across_await() {
    let bad_code = r#"
        async fn example(session: Signal<Session>) {
            let current: Ref<Session> = session.read();
            refresh().await;  // BAD
        }
    "#;
    assert!(!analyze_source("test.rs", bad_code).is_empty());
}

#[test]
fn allows_borrow_released_before_await() {
    let good_code = r#"
        async fn example(cache: &Cache) {
            let pending = {
                let entries = cache.entries.borrow();
                entries.get(&key).cloned()
            };
            pending.await;  // GOOD - borrow dropped
        }
    "#;
    assert!(analyze_source("test.rs", good_code).is_empty());
}

#[test]
fn allows_explicit_drop_before_await() {
    let good_code = r#"
        async fn example(cache: &Cache) {
            let entries = cache.entries.borrow_mut();
            let value = entries.len();
            drop(entries);
            fetch().await;  // GOOD - explicitly dropped
        }
    "#;
    assert!(analyze_source("test.rs", good_code).is_empty());
}

#[test]
fn allows_temporary_borrow_in_statement() {
    let good_code = r#"
        async fn example(cache: &Cache) {
            let status = cache.session.borrow().status;
            cache.status.borrow_mut().apply(&event);
            fetch().await;  // GOOD - temporaries end with their statement
        }
    "#;
    assert!(analyze_source("test.rs", good_code).is_empty());
}

#[test]
fn no_borrow_across_await_violations() {
    let src_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");

    let mut all_violations = Vec::new();
    for entry in WalkDir::new(&src_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
    {
        all_violations.extend(analyze_file(entry.path()));
    }

    if !all_violations.is_empty() {
        let mut error_msg = String::from(
            "\n\nFound .await while holding a borrow!\n\
             On the single-threaded runtime another task touching the same\n\
             RefCell or signal while this one is suspended will panic.\n\n\
             Fix by copying out what you need before awaiting:\n\
             ```rust\n\
             let pending = {\n\
                 let entries = self.entries.borrow();\n\
                 entries.get(&key).cloned()\n\
             };\n\
             pending.await;\n\
             ```\n\n\
             Violations:\n",
        );

        for (file, context) in &all_violations {
            error_msg.push_str(&format!("  - {}: {}\n", file, context));
        }

        panic!("{}", error_msg);
    }
}
