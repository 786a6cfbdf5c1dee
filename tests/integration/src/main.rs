//! Integration Test Harness
//!
//! Runs all integration test categories and prints a summary.
//!
//! # Usage
//!
//! Run all tests:
//! ```text
//! cargo run -p integration-tests
//! ```
//!
//! Run specific test categories:
//! ```text
//! cargo test -p integration-tests --test codec_tests
//! cargo test -p integration-tests --test session_tests
//! cargo test -p integration-tests --test dispatch_tests
//! cargo test -p integration-tests --test stress_tests
//! ```

use std::process::Command;
use std::time::{Duration, Instant};

/// Test category
#[derive(Debug, Clone)]
struct TestCategory {
    name: &'static str,
    description: &'static str,
    test_name: &'static str,
}

const TEST_CATEGORIES: &[TestCategory] = &[
    TestCategory {
        name: "Codec Tests",
        description: "Array bounds, truncation, pointer order, unions, handles",
        test_name: "codec_tests",
    },
    TestCategory {
        name: "Session Tests",
        description: "Context handle lifecycle and outcome codes",
        test_name: "session_tests",
    },
    TestCategory {
        name: "Dispatch Tests",
        description: "Opnum routing, interface matching, fault mapping",
        test_name: "dispatch_tests",
    },
    TestCategory {
        name: "Stress Tests",
        description: "Concurrent clients sharing one dispatcher",
        test_name: "stress_tests",
    },
];

/// Outcome of one category run
struct CategoryResult {
    name: &'static str,
    passed: bool,
    duration: Duration,
    detail: String,
}

fn print_banner() {
    println!("{}", "=".repeat(80));
    println!("     NDR Engine and Dispatcher - Integration Test Suite");
    println!("{}", "=".repeat(80));
    println!("Test Categories:");
    for (i, cat) in TEST_CATEGORIES.iter().enumerate() {
        println!("  {}. {} - {}", i + 1, cat.name, cat.description);
    }
    println!("{}", "-".repeat(80));
}

fn run_category(category: &TestCategory) -> CategoryResult {
    println!("\nRunning: {}", category.name);

    let start = Instant::now();
    let output = Command::new("cargo")
        .args(["test", "-p", "integration-tests", "--test", category.test_name])
        .output();
    let duration = start.elapsed();

    let (passed, detail) = match output {
        Ok(output) => {
            print!("{}", String::from_utf8_lossy(&output.stdout));
            eprint!("{}", String::from_utf8_lossy(&output.stderr));
            match output.status.code() {
                Some(0) => (true, "PASSED".to_string()),
                code => (false, format!("FAILED (exit code: {:?})", code)),
            }
        }
        Err(e) => (false, format!("Failed to execute: {}", e)),
    };

    CategoryResult {
        name: category.name,
        passed,
        duration,
        detail,
    }
}

fn main() {
    print_banner();

    let total_start = Instant::now();
    let results: Vec<CategoryResult> = TEST_CATEGORIES.iter().map(run_category).collect();
    let failed = results.iter().filter(|r| !r.passed).count();

    println!("\n{}", "=".repeat(80));
    println!(
        "Categories: {} | Passed: {} | Failed: {} | Total: {:?}",
        results.len(),
        results.len() - failed,
        failed,
        total_start.elapsed()
    );
    println!("{:<20} {:<6} {:<15} Details", "Category", "Status", "Duration");
    for r in &results {
        let status = if r.passed { "PASS" } else { "FAIL" };
        println!("{:<20} {:<6} {:<15?} {}", r.name, status, r.duration, r.detail);
    }

    std::process::exit(if failed > 0 { 1 } else { 0 });
}
