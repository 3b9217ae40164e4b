//! Console reporting of render results.
//!
//! Two flavors: the verbose report prints one line per test case, the
//! short report prints a progress character per case and details failures
//! only in the summary. Both can show per-case timing.

use crate::render::{RenderResult, ResultState};
use std::io::Write;

#[derive(Debug)]
pub enum Report {
    Console(ConsoleReport),
    Short(ConsoleShortReport),
}

impl Report {
    pub fn console(show_duration: bool) -> Self {
        Report::Console(ConsoleReport { show_duration })
    }

    pub fn short(show_duration: bool) -> Self {
        Report::Short(ConsoleShortReport { show_duration })
    }

    /// Records one finished test case
    pub fn add(&mut self, result: &RenderResult) {
        match self {
            Report::Console(report) => report.add(result),
            Report::Short(report) => report.add(result),
        }
    }

    /// Prints the closing summary and returns the number of failed cases,
    /// which doubles as the process exit code
    pub fn summarize(&self, results: &[RenderResult]) -> usize {
        let failures: Vec<&RenderResult> = results
            .iter()
            .filter(|r| r.state == ResultState::Fail)
            .collect();

        if let Report::Short(_) = self {
            println!();
            for failure in &failures {
                println!(
                    "FAIL {} ({}): {}",
                    failure.name,
                    failure.renderer_name,
                    failure.error.as_deref().unwrap_or("unknown error")
                );
            }
        }

        println!(
            "{} test case{} run, {} failed",
            results.len(),
            if results.len() == 1 { "" } else { "s" },
            failures.len()
        );

        let show_duration = match self {
            Report::Console(report) => report.show_duration,
            Report::Short(report) => report.show_duration,
        };
        if show_duration {
            let total: std::time::Duration = results.iter().map(|r| r.duration).sum();
            println!("total render time: {}", format_duration(total));
        }

        failures.len()
    }
}

#[derive(Debug)]
pub struct ConsoleReport {
    show_duration: bool,
}

impl ConsoleReport {
    fn add(&mut self, result: &RenderResult) {
        match result.state {
            ResultState::Ok => {
                let path = result
                    .image_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                if self.show_duration {
                    println!(
                        "OK   {path} ({} avg over {} iteration{})",
                        format_duration(result.average_duration()),
                        result.iterations,
                        if result.iterations == 1 { "" } else { "s" }
                    );
                } else {
                    println!("OK   {path}");
                }
            }
            ResultState::Fail => {
                println!(
                    "FAIL {} ({}): {}",
                    result.name,
                    result.renderer_name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }
}

#[derive(Debug)]
pub struct ConsoleShortReport {
    show_duration: bool,
}

impl ConsoleShortReport {
    fn add(&mut self, result: &RenderResult) {
        match result.state {
            ResultState::Ok => print!("."),
            ResultState::Fail => print!("F"),
        }
        let _ = std::io::stdout().flush();
    }
}

fn format_duration(duration: std::time::Duration) -> String {
    format!("{:.1} ms", duration.as_secs_f64() * 1000.0)
}
