//! Simple CLI that reads HTML from stdin and outputs JSON to stdout.
//! Useful for piping documents through the sanitizer from other tooling.

use scour::{sanitize_bytes, Config, Specification};
use serde::Serialize;
use std::io::{self, Read};

#[derive(Serialize)]
struct Output {
    sanitized: String,
    bytes_in: usize,
    bytes_out: usize,
}

fn main() {
    // Read HTML bytes from stdin; encoding is sniffed from meta tags.
    let mut html = Vec::new();
    if io::stdin().read_to_end(&mut html).is_err() {
        eprintln!("Failed to read from stdin");
        std::process::exit(1);
    }

    let sanitized = sanitize_bytes(&html, &Config::default(), &Specification::default());

    let output = Output {
        bytes_in: html.len(),
        bytes_out: sanitized.len(),
        sanitized,
    };

    println!("{}", serde_json::to_string(&output).unwrap_or_default());
}
