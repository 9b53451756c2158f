//! Tests for check, fetch, scrape and api subcommands.

use super::{parse, parse_err};
use crate::cli::CliCommand;
use fetchguard_core::gate::ResolutionFailurePolicy;
use fetchguard_core::http::Method;

#[test]
fn cli_parse_check_defaults() {
    match parse(&["fetchguard", "check", "https://example.com/"]) {
        CliCommand::Check {
            urls,
            resolve,
            on_resolution_failure,
            json,
        } => {
            assert_eq!(urls, vec!["https://example.com/"]);
            assert!(resolve.is_empty());
            assert!(on_resolution_failure.is_none());
            assert!(!json);
        }
        _ => panic!("expected Check"),
    }
}

#[test]
fn cli_parse_check_all_flags() {
    match parse(&[
        "fetchguard",
        "check",
        "http://a.test/",
        "http://b.test/",
        "--resolve",
        "a.test=10.0.0.1",
        "--resolve",
        "b.test=93.184.216.34",
        "--on-resolution-failure",
        "deny",
        "--json",
    ]) {
        CliCommand::Check {
            urls,
            resolve,
            on_resolution_failure,
            json,
        } => {
            assert_eq!(urls.len(), 2);
            assert_eq!(resolve, vec!["a.test=10.0.0.1", "b.test=93.184.216.34"]);
            assert_eq!(on_resolution_failure, Some(ResolutionFailurePolicy::Deny));
            assert!(json);
        }
        _ => panic!("expected Check with flags"),
    }
}

#[test]
fn cli_parse_check_requires_url() {
    parse_err(&["fetchguard", "check"]);
}

#[test]
fn cli_parse_check_rejects_unknown_policy() {
    parse_err(&["fetchguard", "check", "http://a.test/", "--on-resolution-failure", "maybe"]);
}

#[test]
fn cli_parse_fetch() {
    match parse(&["fetchguard", "fetch", "https://example.com/a.txt", "-o", "/tmp/a.txt"]) {
        CliCommand::Fetch { url, output } => {
            assert_eq!(url, "https://example.com/a.txt");
            assert_eq!(output.as_deref(), Some(std::path::Path::new("/tmp/a.txt")));
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_parse_scrape_defaults() {
    match parse(&["fetchguard", "scrape", "https://news.example.com/list"]) {
        CliCommand::Scrape {
            base_url,
            pages,
            delay,
            json,
        } => {
            assert_eq!(base_url, "https://news.example.com/list");
            assert_eq!(pages, 5);
            assert_eq!(delay, 1.0);
            assert!(!json);
        }
        _ => panic!("expected Scrape"),
    }
}

#[test]
fn cli_parse_scrape_pages_delay_and_json() {
    match parse(&[
        "fetchguard",
        "scrape",
        "https://x.test/",
        "--pages",
        "2",
        "--delay",
        "0.5",
        "--json",
    ]) {
        CliCommand::Scrape {
            pages, delay, json, ..
        } => {
            assert_eq!(pages, 2);
            assert_eq!(delay, 0.5);
            assert!(json);
        }
        _ => panic!("expected Scrape"),
    }
}

#[test]
fn cli_parse_api() {
    match parse(&[
        "fetchguard",
        "api",
        "post",
        "https://api.example.com/v1",
        "users",
        "--data",
        r#"{"name":"kim"}"#,
        "--api-key",
        "secret",
    ]) {
        CliCommand::Api {
            method,
            base_url,
            endpoint,
            data,
            api_key,
        } => {
            assert_eq!(method, Method::Post);
            assert_eq!(base_url, "https://api.example.com/v1");
            assert_eq!(endpoint, "users");
            assert_eq!(data.as_deref(), Some(r#"{"name":"kim"}"#));
            assert_eq!(api_key.as_deref(), Some("secret"));
        }
        _ => panic!("expected Api"),
    }
}

#[test]
fn cli_parse_api_rejects_unknown_method() {
    parse_err(&["fetchguard", "api", "BREW", "https://api.example.com", "pot"]);
}
