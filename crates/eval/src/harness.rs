//! Candidate harness and its wire protocol.
//!
//! Every candidate is compiled together with [`HARNESS_SOURCE`] into a
//! standalone executable. The parent talks to it over stdin/stdout, one
//! request and one reply per line:
//!
//! ```text
//! child  -> READY quine-harness/1
//! parent -> SOLVE <n> <v1> .. <vn>
//! child  -> OK <m> <w1> .. <wm>          | ERR <message>
//! parent -> BENCH <warmup> <measured> <n> <v1> .. <vn>
//! child  -> TIMES <k> <t1> .. <tk>       | ERR <message>   (nanoseconds)
//! parent -> QUIT
//! ```

use std::fmt::Write as _;

/// First line a healthy harness prints.
pub const HANDSHAKE: &str = "READY quine-harness/1";

/// File name the candidate is written to, next to the harness.
pub const CANDIDATE_FILE: &str = "candidate.rs";

/// File name of the harness entry point.
pub const HARNESS_FILE: &str = "main.rs";

/// Harness entry point. Mounts `candidate.rs` as a module and pins the
/// contract signature, so a candidate with any other shape fails to build.
pub const HARNESS_SOURCE: &str = r#"#[path = "candidate.rs"]
mod candidate;

use std::io::{self, BufRead, Write};
use std::time::Instant;

const SOLVE: fn(Vec<i32>) -> Vec<i32> = candidate::solve;

fn main() {
    std::panic::set_hook(Box::new(|_| {}));

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    if writeln!(out, "READY quine-harness/1").and_then(|_| out.flush()).is_err() {
        return;
    }

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let mut parts = line.split_ascii_whitespace();
        let reply = match parts.next() {
            Some("SOLVE") => solve_request(&mut parts),
            Some("BENCH") => bench_request(&mut parts),
            Some("QUIT") => break,
            Some(other) => Err(format!("unknown request {}", other)),
            None => Err("empty request".to_string()),
        };
        let reply = reply.unwrap_or_else(|e| format!("ERR {}", e.replace(['\n', '\r'], " ")));
        if writeln!(out, "{}", reply).and_then(|_| out.flush()).is_err() {
            break;
        }
    }
}

fn call(input: Vec<i32>) -> Result<Vec<i32>, String> {
    std::panic::catch_unwind(move || SOLVE(input)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        format!("panic: {}", message)
    })
}

fn read_count<'a>(parts: &mut impl Iterator<Item = &'a str>, what: &str) -> Result<usize, String> {
    parts
        .next()
        .ok_or_else(|| format!("missing {}", what))?
        .parse()
        .map_err(|e| format!("bad {}: {}", what, e))
}

fn read_values<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<Vec<i32>, String> {
    let n = read_count(parts, "length")?;
    let mut values = Vec::with_capacity(n);
    for _ in 0..n {
        let value = parts
            .next()
            .ok_or_else(|| "truncated values".to_string())?
            .parse::<i32>()
            .map_err(|e| format!("bad value: {}", e))?;
        values.push(value);
    }
    Ok(values)
}

fn solve_request<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<String, String> {
    let input = read_values(parts)?;
    let output = call(input)?;
    let mut reply = format!("OK {}", output.len());
    for v in &output {
        reply.push(' ');
        reply.push_str(&v.to_string());
    }
    Ok(reply)
}

fn bench_request<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<String, String> {
    let warmup = read_count(parts, "warmup count")?;
    let measured = read_count(parts, "measured count")?;
    let data = read_values(parts)?;

    for _ in 0..warmup {
        std::hint::black_box(call(data.clone())?);
    }

    let mut reply = format!("TIMES {}", measured);
    for _ in 0..measured {
        let input = data.clone();
        let start = Instant::now();
        let output = call(input)?;
        let elapsed = start.elapsed();
        std::hint::black_box(output);
        reply.push(' ');
        reply.push_str(&elapsed.as_nanos().to_string());
    }
    Ok(reply)
}
"#;

/// A parsed harness reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Output of a `SOLVE` request
    Sorted(Vec<i32>),
    /// Measured durations of a `BENCH` request, in nanoseconds
    Times(Vec<u64>),
    /// The harness caught a fault (usually a panic in the candidate)
    Error(String),
}

/// Encode a `SOLVE` request (without the trailing newline).
pub fn encode_solve(input: &[i32]) -> String {
    let mut line = format!("SOLVE {}", input.len());
    push_values(&mut line, input);
    line
}

/// Encode a `BENCH` request (without the trailing newline).
pub fn encode_bench(warmup: u32, measured: u32, data: &[i32]) -> String {
    let mut line = format!("BENCH {} {} {}", warmup, measured, data.len());
    push_values(&mut line, data);
    line
}

/// Encode the shutdown request.
pub fn encode_quit() -> &'static str {
    "QUIT"
}

fn push_values(line: &mut String, values: &[i32]) {
    line.reserve(values.len() * 7);
    for v in values {
        // Writing to a String cannot fail.
        let _ = write!(line, " {}", v);
    }
}

/// Parse one reply line.
pub fn parse_reply(line: &str) -> Result<Reply, String> {
    let line = line.trim_end();
    if let Some(message) = line.strip_prefix("ERR") {
        return Ok(Reply::Error(message.trim().to_string()));
    }

    let mut parts = line.split_ascii_whitespace();
    match parts.next() {
        Some("OK") => parse_counted(&mut parts).map(Reply::Sorted),
        Some("TIMES") => parse_counted(&mut parts).map(Reply::Times),
        Some(other) => Err(format!("unexpected reply `{}`", truncate(other, 64))),
        None => Err("empty reply".to_string()),
    }
}

fn parse_counted<'a, T: std::str::FromStr>(
    parts: &mut impl Iterator<Item = &'a str>,
) -> Result<Vec<T>, String>
where
    T::Err: std::fmt::Display,
{
    let n: usize = parts
        .next()
        .ok_or("reply is missing its count")?
        .parse()
        .map_err(|e| format!("bad reply count: {}", e))?;
    let values = parts
        .map(|p| p.parse::<T>().map_err(|e| format!("bad reply value `{}`: {}", truncate(p, 32), e)))
        .collect::<Result<Vec<T>, String>>()?;
    if values.len() != n {
        return Err(format!("reply announced {} values but carried {}", n, values.len()));
    }
    Ok(values)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_requests() {
        assert_eq!(encode_solve(&[5, -3, 1]), "SOLVE 3 5 -3 1");
        assert_eq!(encode_solve(&[]), "SOLVE 0");
        assert_eq!(encode_bench(3, 5, &[2, 1]), "BENCH 3 5 2 2 1");
    }

    #[test]
    fn test_parse_sorted_reply() {
        assert_eq!(parse_reply("OK 3 -1 0 7\n"), Ok(Reply::Sorted(vec![-1, 0, 7])));
        assert_eq!(parse_reply("OK 0"), Ok(Reply::Sorted(vec![])));
    }

    #[test]
    fn test_parse_times_reply() {
        assert_eq!(parse_reply("TIMES 2 1500 1700"), Ok(Reply::Times(vec![1500, 1700])));
    }

    #[test]
    fn test_parse_error_reply() {
        assert_eq!(
            parse_reply("ERR panic: index out of bounds"),
            Ok(Reply::Error("panic: index out of bounds".to_string()))
        );
    }

    #[test]
    fn test_count_mismatch_is_rejected() {
        let err = parse_reply("OK 3 1 2").unwrap_err();
        assert!(err.contains("announced 3"));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(parse_reply("hello from candidate").is_err());
        assert!(parse_reply("").is_err());
        assert!(parse_reply("OK x 1").is_err());
        assert!(parse_reply("TIMES 1 -5").is_err());
    }

    #[test]
    fn test_harness_pins_contract() {
        assert!(HARNESS_SOURCE.contains("const SOLVE: fn(Vec<i32>) -> Vec<i32> = candidate::solve;"));
        assert!(HARNESS_SOURCE.contains(HANDSHAKE));
        assert!(HARNESS_SOURCE.contains(CANDIDATE_FILE));
    }

    #[test]
    fn test_harness_does_not_call_builtin_sort() {
        for pattern in quine_core::DEFAULT_FORBIDDEN_PATTERNS {
            assert!(!HARNESS_SOURCE.contains(pattern), "harness contains {}", pattern);
        }
    }
}
