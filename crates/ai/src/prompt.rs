//! Prompt construction and reply cleanup.

use regex::Regex;

const FENCED_BLOCK: &str = r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n(.*?)```";

/// Build the mutation request for `source`.
pub fn build_prompt(source: &str) -> String {
    format!(
        r#"You are an expert in algorithm optimisation. Improve the sorting code below.

Strategies, in order of preference:
1. Optimise the current algorithm (early exit, fewer comparisons, fewer swaps).
2. Try a close variant (bubble sort -> cocktail sort -> comb sort).
3. Gradually bring in more efficient ideas (gaps, partitioning, divide and conquer).
4. If the current algorithm is hard to improve further, switch to a faster one.

Guidelines:
- Every change must have a clear optimisation intent.
- Prefer incremental improvements over large jumps.
- Do not add any comments.

Hard rules:
1. Keep exactly this entry point: pub fn solve(input: Vec<i32>) -> Vec<i32>
2. Never call the standard library sorts (slice sort methods, BinaryHeap, BTreeMap, BTreeSet).
3. Use only the standard library; no external crates.
4. Return the complete Rust source only, with no Markdown fences and no explanation.

Current code:
{source}

Return the complete improved Rust code:
"#
    )
}

/// Strip Markdown code fences from a model reply and trim it.
///
/// When the reply holds a fenced block, its body wins over any prose around
/// it.
pub fn clean_code(reply: &str) -> String {
    if let Ok(re) = Regex::new(FENCED_BLOCK) {
        if let Some(body) = re.captures(reply).and_then(|c| c.get(1)) {
            return body.as_str().trim().to_string();
        }
    }
    let mut text = reply.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || "_+-".contains(c));
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_carries_contract_and_source() {
        let prompt = build_prompt("pub fn solve(input: Vec<i32>) -> Vec<i32> { input }");
        assert!(prompt.contains("pub fn solve(input: Vec<i32>) -> Vec<i32>\n"));
        assert!(prompt.contains("Never call the standard library sorts"));
        assert!(prompt.contains("Current code:\npub fn solve(input: Vec<i32>) -> Vec<i32> { input }\n"));
    }

    #[test]
    fn test_clean_plain_reply() {
        assert_eq!(clean_code("\n  pub fn solve() {}  \n"), "pub fn solve() {}");
    }

    #[test]
    fn test_clean_rust_fence() {
        let reply = "```rust\npub fn solve(v: Vec<i32>) -> Vec<i32> {\n    v\n}\n```\n";
        assert_eq!(clean_code(reply), "pub fn solve(v: Vec<i32>) -> Vec<i32> {\n    v\n}");
    }

    #[test]
    fn test_clean_bare_fence_with_prose() {
        let reply = "Here is a faster version:\n```\npub fn solve(v: Vec<i32>) -> Vec<i32> { v }\n```\nIt uses insertion sort.";
        assert_eq!(clean_code(reply), "pub fn solve(v: Vec<i32>) -> Vec<i32> { v }");
    }

    #[test]
    fn test_clean_unterminated_fence() {
        let reply = "```rust\npub fn solve(v: Vec<i32>) -> Vec<i32> { v }";
        assert_eq!(clean_code(reply), "pub fn solve(v: Vec<i32>) -> Vec<i32> { v }");
    }

    #[test]
    fn test_clean_empty_fence() {
        assert_eq!(clean_code("```rust\n```"), "");
    }
}
