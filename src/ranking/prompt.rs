//! Prompt construction.

/// Number of companies each backend is asked for.
pub const DEFAULT_TOP_K: usize = 10;

/// Instruction sent to every backend. `{top_k}` and `{industry}` are
/// substituted at request time.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "List the top {top_k} most popular companies in the \
{industry} industry. Return ONLY a comma-separated list of company names, with no numbering \
and no extra commentary.";

/// Fill in the template. The industry is inserted verbatim.
pub fn build_prompt(template: &str, industry: &str, top_k: usize) -> String {
    // Industry goes in last so its text is never re-scanned for placeholders.
    template
        .replace("{top_k}", &top_k.to_string())
        .replace("{industry}", industry)
}
