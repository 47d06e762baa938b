use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MULTI_WHITESPACE: Regex = Regex::new(r"\s{2,}").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s").unwrap();
    static ref NON_NAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_-]").unwrap();
    static ref EMPTY_BLOCK: Regex = Regex::new(r"\s*\w+\s+\{\s+\}").unwrap();
}

/// Make a value safe for a single-line quoted HCL string
pub fn hcl_string(input: &str) -> String {
    let escaped = input
        .replace('\r', "\\r")
        .replace('\n', "\\n")
        .replace('"', "'");
    MULTI_WHITESPACE
        .replace_all(&escaped, " ")
        .trim()
        .to_string()
}

/// Prepare a value for a heredoc: trailing whitespace removed and `${`
/// doubled so Terraform doesn't interpolate it
pub fn heredoc(input: &str) -> String {
    input.trim_end().replace("${", "$${")
}

/// Reduce a display name to a Terraform identifier / filename stem.
/// With an id, the result is `<id>-<name>`.
pub fn normalize_name(name: &str, id: Option<i64>) -> String {
    let underscored = WHITESPACE.replace_all(name, "_");
    let cleaned = NON_NAME_CHARS.replace_all(&underscored, "").to_string();
    match id {
        Some(id) => format!("{}-{}", id, cleaned),
        None => cleaned,
    }
}

/// File stem for a rendered resource
pub fn build_filename(name: &str, aws_managed: bool, prepend_id: bool, id: i64) -> String {
    let base = if aws_managed {
        format!("AWS_Managed_{}", name)
    } else {
        name.to_string()
    };
    normalize_name(&base, prepend_id.then_some(id))
}

/// One `attr { id = N }` block per id, or a single empty block
pub fn id_blocks(attribute: &str, ids: &[i64]) -> String {
    if ids.is_empty() {
        return format!("{} {{ }}", attribute);
    }
    ids.iter()
        .map(|id| format!("{} {{ id = {} }}", attribute, id))
        .collect::<Vec<_>>()
        .join("\n    ")
}

/// Drop the empty `attr { }` blocks left over from [`id_blocks`]
pub fn strip_empty_blocks(content: &str) -> String {
    EMPTY_BLOCK.replace_all(content, "").to_string()
}

/// Render a boolean the way HCL spells it
pub fn hcl_bool(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
