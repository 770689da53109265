//! The action file-name grammar: `name ('?' prompt_key)* '!'? '.' extension`.
//!
//! Each `?key` segment declares an ordered prompt; a `!` immediately before
//! the extension marks a foreground action. Parsing is purely lexical (the
//! file is never opened or executed) and the raw name is interpreted here
//! and nowhere else.

/// Parsed form of an action file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionName {
    pub display_name: String,
    pub prompts: Vec<String>,
    pub foreground: bool,
}

/// Decode a file name. Infallible: these names are user-authored, so a
/// malformed name (empty display name or empty prompt key) downgrades to a
/// zero-prompt background action instead of being rejected.
pub fn parse(file_name: &str) -> ActionName {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => file_name,
    };

    let foreground = stem.ends_with('!');
    let stem = stem.trim_end_matches('!');

    let mut parts = stem.split('?');
    let display_name = parts.next().unwrap_or_default().to_string();
    let prompts: Vec<String> = parts.map(str::to_string).collect();

    if display_name.is_empty() || prompts.iter().any(String::is_empty) {
        return ActionName {
            display_name: stem.to_string(),
            prompts: Vec::new(),
            foreground: false,
        };
    }

    ActionName {
        display_name,
        prompts,
        foreground,
    }
}
