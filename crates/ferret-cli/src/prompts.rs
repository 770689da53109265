use ferret_core::invoke::PromptSource;
use std::io::{BufRead, Write};

/// Reads prompt values line by line from the terminal. An empty line is an
/// empty value; EOF (Ctrl-D) cancels the invocation.
pub struct TerminalPrompts;

impl PromptSource for TerminalPrompts {
    fn collect(&mut self, key: &str) -> Option<String> {
        eprint!("{key}: ");
        let _ = std::io::stderr().flush();

        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}
