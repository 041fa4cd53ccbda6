//! Splits raw multi-statement SQL text into discrete executable statements.
//!
//! Semicolons inside single-quoted literals, double-quoted identifiers, or
//! `$$`-delimited blocks (procedural bodies) are not statement boundaries.
//! The splitter never fails: an unterminated quote or block at end of input
//! is flushed as a final statement and left for the database to reject.

/// Split `sql` into trimmed, non-empty statements.
#[must_use]
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut in_dollar_block = false;

    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        // The dollar marker is checked before the quote toggles and
        // suppresses them while the block is open.
        if c == '$' && chars.peek() == Some(&'$') {
            chars.next();
            in_dollar_block = !in_dollar_block;
            current.push_str("$$");
            continue;
        }

        if !in_dollar_block {
            if c == '\'' {
                in_single_quote = !in_single_quote;
            } else if c == '"' {
                in_double_quote = !in_double_quote;
            } else if c == ';' && !in_single_quote && !in_double_quote {
                push_statement(&mut statements, &mut current);
                continue;
            }
        }

        current.push(c);
    }

    // Whatever is left (including an unterminated quote or block) becomes the
    // final statement; malformed SQL surfaces when the database rejects it.
    push_statement(&mut statements, &mut current);

    statements
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
    current.clear();
}
