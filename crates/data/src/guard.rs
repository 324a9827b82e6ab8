//! Read-only guard for generated SQL.
//!
//! Generated queries are untrusted. Before a statement reaches SQLite it must
//! be a single `SELECT`/`WITH` statement; after preparation SQLite itself must
//! report it as read-only. Connections are opened read-only as well.

use medassist_core::{AppError, AppResult};

const ALLOWED_LEADING_KEYWORDS: [&str; 2] = ["SELECT", "WITH"];

/// Validate `sql` and return the statement without trailing semicolons.
///
/// Comments after the final `;` are dropped along with it.
pub fn check_statement(sql: &str) -> AppResult<&str> {
    let mut statement = sql.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace());

    if let Some(at) = find_statement_separator(statement) {
        if !is_only_comments(&statement[at + 1..]) {
            return Err(AppError::Database("Only a single statement is allowed".to_string()));
        }
        statement = statement[..at].trim_end();
    }

    if statement.is_empty() {
        return Err(AppError::Database("Query is empty".to_string()));
    }

    let body = skip_leading_comments(statement);
    let keyword: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase();

    if !ALLOWED_LEADING_KEYWORDS.contains(&keyword.as_str()) {
        return Err(AppError::Database(format!(
            "Only read queries are allowed (SELECT or WITH), got: {}",
            if keyword.is_empty() { "<none>" } else { keyword.as_str() }
        )));
    }

    Ok(statement)
}

/// Skip whitespace, `-- line` and `/* block */` comments at the start.
fn skip_leading_comments(mut sql: &str) -> &str {
    loop {
        sql = sql.trim_start();
        if let Some(rest) = sql.strip_prefix("--") {
            sql = rest.find('\n').map(|i| &rest[i + 1..]).unwrap_or("");
        } else if let Some(rest) = sql.strip_prefix("/*") {
            sql = rest.find("*/").map(|i| &rest[i + 2..]).unwrap_or("");
        } else {
            return sql;
        }
    }
}

/// True if nothing but whitespace, comments and stray `;` remain.
fn is_only_comments(mut sql: &str) -> bool {
    loop {
        sql = skip_leading_comments(sql);
        match sql.strip_prefix(';') {
            Some(rest) => sql = rest,
            None => return sql.is_empty(),
        }
    }
}

/// Byte offset of the first `;` outside string literals, quoted identifiers
/// and comments.
fn find_statement_separator(sql: &str) -> Option<usize> {
    let mut chars = sql.char_indices().peekable();
    let mut quote: Option<char> = None;

    while let Some((at, c)) = chars.next() {
        match quote {
            Some(q) if c == q => {
                // doubled quote is an escaped quote
                if chars.peek().map(|&(_, next)| next) == Some(q) {
                    chars.next();
                } else {
                    quote = None;
                }
            }
            Some(_) => {}
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '[' => quote = Some(']'),
                '-' if chars.peek().map(|&(_, next)| next) == Some('-') => {
                    for (_, next) in chars.by_ref() {
                        if next == '\n' {
                            break;
                        }
                    }
                }
                '/' if chars.peek().map(|&(_, next)| next) == Some('*') => {
                    chars.next();
                    let mut prev = '\0';
                    for (_, next) in chars.by_ref() {
                        if prev == '*' && next == '/' {
                            break;
                        }
                        prev = next;
                    }
                }
                ';' => return Some(at),
                _ => {}
            },
        }
    }

    None
}
