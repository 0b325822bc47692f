//! Splits `head, ... | filter(args) | filter` pipelines.
//!
//! The scanner tracks string literals (single, double, backtick), regex
//! literals, and bracket depth so that only top-level `|` and `,` act as
//! separators. `||` is never treated as a pipe.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCall {
    pub name: String,
    pub arguments: Vec<String>,
}

impl FilterCall {
    pub fn new(name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pipeline {
    /// Comma-separated head expressions, trimmed source text.
    pub expressions: Vec<String>,
    pub filters: Vec<FilterCall>,
}

impl Pipeline {
    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }
}

/// Characters after which a `/` is a division operator rather than the
/// start of a regex literal.
fn is_division_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b')' | b'.' | b'+' | b'-' | b'_' | b'$' | b']')
}

#[derive(Default)]
struct Scanner {
    in_single: bool,
    in_double: bool,
    in_template: bool,
    in_regex: bool,
    curly: i32,
    square: i32,
    paren: i32,
}

impl Scanner {
    fn at_top_level(&self) -> bool {
        self.curly == 0 && self.square == 0 && self.paren == 0
    }
}

pub fn split_pipeline(input: &str) -> Pipeline {
    let bytes = input.as_bytes();
    let mut st = Scanner::default();
    let mut pipeline = Pipeline::default();

    let mut expr_start = 0usize;
    let mut parsing_filters = false;
    let mut filter_start = 0usize;
    let mut arg_start: Option<usize> = None;
    let mut arg_end: Option<usize> = None;

    let mut prev: u8 = 0;
    for i in 0..bytes.len() {
        let c = bytes[i];
        if st.in_single {
            if c == b'\'' && prev != b'\\' {
                st.in_single = false;
            }
        } else if st.in_double {
            if c == b'"' && prev != b'\\' {
                st.in_double = false;
            }
        } else if st.in_template {
            if c == b'`' && prev != b'\\' {
                st.in_template = false;
            }
        } else if st.in_regex {
            if c == b'/' && prev != b'\\' {
                st.in_regex = false;
            }
        } else if c == b'|'
            && bytes.get(i + 1) != Some(&b'|')
            && (i == 0 || bytes[i - 1] != b'|')
            && st.at_top_level()
        {
            if parsing_filters {
                pipeline.filters.push(filter_call(input, filter_start, i, arg_start, arg_end));
                arg_start = None;
                arg_end = None;
            } else {
                pipeline.expressions.push(input[expr_start..i].trim().to_string());
                parsing_filters = true;
            }
            filter_start = i + 1;
        } else if c == b',' && !parsing_filters && st.at_top_level() {
            pipeline.expressions.push(input[expr_start..i].trim().to_string());
            expr_start = i + 1;
        } else {
            match c {
                b'"' => st.in_double = true,
                b'\'' => st.in_single = true,
                b'`' => st.in_template = true,
                b'(' => {
                    if parsing_filters && st.paren == 0 {
                        arg_start = Some(i + 1);
                    }
                    st.paren += 1;
                }
                b')' => {
                    st.paren -= 1;
                    if parsing_filters && st.paren == 0 {
                        arg_end = Some(i);
                    }
                }
                b'[' => st.square += 1,
                b']' => st.square -= 1,
                b'{' => st.curly += 1,
                b'}' => st.curly -= 1,
                b'/' => {
                    let before = bytes[..i].iter().rev().find(|b| **b != b' ');
                    if !before.is_some_and(|p| is_division_char(*p)) {
                        st.in_regex = true;
                    }
                }
                _ => {}
            }
        }
        prev = c;
    }

    if parsing_filters {
        pipeline
            .filters
            .push(filter_call(input, filter_start, bytes.len(), arg_start, arg_end));
    } else {
        pipeline.expressions.push(input[expr_start..].trim().to_string());
    }
    pipeline
}

fn filter_call(
    input: &str,
    start: usize,
    end: usize,
    arg_start: Option<usize>,
    arg_end: Option<usize>,
) -> FilterCall {
    let body = input[start..end].trim();
    match (body.find('('), arg_start) {
        (Some(open), Some(args_from)) => {
            let args_to = arg_end.filter(|e| *e >= args_from).unwrap_or(end);
            let args = &input[args_from..args_to];
            let arguments = if args.trim().is_empty() {
                Vec::new()
            } else {
                split_pipeline(args).expressions
            };
            FilterCall::new(body[..open].trim(), arguments)
        }
        _ => FilterCall::new(body, Vec::new()),
    }
}
