// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Parser for a single program line: `var = OPCODE(key1=expr1, key2=expr2, ...)`.

use logos::Logos;
use std::collections::HashSet;

use crate::dsl::lexer::{tokenize, Spanned, Token};
use crate::dsl::step::{ArgExpr, Literal, Step, StepHeader};
use crate::errors::{InterpreterError, InterpreterResult};

/// Parse a full step, including its keyword arguments.
///
/// # Errors
/// Returns [`InterpreterError::Parse`] when the line is not a single assignment of
/// a call expression with keyword-only arguments.
///
/// # Example
/// ```
/// use visprog::dsl::{parse_step, ArgExpr, Literal};
///
/// let step = parse_step(r#"ANSWER0=VQA(image=LEFT,question="Is the dog's toy red?")"#).unwrap();
/// assert_eq!(step.opcode, "VQA");
/// assert_eq!(
///     step.get("question"),
///     Some(&ArgExpr::Literal(Literal::Str("Is the dog's toy red?".to_string())))
/// );
/// ```
pub fn parse_step(line: &str) -> InterpreterResult<Step> {
    let line = line.trim();
    let tokens = tokenize(line)
        .map_err(|offset| InterpreterError::parse(line, format!("invalid token at offset {}", offset)))?;

    let (output_var, opcode) = header_from_tokens(line, &tokens)?;

    // tokens[3] is the opening parenthesis of the call
    let close = matching_close(&tokens, 3)
        .ok_or_else(|| InterpreterError::parse(line, "unbalanced parentheses in argument list"))?;
    if close != tokens.len() - 1 {
        return Err(InterpreterError::parse(line, "unexpected tokens after the closing parenthesis"));
    }

    let mut args = Vec::new();
    let mut seen = HashSet::new();
    for segment in split_top_level(&tokens[4..close]) {
        if segment.is_empty() {
            // Tolerates a trailing comma; an empty argument anywhere else is an error.
            if !args.is_empty() && segment_is_last(&tokens[4..close], segment) {
                continue;
            }
            return Err(InterpreterError::parse(line, "empty argument in argument list"));
        }

        let (key, value_tokens) = match segment {
            [Spanned { token: Token::Ident(key), .. }, Spanned { token: Token::Assign, .. }, rest @ ..] => {
                (key.clone(), rest)
            }
            _ => {
                return Err(InterpreterError::parse(
                    line,
                    "positional arguments are not supported; use key=value",
                ))
            }
        };
        if value_tokens.is_empty() {
            return Err(InterpreterError::parse(line, format!("argument '{}' has no value", key)));
        }
        if !seen.insert(key.clone()) {
            return Err(InterpreterError::parse(line, format!("duplicate keyword argument '{}'", key)));
        }

        args.push((key, classify(line, value_tokens)));
    }

    Ok(Step {
        output_var,
        opcode,
        args,
        line: line.to_string(),
    })
}

/// Extract only the output variable and opcode, without parsing arguments.
///
/// Used to pick a handler before the handler's own full parse.
pub fn parse_step_header(line: &str) -> InterpreterResult<StepHeader> {
    let line = line.trim();
    let mut lexer = Token::lexer(line);
    let mut tokens = Vec::with_capacity(4);
    while tokens.len() < 4 {
        match lexer.next() {
            Some(Ok(token)) => tokens.push(Spanned {
                token,
                span: lexer.span(),
            }),
            Some(Err(())) => {
                return Err(InterpreterError::parse(
                    line,
                    format!("invalid token at offset {}", lexer.span().start),
                ))
            }
            None => break,
        }
    }
    let (output_var, opcode) = header_from_tokens(line, &tokens)?;
    Ok(StepHeader { output_var, opcode })
}

fn header_from_tokens(line: &str, tokens: &[Spanned]) -> InterpreterResult<(String, String)> {
    let output_var = match tokens.first().map(|t| &t.token) {
        Some(Token::Ident(name)) => name.clone(),
        _ => return Err(InterpreterError::parse(line, "expected an output variable name")),
    };
    if !matches!(tokens.get(1).map(|t| &t.token), Some(Token::Assign)) {
        return Err(InterpreterError::parse(line, "expected '=' after the output variable"));
    }
    let opcode = match tokens.get(2).map(|t| &t.token) {
        Some(Token::Ident(name)) => name.clone(),
        _ => return Err(InterpreterError::parse(line, "right-hand side is not a call expression")),
    };
    if !matches!(tokens.get(3).map(|t| &t.token), Some(Token::LParen)) {
        return Err(InterpreterError::parse(line, "right-hand side is not a call expression"));
    }
    Ok((output_var, opcode))
}

fn opens(token: &Token) -> bool {
    matches!(token, Token::LParen | Token::LBracket | Token::LBrace)
}

fn closes(token: &Token) -> bool {
    matches!(token, Token::RParen | Token::RBracket | Token::RBrace)
}

/// Index of the bracket closing the one at `open`, if the nesting is balanced.
fn matching_close(tokens: &[Spanned], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, t) in tokens.iter().enumerate().skip(open) {
        if opens(&t.token) {
            depth += 1;
        } else if closes(&t.token) {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Split a token run at commas that are not nested inside brackets.
fn split_top_level(tokens: &[Spanned]) -> Vec<&[Spanned]> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, t) in tokens.iter().enumerate() {
        if opens(&t.token) {
            depth += 1;
        } else if closes(&t.token) {
            depth = depth.saturating_sub(1);
        } else if t.token == Token::Comma && depth == 0 {
            segments.push(&tokens[start..i]);
            start = i + 1;
        }
    }
    segments.push(&tokens[start..]);
    segments
}

fn segment_is_last(all: &[Spanned], segment: &[Spanned]) -> bool {
    std::ptr::eq(segment.as_ptr(), all[all.len()..].as_ptr())
}

/// Turn the tokens of one argument value into an [`ArgExpr`].
fn classify(line: &str, tokens: &[Spanned]) -> ArgExpr {
    if let Some(lit) = literal(tokens) {
        return ArgExpr::Literal(lit);
    }
    match tokens {
        [Spanned { token: Token::Ident(name), .. }] => return ArgExpr::Var(name.clone()),
        // Single-argument wrapper call such as str("x"): unwrap to the inner expression.
        [Spanned { token: Token::Ident(_), .. }, Spanned { token: Token::LParen, .. }, inner @ .., Spanned { token: Token::RParen, .. }]
            if !inner.is_empty()
                && matching_close(tokens, 1) == Some(tokens.len() - 1)
                && split_top_level(inner).len() == 1 =>
        {
            return classify(line, inner);
        }
        _ => {}
    }
    if let Some(items) = literal_list(tokens) {
        return ArgExpr::List(items);
    }
    let start = tokens[0].span.start;
    let end = tokens[tokens.len() - 1].span.end;
    ArgExpr::Raw(line[start..end].to_string())
}

fn literal(tokens: &[Spanned]) -> Option<Literal> {
    match tokens {
        [t] => match &t.token {
            Token::Str(s) => Some(Literal::Str(s.clone())),
            Token::Int(i) => Some(Literal::Int(*i)),
            Token::Float(f) => Some(Literal::Float(*f)),
            Token::Ident(name) => match name.as_str() {
                "True" => Some(Literal::Bool(true)),
                "False" => Some(Literal::Bool(false)),
                "None" => Some(Literal::None),
                _ => None,
            },
            _ => None,
        },
        [Spanned { token: Token::Minus, .. }, t] => match &t.token {
            Token::Int(i) => Some(Literal::Int(-i)),
            Token::Float(f) => Some(Literal::Float(-f)),
            _ => None,
        },
        _ => None,
    }
}

/// Bracketed or parenthesised list of literals: `['a', 'b']`, `(1, 2)`, `[]`.
fn literal_list(tokens: &[Spanned]) -> Option<Vec<Literal>> {
    let (first, last) = (&tokens.first()?.token, &tokens.last()?.token);
    let bracketed = matches!((first, last), (Token::LBracket, Token::RBracket) | (Token::LParen, Token::RParen));
    if !bracketed || tokens.len() < 2 || matching_close(tokens, 0) != Some(tokens.len() - 1) {
        return None;
    }
    let inner = &tokens[1..tokens.len() - 1];
    if inner.is_empty() {
        return Some(vec![]);
    }
    let mut items = Vec::new();
    for (i, segment) in split_top_level(inner).iter().enumerate() {
        if segment.is_empty() {
            // trailing comma, as in `('a',)`
            if i > 0 && segment_is_last(inner, segment) {
                continue;
            }
            return None;
        }
        items.push(literal(segment)?);
    }
    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn str_lit(s: &str) -> ArgExpr {
        ArgExpr::Literal(Literal::Str(s.to_string()))
    }

    #[test]
    fn test_parse_find_step() {
        let step = parse_step(r#"BOX0=FIND(image=LEFT,object="dog")"#).unwrap();
        assert_eq!(step.output_var, "BOX0");
        assert_eq!(step.opcode, "FIND");
        assert_eq!(
            step.args,
            vec![
                ("image".to_string(), ArgExpr::Var("LEFT".to_string())),
                ("object".to_string(), str_lit("dog")),
            ]
        );
    }

    #[test]
    fn test_quoted_literal_keeps_apostrophes() {
        let step = parse_step(r#"v = OP(k="s with 'quotes'")"#).unwrap();
        assert_eq!(step.get("k"), Some(&str_lit("s with 'quotes'")));

        let step = parse_step(r#"A = VQA(image=IMAGE, question="Is the dog's toy red?")"#).unwrap();
        assert_eq!(step.get("question"), Some(&str_lit("Is the dog's toy red?")));
    }

    #[test]
    fn test_non_call_rhs_is_parse_error() {
        let err = parse_step("v = 5").unwrap_err();
        assert!(matches!(err, InterpreterError::Parse { .. }));
        assert!(err.to_string().contains("v = 5"));
    }

    #[test]
    fn test_parse_errors_table() {
        struct TestCase {
            name: &'static str,
            line: &'static str,
        }

        let cases = vec![
            TestCase { name: "missing assignment", line: "FIND(image=LEFT)" },
            TestCase { name: "positional argument", line: "A = FIND(LEFT)" },
            TestCase { name: "duplicate keyword", line: "A = FIND(image=LEFT, image=RIGHT)" },
            TestCase { name: "unbalanced parens", line: "A = FIND(image=LEFT" },
            TestCase { name: "trailing tokens", line: "A = FIND(image=LEFT) extra" },
            TestCase { name: "unterminated string", line: r#"A = VQA(question="oops)"# },
            TestCase { name: "empty value", line: "A = FIND(image=)" },
        ];

        for case in cases {
            let result = parse_step(case.line);
            assert!(
                matches!(result, Err(InterpreterError::Parse { .. })),
                "case '{}' should fail to parse, got {:?}",
                case.name,
                result
            );
        }
    }

    #[test]
    fn test_argument_classification() {
        let step = parse_step(
            r#"X = OP(a=5, b=-2.5, c=True, d=None, e=str("x"), f=['a','b'], g=('a',), h=ANSWER0 + 1, i=[])"#,
        )
        .unwrap();
        assert_eq!(step.get("a"), Some(&ArgExpr::Literal(Literal::Int(5))));
        assert_eq!(step.get("b"), Some(&ArgExpr::Literal(Literal::Float(-2.5))));
        assert_eq!(step.get("c"), Some(&ArgExpr::Literal(Literal::Bool(true))));
        assert_eq!(step.get("d"), Some(&ArgExpr::Literal(Literal::None)));
        assert_eq!(step.get("e"), Some(&str_lit("x")));
        assert_eq!(
            step.get("f"),
            Some(&ArgExpr::List(vec![Literal::Str("a".into()), Literal::Str("b".into())]))
        );
        assert_eq!(step.get("g"), Some(&ArgExpr::List(vec![Literal::Str("a".into())])));
        assert_eq!(step.get("h"), Some(&ArgExpr::Raw("ANSWER0 + 1".to_string())));
        assert_eq!(step.get("i"), Some(&ArgExpr::List(vec![])));
    }

    #[test]
    fn test_eval_expression_argument_is_literal_string() {
        let step = parse_step(r#"ANSWER2=EVAL(expr="{ANSWER0} and {ANSWER1}")"#).unwrap();
        assert_eq!(step.get("expr"), Some(&str_lit("{ANSWER0} and {ANSWER1}")));
    }

    #[test]
    fn test_trailing_comma_is_accepted() {
        let step = parse_step("A = COUNT(box=BOX0,)").unwrap();
        assert_eq!(step.args.len(), 1);
    }

    #[test]
    fn test_no_arguments() {
        let step = parse_step("A = SEG()").unwrap();
        assert!(step.args.is_empty());
    }

    #[test]
    fn test_header_skips_argument_parsing() {
        // The argument list is malformed but the header is still recoverable.
        let header = parse_step_header("BOX1 = CROP_RIGHTOF(image=IMAGE, LEFT)").unwrap();
        assert_eq!(header.output_var, "BOX1");
        assert_eq!(header.opcode, "CROP_RIGHTOF");

        assert!(parse_step_header("v = 5").is_err());
    }
}
