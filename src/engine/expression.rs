//! Rule expression parsing.

use super::RuleEngineError;

/// One `tag` or `tag=param` term of an expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Term<'a> {
    pub tag: &'a str,
    pub param: Option<&'a str>,
}

impl Term<'_> {
    pub fn param_or_empty(&self) -> &str {
        self.param.unwrap_or("")
    }
}

/// Split a comma-separated expression into terms.
///
/// Whitespace around terms is ignored. Empty terms and empty tags are
/// rejected.
///
/// # Example
///
/// ```rust
/// use scenegate::engine::parse_expression;
///
/// let terms = parse_expression("required, min=18").unwrap();
/// assert_eq!(terms.len(), 2);
/// assert_eq!(terms[1].tag, "min");
/// assert_eq!(terms[1].param, Some("18"));
/// ```
pub fn parse_expression(expression: &str) -> Result<Vec<Term<'_>>, RuleEngineError> {
    let malformed = |reason: &str| RuleEngineError::Malformed {
        expression: expression.to_string(),
        reason: reason.to_string(),
    };

    if expression.trim().is_empty() {
        return Ok(Vec::new());
    }

    expression
        .split(',')
        .map(str::trim)
        .map(|raw| {
            if raw.is_empty() {
                return Err(malformed("empty term"));
            }
            let (tag, param) = match raw.split_once('=') {
                Some((tag, param)) => (tag.trim(), Some(param.trim())),
                None => (raw, None),
            };
            if tag.is_empty() {
                return Err(malformed("term without a tag"));
            }
            Ok(Term { tag, param })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tags_and_params() {
        let terms = parse_expression("required,min=2,oneof=red green").unwrap();

        assert_eq!(
            terms,
            vec![
                Term {
                    tag: "required",
                    param: None
                },
                Term {
                    tag: "min",
                    param: Some("2")
                },
                Term {
                    tag: "oneof",
                    param: Some("red green")
                },
            ]
        );
    }

    #[test]
    fn blank_expression_has_no_terms() {
        assert!(parse_expression("").unwrap().is_empty());
        assert!(parse_expression("   ").unwrap().is_empty());
    }

    #[test]
    fn rejects_empty_terms() {
        assert!(matches!(
            parse_expression("required,,min=1"),
            Err(RuleEngineError::Malformed { .. })
        ));
        assert!(matches!(
            parse_expression("=5"),
            Err(RuleEngineError::Malformed { .. })
        ));
    }

    #[test]
    fn param_or_empty_defaults() {
        let terms = parse_expression("email").unwrap();
        assert_eq!(terms[0].param_or_empty(), "");
    }
}
