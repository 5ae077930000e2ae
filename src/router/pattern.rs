//! Route pattern classification and regex generation.

use super::RouteError;

/// Where a pattern lands in the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Root,
    Exact,
    Parameterized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

/// Key under which a `*` capture is bound.
pub const WILDCARD: &str = "*";

/// Trims trailing slashes; `"/"` and `""` both become the root pattern `""`.
pub fn normalize(pattern: &str) -> &str {
    pattern.trim_end_matches('/')
}

pub fn classify(normalized: &str) -> PatternKind {
    if normalized.is_empty() {
        PatternKind::Root
    } else if normalized.contains(':') || normalized.contains('*') {
        PatternKind::Parameterized
    } else {
        PatternKind::Exact
    }
}

/// A parameterized pattern split into literal text, `:name` and `*` parts.
#[derive(Debug, Clone)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut seen = Vec::<String>::new();
        let mut wildcard = false;
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                ':' => {
                    let mut name = String::new();
                    while let Some(&next) = chars.peek() {
                        if next.is_alphanumeric() || next == '_' {
                            name.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if name.is_empty() {
                        return Err(invalid("`:` must be followed by a parameter name"));
                    }
                    if seen.contains(&name) {
                        return Err(invalid("parameter name used twice"));
                    }
                    seen.push(name.clone());
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Param(name));
                }
                '*' => {
                    if wildcard {
                        return Err(invalid("only one `*` is allowed"));
                    }
                    wildcard = true;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Wildcard);
                }
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Renders the pattern as one alternation branch.
    ///
    /// The branch is wrapped in a group named `group`; each parameter gets a
    /// capture named `<prefix><n>` so branches of the same method never
    /// collide. Returns the regex source and, per capture, the capture name
    /// paired with the parameter name it binds.
    pub fn to_regex(&self, group: &str, prefix: &str) -> (String, Vec<(String, String)>) {
        let mut source = format!("(?P<{group}>");
        let mut captures = Vec::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => source.push_str(&regex::escape(text)),
                Segment::Param(name) => {
                    let capture = format!("{prefix}{}", captures.len());
                    source.push_str(&format!("(?P<{capture}>[^/]+)"));
                    captures.push((capture, name.clone()));
                }
                Segment::Wildcard => {
                    let capture = format!("{prefix}{}", captures.len());
                    source.push_str(&format!("(?P<{capture}>.+)"));
                    captures.push((capture, WILDCARD.to_string()));
                }
            }
        }
        source.push(')');

        (source, captures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_patterns() {
        assert_eq!(classify(normalize("/")), PatternKind::Root);
        assert_eq!(classify(normalize("")), PatternKind::Root);
        assert_eq!(classify(normalize("/about/")), PatternKind::Exact);
        assert_eq!(classify("/users/:id"), PatternKind::Parameterized);
        assert_eq!(classify("/static/*"), PatternKind::Parameterized);
    }

    #[test]
    fn literal_text_is_escaped() {
        let template = Template::parse("/files/:name.txt").unwrap();
        let (source, captures) = template.to_regex("route_0_GET", "p0_");

        assert_eq!(source, r"(?P<route_0_GET>/files/(?P<p0_0>[^/]+)\.txt)");
        assert_eq!(captures, vec![("p0_0".to_string(), "name".to_string())]);
    }

    #[test]
    fn rejects_malformed_patterns() {
        assert!(Template::parse("/users/:").is_err());
        assert!(Template::parse("/a/:id/b/:id").is_err());
        assert!(Template::parse("/a/*/b/*").is_err());
    }
}
