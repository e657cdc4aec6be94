//! Detail link resolution
//!
//! Boards hide the detail URL in different places: `data-*` attributes that
//! feed a URL template, a `javascript:` call whose quoted arguments name the
//! notice, or a helper call that carries a relative path. A [`LinkStrategy`]
//! names which of these a board uses; [`LinkResolver`] applies it to the raw
//! link tokens of a row.
//!
//! Resolution never fails. A row whose tokens don't fit the strategy gets an
//! empty link, and script text is never passed through as a URL.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::utils::error::ParseError;
use crate::utils::{join_base_path, resolve_link};

/// How a board encodes its detail links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkStrategy {
    /// `{name}` placeholders filled from link tokens of the same name
    Template { template: String },

    /// Arguments of a script call fill `{0}`, `{1}`, ... in `template`
    ScriptCall {
        /// Link token holding the call (e.g. `href`, `onclick`)
        token: String,
        /// Called function name
        function: String,
        /// Number of single-quoted arguments
        arity: usize,
        template: String,
        /// Prefix marking scripted values; values without it are plain links
        #[serde(default, skip_serializing_if = "Option::is_none")]
        marker: Option<String>,
    },

    /// Single argument of a script call appended to `base`
    PathSuffix {
        token: String,
        function: String,
        base: String,
    },
}

impl LinkStrategy {
    /// Short name for logs and listings
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Template { .. } => "template",
            Self::ScriptCall { .. } => "script_call",
            Self::PathSuffix { .. } => "path_suffix",
        }
    }
}

/// Build the pattern for `function('a', 'b', ...)` with exactly `arity` arguments
pub fn script_call_pattern(function: &str, arity: usize) -> Result<Regex, ParseError> {
    if function.trim().is_empty() || arity == 0 {
        return Err(ParseError::InvalidPattern {
            pattern: function.to_string(),
            reason: "script call needs a function name and at least one argument".to_string(),
        });
    }

    let args = vec![r"'([^']*)'"; arity].join(r"\s*,\s*");
    let pattern = format!(r"{}\s*\(\s*{args}\s*\)", regex::escape(function.trim()));

    Regex::new(&pattern).map_err(|e| ParseError::InvalidPattern {
        pattern,
        reason: e.to_string(),
    })
}

fn placeholder_re() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE.get_or_init(|| Regex::new(r"\{([^{}]+)\}").expect("Invalid regex pattern"))
}

/// Substitute every `{key}` in `template`; `None` if any value is missing or empty
fn fill_template<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> Option<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in placeholder_re().captures_iter(template) {
        let whole = caps.get(0)?;
        let value = lookup(&caps[1]).filter(|v| !v.is_empty())?;
        out.push_str(&template[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(&template[last..]);

    Some(out)
}

#[derive(Debug)]
enum Compiled {
    Template {
        template: String,
    },
    ScriptCall {
        token: String,
        pattern: Regex,
        template: String,
        marker: Option<String>,
    },
    PathSuffix {
        token: String,
        pattern: Regex,
        base: String,
    },
}

/// Resolves link tokens into a detail URL for one board
#[derive(Debug)]
pub struct LinkResolver {
    compiled: Compiled,
    /// Page URL that relative plain links are resolved against
    origin: String,
}

impl LinkResolver {
    /// Validate `strategy` and compile its patterns
    pub fn new(strategy: &LinkStrategy, origin: impl Into<String>) -> Result<Self, ParseError> {
        let compiled = match strategy {
            LinkStrategy::Template { template } => Compiled::Template {
                template: non_empty_template(template)?,
            },
            LinkStrategy::ScriptCall {
                token,
                function,
                arity,
                template,
                marker,
            } => Compiled::ScriptCall {
                token: token.clone(),
                pattern: script_call_pattern(function, *arity)?,
                template: non_empty_template(template)?,
                marker: marker
                    .as_ref()
                    .map(|m| m.trim().to_lowercase())
                    .filter(|m| !m.is_empty()),
            },
            LinkStrategy::PathSuffix {
                token,
                function,
                base,
            } => Compiled::PathSuffix {
                token: token.clone(),
                pattern: script_call_pattern(function, 1)?,
                base: non_empty_template(base)?,
            },
        };

        Ok(Self {
            compiled,
            origin: origin.into(),
        })
    }

    /// Resolve one row's tokens; empty string when they don't fit
    pub fn resolve(&self, tokens: &BTreeMap<String, String>) -> String {
        match &self.compiled {
            Compiled::Template { template } => {
                fill_template(template, |key| tokens.get(key).map(String::as_str))
                    .unwrap_or_default()
            }

            Compiled::ScriptCall {
                token,
                pattern,
                template,
                marker,
            } => {
                let raw = tokens.get(token).map(|v| v.trim()).unwrap_or_default();
                if raw.is_empty() {
                    return String::new();
                }

                if let Some(marker) = marker {
                    if !raw.to_lowercase().starts_with(marker.as_str()) {
                        return resolve_link(&self.origin, raw);
                    }
                }

                let Some(caps) = pattern.captures(raw) else {
                    return String::new();
                };
                fill_template(template, |key| {
                    key.parse::<usize>()
                        .ok()
                        .and_then(|i| caps.get(i + 1))
                        .map(|m| m.as_str())
                })
                .unwrap_or_default()
            }

            Compiled::PathSuffix {
                token,
                pattern,
                base,
            } => tokens
                .get(token)
                .and_then(|raw| pattern.captures(raw))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim())
                .filter(|path| !path.is_empty())
                .map(|path| join_base_path(base, path))
                .unwrap_or_default(),
        }
    }
}

fn non_empty_template(template: &str) -> Result<String, ParseError> {
    if template.trim().is_empty() {
        return Err(ParseError::InvalidPattern {
            pattern: template.to_string(),
            reason: "template is empty".to_string(),
        });
    }
    Ok(template.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn moef() -> LinkResolver {
        LinkResolver::new(
            &LinkStrategy::ScriptCall {
                token: "href".to_string(),
                function: "fn_egov_select".to_string(),
                arity: 2,
                template: "https://www.moef.go.kr/nw/nes/detailNesDtaView.do?searchBbsId1={1}&searchNttId1={0}&menuNo=4050100".to_string(),
                marker: Some("javascript:".to_string()),
            },
            "https://www.moef.go.kr/nw/nes/nesdta.do",
        )
        .unwrap()
    }

    #[test]
    fn test_template_two_tokens() {
        let resolver = LinkResolver::new(
            &LinkStrategy::Template {
                template: "https://x.go.kr/view.do?nttSn={data-id}&nttSnUrl={data-url}".to_string(),
            },
            "https://x.go.kr/",
        )
        .unwrap();

        assert_eq!(
            resolver.resolve(&tokens(&[("data-id", "7"), ("data-url", "u")])),
            "https://x.go.kr/view.do?nttSn=7&nttSnUrl=u"
        );
        assert_eq!(resolver.resolve(&tokens(&[("data-id", "7")])), "");
        assert_eq!(
            resolver.resolve(&tokens(&[("data-id", "7"), ("data-url", "")])),
            ""
        );
    }

    #[test]
    fn test_script_call_rewrite() {
        let resolver = moef();
        assert_eq!(
            resolver.resolve(&tokens(&[(
                "href",
                "javascript:fn_egov_select('MOSF_000000000071234','MOSFBBS_000000000030');"
            )])),
            "https://www.moef.go.kr/nw/nes/detailNesDtaView.do?searchBbsId1=MOSFBBS_000000000030&searchNttId1=MOSF_000000000071234&menuNo=4050100"
        );
    }

    #[test]
    fn test_script_marker_plain_link_kept() {
        let resolver = moef();
        assert_eq!(
            resolver.resolve(&tokens(&[("href", "/nw/nes/detail.do?id=5")])),
            "https://www.moef.go.kr/nw/nes/detail.do?id=5"
        );
        assert_eq!(
            resolver.resolve(&tokens(&[("href", "https://other.go.kr/a")])),
            "https://other.go.kr/a"
        );
    }

    #[test]
    fn test_unmatched_script_is_empty() {
        let resolver = moef();
        assert_eq!(
            resolver.resolve(&tokens(&[("href", "javascript:void(0);")])),
            ""
        );
        assert_eq!(
            resolver.resolve(&tokens(&[("href", "javascript:fn_egov_select('only');")])),
            ""
        );
        assert_eq!(resolver.resolve(&tokens(&[])), "");
    }

    #[test]
    fn test_path_suffix() {
        let resolver = LinkResolver::new(
            &LinkStrategy::PathSuffix {
                token: "href".to_string(),
                function: "addSearchParam".to_string(),
                base: "https://sri.kostat.go.kr/".to_string(),
            },
            "https://sri.kostat.go.kr/board.es",
        )
        .unwrap();

        assert_eq!(
            resolver.resolve(&tokens(&[(
                "href",
                "javascript:addSearchParam('/board.es?mid=a10306020000&bid=a103060100&act=view&list_no=431')"
            )])),
            "https://sri.kostat.go.kr/board.es?mid=a10306020000&bid=a103060100&act=view&list_no=431"
        );
        assert_eq!(resolver.resolve(&tokens(&[("href", "#")])), "");
    }

    #[test]
    fn test_invalid_strategies_rejected() {
        let empty_template = LinkStrategy::Template {
            template: "  ".to_string(),
        };
        assert!(LinkResolver::new(&empty_template, "").is_err());

        let no_args = LinkStrategy::ScriptCall {
            token: "onclick".to_string(),
            function: "goView".to_string(),
            arity: 0,
            template: "x{0}".to_string(),
            marker: None,
        };
        assert!(LinkResolver::new(&no_args, "").is_err());
    }

    #[test]
    fn test_script_call_pattern_escapes_function() {
        let re = script_call_pattern("a.b", 1).unwrap();
        assert!(re.is_match("a.b('x')"));
        assert!(!re.is_match("aXb('x')"));
    }
}
