//! Chain text → validated actions.

use super::registry::HandlerRegistry;

/// Upper bound on `;`-separated segments, empty ones included.
pub const MAX_STEPS: usize = 10;

/// One validated step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Registered prefix this step dispatches to, e.g. `click` or `click:`.
    pub prefix: String,
    /// Text after the prefix.
    pub params: String,
    /// The trimmed step as written.
    pub raw: String,
}

/// A parsed chain, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionChain {
    pub raw: String,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("chain has {0} segments, at most 10 allowed")]
    TooLong(usize),

    #[error("unsupported action in '{0}'")]
    Unsupported(String),

    #[error("chain has no actions")]
    Empty,
}

/// Splits `raw` on `;` and resolves every non-empty step against `registry`.
///
/// With a `:` in the step, the text through the first `:` must be
/// registered. Without one, the bare word is tried first and then the word
/// with `:` appended.
pub fn parse_chain(raw: &str, registry: &HandlerRegistry) -> Result<ActionChain, ParseError> {
    let segments: Vec<&str> = raw.split(';').collect();
    if segments.len() > MAX_STEPS {
        return Err(ParseError::TooLong(segments.len()));
    }

    let mut actions = Vec::new();
    for step in segments.into_iter().map(str::trim).filter(|s| !s.is_empty()) {
        actions.push(resolve(step, registry)?);
    }

    if actions.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(ActionChain {
        raw: raw.to_owned(),
        actions,
    })
}

fn resolve(step: &str, registry: &HandlerRegistry) -> Result<Action, ParseError> {
    let action = |prefix: &str, params: &str| Action {
        prefix: prefix.to_owned(),
        params: params.to_owned(),
        raw: step.to_owned(),
    };

    if let Some(colon) = step.find(':') {
        let (prefix, params) = step.split_at(colon + 1);
        if registry.contains(prefix) {
            return Ok(action(prefix, params));
        }
    } else if registry.contains(step) {
        return Ok(action(step, ""));
    } else if registry.contains(&format!("{step}:")) {
        return Ok(action(&format!("{step}:"), ""));
    }
    Err(ParseError::Unsupported(step.to_owned()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::chain::registry::ActionHandler;
    use crate::platform::PlatformError;

    struct Noop;

    #[async_trait]
    impl ActionHandler for Noop {
        async fn handle(&self, _: &str) -> Result<String, PlatformError> {
            Ok(String::new())
        }
    }

    fn registry(prefixes: &[&str]) -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        for prefix in prefixes {
            registry.register(prefix, Arc::new(Noop));
        }
        registry
    }

    fn prefixes(chain: &ActionChain) -> Vec<&str> {
        chain.actions.iter().map(|a| a.prefix.as_str()).collect()
    }

    #[test]
    fn colon_steps_resolve_to_prefix_with_params() {
        let reg = registry(&["click:", "type:"]);
        let chain = parse_chain("click:10,20; type:hello world", &reg).unwrap();
        assert_eq!(prefixes(&chain), vec!["click:", "type:"]);
        assert_eq!(chain.actions[0].params, "10,20");
        assert_eq!(chain.actions[1].params, "hello world");
        assert_eq!(chain.actions[1].raw, "type:hello world");
    }

    #[test]
    fn bare_and_colon_prefixes_do_not_compete() {
        let reg = registry(&["click", "click:"]);
        let chain = parse_chain("click;click:5,5", &reg).unwrap();
        assert_eq!(prefixes(&chain), vec!["click", "click:"]);
    }

    #[test]
    fn bare_word_falls_back_to_colon_prefix() {
        let reg = registry(&["capture:"]);
        let chain = parse_chain("capture", &reg).unwrap();
        assert_eq!(prefixes(&chain), vec!["capture:"]);
        assert_eq!(chain.actions[0].params, "");
    }

    #[test]
    fn params_may_contain_colons() {
        let reg = registry(&["drag:"]);
        let chain = parse_chain("drag:1,2:3,4", &reg).unwrap();
        assert_eq!(chain.actions[0].params, "1,2:3,4");
    }

    #[test]
    fn eleven_segments_are_rejected() {
        let reg = registry(&["click"]);
        let raw = vec!["click"; 11].join(";");
        assert_eq!(parse_chain(&raw, &reg), Err(ParseError::TooLong(11)));

        let raw = vec!["click"; 10].join(";");
        assert_eq!(parse_chain(&raw, &reg).unwrap().actions.len(), 10);
    }

    #[test]
    fn empty_segments_count_towards_the_bound() {
        let reg = registry(&["click"]);
        assert!(parse_chain("click;;;;;;;;;;", &reg).is_err());
        assert_eq!(parse_chain("click;;click", &reg).unwrap().actions.len(), 2);
    }

    #[test]
    fn unregistered_prefix_rejects_whole_chain() {
        let reg = registry(&["click:", "type:"]);
        assert_eq!(
            parse_chain("click:1,1;launch:rockets;type:x", &reg),
            Err(ParseError::Unsupported("launch:rockets".into()))
        );
        assert!(parse_chain("clack", &reg).is_err());
    }

    #[test]
    fn empty_chains_are_rejected() {
        let reg = registry(&["click"]);
        assert_eq!(parse_chain("", &reg), Err(ParseError::Empty));
        assert_eq!(parse_chain(" ; ;", &reg), Err(ParseError::Empty));
    }
}
