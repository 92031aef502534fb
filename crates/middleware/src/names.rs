//! Node, topic and service naming.
//!
//! A token is `[A-Za-z_][A-Za-z0-9_]*`. Node names are a single token.
//! Graph names (topics and services) are `/`-separated tokens, optionally
//! prefixed by `/` (absolute) or `~` (private to the node).

use thiserror::Error;

/// Errors that can occur when validating or resolving names.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NameError {
    /// The name is empty.
    #[error("name must not be empty")]
    Empty,

    /// The node name is not a single valid token.
    #[error("invalid node name '{0}' - must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidNodeName(String),

    /// The namespace is malformed.
    #[error("invalid namespace '{0}'")]
    InvalidNamespace(String),

    /// The graph name is malformed.
    #[error("invalid name '{0}' - tokens must match [A-Za-z_][A-Za-z0-9_]* separated by '/'")]
    InvalidName(String),
}

fn is_token(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_token_path(path: &str) -> bool {
    path.split('/').all(is_token)
}

/// Validates a node name.
///
/// # Errors
/// Returns an error if the name is empty or not a single token.
pub fn validate_node_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if !is_token(name) {
        return Err(NameError::InvalidNodeName(name.to_string()));
    }
    Ok(())
}

/// Validates a topic or service name before resolution.
///
/// # Errors
/// Returns an error if the name is empty or malformed.
pub fn validate_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    let body = name
        .strip_prefix('/')
        .or_else(|| name.strip_prefix("~/"))
        .or_else(|| name.strip_prefix('~'))
        .unwrap_or(name);
    if body.is_empty() || !is_token_path(body) {
        return Err(NameError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Normalizes a namespace into absolute form without a trailing slash.
///
/// The root namespace is `/`.
///
/// # Errors
/// Returns an error if any namespace token is malformed.
pub fn normalize_namespace(namespace: &str) -> Result<String, NameError> {
    let trimmed = namespace.trim_matches('/');
    if trimmed.is_empty() {
        return Ok("/".to_string());
    }
    if !is_token_path(trimmed) {
        return Err(NameError::InvalidNamespace(namespace.to_string()));
    }
    Ok(format!("/{trimmed}"))
}

fn join(namespace: &str, tail: &str) -> String {
    if namespace == "/" {
        format!("/{tail}")
    } else {
        format!("{namespace}/{tail}")
    }
}

/// Fully qualified name of a node.
#[must_use]
pub fn node_fqn(namespace: &str, node_name: &str) -> String {
    join(namespace, node_name)
}

/// Resolves a graph name against a node's namespace.
///
/// Absolute names pass through, `~name` lands under the node itself and
/// relative names land under the namespace.
///
/// # Errors
/// Returns an error if the name is malformed.
pub fn resolve(namespace: &str, node_name: &str, name: &str) -> Result<String, NameError> {
    validate_name(name)?;
    if name.starts_with('/') {
        return Ok(name.to_string());
    }
    if let Some(private) = name.strip_prefix('~') {
        let private = private.trim_start_matches('/');
        return Ok(join(&node_fqn(namespace, node_name), private));
    }
    Ok(join(namespace, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_names() {
        assert!(validate_node_name("n1").is_ok());
        assert!(validate_node_name("_talker").is_ok());
        assert_eq!(validate_node_name(""), Err(NameError::Empty));
        assert!(validate_node_name("1node").is_err());
        assert!(validate_node_name("my node").is_err());
        assert!(validate_node_name("a/b").is_err());
        assert!(validate_node_name("na-me").is_err());
    }

    #[test]
    fn test_graph_names() {
        assert!(validate_name("chatter").is_ok());
        assert!(validate_name("/robot/cmd_vel").is_ok());
        assert!(validate_name("~status").is_ok());
        assert!(validate_name("~/status").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("/").is_err());
        assert!(validate_name("~").is_err());
        assert!(validate_name("a//b").is_err());
        assert!(validate_name("a/").is_err());
        assert!(validate_name("a.b").is_err());
        assert!(validate_name("9lives").is_err());
    }

    #[test]
    fn test_normalize_namespace() {
        assert_eq!(normalize_namespace("").unwrap(), "/");
        assert_eq!(normalize_namespace("/").unwrap(), "/");
        assert_eq!(normalize_namespace("robot").unwrap(), "/robot");
        assert_eq!(normalize_namespace("/robot/arm/").unwrap(), "/robot/arm");
        assert!(normalize_namespace("/ro bot").is_err());
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve("/", "n1", "t").unwrap(), "/t");
        assert_eq!(resolve("/robot", "n1", "t").unwrap(), "/robot/t");
        assert_eq!(resolve("/robot", "n1", "/t").unwrap(), "/t");
        assert_eq!(resolve("/robot", "n1", "~t").unwrap(), "/robot/n1/t");
        assert_eq!(resolve("/", "n1", "~/a/b").unwrap(), "/n1/a/b");
        assert!(resolve("/", "n1", "bad name").is_err());
    }
}
