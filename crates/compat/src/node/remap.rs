use compat_middleware::names;

use std::collections::HashMap;

use tracing::{debug, warn};

/// `key:=value` pairs picked out of the process arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Arguments {
    pub node_name: Option<String>,
    pub namespace: Option<String>,
    pub remaps: Vec<(String, String)>,
}

impl Arguments {
    /// Scans `args` for remapping pairs. Anything without `:=` is ignored.
    pub fn parse<I, A>(args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<str>,
    {
        let mut parsed = Self::default();

        for arg in args {
            let Some((key, value)) = arg.as_ref().split_once(":=") else {
                continue;
            };
            match key {
                "__name" => parsed.node_name = Some(value.to_string()),
                "__ns" => parsed.namespace = Some(value.to_string()),
                special if special.starts_with("__") => {
                    debug!(key = special, "ignoring unsupported special argument");
                }
                from => parsed.remaps.push((from.to_string(), value.to_string())),
            }
        }

        parsed
    }
}

/// Resolved name remappings for one node.
#[derive(Clone, Debug, Default)]
pub struct Remappings {
    map: HashMap<String, String>,
}

impl Remappings {
    /// Resolves both sides of every pair against the node. Malformed pairs
    /// are skipped with a warning.
    pub fn resolve(pairs: &[(String, String)], namespace: &str, node_name: &str) -> Self {
        let mut map = HashMap::new();

        for (from, to) in pairs {
            let resolved = names::resolve(namespace, node_name, from).and_then(|from| {
                names::resolve(namespace, node_name, to).map(|to| (from, to))
            });
            match resolved {
                Ok((from, to)) => {
                    debug!(%from, %to, "remapping");
                    map.insert(from, to);
                }
                Err(error) => warn!(%from, %to, %error, "skipping malformed remapping"),
            }
        }

        Self { map }
    }

    /// Applies the remapping to an already resolved name.
    pub fn apply(&self, resolved: String) -> String {
        self.map.get(&resolved).cloned().unwrap_or(resolved)
    }
}
