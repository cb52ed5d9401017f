use super::Expr;
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::trace;

/// Separator between values merged into one key.
pub const VALUE_SEPARATOR: char = ';';

/// Flat, multi-valued result of evaluating a config.
///
/// Keys keep the order of their first assignment. Repeated assignments
/// append to the existing value with [`VALUE_SEPARATOR`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMap {
    entries: IndexMap<String, String>,
}

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, key: &str, value: &str) {
        match self.entries.get_mut(key) {
            Some(existing) => {
                existing.push(VALUE_SEPARATOR);
                existing.push_str(value);
            }
            None => {
                self.entries.insert(key.to_string(), value.to_string());
            }
        }
    }

    /// The raw merged value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Every non-empty value of `key` in declaration order.
    pub fn values(&self, key: &str) -> Vec<&str> {
        self.get(key)
            .map(|raw| {
                raw.split(VALUE_SEPARATOR)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The last assigned value, for keys that hold a single setting.
    pub fn last(&self, key: &str) -> Option<&str> {
        self.values(key).pop()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where conditionals look up environment variables.
#[derive(Debug, Clone)]
pub enum EnvSource {
    Process,
    Fixed(HashSet<String>),
}

impl EnvSource {
    fn contains(&self, name: &str) -> bool {
        match self {
            EnvSource::Process => std::env::var_os(name).is_some(),
            EnvSource::Fixed(vars) => vars.contains(name),
        }
    }
}

/// What an `if <name>` condition is tested against.
#[derive(Debug, Clone)]
pub struct EvalContext {
    pub platform: String,
    pub env: EnvSource,
}

impl EvalContext {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            env: EnvSource::Process,
        }
    }

    /// A context with a fixed set of defined environment variables.
    pub fn fixed<I, S>(platform: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            platform: platform.into(),
            env: EnvSource::Fixed(vars.into_iter().map(Into::into).collect()),
        }
    }

    pub fn holds(&self, condition: &str) -> bool {
        condition == self.platform || self.env.contains(condition)
    }
}

pub fn evaluate(expr: &Expr, ctx: &EvalContext) -> ConfigMap {
    let mut map = ConfigMap::new();
    visit(expr, ctx, &mut map);
    map
}

fn visit(expr: &Expr, ctx: &EvalContext, map: &mut ConfigMap) {
    match expr {
        Expr::Assign { name, value } => map.merge(name, value),
        Expr::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            let taken = ctx.holds(condition);
            trace!(condition = %condition, taken, "config conditional");
            if taken {
                visit(then_branch, ctx, map);
            } else if let Some(other) = else_branch {
                visit(other, ctx, map);
            }
        }
        Expr::Block(list) => {
            for item in list {
                visit(item, ctx, map);
            }
        }
    }
}
