/*
Copyright 2024 The Kubernetes Authors.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use std::collections::{btree_map, BTreeMap};
use std::fmt::Display;

use k8s_openapi::api::core::v1::EnvVar;

/// Environment variables handed to the application container.
///
/// Keys are unique and iterate in lexicographic order, so the same logical
/// environment always renders to the same container env list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Environment(BTreeMap<String, String>);

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to the string form of `value`, returning the previous value.
    pub fn insert<K: Into<String>, V: Display>(&mut self, name: K, value: V) -> Option<String> {
        self.0.insert(name.into(), value.to_string())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Renders the container env list, ordered by variable name.
    ///
    /// Empty values are left unset: the API server drops `value: ""` on
    /// write, and keeping it would make every later comparison a diff.
    pub fn to_env_vars(&self) -> Vec<EnvVar> {
        self.0
            .iter()
            .map(|(name, value)| EnvVar {
                name: name.clone(),
                value: (!value.is_empty()).then(|| value.clone()),
                value_from: None,
            })
            .collect()
    }
}

impl<K: Into<String>, V: Display> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = Environment::new();
        env.extend(iter);
        env
    }
}

impl<K: Into<String>, V: Display> Extend<(K, V)> for Environment {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl<'a> IntoIterator for &'a Environment {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Parses a `KEY=VALUE` pair. The value may be empty or contain `=`.
pub fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{s}`"))?;
    if name.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{s}`"));
    }
    Ok((name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_vars_are_sorted_by_name() {
        let env: Environment = [
            ("SPAWN_NETWORK", "node /src/build/cli.node.js"),
            ("APP_ZIP_FILE", "https://storage.googleapis.com/loomnetwork/block_ssh.zip"),
            ("DEMO_MODE", "false"),
            ("PRIVATE_KEY_JSON_PATH", "data.json"),
            ("APP_SLUG", "hello-world"),
        ]
        .into_iter()
        .collect();

        let names: Vec<_> = env.to_env_vars().into_iter().map(|v| v.name).collect();
        assert_eq!(
            names,
            vec![
                "APP_SLUG",
                "APP_ZIP_FILE",
                "DEMO_MODE",
                "PRIVATE_KEY_JSON_PATH",
                "SPAWN_NETWORK"
            ]
        );
    }

    #[test]
    fn test_values_are_stringified() {
        let env: Environment = [("a", 1)].into_iter().collect();
        assert_eq!(
            env.to_env_vars(),
            vec![EnvVar {
                name: "a".to_string(),
                value: Some("1".to_string()),
                value_from: None,
            }]
        );
    }

    #[test]
    fn test_insertion_order_is_irrelevant() {
        let forward: Environment = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        let backward: Environment = [("c", "3"), ("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(forward, backward);
        assert_eq!(forward.to_env_vars(), backward.to_env_vars());
    }

    #[test]
    fn test_later_insert_wins() {
        let mut env = Environment::new();
        assert_eq!(env.insert("DEMO_MODE", true), None);
        assert_eq!(env.insert("DEMO_MODE", false), Some("true".to_string()));
        assert_eq!(env.get("DEMO_MODE"), Some("false"));
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn test_empty_value_is_unset() {
        let env: Environment = [("EMPTY", "")].into_iter().collect();
        assert_eq!(env.to_env_vars()[0].value, None);
    }

    #[test]
    fn test_parse_env_pair() {
        assert_eq!(
            parse_env_pair("APP_SLUG=hello-world").unwrap(),
            ("APP_SLUG".to_string(), "hello-world".to_string())
        );
        assert_eq!(
            parse_env_pair("QUERY=a=b").unwrap(),
            ("QUERY".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_env_pair("EMPTY=").unwrap(),
            ("EMPTY".to_string(), String::new())
        );
        assert!(parse_env_pair("NO_SEPARATOR").is_err());
        assert!(parse_env_pair("=value").is_err());
    }
}
