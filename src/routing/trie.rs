//! Prefix-tree path matcher.
//!
//! # Responsibilities
//! - Store outputs keyed by path component sequences
//! - Resolve request segments to the most specific output
//! - Capture parameter and catch-all values
//!
//! # Design Decisions
//! - Precedence per segment: constant > parameter > wildcard > catch-all
//! - Backtracks when a more specific branch dead-ends deeper in the tree
//! - Case folding, when enabled, applies to constants only; captured text keeps its case
//! - A catch-all is terminal: components registered after it are ignored
//! - One parameter slot per node; names live on the registered leaf, so
//!   `/users/:id` and `/users/:name` are the same path

use std::collections::HashMap;

use crate::routing::matcher::{Parameters, PathMatcher};
use crate::routing::route::PathComponent;

/// Matcher configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrieOptions {
    /// Compare constant segments without regard to ASCII/Unicode case.
    pub case_insensitive: bool,
}

/// Trie-backed [`PathMatcher`].
#[derive(Debug)]
pub struct TrieRouter<O> {
    root: Node<O>,
    options: TrieOptions,
}

#[derive(Debug)]
struct Node<O> {
    constants: HashMap<String, Node<O>>,
    parameter: Option<Box<Node<O>>>,
    wildcard: Option<Box<Node<O>>>,
    catchall: Option<Leaf<O>>,
    output: Option<Leaf<O>>,
}

/// A registered output with the names of the parameters leading to it.
#[derive(Debug)]
struct Leaf<O> {
    /// Parameter names in path order.
    names: Vec<String>,
    /// Name bound to the joined catch-all segments.
    catchall: Option<String>,
    output: O,
}

impl<O> Default for Node<O> {
    fn default() -> Self {
        Self {
            constants: HashMap::new(),
            parameter: None,
            wildcard: None,
            catchall: None,
            output: None,
        }
    }
}

#[derive(Default)]
struct Captures {
    values: Vec<String>,
    catchall: Vec<String>,
}

impl<O> TrieRouter<O> {
    pub fn new(options: TrieOptions) -> Self {
        Self {
            root: Node::default(),
            options,
        }
    }

    pub fn options(&self) -> TrieOptions {
        self.options
    }

    fn key(&self, constant: &str) -> String {
        if self.options.case_insensitive {
            constant.to_lowercase()
        } else {
            constant.to_string()
        }
    }
}

impl<O> Default for TrieRouter<O> {
    fn default() -> Self {
        Self::new(TrieOptions::default())
    }
}

impl<O> Node<O> {
    fn find<'a>(&'a self, path: &[&str], case_insensitive: bool, captures: &mut Captures) -> Option<&'a Leaf<O>> {
        let Some((head, rest)) = path.split_first() else {
            return self.output.as_ref();
        };

        let constant = if case_insensitive {
            self.constants.get(&head.to_lowercase())
        } else {
            self.constants.get(*head)
        };
        if let Some(found) = constant.and_then(|child| child.find(rest, case_insensitive, captures)) {
            return Some(found);
        }

        if let Some(child) = &self.parameter {
            captures.values.push(head.to_string());
            if let Some(found) = child.find(rest, case_insensitive, captures) {
                return Some(found);
            }
            captures.values.pop();
        }

        if let Some(found) = self
            .wildcard
            .as_ref()
            .and_then(|child| child.find(rest, case_insensitive, captures))
        {
            return Some(found);
        }

        let leaf = self.catchall.as_ref()?;
        captures.catchall = path.iter().map(|s| s.to_string()).collect();
        Some(leaf)
    }
}

impl<O: Send + Sync + 'static> PathMatcher for TrieRouter<O> {
    type Output = O;

    fn register(&mut self, output: O, path: &[PathComponent]) -> Option<O> {
        let keys: Vec<Option<String>> = path
            .iter()
            .map(|c| match c {
                PathComponent::Constant(s) => Some(self.key(s)),
                _ => None,
            })
            .collect();

        let mut names = Vec::new();
        let mut node = &mut self.root;
        for (i, component) in path.iter().enumerate() {
            match component {
                PathComponent::Constant(_) => {
                    let key = keys[i].clone().unwrap_or_default();
                    node = node.constants.entry(key).or_default();
                }
                PathComponent::Parameter(name) => {
                    names.push(name.clone());
                    node = node.parameter.get_or_insert_with(Box::default).as_mut();
                }
                PathComponent::Wildcard => {
                    node = node.wildcard.get_or_insert_with(Box::default).as_mut();
                }
                PathComponent::CatchAll(name) => {
                    if i + 1 < path.len() {
                        tracing::warn!(
                            ignored = path.len() - i - 1,
                            "Components after a catch-all are unreachable"
                        );
                    }
                    let leaf = Leaf {
                        names,
                        catchall: name.clone(),
                        output,
                    };
                    return node.catchall.replace(leaf).map(|displaced| displaced.output);
                }
            }
        }
        let leaf = Leaf {
            names,
            catchall: None,
            output,
        };
        node.output.replace(leaf).map(|displaced| displaced.output)
    }

    fn route(&self, path: &[&str], parameters: &mut Parameters) -> Option<&O> {
        let mut captures = Captures::default();
        let leaf = self.root.find(path, self.options.case_insensitive, &mut captures)?;

        for (name, value) in leaf.names.iter().zip(captures.values) {
            parameters.set(name.clone(), value);
        }
        if !captures.catchall.is_empty() {
            if let Some(name) = &leaf.catchall {
                parameters.set(name.clone(), captures.catchall.join("/"));
            }
            parameters.set_catchall(captures.catchall);
        }
        Some(&leaf.output)
    }
}
