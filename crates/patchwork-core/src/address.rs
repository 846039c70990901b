//! Hierarchical, slash-delimited message addresses.
//!
//! An [`Address`] is parsed and validated once. Routing then walks it with a
//! borrowed [`Route`] that drops one component per level of nesting, so the
//! path is never re-parsed while descending into patches.

use core::fmt;
use core::str::FromStr;

use crate::error::AddressError;

/// A validated path such as `voices/p1/osc1`.
///
/// Leading and trailing slashes are ignored; every component is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    components: Vec<String>,
}

impl Address {
    /// The identifier components, outermost first.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Always false: an address has at least one component.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// A route positioned at the first component.
    pub fn route(&self) -> Route<'_> {
        Route {
            components: &self.components,
        }
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }
        let components: Vec<String> = trimmed.split('/').map(String::from).collect();
        if components.iter().any(String::is_empty) {
            return Err(AddressError::EmptyComponent(path.to_string()));
        }
        Ok(Self { components })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("/"))
    }
}

/// The unconsumed tail of an [`Address`] during routing.
#[derive(Debug, Clone, Copy)]
pub struct Route<'a> {
    components: &'a [String],
}

impl<'a> Route<'a> {
    /// The identifier to match at this level.
    pub fn current(&self) -> &'a str {
        self.components.first().map_or("", String::as_str)
    }

    /// True when the current component is the last one.
    pub fn is_resolved(&self) -> bool {
        self.components.len() == 1
    }

    /// Components left, including the current one.
    pub fn remaining(&self) -> usize {
        self.components.len()
    }

    /// Drops the current component. `None` once the route is resolved.
    pub fn next(self) -> Option<Route<'a>> {
        match self.components {
            [_, rest @ ..] if !rest.is_empty() => Some(Route { components: rest }),
            _ => None,
        }
    }
}
