//! Category matching between provider roles and service names.
//!
//! A category is a canonical lowercase label. Provider roles resolve through a
//! strict lookup; service names resolve through progressively looser rules and
//! always produce *some* label. Matching is an allow-list: anything that does
//! not resolve on both sides is rejected.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_KEYWORD_CATEGORIES, DEFAULT_ROLE_CATEGORIES, DEFAULT_SERVICE_CATEGORIES,
};

/// Lookup tables driving the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTables {
    /// Provider role -> category
    pub roles: BTreeMap<String, String>,
    /// Service name -> category
    pub services: BTreeMap<String, String>,
    /// Keyword variant -> category, checked by substring
    #[serde(default)]
    pub keywords: Vec<(String, String)>,
}

impl CategoryTables {
    /// Build tables from static pairs, normalizing every key and value.
    pub fn from_pairs(
        roles: &[(&str, &str)],
        services: &[(&str, &str)],
        keywords: &[(&str, &str)],
    ) -> Self {
        let map = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| (normalize(k), normalize(v)))
                .collect::<BTreeMap<_, _>>()
        };

        Self {
            roles: map(roles),
            services: map(services),
            keywords: keywords
                .iter()
                .map(|(k, v)| (normalize(k), normalize(v)))
                .collect(),
        }
    }
}

impl Default for CategoryTables {
    fn default() -> Self {
        Self::from_pairs(
            DEFAULT_ROLE_CATEGORIES,
            DEFAULT_SERVICE_CATEGORIES,
            DEFAULT_KEYWORD_CATEGORIES,
        )
    }
}

/// Lowercase and trim.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Resolves roles and service names to categories.
#[derive(Debug, Clone)]
pub struct CategoryMatcher {
    tables: CategoryTables,
    /// Every category reachable from either table, for containment checks
    known: BTreeSet<String>,
}

impl CategoryMatcher {
    pub fn new(tables: CategoryTables) -> Self {
        // Keys are normalized here as well, tables may come from config files
        let tables = CategoryTables {
            roles: tables
                .roles
                .iter()
                .map(|(k, v)| (normalize(k), normalize(v)))
                .collect(),
            services: tables
                .services
                .iter()
                .map(|(k, v)| (normalize(k), normalize(v)))
                .collect(),
            keywords: tables
                .keywords
                .iter()
                .map(|(k, v)| (normalize(k), normalize(v)))
                .filter(|(k, _)| !k.is_empty())
                .collect(),
        };

        let known = tables
            .roles
            .values()
            .chain(tables.services.values())
            .filter(|c| !c.is_empty())
            .cloned()
            .collect();

        Self { tables, known }
    }

    /// Category of a provider role, `None` when the role is unknown or blank.
    pub fn role_category(&self, role: &str) -> Option<String> {
        let role = normalize(role);
        if role.is_empty() {
            return None;
        }
        self.tables.roles.get(&role).cloned()
    }

    /// Category of a service name. Falls back to the normalized name itself.
    pub fn service_category(&self, service_name: &str) -> String {
        let name = normalize(service_name);
        if name.is_empty() {
            return name;
        }

        if let Some(category) = self.tables.services.get(&name) {
            return category.clone();
        }

        if let Some(category) = self
            .known
            .iter()
            .find(|category| name.contains(category.as_str()) || category.contains(name.as_str()))
        {
            return category.clone();
        }

        if let Some((_, category)) = self
            .tables
            .keywords
            .iter()
            .find(|(keyword, _)| name.contains(keyword.as_str()))
        {
            return category.clone();
        }

        name
    }

    /// Whether a provider with `role` may take work for `service_name`.
    pub fn matches(&self, role: &str, service_name: &str) -> bool {
        let Some(role_category) = self.role_category(role) else {
            return false;
        };
        let service_category = self.service_category(service_name);
        !service_category.is_empty() && role_category == service_category
    }
}

impl Default for CategoryMatcher {
    fn default() -> Self {
        Self::new(CategoryTables::default())
    }
}
