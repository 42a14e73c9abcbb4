//! Stored record shapes and deployment environments.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Deployment stage selecting which version line of a descriptor is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    /// Development
    Dev,
    /// Test
    Test,
    /// Pre-production
    Pre,
    /// Production
    Pro,
}

impl Environment {
    /// Maps an environment tag to an environment.
    ///
    /// Production fallback rule: only the exact tags `dev`, `test` and `pre`
    /// select a non-production line. Every other tag, including typos, other
    /// casings and the empty string, selects `Pro`. A misconfigured tag thus
    /// reads production configuration instead of failing open.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "dev" => Environment::Dev,
            "test" => Environment::Test,
            "pre" => Environment::Pre,
            _ => Environment::Pro,
        }
    }
}

/// Per-environment active configuration versions. Zero means unpublished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentVersions {
    /// Development version
    pub dev: i64,
    /// Test version
    pub test: i64,
    /// Pre-production version
    pub pre: i64,
    /// Production version
    pub pro: i64,
}

impl EnvironmentVersions {
    /// Version bound to `environment`.
    pub fn get(&self, environment: Environment) -> i64 {
        match environment {
            Environment::Dev => self.dev,
            Environment::Test => self.test,
            Environment::Pre => self.pre,
            Environment::Pro => self.pro,
        }
    }
}

/// Service descriptor stored at `service.info.<serviceName>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceDescriptor {
    /// Service category, e.g. "api" or "rpc"
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable description
    pub summary: String,
    /// Active version per environment
    pub current_version: EnvironmentVersions,
}

impl ServiceDescriptor {
    /// Active version for an environment tag, applying the production fallback.
    pub fn version_for(&self, environment: &str) -> i64 {
        self.current_version.get(Environment::from_tag(environment))
    }
}

/// Immutable configuration payload stored at
/// `service.config.<serviceName>.<version>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VersionedConfigRecord {
    /// String-encoded JSON configuration body
    pub content: String,
    /// When the version was created
    pub create_time: String,
    /// Who created the version
    pub create_user: String,
    /// When the version was last rolled out
    pub update_time: String,
}
