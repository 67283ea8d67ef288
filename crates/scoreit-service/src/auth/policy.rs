//! Policy evaluation on top of a Casbin enforcer.
//!
//! Rules are `(subject-or-role, resource, action, effect)` tuples matched with
//! `keyMatch2` on the resource. A subject is first checked under its own name,
//! then under each role it has been grouped with; the first allow wins and
//! anything unmatched is denied.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use casbin::{CoreApi, MgmtApi};
use salvo::async_trait;
use tokio::sync::RwLock;

use crate::error::{ServiceError, ServiceResult};
use scoreit_db::model::role::Role;

const DEFAULT_POLICY: &str = include_str!("default_policy.csv");
const DEFAULT_MODEL: &str = include_str!("casbin_model.conf");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl std::str::FromStr for Effect {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            other => Err(ServiceError::InvalidConfiguration(format!(
                "Unknown policy effect '{other}'"
            ))),
        }
    }
}

/// A single permission rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolicyRule {
    pub subject: String,
    pub resource: String,
    pub action: String,
    pub effect: Effect,
}

impl PolicyRule {
    #[must_use]
    pub fn allow(subject: &str, resource: &str, action: &str) -> Self {
        Self {
            subject: subject.to_string(),
            resource: resource.to_string(),
            action: action.to_string(),
            effect: Effect::Allow,
        }
    }

    fn to_casbin(&self) -> Vec<String> {
        vec![
            self.subject.clone(),
            self.resource.clone(),
            self.action.clone(),
            self.effect.as_str().to_string(),
        ]
    }
}

/// The rule table an engine starts with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicySet {
    pub rules: Vec<PolicyRule>,
    /// `(subject, role)` associations known up front.
    pub groupings: Vec<(String, Role)>,
}

impl PolicySet {
    /// ## Summary
    /// Parses policy text.
    ///
    /// Each line is `p, subject, resource, action[, effect]` or `g, subject, role`.
    /// Blank lines and `#` comments are skipped. Lines with the wrong number of
    /// fields and duplicates are logged and skipped.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` for an unknown line type or effect.
    pub fn parse(text: &str) -> ServiceResult<Self> {
        let mut set = Self::default();
        let mut seen_rules = BTreeSet::new();
        let mut seen_groupings = BTreeSet::new();

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();

            match fields.as_slice() {
                ["p", subject, resource, action] => {
                    set.push_rule(&mut seen_rules, subject, resource, action, Effect::Allow);
                }
                ["p", subject, resource, action, effect] => {
                    let effect = effect.parse()?;
                    set.push_rule(&mut seen_rules, subject, resource, action, effect);
                }
                ["g", subject, role] => {
                    if seen_groupings.insert((subject.to_string(), role.to_string())) {
                        set.groupings
                            .push(((*subject).to_string(), Role::new(*role)));
                    }
                }
                ["p" | "g", ..] => {
                    tracing::warn!(line = index + 1, policy = %line, "Policy line has wrong number of fields, skipping");
                }
                [other, ..] => {
                    return Err(ServiceError::InvalidConfiguration(format!(
                        "Unknown policy type '{other}' on line {}",
                        index + 1
                    )));
                }
                [] => {}
            }
        }

        Ok(set)
    }

    fn push_rule(
        &mut self,
        seen: &mut BTreeSet<(String, String, String)>,
        subject: &str,
        resource: &str,
        action: &str,
        effect: Effect,
    ) {
        if subject.is_empty() || resource.is_empty() || action.is_empty() {
            tracing::warn!(subject, resource, action, "Policy rule has an empty field, skipping");
            return;
        }
        if !seen.insert((subject.to_string(), resource.to_string(), action.to_string())) {
            tracing::warn!(subject, resource, action, "Duplicate policy rule, skipping");
            return;
        }
        self.rules.push(PolicyRule {
            subject: subject.to_string(),
            resource: resource.to_string(),
            action: action.to_string(),
            effect,
        });
    }
}

/// Supplies the initial rule table at startup.
pub trait PolicySource: Send + Sync {
    /// ## Errors
    /// Returns an error if the rules cannot be read or parsed.
    fn load(&self) -> ServiceResult<PolicySet>;

    /// ## Summary
    /// Casbin model text. Defaults to the embedded model.
    ///
    /// ## Errors
    /// Returns an error if the model cannot be read.
    fn model(&self) -> ServiceResult<String> {
        Ok(DEFAULT_MODEL.to_string())
    }
}

impl PolicySource for PolicySet {
    fn load(&self) -> ServiceResult<PolicySet> {
        Ok(self.clone())
    }
}

/// Reads rules, and optionally the model, from files. Each falls back to its
/// embedded default when the file does not exist.
#[derive(Debug, Clone)]
pub struct FilePolicySource {
    path: PathBuf,
    model_path: Option<PathBuf>,
}

impl FilePolicySource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            model_path: None,
        }
    }

    /// Also reads the Casbin model from `model_path` when that file exists.
    #[must_use]
    pub fn with_model(mut self, model_path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(model_path.into());
        self
    }
}

fn read_or_default(path: &Path, kind: &str, default: &str) -> ServiceResult<String> {
    if !path.is_file() {
        tracing::warn!(path = %path.display(), kind, "File does not exist, using embedded default");
        return Ok(default.to_string());
    }

    tracing::info!(path = %path.display(), kind, "Loading file");
    std::fs::read_to_string(path).map_err(|e| {
        ServiceError::InvalidConfiguration(format!(
            "Failed to read {kind} file {}: {e}",
            path.display()
        ))
    })
}

impl PolicySource for FilePolicySource {
    fn load(&self) -> ServiceResult<PolicySet> {
        PolicySet::parse(&read_or_default(&self.path, "policy", DEFAULT_POLICY)?)
    }

    fn model(&self) -> ServiceResult<String> {
        match &self.model_path {
            Some(path) => read_or_default(path, "model", DEFAULT_MODEL),
            None => Ok(DEFAULT_MODEL.to_string()),
        }
    }
}

/// Access-control decisions for authenticated subjects.
#[async_trait]
pub trait PolicyEngine: Send + Sync {
    /// ## Summary
    /// Decides whether `subject` may perform `action` on `resource`.
    ///
    /// ## Errors
    /// Returns an error if rule evaluation fails.
    async fn enforce(&self, subject: &str, resource: &str, action: &str) -> ServiceResult<bool>;

    /// ## Summary
    /// Associates `subject` with each of `roles`. Idempotent.
    ///
    /// ## Errors
    /// Returns an error if the association cannot be recorded.
    async fn ensure_roles(&self, subject: &str, roles: &[Role]) -> ServiceResult<()>;
}

/// Casbin-backed policy engine.
///
/// Enforcement runs under a read lock; group registration takes the write lock.
pub struct CasbinPolicyEngine {
    enforcer: RwLock<casbin::Enforcer>,
}

impl CasbinPolicyEngine {
    /// ## Summary
    /// Builds an engine from the model and the rules supplied by `source`.
    ///
    /// ## Errors
    /// Returns an error if the model, the rules or the initial groupings cannot be loaded.
    #[tracing::instrument(skip(source))]
    pub async fn new(source: &dyn PolicySource) -> ServiceResult<Self> {
        tracing::debug!("Initializing Casbin enforcer");

        let model = casbin::DefaultModel::from_str(&source.model()?).await?;
        tracing::debug!("Casbin model loaded");

        let mut enforcer = casbin::Enforcer::new(model, casbin::MemoryAdapter::default()).await?;

        let policy_set = source.load()?;
        if !policy_set.rules.is_empty() {
            enforcer
                .add_policies(policy_set.rules.iter().map(PolicyRule::to_casbin).collect())
                .await?;
        }
        if !policy_set.groupings.is_empty() {
            enforcer
                .add_grouping_policies(
                    policy_set
                        .groupings
                        .iter()
                        .map(|(subject, role)| vec![subject.clone(), role.to_string()])
                        .collect(),
                )
                .await?;
        }

        let policy_count = enforcer.get_policy().len();
        let grouping_count = enforcer.get_grouping_policy().len();
        tracing::info!(
            policy_count = policy_count,
            grouping_count = grouping_count,
            "Casbin enforcer initialized successfully"
        );

        Ok(Self {
            enforcer: RwLock::new(enforcer),
        })
    }

    /// Roles currently associated with `subject`.
    pub async fn roles_for(&self, subject: &str) -> Vec<Role> {
        self.enforcer
            .read()
            .await
            .get_filtered_grouping_policy(0, vec![subject.to_string()])
            .into_iter()
            .filter_map(|grouping| grouping.get(1).map(|role| Role::new(role.as_str())))
            .collect()
    }
}

#[async_trait]
impl PolicyEngine for CasbinPolicyEngine {
    #[tracing::instrument(skip(self))]
    async fn enforce(&self, subject: &str, resource: &str, action: &str) -> ServiceResult<bool> {
        let enforcer = self.enforcer.read().await;

        if enforcer.enforce((subject, resource, action))? {
            tracing::debug!("Authorization granted to subject");
            return Ok(true);
        }

        let groupings = enforcer.get_filtered_grouping_policy(0, vec![subject.to_string()]);
        for grouping in &groupings {
            let Some(role) = grouping.get(1) else {
                continue;
            };

            let allowed = enforcer.enforce((role.as_str(), resource, action))?;
            tracing::trace!(role = %role, allowed = %allowed, "Role check result");

            if allowed {
                tracing::debug!(role = %role, "Authorization granted through role");
                return Ok(true);
            }
        }

        tracing::debug!(role_count = groupings.len(), "Authorization denied");
        Ok(false)
    }

    #[tracing::instrument(skip(self))]
    async fn ensure_roles(&self, subject: &str, roles: &[Role]) -> ServiceResult<()> {
        let wanted: BTreeSet<&str> = roles.iter().map(Role::as_str).collect();
        let missing = |enforcer: &casbin::Enforcer| -> Vec<Vec<String>> {
            wanted
                .iter()
                .map(|role| vec![subject.to_string(), (*role).to_string()])
                .filter(|grouping| !enforcer.has_grouping_policy(grouping.clone()))
                .collect()
        };

        if missing(&*self.enforcer.read().await).is_empty() {
            return Ok(());
        }

        // Re-check under the write lock; another request may have registered them.
        let mut enforcer = self.enforcer.write().await;
        let to_add = missing(&*enforcer);
        if to_add.is_empty() {
            return Ok(());
        }

        let added = to_add.len();
        enforcer.add_grouping_policies(to_add).await?;
        tracing::debug!(added, "Registered role groupings");
        Ok(())
    }
}
