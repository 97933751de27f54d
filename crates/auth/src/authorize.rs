use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use hrms_core::{CompanyId, UserId, UserRole};

use crate::actor::Actor;
use crate::permissions::{Action, Permission, Table, TargetError};
use crate::policy::{rules_for, PolicyRule};
use crate::resource::{Resource, ResourceAttrs};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: '{0}' denied")]
    Denied(Permission),
}

/// Decide whether `actor` may perform `action` on `resource`.
///
/// - No IO
/// - No panics
/// - Fail-closed: a (table, action) pair without rules is denied
pub fn allowed(actor: &Actor, action: Action, resource: &Resource) -> bool {
    rules_for(resource.table(), action).any(|rule| rule.predicate.holds(actor, resource))
}

/// [`allowed`], as a `Result` carrying the denied permission.
pub fn authorize(actor: &Actor, action: Action, resource: &Resource) -> Result<(), AuthzError> {
    if allowed(actor, action, resource) {
        return Ok(());
    }
    let permission = Permission::new(resource.table(), action);
    trace!(actor_id = %actor.id(), %permission, "no policy matched");
    Err(AuthzError::Denied(permission))
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    /// `"table.action"`, or the raw input when it could not be parsed.
    pub permission: String,

    pub granted: bool,

    /// Human-readable reason for the decision.
    pub reason: String,

    /// Name of the first rule that granted access.
    pub matched_rule: Option<&'static str>,

    /// Every rule evaluated for the pair, in catalogue order.
    pub considered_rules: Vec<&'static str>,

    pub actor: ActorState,

    pub denial_reason: Option<DenialReason>,
}

/// Snapshot of the actor the decision was made for.
#[derive(Debug, Clone, Serialize)]
pub struct ActorState {
    pub actor_id: UserId,
    pub role: Option<UserRole>,
    pub company_id: Option<CompanyId>,
    pub admin_of: Vec<CompanyId>,
    pub resolved: bool,
}

impl From<&Actor> for ActorState {
    fn from(actor: &Actor) -> Self {
        Self {
            actor_id: actor.id(),
            role: actor.role(),
            company_id: actor.company_id(),
            admin_of: actor.admin_of().iter().copied().collect(),
            resolved: actor.is_resolved(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// Table or action name not recognised.
    UnknownTarget,
    /// The row attributes the table's policies read were not supplied.
    MissingAttribute,
    /// No rule exists for the (table, action) pair.
    NoRuleForAction,
    /// Rules exist but none held.
    PredicateFalse,
    /// Actor profile could not be read; only public/self rules applied.
    UnresolvedActor,
}

/// Explain why `allowed` returns what it does for this triple.
pub fn explain_authorization(
    actor: &Actor,
    action: Action,
    resource: &Resource,
) -> AuthorizationExplanation {
    let permission = Permission::new(resource.table(), action);
    let rules: Vec<&'static PolicyRule> = rules_for(permission.table, action).collect();
    let considered_rules: Vec<&'static str> = rules.iter().map(|r| r.name).collect();

    if rules.is_empty() {
        return denied(
            actor,
            permission.to_string(),
            considered_rules,
            DenialKind::NoRuleForAction,
            format!("no policy grants '{permission}'; denied by default"),
        );
    }

    if let Some(rule) = rules.iter().find(|r| r.predicate.holds(actor, resource)) {
        return AuthorizationExplanation {
            permission: permission.to_string(),
            granted: true,
            reason: format!("granted by policy \"{}\"", rule.name),
            matched_rule: Some(rule.name),
            considered_rules,
            actor: actor.into(),
            denial_reason: None,
        };
    }

    let blocked_by_resolution =
        !actor.is_resolved() && rules.iter().any(|r| !r.predicate.survives_unresolved());
    let (kind, message) = if blocked_by_resolution {
        (
            DenialKind::UnresolvedActor,
            "actor profile could not be resolved; only public and self-row policies apply"
                .to_string(),
        )
    } else {
        (
            DenialKind::PredicateFalse,
            format!("none of the {} policies for '{permission}' matched", rules.len()),
        )
    };

    denied(actor, permission.to_string(), considered_rules, kind, message)
}

/// Like [`explain_authorization`], but from unparsed table/action names and
/// loose row attributes. Anything that does not parse is denied.
pub fn explain_named(
    actor: &Actor,
    table: &str,
    action: &str,
    attrs: &ResourceAttrs,
) -> AuthorizationExplanation {
    let target = table
        .parse::<Table>()
        .and_then(|t| Ok((t, action.parse::<Action>()?)))
        .and_then(|(t, a)| Ok((a, Resource::from_attrs(t, attrs)?)));

    match target {
        Ok((action, resource)) => explain_authorization(actor, action, &resource),
        Err(err) => {
            let kind = match err {
                TargetError::MissingAttribute { .. } => DenialKind::MissingAttribute,
                TargetError::UnknownTable(_) | TargetError::UnknownAction(_) => {
                    DenialKind::UnknownTarget
                }
            };
            denied(
                actor,
                format!("{table}.{action}"),
                Vec::new(),
                kind,
                format!("{err}; denied by default"),
            )
        }
    }
}

fn denied(
    actor: &Actor,
    permission: String,
    considered_rules: Vec<&'static str>,
    kind: DenialKind,
    message: String,
) -> AuthorizationExplanation {
    AuthorizationExplanation {
        permission,
        granted: false,
        reason: message.clone(),
        matched_rule: None,
        considered_rules,
        actor: actor.into(),
        denial_reason: Some(DenialReason { kind, message }),
    }
}
