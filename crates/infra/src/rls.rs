//! PostgreSQL row-level-security DDL for the policy catalogue.
//!
//! The in-process evaluator and the database enforce the same rules: the
//! output of [`render_policies`] is applied to a Postgres deployment so that
//! direct database access (bypassing the HTTP layer) is still row-filtered.

use std::fmt::Write as _;

use hrms_auth::{Action, PolicyRule, Predicate, Table, POLICIES};

const IS_SUPERADMIN_FN: &str = "\
CREATE OR REPLACE FUNCTION is_superadmin()
RETURNS boolean
LANGUAGE sql
SECURITY DEFINER
STABLE
SET search_path = public
AS $$
  SELECT EXISTS (
    SELECT 1 FROM users WHERE id = auth.uid() AND role = 'superadmin'
  );
$$;
";

/// Column holding the company that scopes a row.
fn tenant_column(table: Table) -> &'static str {
    match table {
        Table::Companies => "id",
        _ => "company_id",
    }
}

/// SQL boolean expression for `predicate` evaluated on a row of `table`.
pub fn predicate_sql(table: Table, predicate: Predicate) -> String {
    let t = table.as_str();
    match predicate {
        Predicate::Always => "true".to_string(),
        Predicate::IsSelf => format!("auth.uid() = {t}.id"),
        Predicate::IsOwner => format!("auth.uid() = {t}.user_id"),
        Predicate::AdminOfRowCompany => format!(
            "auth.uid() IN (SELECT user_id FROM company_admins WHERE company_id = {t}.{})",
            tenant_column(table)
        ),
        Predicate::Superadmin => "is_superadmin()".to_string(),
    }
}

/// One `CREATE POLICY` statement.
pub fn policy_sql(rule: &PolicyRule) -> String {
    let clause = match rule.action {
        Action::Insert => "WITH CHECK",
        _ => "USING",
    };
    format!(
        "CREATE POLICY \"{}\" ON {} FOR {} {} ({});",
        rule.name.replace('"', "\"\""),
        rule.table.as_str(),
        rule.action.sql_keyword(),
        clause,
        predicate_sql(rule.table, rule.predicate),
    )
}

/// Full policy script: helper function, RLS enablement, then every rule.
///
/// Tables with no rule for an action are left without a policy for it, which
/// Postgres treats as deny once RLS is enabled.
pub fn render_policies() -> String {
    let mut out = String::new();
    out.push_str(IS_SUPERADMIN_FN);
    out.push('\n');

    for table in Table::ALL {
        let _ = writeln!(out, "ALTER TABLE {} ENABLE ROW LEVEL SECURITY;", table.as_str());
    }

    for table in Table::ALL {
        out.push('\n');
        let _ = writeln!(out, "-- {}", table.as_str());
        for rule in POLICIES.iter().filter(|r| r.table == table) {
            out.push_str(&policy_sql(rule));
            out.push('\n');
        }
    }
    out
}
