//! Condition logic validation, server condition resolution and merging.
//!
//! Condition logic is an opaque boolean expression over 1-based positions in
//! the model's condition list (`"(1 OR 2) AND 3"`). The engine only checks
//! parenthesis balance; operators and operands pass through untouched.

use crate::error::{GuardError, Result};
use crate::model::{Condition, ConditionType, Entity, Trigger};
use crate::principal::Principal;
use crate::protocol::ConditionSpec;

/// Reject expressions whose parentheses do not balance.
pub fn validate_logic(expr: &str) -> Result<()> {
    let mut depth: usize = 0;
    for (pos, c) in expr.chars().enumerate() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    GuardError::InvalidConditionLogic(format!(
                        "unmatched ')' at position {pos} in \"{expr}\""
                    ))
                })?;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(GuardError::InvalidConditionLogic(format!(
            "{depth} unclosed '(' in \"{expr}\""
        )));
    }
    Ok(())
}

/// Turn one server condition into the form forwarded to the executor.
///
/// `userinfo` conditions read their value from the principal and are re-typed
/// to `fieldvalue`; a missing principal field is a metadata bug and fails hard.
pub fn resolve_condition<P: Principal + ?Sized>(
    condition: &Condition,
    principal: &P,
) -> Result<ConditionSpec> {
    match condition.condition_type {
        ConditionType::UserInfo => {
            let value = principal.field_value(&condition.value).ok_or_else(|| {
                GuardError::MissingUserField {
                    condition: condition.name.clone(),
                    field: condition.value.clone(),
                }
            })?;
            Ok(ConditionSpec::new(
                &condition.name,
                ConditionType::FieldValue,
                &condition.field,
                value,
            ))
        }
        ConditionType::FieldValue => Ok(ConditionSpec::new(
            &condition.name,
            ConditionType::FieldValue,
            &condition.field,
            condition.value.as_str(),
        )),
    }
}

/// Resolve every server condition on `entity` that fires for `trigger`.
///
/// Resolution failures surface as a misconfigured-condition error naming the
/// entity.
pub fn secure_conditions<P: Principal + ?Sized>(
    entity: &Entity,
    trigger: Trigger,
    principal: &P,
) -> Result<Vec<ConditionSpec>> {
    entity
        .conditions
        .iter()
        .filter(|c| c.fires_on(trigger))
        .map(|c| {
            resolve_condition(c, principal).map_err(|e| {
                let reason = e.to_string();
                tracing::warn!(entity = %entity.name, condition = %c.name, %reason, "condition misconfigured");
                GuardError::MisconfiguredCondition {
                    entity: entity.name.clone(),
                    reason,
                }
            })
        })
        .collect()
}

/// Combine client logic with appended server conditions.
///
/// Positions are 1-based over `client ++ secure`. Client logic is wrapped in
/// parentheses so the server conditions always AND against the whole of it.
pub fn merge_logic<C, S>(client_logic: &str, client: &[C], secure: &[S]) -> String {
    let user_count = client.len();
    let secure_count = secure.len();
    if user_count + secure_count == 0 {
        return String::new();
    }
    if client_logic.is_empty() {
        return join_positions(1..=user_count + secure_count);
    }
    if secure_count == 0 {
        return client_logic.to_string();
    }
    format!(
        "({client_logic}) AND {}",
        join_positions(user_count + 1..=user_count + secure_count)
    )
}

fn join_positions(range: std::ops::RangeInclusive<usize>) -> String {
    range
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(" AND ")
}
