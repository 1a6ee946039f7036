//! `when` evaluation (§4.2.1): simple and block forms, the three block
//! modifiers, and the block-statement sequencing shared with `for` bodies.

use crate::context::EvalContext;
use crate::expr::{eval_condition, eval_expr};
use crate::future::BoxFuture;
use mlld_ast::{BlockAction, BlockStmt, WhenArm, WhenForm, WhenModifier};
use mlld_env::{EnvHandle, EnvKind};
use mlld_errors::EvalError;
use mlld_value::Value;

/// Evaluate a `when` expression, simple or block form.
pub fn eval_when<'a>(
    ctx: &'a mut EvalContext,
    handle: EnvHandle,
    form: &'a WhenForm,
) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(async move {
        match form {
            WhenForm::Simple { condition, action } => {
                if eval_condition(ctx, handle, condition).await? {
                    eval_expr(ctx, handle, action).await
                } else {
                    Ok(Value::null())
                }
            }
            WhenForm::Block { modifier, arms } => eval_block_form(ctx, handle, *modifier, arms).await,
        }
    })
}

async fn eval_block_form(
    ctx: &mut EvalContext,
    handle: EnvHandle,
    modifier: WhenModifier,
    arms: &[WhenArm],
) -> Result<Value, EvalError> {
    // Only the last default arm written is reachable anyway (§4.2.1 "`*=>`
    // default arm"), so collecting just the final one matches actual use.
    let mut default_arm: Option<&WhenArm> = None;
    let mut conditioned: Vec<&WhenArm> = Vec::with_capacity(arms.len());
    for arm in arms {
        if arm.is_default {
            default_arm = Some(arm);
        } else {
            conditioned.push(arm);
        }
    }

    match modifier {
        WhenModifier::First => {
            for arm in &conditioned {
                if eval_condition(ctx, handle, &arm.condition).await? {
                    return eval_expr(ctx, handle, &arm.action).await;
                }
            }
            match default_arm {
                Some(arm) => eval_expr(ctx, handle, &arm.action).await,
                None => Ok(Value::null()),
            }
        }
        // "evaluate every Ci; if all truthy, evaluate every Ai; else return
        // empty" — every condition is checked before any action runs, so a
        // later action never fires on the strength of an earlier, unrelated
        // truthy arm.
        WhenModifier::All => {
            let mut truths = Vec::with_capacity(conditioned.len());
            for arm in &conditioned {
                truths.push(eval_condition(ctx, handle, &arm.condition).await?);
            }
            if truths.iter().any(|truthy| !truthy) {
                return Ok(Value::array(Vec::new()));
            }
            let mut results = Vec::with_capacity(conditioned.len());
            for arm in &conditioned {
                results.push(eval_expr(ctx, handle, &arm.action).await?);
            }
            Ok(Value::array(results))
        }
        WhenModifier::Any => {
            let mut results = Vec::new();
            for arm in &conditioned {
                if eval_condition(ctx, handle, &arm.condition).await? {
                    results.push(eval_expr(ctx, handle, &arm.action).await?);
                }
            }
            if results.is_empty() {
                if let Some(arm) = default_arm {
                    results.push(eval_expr(ctx, handle, &arm.action).await?);
                }
            }
            // Open Question 1 (DESIGN.md): defaults to collecting every
            // matched action's value; `BlockAction::First`/`Last` narrow
            // that down to a single one when configured.
            Ok(match ctx.config.block_action {
                BlockAction::All => Value::array(results),
                BlockAction::First => results.into_iter().next().unwrap_or_else(Value::null),
                BlockAction::Last => results.into_iter().last().unwrap_or_else(Value::null),
            })
        }
    }
}

/// Evaluate a block body (`when`/`for` action, `/env` body): `Let`
/// statements bind into a fresh child scope that's thrown away at block
/// exit, `Directive` statements re-dispatch through the directive
/// evaluator. The block's value is whatever its last statement produced.
pub fn eval_block<'a>(
    ctx: &'a mut EvalContext,
    handle: EnvHandle,
    stmts: &'a [BlockStmt],
) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(async move {
        let scope = ctx.arena.child(handle, EnvKind::Child);
        let mut last = None;
        for stmt in stmts {
            match stmt {
                BlockStmt::Let { name, expr, .. } => {
                    let value = eval_expr(ctx, scope, expr).await?;
                    ctx.arena.set(scope, name, value.clone())?;
                    last = Some(value);
                }
                BlockStmt::Directive(directive) => {
                    if let Some(value) = crate::directive::eval_directive(ctx, scope, directive).await? {
                        last = Some(value);
                    }
                }
            }
        }
        ctx.arena.destroy(scope);
        Ok(last.unwrap_or_else(Value::null))
    })
}
