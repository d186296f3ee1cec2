//! CLI commands

use fraudguard_core::{Evaluation, TransactionKind};
use fraudguard_engine::{EvaluationResult, LocationPayload, TransactionPayload};
use fraudguard_rules::RuleId;
use fraudguard_store::{ConfigCache, EvaluationRepository, ReviewSummary, ThresholdConfig};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::context::AppContext;

/// Transaction described on the command line
#[derive(Debug, Clone)]
pub struct TransactionArgs {
    pub id: String,
    pub user: String,
    /// Unsigned; the sign comes from `kind`
    pub amount: Decimal,
    pub latitude: f64,
    pub longitude: f64,
    pub kind: String,
    pub device: Option<String>,
    pub timestamp: Option<String>,
    pub description: Option<String>,
}

impl TransactionArgs {
    /// Build the payload the engine validates
    pub fn to_payload(&self) -> TransactionPayload {
        let kind = match TransactionKind::from_str(&self.kind) {
            Ok(kind) => kind,
            Err(never) => match never {},
        };
        let amount = kind.signed_amount(self.amount);

        TransactionPayload {
            id: Some(Value::String(self.id.clone())),
            amount: Some(Value::String(amount.to_string())),
            user_id: Some(Value::String(self.user.clone())),
            location: Some(LocationPayload {
                latitude: Some(Value::from(self.latitude)),
                longitude: Some(Value::from(self.longitude)),
            }),
            timestamp: self.timestamp.clone(),
            device_id: self.device.clone(),
            transaction_type: Some(kind.to_string()),
            description: self.description.clone(),
        }
    }
}

fn print_result(result: &EvaluationResult) {
    let icon = match result.risk_level {
        fraudguard_core::RiskLevel::Low => "✅",
        fraudguard_core::RiskLevel::Medium => "⚠️ ",
        fraudguard_core::RiskLevel::High => "⛔",
    };
    println!(
        "{} {} risk={} status={}",
        icon, result.transaction_id, result.risk_level, result.status
    );
    for reason in &result.reasons {
        println!("   - {}", reason);
    }
}

fn print_row(evaluation: &Evaluation) {
    println!(
        "{:<24} {:<16} {:<6} {:<14} {:>12} {}",
        evaluation.transaction_id,
        evaluation.user_id,
        evaluation.risk_level,
        evaluation.status,
        evaluation
            .amount
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string()),
        evaluation.created_at.to_rfc3339()
    );
}

/// Evaluate a transaction given on the command line
pub async fn evaluate(
    ctx: &AppContext,
    args: &TransactionArgs,
) -> Result<EvaluationResult, anyhow::Error> {
    let result = ctx.evaluator.execute(&args.to_payload()).await?;
    print_result(&result);
    Ok(result)
}

/// Evaluate a raw JSON payload
pub async fn evaluate_json(ctx: &AppContext, json: &str) -> Result<EvaluationResult, anyhow::Error> {
    let payload = TransactionPayload::from_json(json)?;
    let result = ctx.evaluator.execute(&payload).await?;
    print_result(&result);
    Ok(result)
}

/// Record an analyst decision
pub async fn review(
    ctx: &AppContext,
    transaction_id: &str,
    decision: &str,
    analyst_id: &str,
) -> Result<Evaluation, anyhow::Error> {
    let evaluation = ctx.review.execute(transaction_id, decision, analyst_id).await?;
    println!(
        "✅ {} marked {} by {}",
        evaluation.transaction_id, evaluation.status, analyst_id
    );
    Ok(evaluation)
}

/// Record the user's answer to a pending transaction
pub async fn authenticate(
    ctx: &AppContext,
    transaction_id: &str,
    confirmed: bool,
) -> Result<Evaluation, anyhow::Error> {
    let evaluation = ctx.authenticate.execute(transaction_id, confirmed).await?;
    let answer = if confirmed { "confirmed" } else { "denied" };
    println!("✅ User {} {}", answer, evaluation.transaction_id);
    Ok(evaluation)
}

/// Print one evaluation as JSON
pub async fn show(ctx: &AppContext, transaction_id: &str) -> Result<(), anyhow::Error> {
    let Some(evaluation) = ctx.evaluations.get_by_transaction_id(transaction_id).await? else {
        anyhow::bail!("Transaction {} not found", transaction_id);
    };
    println!("{}", serde_json::to_string_pretty(&evaluation)?);
    Ok(())
}

/// List evaluations, newest first
pub async fn list(ctx: &AppContext, user_id: Option<&str>, limit: usize) -> Result<(), anyhow::Error> {
    let evaluations = match user_id {
        Some(user_id) => ctx.evaluations.get_by_user(user_id).await?,
        None => ctx.evaluations.get_all().await?,
    };

    if evaluations.is_empty() {
        println!("No evaluations");
        return Ok(());
    }

    println!(
        "{:<24} {:<16} {:<6} {:<14} {:>12} {}",
        "TRANSACTION", "USER", "RISK", "STATUS", "AMOUNT", "EVALUATED AT"
    );
    for evaluation in evaluations.iter().take(limit) {
        print_row(evaluation);
    }
    if evaluations.len() > limit {
        println!("... {} more", evaluations.len() - limit);
    }
    Ok(())
}

/// Thresholds the next evaluation will use
pub async fn effective_thresholds(ctx: &AppContext) -> Result<ThresholdConfig, anyhow::Error> {
    let cached = ctx.cache.get_threshold_config().await?;
    Ok(cached.unwrap_or_else(|| ctx.evaluator.config().rules.thresholds()))
}

pub async fn thresholds_show(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let thresholds = effective_thresholds(ctx).await?;
    println!("amount_threshold:   {}", thresholds.amount_threshold);
    println!("location_radius_km: {}", thresholds.location_radius_km);
    Ok(())
}

/// Override one or both thresholds for every later evaluation
pub async fn thresholds_set(
    ctx: &AppContext,
    amount: Option<Decimal>,
    radius_km: Option<f64>,
) -> Result<ThresholdConfig, anyhow::Error> {
    let mut thresholds = effective_thresholds(ctx).await?;
    if let Some(amount) = amount {
        thresholds.amount_threshold = amount;
    }
    if let Some(radius_km) = radius_km {
        thresholds.location_radius_km = radius_km;
    }

    ctx.evaluator
        .config()
        .rules
        .with_thresholds(&thresholds)
        .validate()?;
    ctx.cache.set_threshold_config(&thresholds).await?;

    println!(
        "✅ Thresholds set: amount {} / radius {} km",
        thresholds.amount_threshold, thresholds.location_radius_km
    );
    Ok(thresholds)
}

/// Show every rule with its configured and runtime state
pub async fn rules_list(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let configured = &ctx.evaluator.config().enabled_rules;
    let disabled = ctx.cache.disabled_rules().await?;

    for rule in RuleId::all() {
        let state = if !configured.contains(&rule) {
            "not configured"
        } else if disabled.contains(rule.as_str()) {
            "disabled"
        } else {
            "enabled"
        };
        println!("{:<24} {}", rule, state);
    }
    Ok(())
}

pub async fn rules_set(ctx: &AppContext, rule: RuleId, enabled: bool) -> Result<(), anyhow::Error> {
    ctx.cache.set_rule_enabled(rule.as_str(), enabled).await?;
    println!(
        "✅ {} {}",
        rule,
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Print the manual review queue in publication order
pub fn queue(ctx: &AppContext, limit: usize) -> Result<Vec<ReviewSummary>, anyhow::Error> {
    let summaries = ctx.queue().read_all()?;
    println!("Review queue: {} ({} entries)", ctx.queue_path().display(), summaries.len());

    for summary in summaries.iter().rev().take(limit) {
        println!(
            "  {} user={} risk={} reasons=[{}]",
            summary.transaction_id,
            summary.user_id,
            summary.risk_level,
            summary.reasons.join(", ")
        );
    }
    Ok(summaries)
}
