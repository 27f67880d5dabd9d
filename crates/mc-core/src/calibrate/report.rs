//! Calibration report generation.
//!
//! Produces the per-run report in multiple formats:
//! - JSON for programmatic consumption
//! - Markdown tables for humans
//! - One-line summary for quick status checks

use chrono::{DateTime, Utc};
use mc_common::{HealthState, Therapy};
use mc_config::ConfigSnapshot;
use serde::Serialize;

use super::{ArmCalibration, BaselineModel, ClinicalHazards, ParameterSet};
use crate::model::TransitionProbabilityMatrix;

/// Everything a calibration run produced.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationReport {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigSnapshot>,
    pub hazards: ClinicalHazards,
    pub baseline: BaselineModel,
    pub arms: Vec<ArmCalibration>,
}

impl CalibrationReport {
    pub fn new(hazards: ClinicalHazards, baseline: BaselineModel, arms: Vec<ArmCalibration>) -> Self {
        Self {
            schema_version: mc_common::SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            run_id: None,
            config: None,
            hazards,
            baseline,
            arms,
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_config(mut self, snapshot: ConfigSnapshot) -> Self {
        self.config = Some(snapshot);
        self
    }

    /// Calibration of `therapy`, if it was requested.
    pub fn arm(&self, therapy: Therapy) -> Option<&ArmCalibration> {
        self.arms.iter().find(|a| a.diagnostics.therapy == therapy)
    }

    pub fn parameter_sets(&self) -> impl Iterator<Item = &ParameterSet> {
        self.arms.iter().map(|a| &a.parameters)
    }

    /// Number of arms whose generator had to be regularized.
    pub fn regularized_arms(&self) -> usize {
        self.arms
            .iter()
            .filter(|a| {
                [
                    a.diagnostics.therapy_regularization,
                    a.diagnostics.overlay_regularization,
                ]
                .iter()
                .flatten()
                .any(|r| !r.is_exact())
            })
            .count()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One-line summary.
    pub fn summary_line(&self) -> String {
        let arms: Vec<String> = self
            .arms
            .iter()
            .map(|a| a.diagnostics.therapy.to_string())
            .collect();
        format!(
            "calibrated {} arm(s) [{}] from {} baseline, delta_t={:.4}, {} regularized",
            self.arms.len(),
            arms.join(", "),
            self.baseline.source,
            self.arms
                .first()
                .map(|a| a.parameters.delta_t())
                .unwrap_or(f64::NAN),
            self.regularized_arms(),
        )
    }

    /// Markdown rendering with hazards, baseline and one section per arm.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Calibration Report\n\n");
        if let Some(run_id) = &self.run_id {
            out.push_str(&format!("Run: `{}`\n\n", run_id));
        }
        if let Some(config) = &self.config {
            out.push_str(&format!(
                "Inputs: {} ({}), snapshot `{}`\n\n",
                config.inputs_path.as_deref().unwrap_or("built-in defaults"),
                config.inputs_source,
                config.short_id()
            ));
        }

        out.push_str("## Hazards (per year)\n\n");
        out.push_str("| Quantity | Rate |\n|---|---|\n");
        let h = &self.hazards;
        for (name, rate) in [
            ("background mortality", h.background_mortality),
            ("stroke mortality", h.stroke_mortality),
            ("first stroke", h.first_stroke),
            ("first stroke, survived", h.first_stroke_split.primary),
            ("first stroke, fatal", h.first_stroke_split.secondary),
            ("recurrence", h.recurrence),
            ("recurrence to stroke", h.recurrence_split.primary),
            ("recurrence to death", h.recurrence_split.secondary),
            ("stroke clearance", h.stroke_clearance),
        ] {
            out.push_str(&format!("| {} | {:.6} |\n", name, rate));
        }

        out.push_str(&format!("\n## Baseline ({}, annual)\n\n", self.baseline.source));
        push_matrix(&mut out, &self.baseline.annual);

        for arm in &self.arms {
            let p = &arm.parameters;
            let d = &arm.diagnostics;
            out.push_str(&format!("\n## Arm: {}\n\n", d.therapy));
            out.push_str(&format!(
                "- time step: {:.6} years\n- discount rate per step: {:.6}\n- annual drug cost: {:.2}\n- stroke event cost: {:.2}\n- background mortality overlay: {}\n",
                p.delta_t(),
                p.adj_discount_rate(),
                p.annual_drug_cost(),
                p.stroke_event_cost(),
                if d.overlay_applied { "applied" } else { "disabled" },
            ));
            if let Some(rate) = d.max_exit_rate {
                out.push_str(&format!("- max exit rate: {:.6}\n", rate));
            }
            if d.bleeding_risk_superseded {
                out.push_str("- bleeding relative risk: superseded by background mortality overlay\n");
            }
            out.push('\n');
            push_matrix(&mut out, p.transition_matrix());

            out.push_str("\n| State | Annual cost | Annual utility |\n|---|---|---|\n");
            for state in HealthState::ALL {
                out.push_str(&format!(
                    "| {} | {:.2} | {:.3} |\n",
                    state,
                    p.annual_state_cost(state),
                    p.annual_state_utility(state)
                ));
            }
        }
        out
    }
}

fn push_matrix(out: &mut String, m: &TransitionProbabilityMatrix) {
    out.push_str("| from \\ to |");
    for to in HealthState::ALL {
        out.push_str(&format!(" {} |", to));
    }
    out.push_str("\n|---|");
    for _ in HealthState::ALL {
        out.push_str("---|");
    }
    out.push('\n');
    for from in HealthState::ALL {
        out.push_str(&format!("| {} |", from));
        for p in m.row(from) {
            out.push_str(&format!(" {:.6} |", p));
        }
        out.push('\n');
    }
}
