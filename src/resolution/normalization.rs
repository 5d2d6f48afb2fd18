// src/resolution/normalization.rs - Ordered name-normalization passes over the whole table
use anyhow::{bail, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::models::stats_models::{ResolutionStage, StageStats};
use crate::models::{Field, Record};
use crate::resolution::mappings;
use crate::resolution::name_matcher::{normalize, NameMapping};
use crate::utils::progress_bars::logging::StageLogger;

/// One mapping applied to one (check field, target field) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationPass {
    pub name: String,
    pub check: Field,
    pub target: Field,
    pub mapping: NameMapping,
}

impl NormalizationPass {
    pub fn new(name: &str, check: Field, target: Field, mapping: NameMapping) -> Self {
        Self {
            name: name.to_string(),
            check,
            target,
            mapping,
        }
    }

    /// Records whose check field is null are skipped; a miss leaves the target alone.
    pub fn apply(&self, records: &mut [Record]) -> StageStats {
        let stage = ResolutionStage::Normalization(self.name.clone());
        let logger = StageLogger::new(&stage);
        let mut stats = StageStats::new(stage);

        for record in records.iter_mut() {
            let Some(value) = record.field(self.check) else {
                continue;
            };
            stats.examined += 1;
            if let Some(replacement) = normalize(value, &self.mapping) {
                if record.field(self.target) != Some(replacement.as_str()) {
                    record.set_field(self.target, replacement);
                    stats.resolved += 1;
                }
            }
        }

        logger.log_debug(&format!(
            "{}: {} of {} values rewritten",
            self.name, stats.resolved, stats.examined
        ));
        stats.duration_secs = logger.elapsed_secs();
        stats
    }
}

/// The passes in execution order. Later passes read fields written by earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationPlan {
    pub passes: Vec<NormalizationPass>,
}

impl Default for NormalizationPlan {
    fn default() -> Self {
        Self::default_plan()
    }
}

impl NormalizationPlan {
    pub fn default_plan() -> Self {
        Self {
            passes: vec![
                NormalizationPass::new(
                    "country_variants",
                    Field::Country,
                    Field::Country,
                    mappings::country_variants(),
                ),
                NormalizationPass::new(
                    "subdivision_promotions",
                    Field::SubdivisionName,
                    Field::Country,
                    mappings::subdivision_promotions(),
                ),
                NormalizationPass::new(
                    "subdivision_corrections",
                    Field::SubdivisionName,
                    Field::SubdivisionName,
                    mappings::subdivision_corrections(),
                ),
                NormalizationPass::new(
                    "continent_corrections",
                    Field::Country,
                    Field::Continent,
                    mappings::continent_corrections(),
                ),
            ],
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let plan: Self = serde_json::from_str(json).context("Invalid normalization plan JSON")?;
        if plan.passes.is_empty() {
            bail!("Normalization plan has no passes");
        }
        Ok(plan)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read normalization plan {}", path.display()))?;
        let plan = Self::from_json_str(&json).with_context(|| format!("In {}", path.display()))?;
        info!("🧹 Loaded {} normalization passes from {}", plan.passes.len(), path.display());
        Ok(plan)
    }

    pub fn apply(&self, records: &mut [Record]) -> Vec<StageStats> {
        self.passes.iter().map(|pass| pass.apply(records)).collect()
    }
}
