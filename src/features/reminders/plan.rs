//! Reminder plans loaded from YAML
//!
//! ```yaml
//! reminders:
//!   - drug: Amoxicillin
//!     dosage: 250mg
//!     hours: [8, 14, 20, 2]
//! ```

use crate::features::reminders::schedule::ReminderSpec;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReminderPlan {
    pub reminders: Vec<PlanEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlanEntry {
    pub drug: String,
    pub dosage: String,
    pub hours: Vec<u32>,
}

impl Default for ReminderPlan {
    /// Amoxicillin 250mg at 8 AM, 2 PM, 8 PM and 2 AM
    fn default() -> Self {
        ReminderPlan {
            reminders: vec![PlanEntry {
                drug: "Amoxicillin".to_string(),
                dosage: "250mg".to_string(),
                hours: vec![8, 14, 20, 2],
            }],
        }
    }
}

impl ReminderPlan {
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read reminder plan {path}"))?;
        Self::parse(&contents).with_context(|| format!("Invalid reminder plan {path}"))
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        let plan: ReminderPlan = serde_yaml::from_str(yaml)?;
        // Surface bad hours at load time rather than at scheduling time
        plan.specs()?;
        Ok(plan)
    }

    pub fn specs(&self) -> Result<Vec<ReminderSpec>> {
        self.reminders
            .iter()
            .map(|entry| {
                if entry.drug.trim().is_empty() {
                    return Err(anyhow::anyhow!("Reminder entry has no drug name"));
                }
                ReminderSpec::new(&entry.drug, &entry.dosage, entry.hours.iter().copied())
                    .with_context(|| format!("Invalid hours for {}", entry.drug))
            })
            .collect()
    }
}
