use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolError};
use crate::model::{COMPANY, SYMBOL};

/// Acceptance threshold used by the approximate file matcher.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;

/// One of the six logical sources the pipeline combines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Equity,
    Insider,
    SastRegular,
    SastPledged,
    ShareholdingPattern,
    BhavData,
}

impl Slot {
    /// Processing order. The first slot seeds the accumulator and every later
    /// slot is joined onto it.
    pub const ORDER: [Slot; 6] = [
        Slot::Equity,
        Slot::Insider,
        Slot::SastRegular,
        Slot::SastPledged,
        Slot::ShareholdingPattern,
        Slot::BhavData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Equity => "equity",
            Slot::Insider => "insider",
            Slot::SastRegular => "sast_regular",
            Slot::SastPledged => "sast_pledged",
            Slot::ShareholdingPattern => "shareholding_pattern",
            Slot::BhavData => "bhav_data",
        }
    }

    fn default_keyword(&self) -> &'static str {
        match self {
            Slot::Equity => "EQUITY_L",
            Slot::Insider => "Insider",
            Slot::SastRegular => "SAST-Regular",
            Slot::SastPledged => "SAST-Pledged",
            Slot::ShareholdingPattern => "Shareholding",
            Slot::BhavData => "bhavdata",
        }
    }

    fn default_columns(&self) -> &'static [&'static str] {
        match self {
            Slot::Equity => &[SYMBOL, "OPEN", "HIGH", "LOW", "PREV. CLOSE"],
            Slot::Insider => &[
                SYMBOL,
                COMPANY,
                "NAME OF THE ACQUIRER/DISPOSER",
                "VALUE OF SECURITY (ACQUIRED/DISPLOSED)",
                "ACQUISITION/DISPOSAL TRANSACTION TYPE",
            ],
            Slot::SastRegular => &[
                SYMBOL,
                COMPANY,
                "TOTAL AFTER ACQUISITION/SALE (SHARES/VOTING RIGHTS/WARRANTS/ CONVERTIBLE SECURITIES/ANY OTHER INSTRUMENT)",
            ],
            Slot::SastPledged => &[
                COMPANY,
                "NAME OF COMPANY",
                "PROMOTER SHARES ENCUMBERED AS OF LAST QUARTER % OF TOTAL SHARES [X/(A+B+C)]",
            ],
            Slot::ShareholdingPattern => &[COMPANY, "PROMOTER & PROMOTER GROUP (A)"],
            Slot::BhavData => &[
                SYMBOL,
                "CLOSE_PRICE",
                "OPEN_PRICE",
                "HIGH_PRICE",
                "LOW_PRICE",
                "NET_TRDQTY",
            ],
        }
    }

    /// Join plan used when the configuration does not override it. The
    /// equity slot seeds the accumulator and has none.
    pub fn default_join(&self) -> Option<JoinPlan> {
        match self {
            Slot::Equity => None,
            Slot::Insider | Slot::BhavData => Some(JoinPlan::on([SYMBOL])),
            Slot::SastRegular => Some(JoinPlan::Composite {
                keys: vec![SYMBOL.to_string(), COMPANY.to_string()],
                fallback: vec![SYMBOL.to_string()],
            }),
            Slot::SastPledged | Slot::ShareholdingPattern => Some(JoinPlan::on([COMPANY])),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key selection for one join step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JoinPlan {
    /// Join on these keys or skip the step.
    On { keys: Vec<String> },
    /// Join on `keys` when both operands carry all of them, otherwise on
    /// `fallback`.
    Composite {
        keys: Vec<String>,
        fallback: Vec<String>,
    },
}

impl JoinPlan {
    pub fn on<const N: usize>(keys: [&str; N]) -> Self {
        JoinPlan::On {
            keys: keys.iter().map(|key| key.to_string()).collect(),
        }
    }
}

/// Per-slot lookup keyword, column whitelist and optional join override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSpec {
    pub slot: Slot,
    pub keyword: String,
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<JoinPlan>,
}

impl SlotSpec {
    fn default_for(slot: Slot) -> Self {
        Self {
            slot,
            keyword: slot.default_keyword().to_string(),
            columns: slot
                .default_columns()
                .iter()
                .map(|column| column.to_string())
                .collect(),
            join: None,
        }
    }

    /// Override when present, otherwise the slot's default plan.
    pub fn join_plan(&self) -> Option<JoinPlan> {
        self.join.clone().or_else(|| self.slot.default_join())
    }
}

/// String similarity algorithm used by the approximate file matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityKind {
    #[default]
    NormalizedLevenshtein,
    JaroWinkler,
}

/// What to do when several columns of one table look like a company name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyRenamePolicy {
    /// Rename the first candidate in column order and warn about the rest.
    #[default]
    FirstMatch,
    /// Rename nothing and report the ambiguity as an error.
    Strict,
}

/// Complete configuration of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub slots: Vec<SlotSpec>,
    pub similarity: SimilarityKind,
    pub threshold: f64,
    pub company_policy: CompanyRenamePolicy,
    /// Append an empty `COMPANY` column to a final table that has none.
    pub ensure_company_column: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            slots: Slot::ORDER.into_iter().map(SlotSpec::default_for).collect(),
            similarity: SimilarityKind::default(),
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            company_policy: CompanyRenamePolicy::default(),
            ensure_company_column: true,
        }
    }
}

impl PipelineConfig {
    /// Loads and validates a JSON configuration document. Missing top-level
    /// fields take their default values.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ToolError::MissingInput(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every slot is configured exactly once with usable values.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ToolError::InvalidConfig(format!(
                "threshold {} is outside 0.0..=1.0",
                self.threshold
            )));
        }

        for slot in Slot::ORDER {
            let count = self.slots.iter().filter(|spec| spec.slot == slot).count();
            if count != 1 {
                return Err(ToolError::InvalidConfig(format!(
                    "slot '{slot}' must be configured exactly once, found {count}"
                )));
            }
        }

        for spec in &self.slots {
            if spec.keyword.trim().is_empty() {
                return Err(ToolError::InvalidConfig(format!(
                    "slot '{}' has an empty keyword",
                    spec.slot
                )));
            }
            match (&spec.slot, &spec.join) {
                (Slot::Equity, Some(_)) => {
                    return Err(ToolError::InvalidConfig(
                        "slot 'equity' seeds the merge and cannot declare a join".into(),
                    ));
                }
                (_, Some(JoinPlan::On { keys })) if keys.is_empty() => {
                    return Err(ToolError::InvalidConfig(format!(
                        "slot '{}' declares a join without keys",
                        spec.slot
                    )));
                }
                (_, Some(JoinPlan::Composite { keys, fallback }))
                    if keys.is_empty() || fallback.is_empty() =>
                {
                    return Err(ToolError::InvalidConfig(format!(
                        "slot '{}' declares a composite join without keys or fallback",
                        spec.slot
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Specification of `slot`. Validated configurations always have one.
    pub fn slot(&self, slot: Slot) -> Option<&SlotSpec> {
        self.slots.iter().find(|spec| spec.slot == slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_and_complete() {
        let config = PipelineConfig::default();
        config.validate().expect("default config valid");
        for slot in Slot::ORDER {
            assert!(config.slot(slot).is_some(), "{slot} configured");
        }
        assert_eq!(
            config.slot(Slot::BhavData).map(|spec| spec.keyword.as_str()),
            Some("bhavdata")
        );
    }

    #[test]
    fn duplicate_slot_is_rejected() {
        let mut config = PipelineConfig::default();
        config.slots.push(SlotSpec::default_for(Slot::Insider));
        assert!(matches!(
            config.validate(),
            Err(ToolError::InvalidConfig(message)) if message.contains("insider")
        ));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let config = PipelineConfig {
            threshold: 1.5,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    fn with_slot(slot: Slot, edit: impl FnOnce(&mut SlotSpec)) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        if let Some(spec) = config.slots.iter_mut().find(|spec| spec.slot == slot) {
            edit(spec);
        }
        config
    }

    fn rejection(config: &PipelineConfig) -> String {
        match config.validate() {
            Err(ToolError::InvalidConfig(message)) => message,
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn blank_keyword_is_rejected() {
        let config = with_slot(Slot::SastRegular, |spec| spec.keyword = "  ".into());
        assert!(rejection(&config).contains("sast_regular"));
    }

    #[test]
    fn equity_cannot_declare_a_join() {
        let config = with_slot(Slot::Equity, |spec| spec.join = Some(JoinPlan::on([SYMBOL])));
        assert!(rejection(&config).contains("equity"));
    }

    #[test]
    fn join_plans_need_keys() {
        let empty_keys = with_slot(Slot::BhavData, |spec| {
            spec.join = Some(JoinPlan::On { keys: Vec::new() });
        });
        assert!(rejection(&empty_keys).contains("bhav_data"));

        let empty_fallback = with_slot(Slot::SastRegular, |spec| {
            spec.join = Some(JoinPlan::Composite {
                keys: vec![SYMBOL.to_string(), COMPANY.to_string()],
                fallback: Vec::new(),
            });
        });
        assert!(rejection(&empty_fallback).contains("fallback"));
    }

    #[test]
    fn missing_config_file_is_reported() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("stock-sync.json");

        let result = PipelineConfig::from_json_file(&path);

        assert!(matches!(result, Err(ToolError::MissingInput(missing)) if missing == path));
    }

    #[test]
    fn malformed_config_file_is_a_json_error() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("stock-sync.json");
        std::fs::write(&path, r#"{"threshold": "high""#).expect("config written");

        assert!(matches!(
            PipelineConfig::from_json_file(&path),
            Err(ToolError::Json(_))
        ));
    }

    #[test]
    fn config_file_is_loaded_and_validated() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let valid = dir.path().join("valid.json");
        std::fs::write(&valid, r#"{"similarity": "jaro_winkler", "threshold": 0.75}"#)
            .expect("config written");
        let invalid = dir.path().join("invalid.json");
        std::fs::write(&invalid, r#"{"threshold": 2.0}"#).expect("config written");

        let config = PipelineConfig::from_json_file(&valid).expect("config loaded");
        assert_eq!(config.similarity, SimilarityKind::JaroWinkler);
        assert_eq!(config.threshold, 0.75);
        assert!(matches!(
            PipelineConfig::from_json_file(&invalid),
            Err(ToolError::InvalidConfig(_))
        ));
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"company_policy": "strict", "threshold": 0.8}"#)
                .expect("config parsed");
        assert_eq!(config.company_policy, CompanyRenamePolicy::Strict);
        assert_eq!(config.slots.len(), 6);
        config.validate().expect("config valid");
    }

    #[test]
    fn join_override_replaces_default_plan() {
        let spec: SlotSpec = serde_json::from_str(
            r#"{
                "slot": "bhav_data",
                "keyword": "bhav",
                "columns": ["SYMBOL"],
                "join": {"kind": "on", "keys": ["SYMBOL", "SERIES"]}
            }"#,
        )
        .expect("slot parsed");
        assert_eq!(
            spec.join_plan(),
            Some(JoinPlan::on(["SYMBOL", "SERIES"]))
        );
    }
}
