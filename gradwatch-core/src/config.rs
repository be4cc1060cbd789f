use std::path::PathBuf;

use tracing::{debug, info};

use crate::location::RegionMatcher;
use crate::table::ColumnLayout;

/// README section headers whose tables are harvested.
pub const DEFAULT_SECTIONS: &[&str] = &[
    "## 💻 Software Engineering New Grad Roles",
    "## 📱 Product Management New Grad Roles",
    "## 🤖 Data Science, AI & Machine Learning New Grad Roles",
];

pub const DEFAULT_LEDGER_PATH: &str = "seen.json";
pub const DEFAULT_REGION_LABEL: &str = "NYC";

/// Everything the publish and refresh flows need besides their collaborators.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub sections: Vec<String>,
    pub columns: ColumnLayout,
    pub region: RegionMatcher,
    /// Short region name used in notifications and summaries.
    pub region_label: String,
    pub ledger_path: PathBuf,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            sections: DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect(),
            columns: ColumnLayout::default(),
            region: RegionMatcher::nyc(),
            region_label: DEFAULT_REGION_LABEL.to_string(),
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
        }
    }
}

impl HarvestConfig {
    pub fn trace_loaded(&self) {
        info!(
            sections = self.sections.len(),
            region = %self.region_label,
            region_patterns = self.region.len(),
            ledger_path = %self.ledger_path.display(),
            "Loaded HarvestConfig"
        );
        debug!(?self, "HarvestConfig loaded (full debug)");
    }
}
