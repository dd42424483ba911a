//! Project record types and the closed category vocabulary

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Closed vocabulary of project categories.
///
/// The completion model is instructed to label each project with values
/// from this list only; anything outside it is rejected at validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Bridge or Structure")]
    BridgeOrStructure,
    #[serde(rename = "Drainage")]
    Drainage,
    #[serde(rename = "Roadway")]
    Roadway,
    #[serde(rename = "Traffic")]
    Traffic,
    #[serde(rename = "Utility")]
    Utility,
    #[serde(rename = "Replacement")]
    Replacement,
    #[serde(rename = "Asset Management")]
    AssetManagement,
    #[serde(rename = "Railroad")]
    Railroad,
    #[serde(rename = "Drainage/Stormwater Management")]
    DrainageStormwaterManagement,
    #[serde(rename = "Water Line")]
    WaterLine,
    #[serde(rename = "Street Improvement")]
    StreetImprovement,
    #[serde(rename = "Lighting or Signals")]
    LightingOrSignals,
    #[serde(rename = "Utility Coordination")]
    UtilityCoordination,
    #[serde(rename = "Wastewater Sewer")]
    WastewaterSewer,
    #[serde(rename = "Wastewater Treatment Plant")]
    WastewaterTreatmentPlant,
    #[serde(rename = "Traffic Report")]
    TrafficReport,
    #[serde(rename = "Permit (Railroad)")]
    PermitRailroad,
    #[serde(rename = "Permit (Wastewater)")]
    PermitWastewater,
    #[serde(rename = "Permit (Other)")]
    PermitOther,
}

impl Category {
    /// Every allowed category, in vocabulary order.
    pub const ALL: [Category; 19] = [
        Category::BridgeOrStructure,
        Category::Drainage,
        Category::Roadway,
        Category::Traffic,
        Category::Utility,
        Category::Replacement,
        Category::AssetManagement,
        Category::Railroad,
        Category::DrainageStormwaterManagement,
        Category::WaterLine,
        Category::StreetImprovement,
        Category::LightingOrSignals,
        Category::UtilityCoordination,
        Category::WastewaterSewer,
        Category::WastewaterTreatmentPlant,
        Category::TrafficReport,
        Category::PermitRailroad,
        Category::PermitWastewater,
        Category::PermitOther,
    ];

    /// Canonical display name, as persisted and as shown to the model.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::BridgeOrStructure => "Bridge or Structure",
            Category::Drainage => "Drainage",
            Category::Roadway => "Roadway",
            Category::Traffic => "Traffic",
            Category::Utility => "Utility",
            Category::Replacement => "Replacement",
            Category::AssetManagement => "Asset Management",
            Category::Railroad => "Railroad",
            Category::DrainageStormwaterManagement => "Drainage/Stormwater Management",
            Category::WaterLine => "Water Line",
            Category::StreetImprovement => "Street Improvement",
            Category::LightingOrSignals => "Lighting or Signals",
            Category::UtilityCoordination => "Utility Coordination",
            Category::WastewaterSewer => "Wastewater Sewer",
            Category::WastewaterTreatmentPlant => "Wastewater Treatment Plant",
            Category::TrafficReport => "Traffic Report",
            Category::PermitRailroad => "Permit (Railroad)",
            Category::PermitWastewater => "Permit (Wastewater)",
            Category::PermitOther => "Permit (Other)",
        }
    }

    /// Parse a category from its canonical name. Leading/trailing
    /// whitespace is tolerated; anything else is not.
    pub fn parse(value: &str) -> Option<Category> {
        let value = value.trim();
        Category::ALL.iter().copied().find(|c| c.as_str() == value)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw project shape as emitted by the completion model.
///
/// Every field is defaulted so that a missing field takes its zero value
/// instead of failing deserialization. Validation happens afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProjectData {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub consultant: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub category: Vec<String>,
}

/// A validated project record extracted from one agenda document.
///
/// Constructed by the structuring parser, enriched once with
/// region/discipline, then handed unmodified to persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Agenda date for the item
    pub date: NaiveDate,
    /// Consulting firm, may be empty
    pub consultant: String,
    /// Contract amount, non-negative
    pub amount: f64,
    /// Project name as written in the agenda
    pub project_name: String,
    /// Categories from the closed vocabulary; may be empty if the model
    /// omitted them
    pub categories: Vec<Category>,
    /// Region attached from location configuration, not model output
    #[serde(default)]
    pub region: String,
    /// Discipline attached from location configuration, not model output
    #[serde(default)]
    pub discipline: String,
}

impl ProjectRecord {
    /// Categories as the flat comma-joined string used in storage.
    /// Lossy for names containing commas; the vocabulary has none.
    pub fn categories_joined(&self) -> String {
        self.categories
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_size() {
        assert_eq!(Category::ALL.len(), 19);
    }

    #[test]
    fn test_parse_known_categories() {
        assert_eq!(Category::parse("Roadway"), Some(Category::Roadway));
        assert_eq!(
            Category::parse("Drainage/Stormwater Management"),
            Some(Category::DrainageStormwaterManagement)
        );
        assert_eq!(
            Category::parse("Permit (Railroad)"),
            Some(Category::PermitRailroad)
        );
        assert_eq!(Category::parse("  Water Line  "), Some(Category::WaterLine));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(Category::parse("Sidewalks"), None);
        assert_eq!(Category::parse("roadway"), None);
        assert_eq!(Category::parse(""), None);
    }

    #[test]
    fn test_serde_names_match_canonical() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
            let back: Category = serde_json::from_str(&json).unwrap();
            assert_eq!(back, category);
        }
    }

    #[test]
    fn test_raw_project_defaults() {
        let raw: RawProjectData = serde_json::from_str("{}").unwrap();
        assert_eq!(raw.date, "");
        assert_eq!(raw.consultant, "");
        assert_eq!(raw.amount, 0.0);
        assert_eq!(raw.project_name, "");
        assert!(raw.category.is_empty());
    }

    #[test]
    fn test_categories_joined() {
        let record = ProjectRecord {
            date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            consultant: "Acme".to_string(),
            amount: 45000.0,
            project_name: "Main St Design".to_string(),
            categories: vec![Category::Roadway, Category::Traffic],
            region: String::new(),
            discipline: String::new(),
        };
        assert_eq!(record.categories_joined(), "Roadway, Traffic");
    }
}
