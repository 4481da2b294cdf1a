use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    MobileLow,
    #[default]
    DesktopHigh,
    DesktopUltra,
}

#[derive(Debug, Clone, Copy)]
pub struct BudgetProfile {
    pub star_count: u32,
}

impl QualityTier {
    pub fn budget(self) -> BudgetProfile {
        match self {
            Self::MobileLow => BudgetProfile {
                star_count: 15_000,
            },
            Self::DesktopHigh => BudgetProfile {
                star_count: 40_000,
            },
            Self::DesktopUltra => BudgetProfile {
                star_count: 120_000,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::QualityTier;

    #[test]
    fn budgets_grow_with_tier() {
        let low = QualityTier::MobileLow.budget().star_count;
        let high = QualityTier::DesktopHigh.budget().star_count;
        let ultra = QualityTier::DesktopUltra.budget().star_count;
        assert!(low < high && high < ultra);
        assert_eq!(QualityTier::default().budget().star_count, 40_000);
    }
}
