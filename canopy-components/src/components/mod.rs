mod forest_growth;

pub use forest_growth::{growth_rate, ForestGrowth, ForestGrowthParameters, GrowthRegime};
