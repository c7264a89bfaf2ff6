use serde::{Deserialize, Serialize};

/// Parameters of the MET energy model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyModel {
    /// Metabolic equivalent of the activity. 4.0 approximates running.
    pub met: f64,
    pub weight_kg: f64,
}

impl Default for EnergyModel {
    fn default() -> Self {
        Self {
            met: 4.0,
            weight_kg: 70.0,
        }
    }
}

impl EnergyModel {
    /// Estimated kilocalories burned over `duration_seconds`.
    pub fn calories(&self, duration_seconds: f64) -> f64 {
        self.met * self.weight_kg * duration_seconds / 3600.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_hour_at_defaults() {
        assert_eq!(EnergyModel::default().calories(3600.0), 280.0);
    }

    #[test]
    fn zero_duration_burns_nothing() {
        assert_eq!(EnergyModel::default().calories(0.0), 0.0);
    }

    #[test]
    fn scales_with_configured_weight_and_met() {
        let model = EnergyModel {
            met: 8.0,
            weight_kg: 60.0,
        };
        assert_eq!(model.calories(1800.0), 240.0);
    }
}
