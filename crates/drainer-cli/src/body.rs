//! Body-composition batch job used by the demo.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use drainer_core::BatchExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

/// One set of tape-measure readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    pub sex: Sex,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub waist_cm: f64,
    pub neck_cm: f64,
    pub hip_cm: f64,
}

impl Measurement {
    /// Deterministic sample data so runs are reproducible.
    pub fn sample(n: u32) -> Self {
        let i = f64::from(n);
        Self {
            sex: if n % 2 == 0 { Sex::Male } else { Sex::Female },
            weight_kg: 55.0 + (i * 7.0) % 45.0,
            height_cm: 155.0 + (i * 11.0) % 40.0,
            waist_cm: 68.0 + (i * 5.0) % 32.0,
            neck_cm: 32.0 + i % 8.0,
            hip_cm: 88.0 + (i * 3.0) % 22.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Composition {
    pub bmi: f64,
    pub body_fat_pct: f64,
    pub fat_mass_kg: f64,
    pub lean_mass_kg: f64,
}

/// Readings that cannot produce a result. Never retried: it is per payload,
/// not a batch failure.
#[derive(Debug, Clone, Error, Serialize)]
#[error("invalid measurement: {0}")]
pub struct InvalidMeasurement(pub String);

/// Transient failure of the whole batch.
#[derive(Debug, Error)]
#[error("calculation backend unavailable (call {call})")]
pub struct BackendUnavailable {
    pub call: u64,
}

/// US Navy circumference method, metric form.
pub fn compose(m: &Measurement) -> Result<Composition, InvalidMeasurement> {
    if m.weight_kg <= 0.0 || m.height_cm <= 0.0 {
        return Err(InvalidMeasurement("weight and height must be positive".into()));
    }

    let height_m = m.height_cm / 100.0;
    let bmi = m.weight_kg / (height_m * height_m);

    let body_fat_pct = match m.sex {
        Sex::Male => {
            let girth = m.waist_cm - m.neck_cm;
            if girth <= 0.0 {
                return Err(InvalidMeasurement("waist must exceed neck".into()));
            }
            495.0 / (1.0324 - 0.19077 * girth.log10() + 0.15456 * m.height_cm.log10()) - 450.0
        }
        Sex::Female => {
            let girth = m.waist_cm + m.hip_cm - m.neck_cm;
            if girth <= 0.0 {
                return Err(InvalidMeasurement("waist + hip must exceed neck".into()));
            }
            495.0 / (1.29579 - 0.35004 * girth.log10() + 0.22100 * m.height_cm.log10()) - 450.0
        }
    };
    let body_fat_pct = body_fat_pct.clamp(0.0, 100.0);
    let fat_mass_kg = m.weight_kg * body_fat_pct / 100.0;

    Ok(Composition {
        bmi,
        body_fat_pct,
        fat_mass_kg,
        lean_mass_kg: m.weight_kg - fat_mass_kg,
    })
}

/// Computes compositions for a batch; can be told to fail every `flaky_every`-th call.
pub struct BodyCompositionExecutor {
    flaky_every: Option<u64>,
    calls: AtomicU64,
}

impl BodyCompositionExecutor {
    pub fn new(flaky_every: Option<u64>) -> Self {
        Self {
            flaky_every: flaky_every.filter(|k| *k > 0),
            calls: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl BatchExecutor<Measurement> for BodyCompositionExecutor {
    type Output = Result<Composition, InvalidMeasurement>;
    type Error = BackendUnavailable;

    async fn execute(
        &self,
        payloads: Vec<Measurement>,
    ) -> Result<Vec<Self::Output>, BackendUnavailable> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(k) = self.flaky_every
            && call % k == 0
        {
            return Err(BackendUnavailable { call });
        }
        Ok(payloads.iter().map(compose).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(sex: Sex) -> Measurement {
        Measurement {
            sex,
            weight_kg: 80.0,
            height_cm: 180.0,
            waist_cm: 85.0,
            neck_cm: 38.0,
            hip_cm: 95.0,
        }
    }

    #[test]
    fn male_reading_is_plausible() {
        let c = compose(&reading(Sex::Male)).unwrap();
        assert!((c.bmi - 24.69).abs() < 0.01);
        assert!(c.body_fat_pct > 10.0 && c.body_fat_pct < 25.0);
        assert!((c.fat_mass_kg + c.lean_mass_kg - 80.0).abs() < 1e-9);
    }

    #[test]
    fn neck_wider_than_waist_is_invalid() {
        let mut m = reading(Sex::Male);
        m.neck_cm = 90.0;
        assert!(compose(&m).is_err());
    }

    #[tokio::test]
    async fn every_kth_call_fails() {
        let executor = BodyCompositionExecutor::new(Some(2));
        assert!(executor.execute(vec![reading(Sex::Female)]).await.is_ok());
        let err = executor.execute(vec![reading(Sex::Female)]).await.unwrap_err();
        assert_eq!(err.call, 2);
        assert!(executor.execute(vec![]).await.is_ok());
    }
}
