use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::PredictionRequest;

/// Form field names as submitted by the prediction page.
pub mod fields {
    pub const NANOPARTICLE_ID: &str = "nanoparticleId";
    pub const CORE_SIZE: &str = "coreSize";
    pub const ZETA_POTENTIAL: &str = "zetaPotential";
    pub const SURFACE_AREA: &str = "surfaceArea";
    pub const BANDGAP_ENERGY: &str = "bandgapEnergy";
    pub const ELECTRIC_CHARGE: &str = "electricCharge";
    pub const OXYGEN_ATOMS: &str = "oxygenAtoms";
    pub const DOSAGE: &str = "dosage";
    pub const EXPOSURE_TIME: &str = "exposureTime";
    pub const ENVIRONMENTAL_PH: &str = "environmentalPH";
    pub const PROTEIN_CORONA: &str = "proteinCorona";
    pub const HYDRODYNAMIC_DIAMETER: &str = "hydrodynamicDiameter";
}

pub const DEFAULT_ENVIRONMENTAL_PH: f64 = 7.4;
pub const PROTEIN_CORONA_PRESENT: &str = "Present";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

/// Raw string values keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(BTreeMap<String, String>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    /// Value of `field`, treating blank input as absent.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn number(&self, field: &'static str) -> Result<Option<f64>, FormError> {
        self.get(field).map(|raw| parse_number(field, raw)).transpose()
    }

    pub fn required_number(&self, field: &'static str) -> Result<f64, FormError> {
        self.number(field)?.ok_or(FormError::MissingField(field))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        )
    }
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, FormError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| FormError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

pub fn generated_nanoparticle_id() -> String {
    format!("NP-{}", Utc::now().timestamp_millis())
}

impl PredictionRequest {
    /// Builds the wire payload from submitted form values.
    ///
    /// Every numeric field must parse as a finite number; nothing malformed is
    /// forwarded to the service. The display-only hydrodynamic diameter
    /// override is validated here too although it is not part of the payload.
    pub fn from_form(form: &FormData) -> Result<Self, FormError> {
        use fields::*;

        form.number(HYDRODYNAMIC_DIAMETER)?;

        Ok(Self {
            nanoparticle_id: form
                .get(NANOPARTICLE_ID)
                .map(str::to_string)
                .unwrap_or_else(generated_nanoparticle_id),
            core_size: form.required_number(CORE_SIZE)?,
            zeta_potential: form.required_number(ZETA_POTENTIAL)?,
            surface_area: form.required_number(SURFACE_AREA)?,
            bandgap_energy: form.required_number(BANDGAP_ENERGY)?,
            electric_charge: form.number(ELECTRIC_CHARGE)?,
            oxygen_atoms: form.required_number(OXYGEN_ATOMS)?,
            dosage: form.required_number(DOSAGE)?,
            exposure_time: form.required_number(EXPOSURE_TIME)?,
            environmental_ph: form
                .number(ENVIRONMENTAL_PH)?
                .unwrap_or(DEFAULT_ENVIRONMENTAL_PH),
            protein_corona: form.0.get(PROTEIN_CORONA).map(String::as_str)
                == Some(PROTEIN_CORONA_PRESENT),
        })
    }
}

impl TryFrom<&FormData> for PredictionRequest {
    type Error = FormError;

    fn try_from(form: &FormData) -> Result<Self, Self::Error> {
        Self::from_form(form)
    }
}
