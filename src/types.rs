use std::fmt;

use serde::{Deserialize, Serialize};

use crate::form::FormData;

/// Payload sent to `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub nanoparticle_id: String,
    pub core_size: f64,
    pub zeta_potential: f64,
    pub surface_area: f64,
    pub bandgap_energy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electric_charge: Option<f64>,
    pub oxygen_atoms: f64,
    pub dosage: f64,
    pub exposure_time: f64,
    #[serde(rename = "environmental_pH")]
    pub environmental_ph: f64,
    pub protein_corona: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage1Response {
    pub predicted_hydrodynamic_diameter: String,
    pub aggregation_factor: String,
    pub stability_assessment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage2Response {
    pub toxicity_prediction: String,
    pub confidence: f64,
    pub risk_level: String,
    pub composite_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage3Response {
    pub ros_generation: String,
    pub apoptosis_induction: String,
    pub membrane_damage: String,
    pub cell_viability: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFactors {
    pub material: String,
    pub size_effect: String,
    pub surface_reactivity: String,
    pub environmental: String,
}

/// Successful body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub nanoparticle_id: String,
    pub stage1: Stage1Response,
    pub stage2: Stage2Response,
    pub stage3: Stage3Response,
    pub key_factors: KeyFactors,
}

/// Cellular mechanisms reported in stage 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mechanism {
    #[serde(rename = "ROS Generation")]
    RosGeneration,
    #[serde(rename = "Apoptosis Induction")]
    ApoptosisInduction,
    #[serde(rename = "Membrane Damage")]
    MembraneDamage,
    #[serde(rename = "Cell Viability")]
    CellViability,
}

impl Mechanism {
    pub const ALL: [Mechanism; 4] = [
        Mechanism::RosGeneration,
        Mechanism::ApoptosisInduction,
        Mechanism::MembraneDamage,
        Mechanism::CellViability,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Mechanism::RosGeneration => "ROS Generation",
            Mechanism::ApoptosisInduction => "Apoptosis Induction",
            Mechanism::MembraneDamage => "Membrane Damage",
            Mechanism::CellViability => "Cell Viability",
        }
    }

    /// The stage 3 field carrying this mechanism's assessment.
    pub fn value(self, stage3: &Stage3Response) -> &str {
        match self {
            Mechanism::RosGeneration => &stage3.ros_generation,
            Mechanism::ApoptosisInduction => &stage3.apoptosis_induction,
            Mechanism::MembraneDamage => &stage3.membrane_damage,
            Mechanism::CellViability => &stage3.cell_viability,
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CytotoxicityLevel {
    #[serde(rename = "Cytotoxic")]
    Cytotoxic,
    #[serde(rename = "Moderately Cytotoxic")]
    ModeratelyCytotoxic,
    #[serde(rename = "Non-Cytotoxic")]
    NonCytotoxic,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl CytotoxicityLevel {
    pub fn label(self) -> &'static str {
        match self {
            CytotoxicityLevel::Cytotoxic => "Cytotoxic",
            CytotoxicityLevel::ModeratelyCytotoxic => "Moderately Cytotoxic",
            CytotoxicityLevel::NonCytotoxic => "Non-Cytotoxic",
            CytotoxicityLevel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for CytotoxicityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CytotoxicityEffect {
    pub mechanism: Mechanism,
    pub level: CytotoxicityLevel,
    /// Server wording the level was derived from.
    pub raw: String,
}

impl fmt::Display for CytotoxicityEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.mechanism, self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub journal: String,
    pub year: u16,
}

/// Whether a view model came from the remote service or the canned fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Live,
    Fallback,
}

/// View model handed to the display layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    pub toxicity: String,
    pub cytotoxicity_effects: Vec<CytotoxicityEffect>,
    pub confidence: f64,
    pub key_drivers: Vec<String>,
    pub citations: Vec<Citation>,
    pub hydrodynamic_diameter: Option<f64>,
    pub raw_data: FormData,
    pub api_response: ApiResponse,
    pub source: ResponseSource,
}

impl PredictionResponse {
    pub fn effect(&self, mechanism: Mechanism) -> Option<&CytotoxicityEffect> {
        self.cytotoxicity_effects
            .iter()
            .find(|effect| effect.mechanism == mechanism)
    }
}
