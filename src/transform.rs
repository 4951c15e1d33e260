use crate::form::{FormData, fields, generated_nanoparticle_id};
use crate::types::{
    ApiResponse, Citation, CytotoxicityEffect, CytotoxicityLevel, KeyFactors, Mechanism,
    PredictionResponse, ResponseSource, Stage1Response, Stage2Response, Stage3Response,
};

// Checked in this order; the first group with a match wins.
const CYTOTOXIC_TERMS: &[&str] = &["high", "severe", "strong"];
const MODERATE_TERMS: &[&str] = &["medium", "moderate", "mild"];
const NON_CYTOTOXIC_TERMS: &[&str] = &["low", "minimal", "weak", "none"];

const CITATIONS: [(&str, &str, u16); 3] = [
    (
        "Machine learning prediction of nanoparticle toxicity",
        "Nature Nanotechnology",
        2023,
    ),
    (
        "Physicochemical descriptors in nanomaterial risk assessment",
        "Environmental Science & Technology",
        2024,
    ),
    (
        "Cytotoxicity mechanisms of engineered nanoparticles",
        "ACS Nano",
        2023,
    ),
];

const FALLBACK_KEY_DRIVERS: [&str; 4] = [
    "High dosage",
    "Small core size",
    "Extended exposure",
    "Surface reactivity",
];

impl CytotoxicityLevel {
    /// Maps free-form severity wording onto a level by case-insensitive
    /// substring match.
    pub fn classify(value: &str) -> Self {
        let value = value.to_lowercase();
        let mentions = |terms: &[&str]| terms.iter().any(|term| value.contains(term));

        if mentions(CYTOTOXIC_TERMS) {
            CytotoxicityLevel::Cytotoxic
        } else if mentions(MODERATE_TERMS) {
            CytotoxicityLevel::ModeratelyCytotoxic
        } else if mentions(NON_CYTOTOXIC_TERMS) {
            CytotoxicityLevel::NonCytotoxic
        } else {
            CytotoxicityLevel::Unknown
        }
    }
}

pub fn citations() -> Vec<Citation> {
    CITATIONS
        .iter()
        .map(|&(title, journal, year)| Citation {
            title: title.to_string(),
            journal: journal.to_string(),
            year,
        })
        .collect()
}

pub fn cytotoxicity_effects(stage3: &Stage3Response) -> Vec<CytotoxicityEffect> {
    Mechanism::ALL
        .into_iter()
        .map(|mechanism| {
            let raw = mechanism.value(stage3);
            CytotoxicityEffect {
                mechanism,
                level: CytotoxicityLevel::classify(raw),
                raw: raw.to_string(),
            }
        })
        .collect()
}

pub fn key_drivers(factors: &KeyFactors) -> Vec<String> {
    vec![
        format!("Material Effect: {}", factors.material),
        format!("Size Effect: {}", factors.size_effect),
        format!("Surface Reactivity: {}", factors.surface_reactivity),
        format!("Environmental: {}", factors.environmental),
    ]
}

/// Leading decimal number of a free-form string, e.g. `45.2` for `"45.2 nm"`.
pub fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .unwrap_or(text.len());

    (1..=end)
        .rev()
        .find_map(|len| text[..len].parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// A user-supplied diameter overrides the predicted one.
pub fn display_hydrodynamic_diameter(stage1: &Stage1Response, form: &FormData) -> Option<f64> {
    form.number(fields::HYDRODYNAMIC_DIAMETER)
        .ok()
        .flatten()
        .or_else(|| leading_number(&stage1.predicted_hydrodynamic_diameter))
}

pub fn transform_api_response(api_response: ApiResponse, form: &FormData) -> PredictionResponse {
    PredictionResponse {
        toxicity: api_response.stage2.toxicity_prediction.clone(),
        cytotoxicity_effects: cytotoxicity_effects(&api_response.stage3),
        confidence: api_response.stage2.confidence,
        key_drivers: key_drivers(&api_response.key_factors),
        citations: citations(),
        hydrodynamic_diameter: display_hydrodynamic_diameter(&api_response.stage1, form),
        raw_data: form.clone(),
        api_response,
        source: ResponseSource::Live,
    }
}

/// Canned assessment served in place of a failed prediction.
pub fn fallback_response(form: &FormData) -> PredictionResponse {
    let api_response = ApiResponse {
        success: true,
        nanoparticle_id: form
            .get(fields::NANOPARTICLE_ID)
            .map(str::to_string)
            .unwrap_or_else(generated_nanoparticle_id),
        stage1: Stage1Response {
            predicted_hydrodynamic_diameter: "45.2".to_string(),
            aggregation_factor: "1.5x".to_string(),
            stability_assessment: "MODERATE STABILITY".to_string(),
        },
        stage2: Stage2Response {
            toxicity_prediction: "TOXIC".to_string(),
            confidence: 0.85,
            risk_level: "HIGH RISK".to_string(),
            composite_score: 0.78,
        },
        stage3: Stage3Response {
            ros_generation: "HIGH".to_string(),
            apoptosis_induction: "MEDIUM".to_string(),
            membrane_damage: "HIGH".to_string(),
            cell_viability: "LOW".to_string(),
        },
        key_factors: KeyFactors {
            material: "85.0%".to_string(),
            size_effect: "HIGH".to_string(),
            surface_reactivity: "MODERATE".to_string(),
            environmental: "UNFAVORABLE".to_string(),
        },
    };

    PredictionResponse {
        toxicity: "Toxic".to_string(),
        cytotoxicity_effects: cytotoxicity_effects(&api_response.stage3),
        confidence: 0.85,
        key_drivers: FALLBACK_KEY_DRIVERS.iter().map(|d| d.to_string()).collect(),
        citations: citations(),
        hydrodynamic_diameter: display_hydrodynamic_diameter(&api_response.stage1, form),
        raw_data: form.clone(),
        api_response,
        source: ResponseSource::Fallback,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_api_response() -> ApiResponse {
        ApiResponse {
            success: true,
            nanoparticle_id: "NP-42".to_string(),
            stage1: Stage1Response {
                predicted_hydrodynamic_diameter: "38.6 nm".to_string(),
                aggregation_factor: "1.9x".to_string(),
                stability_assessment: "LOW STABILITY".to_string(),
            },
            stage2: Stage2Response {
                toxicity_prediction: "NON-TOXIC".to_string(),
                confidence: 0.91,
                risk_level: "LOW RISK".to_string(),
                composite_score: 0.22,
            },
            stage3: Stage3Response {
                ros_generation: "HIGH".to_string(),
                apoptosis_induction: "Moderate activation".to_string(),
                membrane_damage: "minimal".to_string(),
                cell_viability: "82% viable".to_string(),
            },
            key_factors: KeyFactors {
                material: "TiO2 anatase".to_string(),
                size_effect: "MODERATE".to_string(),
                surface_reactivity: "LOW".to_string(),
                environmental: "FAVORABLE".to_string(),
            },
        }
    }

    #[test]
    fn classification_is_case_insensitive() {
        use CytotoxicityLevel::*;

        assert_eq!(CytotoxicityLevel::classify("HIGH"), Cytotoxic);
        assert_eq!(CytotoxicityLevel::classify("Severe necrosis"), Cytotoxic);
        assert_eq!(CytotoxicityLevel::classify("MODERATE"), ModeratelyCytotoxic);
        assert_eq!(CytotoxicityLevel::classify("mild"), ModeratelyCytotoxic);
        assert_eq!(CytotoxicityLevel::classify("LOW"), NonCytotoxic);
        assert_eq!(CytotoxicityLevel::classify("None detected"), NonCytotoxic);
        assert_eq!(CytotoxicityLevel::classify("82% viable"), Unknown);
        assert_eq!(CytotoxicityLevel::classify(""), Unknown);
    }

    #[test]
    fn classification_priority() {
        assert_eq!(
            CytotoxicityLevel::classify("low dose, high response"),
            CytotoxicityLevel::Cytotoxic
        );
        assert_eq!(
            CytotoxicityLevel::classify("weak to moderate"),
            CytotoxicityLevel::ModeratelyCytotoxic
        );
    }

    #[test]
    fn transforms_all_four_mechanisms() {
        let form = crate::form::tests::sample_form();
        let response = transform_api_response(sample_api_response(), &form);

        let levels: Vec<_> = response
            .cytotoxicity_effects
            .iter()
            .map(|effect| (effect.mechanism, effect.level))
            .collect();
        assert_eq!(
            levels,
            vec![
                (Mechanism::RosGeneration, CytotoxicityLevel::Cytotoxic),
                (
                    Mechanism::ApoptosisInduction,
                    CytotoxicityLevel::ModeratelyCytotoxic
                ),
                (Mechanism::MembraneDamage, CytotoxicityLevel::NonCytotoxic),
                (Mechanism::CellViability, CytotoxicityLevel::Unknown),
            ]
        );
        assert_eq!(
            response.effect(Mechanism::RosGeneration).unwrap().to_string(),
            "ROS Generation: HIGH"
        );

        assert_eq!(response.toxicity, "NON-TOXIC");
        assert_eq!(response.confidence, 0.91);
        assert_eq!(response.source, ResponseSource::Live);
        assert_eq!(response.raw_data, form);
        assert_eq!(response.citations.len(), 3);
        assert_eq!(response.api_response.nanoparticle_id, "NP-42");
    }

    #[test]
    fn key_driver_labels() {
        let drivers = key_drivers(&sample_api_response().key_factors);
        assert_eq!(
            drivers,
            vec![
                "Material Effect: TiO2 anatase",
                "Size Effect: MODERATE",
                "Surface Reactivity: LOW",
                "Environmental: FAVORABLE",
            ]
        );
    }

    #[test]
    fn diameter_prefers_user_override() {
        let api = sample_api_response();
        let form = crate::form::tests::sample_form();
        assert_eq!(display_hydrodynamic_diameter(&api.stage1, &form), Some(38.6));

        let form = form.with(fields::HYDRODYNAMIC_DIAMETER, "52");
        assert_eq!(display_hydrodynamic_diameter(&api.stage1, &form), Some(52.0));
    }

    #[test]
    fn leading_number_parsing() {
        assert_eq!(leading_number("45.2"), Some(45.2));
        assert_eq!(leading_number("  45.2 nm"), Some(45.2));
        assert_eq!(leading_number("1.5x"), Some(1.5));
        assert_eq!(leading_number("-3e2 mV"), Some(-300.0));
        assert_eq!(leading_number("12e"), Some(12.0));
        assert_eq!(leading_number("approx. 40"), None);
        assert_eq!(leading_number(""), None);
    }

    #[test]
    fn citations_are_fixed() {
        let citations = citations();
        assert_eq!(citations[0].journal, "Nature Nanotechnology");
        assert_eq!(citations[1].year, 2024);
        assert_eq!(citations[2].journal, "ACS Nano");
    }

    #[test]
    fn fallback_is_canned_and_marked() {
        let form = crate::form::tests::sample_form().with(fields::NANOPARTICLE_ID, "NP-7");
        let response = fallback_response(&form);

        assert_eq!(response.source, ResponseSource::Fallback);
        assert_eq!(response.toxicity, "Toxic");
        assert_eq!(response.confidence, 0.85);
        assert_eq!(response.key_drivers[0], "High dosage");
        assert_eq!(response.api_response.nanoparticle_id, "NP-7");
        assert_eq!(response.api_response.stage2.composite_score, 0.78);
        assert_eq!(response.hydrodynamic_diameter, Some(45.2));
        assert_eq!(
            response.effect(Mechanism::CellViability).unwrap().level,
            CytotoxicityLevel::NonCytotoxic
        );

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["source"], "fallback");
        assert_eq!(json["rawData"]["nanoparticleId"], "NP-7");
    }
}
