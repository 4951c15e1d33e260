//! Client for the nanoparticle toxicity prediction service.
//!
//! Form values are validated into a [`types::PredictionRequest`], posted to the
//! remote service by [`client::HttpPredictionClient`], and the staged answer is
//! turned into a [`types::PredictionResponse`] view model. The [`scene`] module
//! drives the 3D demo scene.

pub mod client;
pub mod config;
pub mod contact;
pub mod error;
pub mod form;
pub mod scene;
pub mod server;
pub mod transform;
pub mod types;

pub use client::{FailurePolicy, HttpPredictionClient, PredictionService};
pub use contact::{ContactForm, ContactOutcome, ContactService};
pub use error::{FailureKind, PredictionError};
pub use form::{FormData, FormError};
pub use types::{PredictionRequest, PredictionResponse};
