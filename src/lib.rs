//! Converts matched triplets of `.mat` apnea recordings (RR intervals,
//! SpO2, apnea labels) into one flat CSV dataset for modelling.

pub mod config;
pub mod data;
pub mod mat;
