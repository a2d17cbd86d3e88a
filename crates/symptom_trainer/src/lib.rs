//! Symptom Model Trainer
//!
//! Batch pipeline that trains per-symptom decision-tree classifiers from
//! the meal/symptom event log and exports them as portable JSON artifacts
//! for on-device inference.

pub mod commands;
pub mod extract;
pub mod probe;
pub mod run;
