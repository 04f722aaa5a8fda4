//! Threshold-based risk classification of a single reading.
//!
//! Rules are applied in order and the first match wins:
//!
//! 1. `critical` if heart rate > 140, SpO2 < 88, or systolic BP > 180
//! 2. `warning`  if heart rate > 120 or < 50, SpO2 < 92, or systolic BP > 160
//! 3. `normal` otherwise
//!
//! Diastolic pressure is recorded with every reading but is not thresholded.

use rpm_contracts::patient::RiskLevel;

pub const CRITICAL_HEART_RATE_ABOVE: i32 = 140;
pub const CRITICAL_SPO2_BELOW: i32 = 88;
pub const CRITICAL_BP_SYS_ABOVE: i32 = 180;

pub const WARNING_HEART_RATE_ABOVE: i32 = 120;
pub const WARNING_HEART_RATE_BELOW: i32 = 50;
pub const WARNING_SPO2_BELOW: i32 = 92;
pub const WARNING_BP_SYS_ABOVE: i32 = 160;

/// Classify a reading. Pure and deterministic.
pub fn classify(heart_rate: i32, spo2: i32, bp_sys: i32) -> RiskLevel {
    if heart_rate > CRITICAL_HEART_RATE_ABOVE
        || spo2 < CRITICAL_SPO2_BELOW
        || bp_sys > CRITICAL_BP_SYS_ABOVE
    {
        return RiskLevel::Critical;
    }

    if heart_rate > WARNING_HEART_RATE_ABOVE
        || heart_rate < WARNING_HEART_RATE_BELOW
        || spo2 < WARNING_SPO2_BELOW
        || bp_sys > WARNING_BP_SYS_ABOVE
    {
        return RiskLevel::Warning;
    }

    RiskLevel::Normal
}
