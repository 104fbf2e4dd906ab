//! Storage policy rules: when a matching record becomes due for transition.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use herd_core::keys::codes_equal;

use crate::error::{CatalogError, Result};

/// Rule type: transition once the data has been registered for N days.
pub const DAYS_SINCE_BDATA_REGISTERED: &str = "DAYS_SINCE_BDATA_REGISTERED";

/// A stored policy rule.
///
/// The rule type is kept as a free-form code so that policies registered with
/// a type this build does not understand can still be loaded and reported.
/// Only [`StoragePolicyRule::evaluate`] decides whether the type is usable.
///
/// # Example
///
/// ```rust
/// use herd_catalog::policy::StoragePolicyRule;
///
/// let rule = StoragePolicyRule::days_since_registration(90);
/// assert!(rule.evaluate().is_ok());
///
/// let rule = StoragePolicyRule::new("DAYS_SINCE_LAST_ACCESS", 30);
/// assert!(rule.evaluate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoragePolicyRule {
    /// Rule type code.
    #[serde(rename = "storagePolicyRuleType")]
    pub rule_type: String,
    /// Rule threshold; for age rules this is a number of days.
    #[serde(rename = "storagePolicyRuleValue")]
    pub rule_value: u32,
}

impl StoragePolicyRule {
    /// Creates a rule with an arbitrary type code.
    #[must_use]
    pub fn new(rule_type: impl Into<String>, rule_value: u32) -> Self {
        Self {
            rule_type: rule_type.into(),
            rule_value,
        }
    }

    /// Creates a "days since registration" rule.
    #[must_use]
    pub fn days_since_registration(days: u32) -> Self {
        Self::new(DAYS_SINCE_BDATA_REGISTERED, days)
    }

    /// Resolves the stored rule into one the selector can apply.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnsupportedPolicyRule`] for any rule type other
    /// than [`DAYS_SINCE_BDATA_REGISTERED`].
    pub fn evaluate(&self) -> Result<EvaluatedRule> {
        if codes_equal(self.rule_type.trim(), DAYS_SINCE_BDATA_REGISTERED) {
            Ok(EvaluatedRule::DaysSinceRegistration {
                days: self.rule_value,
            })
        } else {
            Err(CatalogError::UnsupportedPolicyRule {
                rule_type: self.rule_type.clone(),
            })
        }
    }
}

/// A rule the selector knows how to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatedRule {
    /// Eligible once `now - created_on >= days`.
    DaysSinceRegistration {
        /// Minimum age in whole days.
        days: u32,
    },
}

impl EvaluatedRule {
    /// Latest registration time that still qualifies at `now`.
    ///
    /// Returns `None` when the threshold reaches back past the representable
    /// time range, in which case nothing qualifies.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match *self {
            Self::DaysSinceRegistration { days } => {
                TimeDelta::try_days(i64::from(days)).and_then(|age| now.checked_sub_signed(age))
            }
        }
    }

    /// Returns true if data registered at `created_on` is old enough at `now`.
    ///
    /// Data registered exactly on the cutoff qualifies.
    #[must_use]
    pub fn is_satisfied_by(&self, created_on: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.cutoff(now).is_some_and(|cutoff| created_on <= cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_accepts_age_rule_in_any_case() {
        let rule = StoragePolicyRule::new("days_since_bdata_registered", 7);
        assert_eq!(
            rule.evaluate().unwrap(),
            EvaluatedRule::DaysSinceRegistration { days: 7 }
        );
    }

    #[test]
    fn evaluate_rejects_unknown_type() {
        let err = StoragePolicyRule::new("SIZE_IN_BYTES", 7)
            .evaluate()
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::UnsupportedPolicyRule { rule_type } if rule_type == "SIZE_IN_BYTES"
        ));
    }

    #[test]
    fn age_boundary_is_inclusive() {
        let now = Utc::now();
        let rule = EvaluatedRule::DaysSinceRegistration { days: 10 };

        assert!(rule.is_satisfied_by(now - TimeDelta::days(11), now));
        assert!(rule.is_satisfied_by(now - TimeDelta::days(10), now));
        assert!(!rule.is_satisfied_by(now - TimeDelta::days(10) + TimeDelta::seconds(1), now));
        assert!(!rule.is_satisfied_by(now - TimeDelta::days(9), now));
    }

    #[test]
    fn zero_day_rule_accepts_anything_already_registered() {
        let now = Utc::now();
        let rule = EvaluatedRule::DaysSinceRegistration { days: 0 };
        assert!(rule.is_satisfied_by(now, now));
        assert!(!rule.is_satisfied_by(now + TimeDelta::seconds(1), now));
    }

    #[test]
    fn huge_threshold_never_qualifies() {
        let now = Utc::now();
        let rule = EvaluatedRule::DaysSinceRegistration { days: u32::MAX };
        assert_eq!(rule.cutoff(now), None);
        assert!(!rule.is_satisfied_by(DateTime::<Utc>::MIN_UTC, now));
    }

    #[test]
    fn serde_uses_rule_field_names() {
        let json = serde_json::to_value(StoragePolicyRule::days_since_registration(30)).unwrap();
        assert_eq!(json["storagePolicyRuleType"], DAYS_SINCE_BDATA_REGISTERED);
        assert_eq!(json["storagePolicyRuleValue"], 30);
    }
}
