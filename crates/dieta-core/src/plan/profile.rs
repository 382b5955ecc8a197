//! User profile sent to the generation service.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// The attributes a diet plan is generated from.
///
/// Values are kept as the text the user entered; the generation service
/// interprets them. The serialized form is the request body of
/// `POST /create`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub name: String,
    pub age: String,
    pub gender: String,
    /// Height, e.g. "1.75".
    pub height: String,
    /// Weight, e.g. "70".
    pub weight: String,
    /// Goal, e.g. "Perder peso".
    pub objective: String,
    /// Activity level.
    pub level: String,
}

impl UserProfile {
    /// Parse a profile from a TOML document with one key per field.
    ///
    /// Keys may be omitted; they parse as blank so callers can fill them in
    /// before calling [`Self::validate`].
    pub fn from_toml(content: &str) -> Result<Self, PlanError> {
        toml::from_str(content)
            .map_err(|e| PlanError::InvalidInput(format!("TOML parse error: {e}")))
    }

    /// Check that every field is populated.
    ///
    /// Returns [`PlanError::InvalidInput`] naming all blank fields.
    pub fn validate(&self) -> Result<(), PlanError> {
        let blank: Vec<&str> = self
            .fields()
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect();

        if blank.is_empty() {
            Ok(())
        } else {
            Err(PlanError::InvalidInput(format!(
                "missing fields: {}",
                blank.join(", ")
            )))
        }
    }

    fn fields(&self) -> [(&'static str, &str); 7] {
        [
            ("name", self.name.as_str()),
            ("age", self.age.as_str()),
            ("gender", self.gender.as_str()),
            ("height", self.height.as_str()),
            ("weight", self.weight.as_str()),
            ("objective", self.objective.as_str()),
            ("level", self.level.as_str()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> UserProfile {
        UserProfile {
            name: "Ana".to_string(),
            age: "29".to_string(),
            gender: "Feminino".to_string(),
            height: "1.65".to_string(),
            weight: "62".to_string(),
            objective: "Perder peso".to_string(),
            level: "Moderadamente ativo".to_string(),
        }
    }

    #[test]
    fn complete_profile_is_valid() {
        assert_eq!(complete().validate(), Ok(()));
    }

    #[test]
    fn blank_fields_are_reported_together() {
        let mut profile = complete();
        profile.age = String::new();
        profile.level = "   ".to_string();

        let err = profile.validate().unwrap_err();
        assert_eq!(
            err,
            PlanError::InvalidInput("missing fields: age, level".to_string())
        );
    }

    #[test]
    fn serializes_as_request_body() {
        let value = serde_json::to_value(complete()).unwrap();
        let mut keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        let mut expected = vec!["name", "age", "gender", "height", "weight", "objective", "level"];
        expected.sort_unstable();
        assert_eq!(keys, expected);
    }

    #[test]
    fn from_toml_parses_every_field() {
        let content = r#"
name = "Ana"
age = "29"
gender = "Feminino"
height = "1.65"
weight = "62"
objective = "Perder peso"
level = "Moderadamente ativo"
"#;
        assert_eq!(UserProfile::from_toml(content).unwrap(), complete());
    }

    #[test]
    fn from_toml_leaves_missing_keys_blank() {
        let profile = UserProfile::from_toml("name = \"Ana\"\nweight = \"62\"").unwrap();
        assert_eq!(profile.name, "Ana");
        assert_eq!(profile.weight, "62");
        assert_eq!(
            profile.validate().unwrap_err(),
            PlanError::InvalidInput(
                "missing fields: age, gender, height, objective, level".to_string()
            )
        );
    }

    #[test]
    fn from_toml_rejects_malformed_documents() {
        let err = UserProfile::from_toml("name = ").unwrap_err();
        assert!(matches!(err, PlanError::InvalidInput(ref msg) if msg.contains("TOML")), "got: {err}");

        let err = UserProfile::from_toml("age = 29").unwrap_err();
        assert!(matches!(err, PlanError::InvalidInput(_)), "got: {err}");
    }
}
