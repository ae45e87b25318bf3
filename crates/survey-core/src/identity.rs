//! Respondent identity resolution.

use anyhow::{bail, Result};
use std::env;

/// Environment variables checked for the respondent, in priority order.
const IDENTITY_VARS: &[&str] = &["SURVEY_RESPONDENT", "USER"];

/// Get the respondent identity.
///
/// Resolution order:
/// 1. Explicit override (`--respondent`)
/// 2. `SURVEY_RESPONDENT` environment variable
/// 3. `USER` environment variable
pub fn get_respondent(explicit: Option<&str>) -> Result<String> {
    if let Some(name) = explicit {
        let name = name.trim();
        if name.is_empty() {
            bail!("Respondent must not be empty");
        }
        return Ok(name.to_string());
    }

    for var in IDENTITY_VARS {
        if let Ok(name) = env::var(var) {
            if !name.trim().is_empty() {
                return Ok(name.trim().to_string());
            }
        }
    }

    bail!("Respondent identity required. Use --respondent <email> or set SURVEY_RESPONDENT.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_override() {
        let identity = get_respondent(Some(" reviewer@example.com ")).unwrap();
        assert_eq!(identity, "reviewer@example.com");
    }

    #[test]
    fn test_blank_override_rejected() {
        assert!(get_respondent(Some("   ")).is_err());
    }
}
