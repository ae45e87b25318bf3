//! Shared helpers for CLI commands.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use survey_core::{CloneCatalog, SurveyStore};

/// Open an initialized store together with its clone catalog.
pub fn open_store(store_dir: &Path, clones_dir: &Path) -> Result<SurveyStore> {
    let catalog = CloneCatalog::load_dir(clones_dir)?;
    let store = SurveyStore::open(store_dir, catalog)
        .with_context(|| format!("Failed to open survey store: {}", store_dir.display()))?;
    Ok(store)
}

/// Parse `question=value` pairs into a field map.
///
/// The value may itself contain `=`. Repeating a question name is an error.
pub fn parse_fields(raw: &[String]) -> Result<BTreeMap<String, String>> {
    let mut fields = BTreeMap::new();
    for pair in raw {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("Invalid answer '{pair}': expected question=value");
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("Invalid answer '{pair}': question name is empty");
        }
        if fields.insert(name.to_string(), value.to_string()).is_some() {
            bail!("Question '{name}' answered more than once");
        }
    }
    Ok(fields)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn raw(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_parse_fields() {
        let fields = parse_fields(&raw(&["is_clone=yes", "notes=a=b", "empty="])).unwrap();
        assert_eq!(fields.get("is_clone").unwrap(), "yes");
        assert_eq!(fields.get("notes").unwrap(), "a=b");
        assert_eq!(fields.get("empty").unwrap(), "");
    }

    #[test]
    fn test_parse_fields_rejects_bad_pairs() {
        assert!(parse_fields(&raw(&["no-equals"])).is_err());
        assert!(parse_fields(&raw(&["=value"])).is_err());
        assert!(parse_fields(&raw(&["a=1", "a=2"])).is_err());
    }
}
