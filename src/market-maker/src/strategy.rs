//! Strategy profile loading.
//!
//! Reads every `*.yaml` file under a directory (normally `./strategies/`)
//! and deserialises each into a [`StrategyProfile`], keyed by file stem.
//! This is the concrete `get_strategies()` extension point: the core only
//! ever consumes the resulting map.

use std::collections::HashMap;
use std::path::Path;

use common::{Error, StrategyProfile};

pub fn load_strategies(dir: &Path) -> Result<HashMap<String, StrategyProfile>, Error> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::config(format!("could not read strategies dir {}: {e}", dir.display())))?;

    let mut strategies = HashMap::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::config(format!("could not read directory entry: {e}")))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::config(format!("non-utf8 strategy filename: {}", path.display())))?
            .to_string();

        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::config(format!("could not read {}: {e}", path.display())))?;
        let mut profile: StrategyProfile = serde_yaml::from_str(&contents)?;
        profile.name = name.clone();
        strategies.insert(name, profile);
    }
    Ok(strategies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_markets_and_sets_name_from_filename() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("default.yaml")).unwrap();
        write!(
            f,
            "env: demo\nmarkets:\n  - market_ticker: ABC\n    instant_liquidity_cents: 10000\n    max_exposure_cents: 50000\n    price_stickyness: 10\n    spread: 5\n    depth: 3\n"
        )
        .unwrap();

        let strategies = load_strategies(dir.path()).unwrap();
        let profile = strategies.get("default").unwrap();
        assert_eq!(profile.name, "default");
        assert_eq!(profile.markets.len(), 1);
        assert_eq!(profile.markets[0].market_ticker, "ABC");
    }

    #[test]
    fn ignores_non_yaml_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), "not yaml").unwrap();

        let strategies = load_strategies(dir.path()).unwrap();
        assert!(strategies.is_empty());
    }
}
