//! Wiring shared by the CLI subcommands: configuration → profile, store and
//! facade.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tabula_core::config::settings;
use tabula_core::{ConfigLookup, LayeredConfig, ReportFacade, ReportOptions, ReportProfile};
use tabula_store::MemoryStore;

/// Command-line overrides applied on top of configuration.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub store_path: Option<PathBuf>,
    pub profile_path: Option<PathBuf>,
}

/// Resolve the profile: explicit path, then `profile_path`, then the
/// embedded default. `report_default_language` replaces the profile's
/// fallback language when set.
pub fn load_profile<C: ConfigLookup>(config: &C, explicit: Option<&Path>) -> anyhow::Result<ReportProfile> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| config.get(settings::PROFILE_PATH).map(PathBuf::from));

    let profile = match path {
        Some(path) => ReportProfile::from_path(&path)
            .with_context(|| format!("loading report profile {}", path.display()))?,
        None => ReportProfile::load_default(),
    };

    Ok(match config.get(settings::REPORT_DEFAULT_LANGUAGE) {
        Some(lang) => profile.with_default_language(&lang),
        None => profile,
    })
}

/// Load the fixture store named on the command line or by `store_path`.
pub fn load_store<C: ConfigLookup>(config: &C, explicit: Option<&Path>) -> anyhow::Result<MemoryStore> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(config.require(settings::STORE_PATH)?),
    };
    MemoryStore::from_path(&path).with_context(|| format!("loading record store {}", path.display()))
}

/// Build a ready-to-run facade.
pub fn build_facade(config: &LayeredConfig, overrides: &Overrides) -> anyhow::Result<ReportFacade<MemoryStore>> {
    let profile = load_profile(config, overrides.profile_path.as_deref())?;
    let store = load_store(config, overrides.store_path.as_deref())?;
    let options = ReportOptions::from_config(config)?;
    tracing::info!(
        records = store.len(),
        criteria = profile.criteria.len(),
        max_records = ?options.max_records,
        "facade ready"
    );
    Ok(ReportFacade::new(Arc::new(profile), store).with_options(options))
}
