use crate::config::DataSource;
use crate::error::Result;
use redcraft::core::rdc::redcat::Redcat;
use redcraft::engine::config::MolanConfig;
use tracing::info;

/// Loads every medium's RDC table; a missing or malformed file is fatal.
pub fn load_redcat(source: &DataSource, config: &MolanConfig, offset: usize) -> Result<Redcat> {
    info!(
        "Loading {} RDC media from {:?} with prefix '{}'",
        source.media_count, &source.path, source.prefix
    );
    let redcat = Redcat::load(
        &source.path,
        &source.prefix,
        source.media_count,
        config.couplings,
        config.fit,
    )?
    .with_offset(offset);

    for medium in 0..redcat.media_count() {
        if let Ok(table) = redcat.table(medium) {
            info!("Medium {}: {} residue rows", medium + 1, table.len());
        }
    }
    Ok(redcat)
}
