//! Logging in to the game described by the config.

use std::env;

use log::info;
use vsebook_broker::marketwatch::MarketWatch;
use zeroize::Zeroizing;

use crate::config::Config;
use crate::error::{Error, Result};

/// Read the password from the environment variable named in the config.
pub fn password(config: &Config) -> Result<Zeroizing<String>> {
    let var = &config.session.password_env;
    match env::var(var) {
        Ok(p) if !p.is_empty() => Ok(Zeroizing::new(p)),
        _ => Err(Error::Config(format!(
            "password environment variable {var} is not set"
        ))),
    }
}

/// Build a MarketWatch handle and log in.
pub fn connect(config: &Config) -> Result<MarketWatch> {
    let password = password(config)?;
    let mut game = MarketWatch::with_endpoints(
        &config.session.username,
        password,
        config.endpoints(),
        config.timeout(),
    )
    .map_err(|e| Error::Connection(e.to_string()))?;

    game.connect()
        .map_err(|e| Error::Connection(e.to_string()))?;
    info!(
        "Session open for {} on game {}",
        config.session.username,
        config.game_id()
    );
    Ok(game)
}
