//! Configuration for the Huddle proxy.
//!
//! Settings are read once from the process environment (optionally seeded
//! from a `.env` file) into an explicit [`Settings`] value that is handed to
//! every component at startup. Nothing in this crate keeps global state.
//!
//! - [`settings`]: environment variables, defaults, CORS origin list
//! - [`favorites`]: `FAVORITE_TEAMS` parsing and team/league key patterns

pub mod error;
pub mod favorites;
pub mod settings;

pub use error::{ConfigError, Result};
pub use favorites::{
    Favorite, is_league_key, is_team_key, league_key_from_team_key, parse_favorites,
    render_favorites,
};
pub use settings::Settings;
