//! The server configuration, read from command line flags or the environment.

use std::net::{IpAddr, SocketAddr};

use clap::{Parser, ValueEnum};

use crate::Error;

/// The kind of datastore to keep categories and transactions in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// An SQLite database file.
    Sqlite,
    /// A PostgREST style table API, e.g., Supabase.
    Rest,
    /// An in-process document store with an optional JSON snapshot file.
    Document,
}

/// The REST API server for Budget Bubbles.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The datastore to use.
    #[arg(long, env = "BUDGET_BACKEND", value_enum, default_value_t = Backend::Sqlite)]
    pub backend: Backend,

    /// Where the datastore lives: a SQLite database path, the base URL of the
    /// table API, or the path of the document snapshot. `:memory:` keeps
    /// SQLite and document data in memory only.
    #[arg(long, env = "DATASTORE_URL")]
    pub datastore_url: String,

    /// The service key for the table API.
    #[arg(long, env = "DATASTORE_KEY", hide_env_values = true)]
    pub datastore_key: Option<String>,

    /// The address to serve the API from.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 8001)]
    pub port: u16,
}

impl Config {
    /// Check the settings needed by the chosen backend are present.
    ///
    /// # Errors
    /// Returns [Error::Config] if the datastore URL is empty, or if the REST
    /// backend is chosen without a key.
    pub fn validate(&self) -> Result<(), Error> {
        if self.datastore_url.trim().is_empty() {
            return Err(Error::Config("the datastore URL cannot be empty".to_owned()));
        }

        if self.backend == Backend::Rest
            && self
                .datastore_key
                .as_deref()
                .is_none_or(|key| key.trim().is_empty())
        {
            return Err(Error::Config(
                "the rest backend needs a datastore key (--datastore-key or DATASTORE_KEY)"
                    .to_owned(),
            ));
        }

        Ok(())
    }

    /// The socket address to bind the server to.
    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
