use serde::{Deserialize, Serialize};

///
/// ConnectOptions
///
/// Connection parameters for a SQL store. The active dialect renders these
/// into its native connection-string format.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ConnectOptions {
    pub host: String,
    pub port: Option<u16>,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl ConnectOptions {
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: None,
            database: database.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}
