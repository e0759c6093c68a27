//! Store Config

use clap::Args;

/// Cassandra connection settings.
#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// Contact points as `host:port`, comma separated
    #[arg(
        long,
        env = "CASS_CONTACT_POINTS",
        value_delimiter = ',',
        default_value = "127.0.0.1:9042"
    )]
    pub contact_points: Vec<String>,

    /// Datacenter preferred by the load balancing policy
    #[arg(long, env = "CASS_DATACENTER", default_value = "datacenter1")]
    pub datacenter: String,

    /// Keyspace holding the promotion tables
    #[arg(long, env = "CASS_KEYSPACE", default_value = "promo_catalog")]
    pub keyspace: String,

    /// Username for password authentication
    #[arg(long, env = "CASS_USER")]
    pub user: Option<String>,

    /// Password for password authentication
    #[arg(long, env = "CASS_PASS", hide_env_values = true)]
    pub password: Option<String>,
}

impl StoreConfig {
    /// Credentials, when both halves are configured.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.user
            .as_deref()
            .zip(self.password.as_deref())
            .filter(|(user, _)| !user.is_empty())
    }
}
