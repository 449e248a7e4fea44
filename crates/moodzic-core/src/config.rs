/// Trait for loading service configuration from environment variables.
///
/// Implementors derive `serde::Deserialize`; field names map to upper-cased
/// env vars (`database_url` ← `DATABASE_URL`). A `.env` file in the working
/// directory, when present, is loaded first and never overrides variables
/// already set in the process environment.
pub trait Config: Sized + serde::de::DeserializeOwned {
    fn from_env() -> Result<Self, envy::Error> {
        // A missing .env is the normal production case.
        let _ = dotenvy::dotenv();
        envy::from_env()
    }

    /// Load from an explicit set of `(KEY, value)` pairs instead of the process environment.
    fn from_iter<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }
}
