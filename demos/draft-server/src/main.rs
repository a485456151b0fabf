use pokedrafter::prelude::*;

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

/// Accepts any numeric token as the user id. Local development only.
struct DevAuth;

impl Authenticator for DevAuth {
    async fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
        let id: u64 = token
            .parse()
            .map_err(|_| AuthError("token must be a number".into()))?;
        Ok(UserId(id))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("POKEDRAFTER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());
    let db = std::env::var("POKEDRAFTER_DB").unwrap_or_else(|_| "pokedrafter.db".into());

    let store = SqliteStore::open(&db)?;
    let server = PokedrafterServerBuilder::new()
        .bind(&addr)
        .build(store, DevAuth)
        .await?;

    tracing::info!(addr = %server.local_addr()?, db = %db, "draft server listening");
    server.run().await?;
    Ok(())
}
