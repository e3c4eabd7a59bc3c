use core_config::{app_info, env_or_default, server::ServerConfig, AppInfo, FromEnv};
use domain_documents::{CollectionPair, EmbedderConfig, WeaviateConfig};

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `core_config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub weaviate: WeaviateConfig,
    pub embedder: Option<EmbedderConfig>,
    pub collections: CollectionPair,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;
        let weaviate = WeaviateConfig::from_env()?;
        let embedder = EmbedderConfig::from_env().ok();

        // The demo query fans out to one article and one image collection.
        let collections = CollectionPair {
            text_collection: env_or_default("TEXT_COLLECTION", "Articles"),
            image_collection: env_or_default("IMAGE_COLLECTION", "Images"),
        };

        Ok(Self {
            app: app_info!(),
            environment,
            server,
            weaviate,
            embedder,
            collections,
        })
    }
}
