//! Application configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `faqrag.toml` + `faqrag.<env>.toml`
//! + the plain environment variables the bot has always read (`API_PROVIDER`,
//! `OPENAI_API_KEY`, ...) + `FAQRAG_*` overrides. The resulting [`AppConfig`] is
//! built once at process start and handed to every component constructor.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::chunker::ChunkingConfig;
use crate::error::{Error, Result};

/// Plain environment variables understood without a prefix.
const ENV_KEYS: &[&str] = &[
    "API_PROVIDER",
    "EMBEDDING_PROVIDER",
    "OPENAI_API_KEY",
    "GROQ_API_KEY",
    "HF_TOKEN",
    "EMBED_MODEL",
    "RERANK_MODEL",
    "GENERATION_MODEL",
    "DENSE_PATH",
    "DOCSTORE_PATH",
    "SPARSE_PATH",
    "BUILD_LOCK_PATH",
];

/// Chat-completion provider used for reranking and answer generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum ApiProvider {
    OpenAi,
    #[default]
    Groq,
}

impl ApiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiProvider::OpenAi => "openai",
            ApiProvider::Groq => "groq",
        }
    }

    /// Chat model used when none is configured.
    pub fn default_chat_model(&self) -> &'static str {
        match self {
            ApiProvider::OpenAi => "gpt-4o-mini",
            ApiProvider::Groq => "llama-3.1-8b-instant",
        }
    }
}

impl FromStr for ApiProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ApiProvider::OpenAi),
            "groq" => Ok(ApiProvider::Groq),
            other => Err(Error::InvalidConfig(format!("Unsupported API provider: {other}"))),
        }
    }
}

impl TryFrom<String> for ApiProvider {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for ApiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend that turns texts into vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum EmbeddingProvider {
    OpenAi,
    #[default]
    HuggingFace,
    /// Offline feature-hashing embedder; deterministic, no credentials.
    Hash,
}

impl EmbeddingProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingProvider::OpenAi => "openai",
            EmbeddingProvider::HuggingFace => "huggingface",
            EmbeddingProvider::Hash => "hash",
        }
    }
}

impl FromStr for EmbeddingProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(EmbeddingProvider::OpenAi),
            "huggingface" | "hf" => Ok(EmbeddingProvider::HuggingFace),
            "hash" | "fake" => Ok(EmbeddingProvider::Hash),
            other => Err(Error::InvalidConfig(format!("Unsupported embedding provider: {other}"))),
        }
    }
}

impl TryFrom<String> for EmbeddingProvider {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An API credential. Never printed.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_provider: ApiProvider,
    pub embedding_provider: EmbeddingProvider,
    pub openai_api_key: Secret,
    pub groq_api_key: Secret,
    pub hf_token: Secret,
    pub embed_model: String,
    /// Defaults to the chat provider's own model when unset.
    pub rerank_model: Option<String>,
    pub generation_model: Option<String>,
    pub openai_base_url: String,
    pub groq_base_url: String,
    pub huggingface_base_url: String,
    /// Dimension of the offline hash embedder.
    pub hash_dim: usize,
    /// Timeout for chat calls (rerank, generation).
    pub request_timeout_secs: u64,
    /// Timeout for batched embedding calls.
    pub embed_timeout_secs: u64,
    pub dense_path: PathBuf,
    pub docstore_path: PathBuf,
    pub sparse_path: PathBuf,
    pub build_lock_path: PathBuf,
    pub chunking: ChunkingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_provider: ApiProvider::default(),
            embedding_provider: EmbeddingProvider::default(),
            openai_api_key: Secret::default(),
            groq_api_key: Secret::default(),
            hf_token: Secret::default(),
            embed_model: "text-embedding-3-small".to_string(),
            rerank_model: None,
            generation_model: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            groq_base_url: "https://api.groq.com/openai/v1".to_string(),
            huggingface_base_url: "https://api-inference.huggingface.co".to_string(),
            hash_dim: 1024,
            request_timeout_secs: 30,
            embed_timeout_secs: 120,
            dense_path: PathBuf::from(".rag_store/dense"),
            docstore_path: PathBuf::from(".rag_store/docstore.json"),
            sparse_path: PathBuf::from(".rag_store/sparse"),
            build_lock_path: PathBuf::from(".rag_store/build.lock"),
            chunking: ChunkingConfig::default(),
        }
    }
}

/// How answers are produced, decided once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationBackend {
    External { provider: ApiProvider, base_url: String, credential: Secret, model: String },
    Extractive,
}

impl AppConfig {
    /// Load from the working directory and the process environment.
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment())
    }

    pub fn figment() -> Figment {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("faqrag.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("faqrag.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("faqrag.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("faqrag.test.toml")),
            _ => {}
        }
        figment.merge(Env::raw().only(ENV_KEYS)).merge(Env::prefixed("FAQRAG_"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.chunking.window == 0 {
            return Err(Error::InvalidConfig("chunking.window must be positive".into()));
        }
        if self.hash_dim == 0 {
            return Err(Error::InvalidConfig("hash_dim must be positive".into()));
        }
        Ok(())
    }

    /// Expand `~`/`$VAR` in every storage path and anchor relative ones at `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        for path in [
            &mut self.dense_path,
            &mut self.docstore_path,
            &mut self.sparse_path,
            &mut self.build_lock_path,
        ] {
            *path = resolve_with_base(base, path.to_string_lossy());
        }
        self
    }

    /// Credential for the selected chat provider.
    pub fn api_credential(&self) -> &Secret {
        self.credential_for(self.api_provider)
    }

    pub fn api_base_url(&self) -> &str {
        self.base_url_for(self.api_provider)
    }

    pub fn credential_for(&self, provider: ApiProvider) -> &Secret {
        match provider {
            ApiProvider::OpenAi => &self.openai_api_key,
            ApiProvider::Groq => &self.groq_api_key,
        }
    }

    pub fn base_url_for(&self, provider: ApiProvider) -> &str {
        match provider {
            ApiProvider::OpenAi => &self.openai_base_url,
            ApiProvider::Groq => &self.groq_base_url,
        }
    }

    /// Model the relevance judge asks, on the selected provider.
    pub fn rerank_model(&self) -> &str {
        self.rerank_model.as_deref().unwrap_or(self.api_provider.default_chat_model())
    }

    /// The selected provider when it has a credential, OpenAI when only an
    /// OpenAI key is set, extractive otherwise.
    pub fn generation_backend(&self) -> GenerationBackend {
        let provider = if !self.api_credential().is_empty() {
            self.api_provider
        } else if !self.openai_api_key.is_empty() {
            ApiProvider::OpenAi
        } else {
            return GenerationBackend::Extractive;
        };
        GenerationBackend::External {
            provider,
            base_url: self.base_url_for(provider).to_string(),
            credential: self.credential_for(provider).clone(),
            model: self.generation_model.clone().unwrap_or_else(|| provider.default_chat_model().to_string()),
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
