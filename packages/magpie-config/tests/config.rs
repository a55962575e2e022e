use serde_json::Map;

use magpie_config::{
	Config, Download, EmbeddingProviderConfig, Funnel, LlmProviderConfig, Processing, Providers,
	Search, Service,
};

fn base_config() -> Config {
	Config {
		service: Service { log_level: "info".to_string() },
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "p".to_string(),
				api_base: "http://localhost".to_string(),
				api_key: "key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "m".to_string(),
				dimensions: 3,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			llm: LlmProviderConfig {
				provider_id: "p".to_string(),
				api_base: "http://localhost".to_string(),
				api_key: "key".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "m".to_string(),
				temperature: 0.1,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		search: Search {
			api_base: "http://export.arxiv.org/api/query".to_string(),
			user_agent: None,
			max_results: 60,
			page_size_cap: 30,
			query_delay_ms: 1_200,
			timeout_ms: 10_000,
		},
		funnel: Funnel {
			metadata_threshold: 0.65,
			page_threshold: 0.2,
			validation_threshold: 0.05,
			small_doc_pages: 8,
			embed_batch_size: 5,
		},
		processing: Processing {
			max_documents: 30,
			worker_pool: 1,
			document_budget_secs: 300,
			metadata_pages: 3,
			download: Download {
				timeout_ms: 30_000,
				max_bytes: 50 * 1024 * 1024,
				max_attempts: 3,
				backoff_base_ms: 500,
				backoff_max_ms: 10_000,
			},
		},
	}
}

#[test]
fn accepts_valid_config() {
	assert!(magpie_config::validate(&base_config()).is_ok());
}

#[test]
fn rejects_out_of_range_threshold() {
	let mut cfg = base_config();
	cfg.funnel.metadata_threshold = 1.5;

	let err = magpie_config::validate(&cfg).unwrap_err();
	assert!(err.to_string().contains("funnel.metadata_threshold"));
}

#[test]
fn rejects_zero_worker_pool() {
	let mut cfg = base_config();
	cfg.processing.worker_pool = 0;

	assert!(magpie_config::validate(&cfg).is_err());
}

#[test]
fn rejects_empty_llm_api_key() {
	let mut cfg = base_config();
	cfg.providers.llm.api_key = "  ".to_string();

	let err = magpie_config::validate(&cfg).unwrap_err();
	assert!(err.to_string().contains("llm"));
}

#[test]
fn rejects_backoff_cap_below_base() {
	let mut cfg = base_config();
	cfg.processing.download.backoff_base_ms = 5_000;
	cfg.processing.download.backoff_max_ms = 1_000;

	assert!(magpie_config::validate(&cfg).is_err());
}

#[test]
fn parses_full_toml_document() {
	let raw = r#"
[service]
log_level = "info"

[providers.embedding]
provider_id = "openai"
api_base = "https://api.openai.com"
api_key = "key"
path = "/v1/embeddings"
model = "text-embedding-3-small"
dimensions = 1536
timeout_ms = 15000
default_headers = {}

[providers.llm]
provider_id = "openai"
api_base = "https://api.openai.com"
api_key = "key"
path = "/v1/chat/completions"
model = "gpt-4o-mini"
temperature = 0.1
timeout_ms = 60000
default_headers = {}

[search]
api_base = "http://export.arxiv.org/api/query"
max_results = 60
page_size_cap = 30
query_delay_ms = 1200
timeout_ms = 10000

[funnel]
metadata_threshold = 0.65
page_threshold = 0.2
validation_threshold = 0.05
small_doc_pages = 8
embed_batch_size = 5

[processing]
max_documents = 30
worker_pool = 1
document_budget_secs = 300
metadata_pages = 3

[processing.download]
timeout_ms = 30000
max_bytes = 52428800
max_attempts = 3
backoff_base_ms = 500
backoff_max_ms = 10000
"#;
	let cfg: Config = toml::from_str(raw).expect("parse failed");

	assert!(magpie_config::validate(&cfg).is_ok());
	assert_eq!(cfg.funnel.small_doc_pages, 8);
	assert!(cfg.search.user_agent.is_none());
}
