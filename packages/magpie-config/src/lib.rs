mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Download, EmbeddingProviderConfig, Funnel, LlmProviderConfig, Processing, Providers,
	Search, Service,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm", &cfg.providers.llm.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if cfg.search.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "search.api_base must be non-empty.".to_string(),
		});
	}
	if cfg.search.max_results == 0 {
		return Err(Error::Validation {
			message: "search.max_results must be greater than zero.".to_string(),
		});
	}
	if cfg.search.page_size_cap == 0 {
		return Err(Error::Validation {
			message: "search.page_size_cap must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [
		("funnel.metadata_threshold", cfg.funnel.metadata_threshold),
		("funnel.page_threshold", cfg.funnel.page_threshold),
		("funnel.validation_threshold", cfg.funnel.validation_threshold),
	] {
		if !value.is_finite() {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number."),
			});
		}
		if !(0.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if cfg.funnel.small_doc_pages == 0 {
		return Err(Error::Validation {
			message: "funnel.small_doc_pages must be greater than zero.".to_string(),
		});
	}
	if cfg.funnel.embed_batch_size == 0 {
		return Err(Error::Validation {
			message: "funnel.embed_batch_size must be greater than zero.".to_string(),
		});
	}
	if cfg.processing.max_documents == 0 {
		return Err(Error::Validation {
			message: "processing.max_documents must be greater than zero.".to_string(),
		});
	}
	if cfg.processing.worker_pool == 0 {
		return Err(Error::Validation {
			message: "processing.worker_pool must be greater than zero.".to_string(),
		});
	}
	if cfg.processing.document_budget_secs == 0 {
		return Err(Error::Validation {
			message: "processing.document_budget_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.processing.metadata_pages == 0 {
		return Err(Error::Validation {
			message: "processing.metadata_pages must be greater than zero.".to_string(),
		});
	}
	if cfg.processing.download.max_bytes == 0 {
		return Err(Error::Validation {
			message: "processing.download.max_bytes must be greater than zero.".to_string(),
		});
	}
	if cfg.processing.download.max_attempts == 0 {
		return Err(Error::Validation {
			message: "processing.download.max_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.processing.download.backoff_max_ms < cfg.processing.download.backoff_base_ms {
		return Err(Error::Validation {
			message:
				"processing.download.backoff_max_ms must be at least processing.download.backoff_base_ms."
					.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.search.user_agent.as_deref().map(|agent| agent.trim().is_empty()).unwrap_or(false) {
		cfg.search.user_agent = None;
	}
	if cfg.search.api_base.ends_with('/') {
		let trimmed = cfg.search.api_base.trim_end_matches('/').to_string();

		cfg.search.api_base = trimmed;
	}
}
