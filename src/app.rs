//! Application orchestration for converting lesson text into stored slide decks.

use crate::ai::{ChatService, OpenAiChatClient};
use crate::extract::extract_candidate;
use crate::models::{
    Config, ConversionRequest, SlideDocument, StorageDescriptor, DEFAULT_MODEL_TIMEOUT_SECS,
    DEFAULT_STORAGE_FOLDER, DEFAULT_STORAGE_TIMEOUT_SECS,
};
use crate::normalize::{check_desc_coverage, normalize};
use crate::storage::{commit, object_key, MockStorageClient, S3StorageClient, StorageService};
use crate::{prompts, Error, Result};
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Runs the text-to-slides pipeline against a chat model and a storage backend.
///
/// Holds no per-request state, so one `App` can serve concurrent conversions.
pub struct App {
    chat: Box<dyn ChatService>,
    storage: Box<dyn StorageService>,
    settings: PipelineSettings,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub chat: Box<dyn ChatService>,
    pub storage: Box<dyn StorageService>,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub folder: String,
    pub model_timeout: Duration,
    pub storage_timeout: Duration,
    /// Minimum share of the lesson text the descriptions must cover, if set.
    pub desc_min_coverage: Option<f64>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            folder: DEFAULT_STORAGE_FOLDER.to_string(),
            model_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
            storage_timeout: Duration::from_secs(DEFAULT_STORAGE_TIMEOUT_SECS),
            desc_min_coverage: None,
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            folder: config.storage_folder.clone(),
            model_timeout: config.model_timeout,
            storage_timeout: config.storage_timeout,
            desc_min_coverage: config.desc_min_coverage,
        }
    }
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices, settings: PipelineSettings) -> Self {
        Self {
            chat: services.chat,
            storage: services.storage,
            settings,
        }
    }

    /// Construct an app from configuration (see `Config::from_env`).
    pub async fn new(config: &Config) -> Result<Self> {
        info!(
            "Chat provider: OpenAI-compatible at {} (model: {}, mode: {:?})",
            config.ai_base_url, config.chat_model, config.reply_mode
        );
        let chat = OpenAiChatClient::new_with_client(
            config.ai_api_key.clone(),
            config.chat_model.clone(),
            config.model_timeout,
            reqwest::Client::new(),
        )
        .with_base_url(config.ai_base_url.clone())
        .with_reply_mode(config.reply_mode);

        let storage: Box<dyn StorageService> = if config.dry_run {
            info!("DRY_RUN enabled, slide decks are kept in memory only");
            Box::new(
                MockStorageClient::new().with_base_url(config.storage_public_base_url.clone()),
            )
        } else {
            let missing = |name: &str| Error::Config(format!("{} not set", name));
            Box::new(
                S3StorageClient::new(
                    config
                        .storage_access_key_id
                        .clone()
                        .ok_or_else(|| missing("STORAGE_ACCESS_KEY_ID"))?,
                    config
                        .storage_secret_access_key
                        .clone()
                        .ok_or_else(|| missing("STORAGE_SECRET_ACCESS_KEY"))?,
                    config.storage_endpoint.clone(),
                    config.storage_region.clone(),
                    config.storage_bucket.clone(),
                    config.storage_public_base_url.clone(),
                )
                .await?,
            )
        };

        Ok(Self::with_services(
            AppServices {
                chat: Box::new(chat),
                storage,
            },
            PipelineSettings::from_config(config),
        ))
    }

    /// Convert lesson text into a slide deck and store it as `<folder>/<title>.json`.
    ///
    /// A descriptor is returned only when a fully valid deck was written. Failures
    /// before the commit leave storage untouched. When the storage deadline
    /// expires the call fails with `StorageWriteFailed`, but the backend may
    /// still complete that write, so the key can hold the new deck afterwards.
    pub async fn convert_text_to_slides(
        &self,
        raw_text: &str,
        title: &str,
    ) -> Result<StorageDescriptor> {
        let request = ConversionRequest::new(raw_text, title)?;
        let request_id = Uuid::new_v4();

        info!(
            "[{}] Converting '{}' ({} chars of lesson text)",
            request_id,
            request.title(),
            request.raw_text().chars().count()
        );

        let result = self.run_pipeline(&request, request_id).await;
        if let Err(e) = &result {
            error!(
                "[{}] Conversion failed at {} stage: {}",
                request_id,
                e.stage(),
                e
            );
        }
        result
    }

    async fn run_pipeline(
        &self,
        request: &ConversionRequest,
        request_id: Uuid,
    ) -> Result<StorageDescriptor> {
        let conversation = prompts::build_conversation(request);

        let reply = tokio::time::timeout(
            self.settings.model_timeout,
            self.chat.complete(&conversation),
        )
        .await
        .map_err(|_| {
            Error::ModelUnavailable(format!(
                "no reply within {}s",
                self.settings.model_timeout.as_secs_f64()
            ))
        })??;
        info!("[{}] Model replied ({} chars)", request_id, reply.len());

        let document = normalize(extract_candidate(&reply))?;
        if let Some(min_ratio) = self.settings.desc_min_coverage {
            check_desc_coverage(&document, request.raw_text(), min_ratio)?;
        }
        info!("[{}] Validated {} slides", request_id, document.len());

        let descriptor = tokio::time::timeout(
            self.settings.storage_timeout,
            commit(
                self.storage.as_ref(),
                &self.settings.folder,
                request.title(),
                &document,
            ),
        )
        .await
        .map_err(|_| {
            Error::StorageWriteFailed(format!(
                "storage did not confirm the write within {}s",
                self.settings.storage_timeout.as_secs_f64()
            ))
        })??;

        info!("[{}] Stored deck at {}", request_id, descriptor.url);
        Ok(descriptor)
    }

    /// Read back the deck stored for `title` and validate it again.
    pub async fn fetch_slides(&self, title: &str) -> Result<SlideDocument> {
        if title.trim().is_empty() {
            return Err(Error::InvalidRequest("title must not be empty".to_string()));
        }

        let key = object_key(&self.settings.folder, title);
        let body = self.storage.get_object(&key).await?;
        let text = String::from_utf8(body)
            .map_err(|e| Error::StorageReadFailed(format!("{} is not UTF-8: {}", key, e)))?;

        normalize(&text).map_err(|e| {
            warn!("Stored deck {} failed validation: {}", key, e);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{App, AppServices, PipelineSettings};
    use crate::ai::{MockChatClient, Role};
    use crate::storage::MockStorageClient;
    use crate::Error;
    use std::time::Duration;

    const DECK: &str = r#"[
        {"title":"Light","desc":"Plants use light to make food.","promptImage":"a leaf in sunlight"},
        {"title":"Water","desc":"Roots carry water up the stem.","promptImage":"roots drinking water"}
    ]"#;

    fn build_test_app(chat: MockChatClient, storage: MockStorageClient) -> App {
        build_test_app_with(chat, storage, PipelineSettings::default())
    }

    fn build_test_app_with(
        chat: MockChatClient,
        storage: MockStorageClient,
        settings: PipelineSettings,
    ) -> App {
        App::with_services(
            AppServices {
                chat: Box::new(chat),
                storage: Box::new(storage),
            },
            settings,
        )
    }

    #[tokio::test]
    async fn test_convert_sends_lesson_text_and_stores_deck() {
        let chat = MockChatClient::new().with_prompt_response(DECK);
        let storage = MockStorageClient::new();
        let app = build_test_app(chat.clone(), storage.clone());

        let descriptor = app
            .convert_text_to_slides("Plants use light. Roots carry water.", "plants")
            .await
            .unwrap();

        assert_eq!(descriptor.key, "AI Slide/plants.json");
        assert_eq!(storage.get_put_count(), 1);

        let conversation = chat.last_conversation().unwrap();
        assert_eq!(conversation.messages[0].role, Role::System);
        assert!(conversation.messages[1]
            .content
            .contains("Plants use light. Roots carry water."));
    }

    #[tokio::test]
    async fn test_model_failure_stops_before_storage() {
        let storage = MockStorageClient::new();
        let app = build_test_app(
            MockChatClient::new().with_model_error("500 internal"),
            storage.clone(),
        );

        let err = app.convert_text_to_slides("text", "t").await.unwrap_err();

        assert!(matches!(err, Error::ModelError(_)));
        assert_eq!(storage.get_put_count(), 0);
    }

    #[tokio::test]
    async fn test_slow_model_hits_deadline() {
        let storage = MockStorageClient::new();
        let app = build_test_app_with(
            MockChatClient::new()
                .with_prompt_response(DECK)
                .with_delay(Duration::from_secs(5)),
            storage.clone(),
            PipelineSettings {
                model_timeout: Duration::from_millis(50),
                ..PipelineSettings::default()
            },
        );

        let err = app.convert_text_to_slides("text", "t").await.unwrap_err();

        assert!(matches!(err, Error::ModelUnavailable(_)));
        assert_eq!(storage.get_put_count(), 0);
    }

    #[tokio::test]
    async fn test_slow_storage_hits_deadline() {
        let storage = MockStorageClient::new().with_delay(Duration::from_secs(5));
        let app = build_test_app_with(
            MockChatClient::new().with_prompt_response(DECK),
            storage.clone(),
            PipelineSettings {
                storage_timeout: Duration::from_millis(50),
                ..PipelineSettings::default()
            },
        );

        let err = app.convert_text_to_slides("text", "t").await.unwrap_err();

        // The write was already handed to the backend when the deadline fired.
        assert!(matches!(err, Error::StorageWriteFailed(_)));
        assert_eq!(storage.get_put_count(), 1);
    }

    #[test]
    fn test_default_settings_match_config_defaults() {
        let config = crate::models::Config::from_lookup(|key| match key {
            "AI_API_KEY" => Some("key".to_string()),
            "DRY_RUN" => Some("true".to_string()),
            _ => None,
        })
        .unwrap();

        let from_config = PipelineSettings::from_config(&config);
        let defaults = PipelineSettings::default();

        assert_eq!(defaults.folder, from_config.folder);
        assert_eq!(defaults.model_timeout, from_config.model_timeout);
        assert_eq!(defaults.storage_timeout, from_config.storage_timeout);
        assert_eq!(defaults.desc_min_coverage, from_config.desc_min_coverage);
    }

    #[tokio::test]
    async fn test_coverage_gate_rejects_summarized_deck() {
        let storage = MockStorageClient::new();
        let lesson = "Plants use light to make food. Roots carry water up the stem. \
                      Leaves release oxygen into the air during the day.";
        let app = build_test_app_with(
            MockChatClient::new().with_prompt_response(
                r#"[{"title":"Plants","desc":"Plants grow.","promptImage":"a plant"}]"#,
            ),
            storage.clone(),
            PipelineSettings {
                desc_min_coverage: Some(0.9),
                ..PipelineSettings::default()
            },
        );

        let err = app.convert_text_to_slides(lesson, "t").await.unwrap_err();

        assert!(matches!(err, Error::MalformedModelOutput(_)));
        assert_eq!(storage.get_put_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_slides_missing_deck() {
        let app = build_test_app(MockChatClient::new(), MockStorageClient::new());

        let err = app.fetch_slides("nothing-here").await.unwrap_err();
        assert!(matches!(err, Error::StorageReadFailed(_)));
    }
}
