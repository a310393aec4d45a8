//! OCR fallback: transcribe pages that have no text layer.
//!
//! A scanned page carries its words only as pixels. Such pages are
//! rasterised with pdfium, encoded as base64 PNG and sent to a vision model
//! through `edgequake-llm`. Rendering happens in the converter's blocking
//! pass ([`render_page`]); encoding and the model call run on the async side.
//!
//! Model calls are retried with exponential backoff (`retry_backoff_ms *
//! 2^(attempt-1)`) and each call is bounded by `api_timeout_secs`.

use crate::config::OcrConfig;
use crate::error::CurateError;
use crate::prompts::page_transcription_prompt;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

const DEFAULT_VISION_MODEL: &str = "gpt-4.1-nano";

/// Rasterise one page, capping the longest edge at `max_pixels`.
///
/// Blocking; call from the converter's `spawn_blocking` pass.
pub fn render_page(page: &PdfPage, page_num: usize, max_pixels: u32) -> Result<DynamicImage, CurateError> {
    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| CurateError::RenderFailed {
            page: page_num,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!("Rendered page {} → {}x{} px", page_num, image.width(), image.height());
    Ok(image)
}

/// Encode a rendered page as a high-detail base64 PNG attachment.
pub fn encode_page(img: &DynamicImage, page_num: usize) -> Result<ImageData, CurateError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| CurateError::RenderFailed {
            page: page_num,
            detail: format!("PNG encoding failed: {}", e),
        })?;
    Ok(ImageData::new(STANDARD.encode(&buf), "image/png").with_detail("high"))
}

/// Pick the vision provider, most specific first:
///
/// 1. a pre-built `provider`
/// 2. `provider_name` (+ `model`, defaulting to `gpt-4.1-nano`)
/// 3. `EDGEQUAKE_LLM_PROVIDER` together with `EDGEQUAKE_MODEL`
/// 4. `OPENAI_API_KEY` present → OpenAI
/// 5. whatever `ProviderFactory::from_env` detects
pub fn resolve_provider(config: &OcrConfig) -> Result<Arc<dyn LLMProvider>, CurateError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_VISION_MODEL);
    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create_provider("openai", model);
    }

    let (llm, _embedding) = ProviderFactory::from_env().map_err(|e| CurateError::ProviderNotConfigured {
        provider: "auto".to_string(),
        hint: format!("set OPENAI_API_KEY or EDGEQUAKE_LLM_PROVIDER to enable OCR ({e})"),
    })?;
    Ok(llm)
}

fn create_provider(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, CurateError> {
    ProviderFactory::create_llm_provider(name, model).map_err(|e| CurateError::ProviderNotConfigured {
        provider: name.to_string(),
        hint: e.to_string(),
    })
}

/// Transcribe one rendered page into Markdown.
pub async fn transcribe_page(
    provider: &Arc<dyn LLMProvider>,
    page_num: usize,
    image: ImageData,
    config: &OcrConfig,
    table_structure: bool,
) -> Result<String, CurateError> {
    let start = Instant::now();
    let messages = vec![
        ChatMessage::system(page_transcription_prompt(table_structure)),
        ChatMessage::user_with_images("", vec![image]),
    ];
    let options = build_options(config);
    let call_timeout = Duration::from_secs(config.api_timeout_secs);

    let mut last_err = String::from("no attempt made");
    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.backoff_for(attempt);
            warn!(
                "Page {}: OCR retry {}/{} after {:?}",
                page_num, attempt, config.max_retries, backoff
            );
            sleep(backoff).await;
        }

        match timeout(call_timeout, provider.chat(&messages, Some(&options))).await {
            Ok(Ok(response)) => {
                debug!(
                    "Page {}: transcribed, {} prompt tokens, {:?}",
                    page_num,
                    response.prompt_tokens,
                    start.elapsed()
                );
                return Ok(response.content);
            }
            Ok(Err(e)) => last_err = e.to_string(),
            Err(_) => last_err = format!("timed out after {}s", config.api_timeout_secs),
        }
        warn!("Page {}: OCR attempt {} failed: {}", page_num, attempt + 1, last_err);
    }

    Err(CurateError::OcrFailed {
        page: page_num,
        retries: config.max_retries,
        detail: last_err,
    })
}

fn build_options(config: &OcrConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
