//! 音频检测 - 业务能力层
//!
//! Oracle 无法处理音频，带音频/视频的测验一律跳过。

use tracing::warn;

use crate::error::AppResult;
use crate::infrastructure::{DocumentSession, Selector};

/// 音频/视频元素的结构特征
pub const AUDIO_SELECTORS: &[&str] = &[
    "audio",
    "video",
    ".audio-player",
    "[class*='audio']",
    "[id*='audio']",
    "source[type*='audio']",
];

/// 页面上是否有音频/视频元素，返回命中的选择器
pub async fn find_audio(session: &dyn DocumentSession) -> AppResult<Option<&'static str>> {
    for css in AUDIO_SELECTORS {
        if !session.find_all(&Selector::css(*css)).await?.is_empty() {
            warn!("⚠️ 发现音频/视频元素: {}", css);
            return Ok(Some(*css));
        }
    }
    Ok(None)
}
