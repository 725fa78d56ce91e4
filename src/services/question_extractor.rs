//! 题目提取 - 业务能力层
//!
//! 把页面上的一个题目区域转成 `Question`，只读不写。

use tracing::{debug, warn};

use crate::error::AppResult;
use crate::infrastructure::{DocumentSession, ElementRef};
use crate::models::{AnswerWidget, MediaBlob, Question, WidgetKind};

/// 题目区域候选，按顺序尝试，第一个有结果的生效
pub const QUESTION_REGION_SELECTORS: &[&str] = &[".que", ".formulation"];
/// 题干子区域
pub const QUESTION_TEXT_SELECTOR: &str = ".qtext";
/// 文本作答框
pub const FREE_TEXT_SELECTOR: &str = "input[type='text'], textarea";
/// 选项行候选，按顺序尝试
pub const CHOICE_ROW_SELECTORS: &[&str] = &[".answer .r0, .answer .r1", ".answer label"];
/// 选项所在的作答块
pub const ANSWER_BLOCK_SELECTOR: &str = ".answer";
/// 选项输入框
pub const CHOICE_INPUT_SELECTOR: &str = "input[type='radio'], input[type='checkbox']";
/// 题目中的图片
pub const IMAGE_SELECTOR: &str = "img";

/// 题目提取器
///
/// 职责：
/// - 提取题干并加上测验名前缀
/// - 截取题目中的图片
/// - 识别作答控件
/// - 不修改页面
#[derive(Debug, Default)]
pub struct QuestionExtractor;

impl QuestionExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 规范化测验名：去掉开头的序号和结尾的数字
    ///
    /// `"3. Present Simple 2"` → `"Present Simple"`
    pub fn quiz_title_fragment(&self, quiz_name: &str) -> String {
        let rest = quiz_name.trim_start();
        let without_ordinal = match rest.trim_start_matches(|c: char| c.is_ascii_digit()) {
            stripped if stripped.len() < rest.len() => stripped
                .trim_start()
                .trim_start_matches(['.', ')'])
                .trim_start(),
            _ => rest,
        };
        without_ordinal
            .trim_end()
            .trim_end_matches(|c: char| c.is_ascii_digit())
            .trim()
            .to_string()
    }

    /// 提取单个题目
    pub async fn extract(
        &self,
        session: &dyn DocumentSession,
        region: ElementRef,
        index: usize,
        title_fragment: &str,
    ) -> AppResult<Question> {
        let text = self.extract_text(session, region).await?;
        let prompt_text = if title_fragment.is_empty() {
            text
        } else {
            format!("{}\n{}", title_fragment, text)
        };

        let media = self.extract_media(session, region).await;
        let widgets = self.extract_widgets(session, region).await?;

        debug!(
            "题目 {}: 题干 {} 字符, 图片 {} 张, 控件 {} 个",
            index,
            prompt_text.chars().count(),
            media.len(),
            widgets.len()
        );

        Ok(Question {
            index,
            prompt_text,
            media,
            widgets,
        })
    }

    /// 优先读 `.qtext`，没有时读整个区域
    async fn extract_text(
        &self,
        session: &dyn DocumentSession,
        region: ElementRef,
    ) -> AppResult<String> {
        let text = match session
            .find_first_within(region, QUESTION_TEXT_SELECTOR)
            .await?
        {
            Some(qtext) => session.text(qtext).await?,
            None => session.text(region).await?,
        };
        Ok(text.trim().to_string())
    }

    /// 截取所有图片，单张失败时跳过
    async fn extract_media(&self, session: &dyn DocumentSession, region: ElementRef) -> Vec<MediaBlob> {
        let images = match session.find_within(region, IMAGE_SELECTOR).await {
            Ok(images) => images,
            Err(e) => {
                warn!("⚠️ 查找图片失败: {}", e);
                return Vec::new();
            }
        };

        let mut media = Vec::with_capacity(images.len());
        for image in images {
            match session.screenshot(image).await {
                Ok(bytes) => media.push(MediaBlob::png(bytes)),
                Err(e) => warn!("⚠️ 图片截图失败，已跳过: {}", e),
            }
        }
        media
    }

    /// 识别作答控件：文本框优先，其次选项行
    ///
    /// 有任一选项的输入框是复选框时为多选题。
    async fn extract_widgets(
        &self,
        session: &dyn DocumentSession,
        region: ElementRef,
    ) -> AppResult<Vec<AnswerWidget>> {
        if !session.find_within(region, FREE_TEXT_SELECTOR).await?.is_empty() {
            return Ok(vec![AnswerWidget::free_text()]);
        }

        let controls = choice_controls(session, region).await?;
        if controls.is_empty() {
            return Ok(Vec::new());
        }

        let mut kind = WidgetKind::SingleChoice;
        for input in controls.iter().filter_map(|c| c.input) {
            let input_type = session.attribute(input, "type").await?.unwrap_or_default();
            if input_type.eq_ignore_ascii_case("checkbox") {
                kind = WidgetKind::MultiChoice;
                break;
            }
        }

        let mut widgets = Vec::with_capacity(controls.len());
        for (i, control) in controls.into_iter().enumerate() {
            let label = session.text(control.row).await?;
            widgets.push(AnswerWidget {
                position: i + 1,
                kind,
                label: label.trim().to_string(),
            });
        }
        Ok(widgets)
    }
}

/// 一个选项行及其输入框
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceControl {
    pub row: ElementRef,
    pub input: Option<ElementRef>,
}

/// 题目区域内的选项，按文档顺序
///
/// 输入框先在行内查找；行内没有时（`label` 行）按序号取作答块中的输入框。
/// 作答块之外的输入框（例如题目标记复选框）不会被当作选项。
pub async fn choice_controls(
    session: &dyn DocumentSession,
    region: ElementRef,
) -> AppResult<Vec<ChoiceControl>> {
    let mut rows = Vec::new();
    for css in CHOICE_ROW_SELECTORS {
        rows = session.find_within(region, css).await?;
        if !rows.is_empty() {
            break;
        }
    }
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let block_inputs = match session
        .find_first_within(region, ANSWER_BLOCK_SELECTOR)
        .await?
    {
        Some(block) => session.find_within(block, CHOICE_INPUT_SELECTOR).await?,
        None => Vec::new(),
    };

    let mut controls = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        let input = match session.find_first_within(row, CHOICE_INPUT_SELECTOR).await? {
            Some(input) => Some(input),
            None => block_inputs.get(i).copied(),
        };
        controls.push(ChoiceControl { row, input });
    }
    Ok(controls)
}
