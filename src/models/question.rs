use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// 作答控件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WidgetKind {
    /// 文本框 / 多行文本框
    FreeText,
    /// 单选（radio）
    SingleChoice,
    /// 多选（checkbox）
    MultiChoice,
}

/// 一个作答控件
///
/// `position` 从 1 开始，与页面显示顺序一致，Oracle 返回的编号就是和它对比的。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerWidget {
    pub position: usize,
    pub kind: WidgetKind,
    pub label: String,
}

impl AnswerWidget {
    pub fn free_text() -> Self {
        Self {
            position: 1,
            kind: WidgetKind::FreeText,
            label: String::new(),
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self.kind, WidgetKind::SingleChoice | WidgetKind::MultiChoice)
    }
}

/// 题目类型，由控件推导
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    FreeText,
    SingleChoice,
    MultiChoice,
    /// 没有找到任何控件
    Unanswerable,
}

/// 题目中的一张图片（PNG 截图）
#[derive(Clone, PartialEq, Eq)]
pub struct MediaBlob {
    bytes: Vec<u8>,
}

impl MediaBlob {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// 转为 `data:image/png;base64,...`，用于内联到 Oracle 请求中
    pub fn to_data_uri(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.bytes))
    }
}

impl std::fmt::Debug for MediaBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MediaBlob({} bytes)", self.bytes.len())
    }
}

/// 规范化后的题目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// 题目在测验中的序号（从 1 开始）
    pub index: usize,
    /// 带测验名前缀的题干
    pub prompt_text: String,
    /// 题目中的图片，按文档顺序
    pub media: Vec<MediaBlob>,
    /// 作答控件，按文档顺序
    pub widgets: Vec<AnswerWidget>,
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        if self.widgets.is_empty() {
            QuestionKind::Unanswerable
        } else if self.widgets.iter().any(|w| w.kind == WidgetKind::FreeText) {
            QuestionKind::FreeText
        } else if self.widgets.iter().any(|w| w.kind == WidgetKind::MultiChoice) {
            QuestionKind::MultiChoice
        } else {
            QuestionKind::SingleChoice
        }
    }

    /// 选项控件（自由作答题为空）
    pub fn choices(&self) -> impl Iterator<Item = &AnswerWidget> {
        self.widgets.iter().filter(|w| w.is_choice())
    }

    /// 生成发送给 Oracle 的提示词
    pub fn render_prompt(&self) -> String {
        let options: Vec<String> = self
            .choices()
            .map(|w| format!("{}. {}", w.position, w.label))
            .collect();

        let options = if options.is_empty() {
            "No answer options in this question, you need to come up with an answer yourself and give it in a text format.".to_string()
        } else {
            options.join("\n")
        };

        format!(
            "QUESTION:\n{}\nOPTIONS:\n{}\nANSWER:",
            self.prompt_text, options
        )
    }
}
