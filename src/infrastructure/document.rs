//! 文档会话能力 - 基础设施层
//!
//! 引擎只通过这个 trait 读写页面，不直接接触浏览器类型。

use std::fmt;

use async_trait::async_trait;

use crate::error::AppResult;

/// 页面元素句柄
///
/// 只在当前页面有效，导航之后旧句柄会失效。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef(pub usize);

/// 结构选择器
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    Css(String),
    XPath(String),
}

impl Selector {
    pub fn css(selector: impl Into<String>) -> Self {
        Selector::Css(selector.into())
    }

    pub fn xpath(selector: impl Into<String>) -> Self {
        Selector::XPath(selector.into())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(s) => write!(f, "css:{}", s),
            Selector::XPath(s) => write!(f, "xpath:{}", s),
        }
    }
}

/// 文档会话
///
/// 职责：
/// - 导航、查找、读取、点击、输入、截图
/// - 通过脚本强制点击 / 滚动到可见区域
/// - 不认识 Question / Quiz
#[async_trait]
pub trait DocumentSession: Send + Sync {
    /// 导航到指定地址
    async fn navigate(&self, url: &str) -> AppResult<()>;

    /// 当前页面地址
    async fn current_url(&self) -> AppResult<String>;

    /// 在整个页面中查找，结果按文档顺序
    async fn find_all(&self, selector: &Selector) -> AppResult<Vec<ElementRef>>;

    /// 在某个元素内部按 CSS 查找，结果按文档顺序
    async fn find_within(&self, scope: ElementRef, css: &str) -> AppResult<Vec<ElementRef>>;

    /// 元素的可见文本
    async fn text(&self, element: ElementRef) -> AppResult<String>;

    /// 元素属性
    async fn attribute(&self, element: ElementRef, name: &str) -> AppResult<Option<String>>;

    /// 复选框 / 单选框当前是否选中
    async fn is_checked(&self, element: ElementRef) -> AppResult<bool>;

    /// 模拟用户点击
    async fn click(&self, element: ElementRef) -> AppResult<()>;

    /// 清空输入框后输入文本
    async fn fill(&self, element: ElementRef, text: &str) -> AppResult<()>;

    /// 元素截图（PNG）
    async fn screenshot(&self, element: ElementRef) -> AppResult<Vec<u8>>;

    /// 整个页面截图（PNG），用于失败时留存现场
    async fn page_screenshot(&self) -> AppResult<Vec<u8>>;

    /// 通过脚本点击（元素被遮挡或不可交互时使用）
    async fn force_click(&self, element: ElementRef) -> AppResult<()>;

    /// 通过脚本滚动到可见区域
    async fn scroll_into_view(&self, element: ElementRef) -> AppResult<()>;

    /// 页面中第一个匹配元素
    async fn find_first(&self, selector: &Selector) -> AppResult<Option<ElementRef>> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    /// 元素内部第一个匹配元素
    async fn find_first_within(
        &self,
        scope: ElementRef,
        css: &str,
    ) -> AppResult<Option<ElementRef>> {
        Ok(self.find_within(scope, css).await?.into_iter().next())
    }
}
