//! 页面会话 - 基础设施层
//!
//! 持有唯一的 page 资源，对外只暴露 `DocumentSession` 能力

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Element, Page};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{is_session_lost, AppError, AppResult, NavigationError};
use crate::infrastructure::document::{DocumentSession, ElementRef, Selector};

const FORCE_CLICK_JS: &str = "function() { this.click(); }";
const SCROLL_INTO_VIEW_JS: &str = "function() { this.scrollIntoView(true); }";
const CLEAR_VALUE_JS: &str = "function() { this.value = ''; this.focus(); }";

/// 基于 chromiumoxide 的页面会话
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 把查到的 Element 登记下来，用 `ElementRef` 编号交给上层
/// - 导航时清空登记表
pub struct PageSession {
    page: Page,
    elements: Mutex<Vec<Element>>,
}

impl PageSession {
    /// 创建新的页面会话
    pub fn new(page: Page) -> Self {
        Self {
            page,
            elements: Mutex::new(Vec::new()),
        }
    }

    async fn register(&self, found: Vec<Element>) -> Vec<ElementRef> {
        let mut elements = self.elements.lock().await;
        let start = elements.len();
        let count = found.len();
        elements.extend(found);
        (start..start + count).map(ElementRef).collect()
    }

    /// 查找结果：连接断开时报错，其它错误视为没有匹配
    fn found_or_empty(
        found: Result<Vec<Element>, CdpError>,
        what: &dyn std::fmt::Display,
    ) -> AppResult<Vec<Element>> {
        match found {
            Ok(found) => Ok(found),
            Err(e) if is_session_lost(&e) => Err(e.into()),
            Err(e) => {
                debug!("{} 无匹配: {}", what, e);
                Ok(Vec::new())
            }
        }
    }

    fn resolve(elements: &[Element], element: ElementRef) -> AppResult<&Element> {
        elements
            .get(element.0)
            .ok_or_else(|| NavigationError::StaleElement { index: element.0 }.into())
    }
}

#[async_trait]
impl DocumentSession for PageSession {
    async fn navigate(&self, url: &str) -> AppResult<()> {
        debug!("导航到: {}", url);
        self.elements.lock().await.clear();
        match self.page.goto(url).await {
            Ok(_) => Ok(()),
            Err(e) if is_session_lost(&e) => Err(e.into()),
            Err(e) => Err(AppError::page_load_failed(url, e)),
        }
    }

    async fn current_url(&self) -> AppResult<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn find_all(&self, selector: &Selector) -> AppResult<Vec<ElementRef>> {
        let found = match selector {
            Selector::Css(css) => self.page.find_elements(css.as_str()).await,
            Selector::XPath(xpath) => self.page.find_xpaths(xpath.as_str()).await,
        };
        // chromiumoxide 在没有匹配时也可能返回错误
        let found = Self::found_or_empty(found, selector)?;
        Ok(self.register(found).await)
    }

    async fn find_within(&self, scope: ElementRef, css: &str) -> AppResult<Vec<ElementRef>> {
        let found = {
            let elements = self.elements.lock().await;
            let el = Self::resolve(&elements, scope)?;
            Self::found_or_empty(el.find_elements(css).await, &css)?
        };
        Ok(self.register(found).await)
    }

    async fn text(&self, element: ElementRef) -> AppResult<String> {
        let elements = self.elements.lock().await;
        let el = Self::resolve(&elements, element)?;
        Ok(el.inner_text().await?.unwrap_or_default())
    }

    async fn attribute(&self, element: ElementRef, name: &str) -> AppResult<Option<String>> {
        let elements = self.elements.lock().await;
        let el = Self::resolve(&elements, element)?;
        Ok(el.attribute(name).await?)
    }

    async fn is_checked(&self, element: ElementRef) -> AppResult<bool> {
        let elements = self.elements.lock().await;
        let el = Self::resolve(&elements, element)?;
        let checked = el.property("checked").await?;
        Ok(checked.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn click(&self, element: ElementRef) -> AppResult<()> {
        let elements = self.elements.lock().await;
        Self::resolve(&elements, element)?.click().await?;
        Ok(())
    }

    async fn fill(&self, element: ElementRef, text: &str) -> AppResult<()> {
        let elements = self.elements.lock().await;
        let el = Self::resolve(&elements, element)?;
        el.call_js_fn(CLEAR_VALUE_JS, false).await?;
        el.type_str(text).await?;
        Ok(())
    }

    async fn screenshot(&self, element: ElementRef) -> AppResult<Vec<u8>> {
        let elements = self.elements.lock().await;
        let el = Self::resolve(&elements, element)?;
        Ok(el.screenshot(CaptureScreenshotFormat::Png).await?)
    }

    async fn page_screenshot(&self) -> AppResult<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        Ok(self.page.screenshot(params).await?)
    }

    async fn force_click(&self, element: ElementRef) -> AppResult<()> {
        let elements = self.elements.lock().await;
        Self::resolve(&elements, element)?
            .call_js_fn(FORCE_CLICK_JS, false)
            .await?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: ElementRef) -> AppResult<()> {
        let elements = self.elements.lock().await;
        Self::resolve(&elements, element)?
            .call_js_fn(SCROLL_INTO_VIEW_JS, false)
            .await?;
        Ok(())
    }
}
