//! 集成测试公共工具
//!
//! - `FakeSession`：内存中的 `DocumentSession`，按 (页面地址, 选择器) 返回预先登记的元素
//! - `ScriptedOracle`：按顺序返回预设回复，并记录每次调用
//! - `QuizBuilder` / `SectionBuilder`：用 crate 公开的选择器常量搭建页面

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use quiz_autosolver::config::{Config, LabelSet};
use quiz_autosolver::error::{AppResult, BrowserError, NavigationError, OracleError};
use quiz_autosolver::models::{MediaBlob, QuizActivity};
use quiz_autosolver::services::question_extractor::{
    ANSWER_BLOCK_SELECTOR, CHOICE_INPUT_SELECTOR, CHOICE_ROW_SELECTORS, FREE_TEXT_SELECTOR,
    IMAGE_SELECTOR, QUESTION_REGION_SELECTORS, QUESTION_TEXT_SELECTOR,
};
use quiz_autosolver::services::section_scanner::{
    section_selector, COMPLETION_ICON_SELECTOR, INSTANCE_NAME_SELECTOR, QUIZ_ACTIVITY_SELECTOR,
    QUIZ_LINK_SELECTOR, SECTION_CONTENT_SELECTOR,
};
use quiz_autosolver::services::{probes, Oracle};
use quiz_autosolver::{DocumentSession, ElementRef, Selector};

pub const LMS: &str = "https://lms.test";
pub const COURSE_URL: &str = "https://lms.test/course/view.php?id=7";
pub const LOGIN_URL: &str = "https://lms.test/login/index.php";

pub fn quiz_url(number: usize) -> String {
    format!("{}/mod/quiz/view.php?id={}", LMS, 100 + number)
}

pub fn attempt_url(number: usize) -> String {
    format!("{}/mod/quiz/attempt.php?attempt={}", LMS, number)
}

pub fn summary_url(number: usize) -> String {
    format!("{}/mod/quiz/summary.php?attempt={}", LMS, number)
}

pub fn review_url(number: usize) -> String {
    format!("{}/mod/quiz/review.php?attempt={}", LMS, number)
}

/// `page_screenshot` 返回的内容
pub const PAGE_PNG: &[u8] = b"\x89PNG\r\n\x1a\npage";

/// 每次调用返回一个新的截图目录
pub fn scratch_dir() -> PathBuf {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    std::env::temp_dir().join(format!(
        "quiz_autosolver_shots_{}_{}",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::SeqCst)
    ))
}

/// 不等待的测试配置，截图写入独立的临时目录
pub fn test_config() -> Config {
    Config {
        site_url: LOGIN_URL.to_string(),
        course_url: COURSE_URL.to_string(),
        screenshot_dir: scratch_dir().to_string_lossy().to_string(),
        wait_timeout_secs: 0,
        settle_delay_ms: 0,
        question_pause_ms: 0,
        submit_pause_ms: 0,
        ..Config::default()
    }
}

pub fn activity(number: usize, name: &str) -> QuizActivity {
    let url = quiz_url(number);
    QuizActivity {
        number,
        id: QuizActivity::id_from_url(&url),
        display_name: name.to_string(),
        status: quiz_autosolver::models::CompletionStatus::Pending,
        url,
    }
}

// ========== FakeSession ==========

/// 页面节点
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub tag: String,
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub checked: bool,
    pub value: String,
    /// `None` 表示截图失败
    pub screenshot: Option<Vec<u8>>,
    /// 点击后跳转的地址
    pub navigates_to: Option<String>,
}

impl Node {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn screenshot(mut self, bytes: Vec<u8>) -> Self {
        self.screenshot = Some(bytes);
        self
    }

    pub fn navigates_to(mut self, url: &str) -> Self {
        self.navigates_to = Some(url.to_string());
        self
    }
}

/// 页面上的操作记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Navigate(String),
    Click(usize),
    ForceClick(usize),
    Fill(usize, String),
    Scroll(usize),
}

#[derive(Default)]
struct State {
    url: String,
    nodes: Vec<Node>,
    pages: HashMap<String, HashMap<Selector, Vec<usize>>>,
    scoped: HashMap<(usize, String), Vec<usize>>,
    events: Vec<Event>,
    /// 导航到该地址时浏览器断开
    lost_at: Option<String>,
    lost: bool,
}

impl State {
    fn node(&self, element: ElementRef) -> AppResult<&Node> {
        self.nodes.get(element.0).ok_or_else(|| {
            NavigationError::StaleElement { index: element.0 }.into()
        })
    }

    fn node_mut(&mut self, element: ElementRef) -> AppResult<&mut Node> {
        self.nodes.get_mut(element.0).ok_or_else(|| {
            NavigationError::StaleElement { index: element.0 }.into()
        })
    }

    /// 点击的效果：单选框选中并取消同组其它项，复选框切换，链接跳转
    fn activate(&mut self, element: ElementRef) -> AppResult<()> {
        let node = self.node(element)?.clone();
        match node.attrs.get("type").map(String::as_str) {
            Some("radio") => {
                let group = node.attrs.get("name").cloned();
                for other in self.nodes.iter_mut() {
                    if other.attrs.get("type").map(String::as_str) == Some("radio")
                        && other.attrs.get("name") == group.as_ref()
                    {
                        other.checked = false;
                    }
                }
                self.node_mut(element)?.checked = true;
            }
            Some("checkbox") => {
                let node = self.node_mut(element)?;
                node.checked = !node.checked;
            }
            _ => {}
        }
        if let Some(url) = node.navigates_to {
            self.url = url;
        }
        Ok(())
    }
}

/// 内存中的文档会话
#[derive(Default)]
pub struct FakeSession {
    state: Mutex<State>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, node: Node) -> ElementRef {
        let mut state = self.state.lock().unwrap();
        state.nodes.push(node);
        ElementRef(state.nodes.len() - 1)
    }

    /// 在页面 `url` 上登记选择器的结果
    pub fn on_page(&self, url: &str, selector: Selector, elements: &[ElementRef]) {
        let mut state = self.state.lock().unwrap();
        state
            .pages
            .entry(url.to_string())
            .or_default()
            .insert(selector, elements.iter().map(|e| e.0).collect());
    }

    /// 在元素 `scope` 内登记 CSS 查询的结果
    pub fn within(&self, scope: ElementRef, css: &str, elements: &[ElementRef]) {
        let mut state = self.state.lock().unwrap();
        state
            .scoped
            .insert((scope.0, css.to_string()), elements.iter().map(|e| e.0).collect());
    }

    /// 导航到 `url` 时模拟浏览器断开，之后的导航全部失败
    pub fn lose_session_at(&self, url: &str) {
        self.state.lock().unwrap().lost_at = Some(url.to_string());
    }

    pub fn node(&self, element: ElementRef) -> Node {
        self.state.lock().unwrap().nodes[element.0].clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn url(&self) -> String {
        self.state.lock().unwrap().url.clone()
    }

    pub fn visited(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Navigate(url) => Some(url),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl DocumentSession for FakeSession {
    async fn navigate(&self, url: &str) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.lost || state.lost_at.as_deref() == Some(url) {
            state.lost = true;
            return Err(BrowserError::SessionLost {
                source: "websocket closed".into(),
            }
            .into());
        }
        state.url = url.to_string();
        state.events.push(Event::Navigate(url.to_string()));
        Ok(())
    }

    async fn current_url(&self) -> AppResult<String> {
        Ok(self.url())
    }

    async fn find_all(&self, selector: &Selector) -> AppResult<Vec<ElementRef>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pages
            .get(&state.url)
            .and_then(|page| page.get(selector))
            .map(|ids| ids.iter().copied().map(ElementRef).collect())
            .unwrap_or_default())
    }

    async fn find_within(&self, scope: ElementRef, css: &str) -> AppResult<Vec<ElementRef>> {
        let state = self.state.lock().unwrap();
        state.node(scope)?;
        Ok(state
            .scoped
            .get(&(scope.0, css.to_string()))
            .map(|ids| ids.iter().copied().map(ElementRef).collect())
            .unwrap_or_default())
    }

    async fn text(&self, element: ElementRef) -> AppResult<String> {
        let state = self.state.lock().unwrap();
        Ok(state.node(element)?.text.clone())
    }

    async fn attribute(&self, element: ElementRef, name: &str) -> AppResult<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(state.node(element)?.attrs.get(name).cloned())
    }

    async fn is_checked(&self, element: ElementRef) -> AppResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.node(element)?.checked)
    }

    async fn click(&self, element: ElementRef) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Click(element.0));
        state.activate(element)
    }

    async fn fill(&self, element: ElementRef, text: &str) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.node_mut(element)?.value = text.to_string();
        state.events.push(Event::Fill(element.0, text.to_string()));
        Ok(())
    }

    async fn screenshot(&self, element: ElementRef) -> AppResult<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state.node(element)?.screenshot.clone().ok_or_else(|| {
            NavigationError::ElementNotFound {
                selector: IMAGE_SELECTOR.to_string(),
                timeout_secs: 0,
            }
            .into()
        })
    }

    async fn page_screenshot(&self) -> AppResult<Vec<u8>> {
        Ok(PAGE_PNG.to_vec())
    }

    async fn force_click(&self, element: ElementRef) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::ForceClick(element.0));
        state.activate(element)
    }

    async fn scroll_into_view(&self, element: ElementRef) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.node(element)?;
        state.events.push(Event::Scroll(element.0));
        Ok(())
    }
}

// ========== ScriptedOracle ==========

/// 一次 Oracle 调用
#[derive(Debug, Clone)]
pub struct OracleCall {
    pub prompt: String,
    pub media: usize,
}

/// 按顺序返回预设回复；预设用完后返回 `EmptyContent`
#[derive(Default)]
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Result<String, OracleError>>>,
    calls: Mutex<Vec<OracleCall>>,
}

impl ScriptedOracle {
    pub fn new(replies: Vec<Result<String, OracleError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn calls(&self) -> Vec<OracleCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn query(&self, prompt: &str, media: &[MediaBlob]) -> Result<String, OracleError> {
        self.calls.lock().unwrap().push(OracleCall {
            prompt: prompt.to_string(),
            media: media.len(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(OracleError::EmptyContent {
                    model: "scripted".to_string(),
                })
            })
    }
}

// ========== 页面搭建 ==========

/// 搭建一个测验：首页（开始按钮）→ 答题页（题目 + 提交按钮）→ 确认页 → 结果页
pub struct QuizBuilder<'a> {
    session: &'a FakeSession,
    labels: LabelSet,
    number: usize,
    regions: Vec<ElementRef>,
    landing_extra: Vec<(Selector, Vec<ElementRef>)>,
    attempt_extra: Vec<(Selector, Vec<ElementRef>)>,
    submit: bool,
}

impl<'a> QuizBuilder<'a> {
    pub fn new(session: &'a FakeSession, number: usize) -> Self {
        Self {
            session,
            labels: LabelSet::default(),
            number,
            regions: Vec::new(),
            landing_extra: Vec::new(),
            attempt_extra: Vec::new(),
            submit: true,
        }
    }

    fn region(&mut self, prompt: &str) -> ElementRef {
        let region = self.session.add(Node::new("div").attr("class", "que"));
        let qtext = self.session.add(Node::new("div").text(prompt));
        self.session.within(region, QUESTION_TEXT_SELECTOR, &[qtext]);
        self.regions.push(region);
        region
    }

    /// 文本题，返回输入框
    pub fn free_text(&mut self, prompt: &str, prior: &str) -> ElementRef {
        let region = self.region(prompt);
        let input = self
            .session
            .add(Node::new("input").attr("type", "text").value(prior));
        self.session.within(region, FREE_TEXT_SELECTOR, &[input]);
        input
    }

    /// 选择题，返回各选项的输入框
    pub fn choice(&mut self, prompt: &str, options: &[&str], multi: bool) -> Vec<ElementRef> {
        let region = self.region(prompt);
        let input_type = if multi { "checkbox" } else { "radio" };
        let group = format!("q{}:{}_answer", self.number, self.regions.len());

        let mut rows = Vec::new();
        let mut inputs = Vec::new();
        for option in options {
            let row = self.session.add(Node::new("div").text(option));
            let input = self
                .session
                .add(Node::new("input").attr("type", input_type).attr("name", &group));
            self.session.within(row, CHOICE_INPUT_SELECTOR, &[input]);
            rows.push(row);
            inputs.push(input);
        }
        self.session.within(region, CHOICE_ROW_SELECTORS[0], &rows);
        inputs
    }

    /// 单选题，题目头部带一个"标记"复选框，区域级的选项查询会先匹配到它
    ///
    /// 返回 (标记复选框, 各选项的输入框)
    pub fn choice_with_flag(&mut self, prompt: &str, options: &[&str]) -> (ElementRef, Vec<ElementRef>) {
        let flag = self
            .session
            .add(Node::new("input").attr("type", "checkbox").attr("name", "flag"));
        let inputs = self.choice(prompt, options, false);
        let region = *self.regions.last().unwrap();

        let mut everything = vec![flag];
        everything.extend(&inputs);
        self.session.within(region, CHOICE_INPUT_SELECTOR, &everything);
        (flag, inputs)
    }

    /// 选项行是 label，输入框不在行内，只能按顺序从答案块中对应
    pub fn choice_with_detached_inputs(&mut self, prompt: &str, options: &[&str]) -> Vec<ElementRef> {
        let region = self.region(prompt);
        let group = format!("q{}:{}_answer", self.number, self.regions.len());
        let block = self.session.add(Node::new("div").attr("class", "answer"));

        let mut labels = Vec::new();
        let mut inputs = Vec::new();
        for option in options {
            labels.push(self.session.add(Node::new("label").text(option)));
            inputs.push(
                self.session
                    .add(Node::new("input").attr("type", "radio").attr("name", &group)),
            );
        }
        self.session.within(region, CHOICE_ROW_SELECTORS[1], &labels);
        self.session.within(region, ANSWER_BLOCK_SELECTOR, &[block]);
        self.session.within(block, CHOICE_INPUT_SELECTOR, &inputs);
        inputs
    }

    /// 带图片的文本题，`None` 表示该图片截图失败
    pub fn free_text_with_images(&mut self, prompt: &str, images: &[Option<Vec<u8>>]) -> ElementRef {
        let input = self.free_text(prompt, "");
        let region = *self.regions.last().unwrap();
        let imgs: Vec<ElementRef> = images
            .iter()
            .map(|img| {
                let node = Node::new("img");
                let node = match img {
                    Some(bytes) => node.screenshot(bytes.clone()),
                    None => node,
                };
                self.session.add(node)
            })
            .collect();
        self.session.within(region, IMAGE_SELECTOR, &imgs);
        input
    }

    /// 没有任何控件的题目
    pub fn bare(&mut self, prompt: &str) {
        self.region(prompt);
    }

    pub fn audio_on_landing(mut self) -> Self {
        let audio = self.session.add(Node::new("audio"));
        self.landing_extra.push((Selector::css("audio"), vec![audio]));
        self
    }

    pub fn audio_on_attempt(mut self) -> Self {
        let audio = self.session.add(Node::new("source").attr("type", "audio/mpeg"));
        self.attempt_extra
            .push((Selector::css("source[type*='audio']"), vec![audio]));
        self
    }

    pub fn without_submit(mut self) -> Self {
        self.submit = false;
        self
    }

    /// 登记所有页面
    pub fn finish(self) -> Vec<ElementRef> {
        let session = self.session;
        let landing = quiz_url(self.number);
        let attempt = attempt_url(self.number);

        let start = session.add(
            Node::new("button")
                .attr("type", "submit")
                .text("Attempt quiz now")
                .navigates_to(&attempt),
        );
        let start_probe = probes::start_probes(&self.labels).remove(0);
        session.on_page(&landing, start_probe, &[start]);
        for (selector, elements) in &self.landing_extra {
            session.on_page(&landing, selector.clone(), elements);
        }

        session.on_page(
            &attempt,
            Selector::css(QUESTION_REGION_SELECTORS[0]),
            &self.regions,
        );
        for (selector, elements) in &self.attempt_extra {
            session.on_page(&attempt, selector.clone(), elements);
        }

        if self.submit {
            let summary = summary_url(self.number);
            let finish = session.add(
                Node::new("button")
                    .text("Finish attempt ...")
                    .navigates_to(&summary),
            );
            let submit_probe = probes::submit_probes(&self.labels).remove(0);
            session.on_page(&attempt, submit_probe, &[finish]);

            let confirm = session.add(
                Node::new("button")
                    .text("Submit all and finish")
                    .navigates_to(&review_url(self.number)),
            );
            let confirm_probe = probes::confirm_probes(&self.labels).remove(0);
            session.on_page(&summary, confirm_probe, &[confirm]);
        }

        self.regions
    }
}

/// 课程页中的一个测验条目
pub struct ActivityRow<'a> {
    pub name: &'a str,
    pub href: Option<String>,
    pub icon_src: &'a str,
    pub icon_alt: &'a str,
}

/// 在课程页上搭建章节 `section`
pub fn build_section(session: &FakeSession, section: u32, rows: &[ActivityRow<'_>]) {
    let section_el = session.add(Node::new("li").attr("id", &format!("section-{}", section)));
    session.on_page(COURSE_URL, section_selector(section), &[section_el]);

    let content = session.add(Node::new("ul").attr("class", "section"));
    session.within(section_el, SECTION_CONTENT_SELECTOR, &[content]);

    let mut items = Vec::new();
    for row in rows {
        let item = session.add(Node::new("li").attr("class", "activity quiz"));
        if let Some(href) = &row.href {
            let link = session.add(Node::new("a").attr("href", href).text(row.name));
            let name = session.add(Node::new("span").text(&format!(" {} ", row.name)));
            session.within(item, QUIZ_LINK_SELECTOR, &[link]);
            session.within(link, INSTANCE_NAME_SELECTOR, &[name]);
        }
        let icon = session.add(
            Node::new("img")
                .attr("src", row.icon_src)
                .attr("alt", row.icon_alt),
        );
        session.within(item, COMPLETION_ICON_SELECTOR, &[icon]);
        items.push(item);
    }
    session.within(content, QUIZ_ACTIVITY_SELECTOR, &items);
}
