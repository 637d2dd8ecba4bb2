//! Playwright browser automation
//!
//! A single Node process hosts Playwright for the whole session. Commands are
//! exchanged with it as one JSON object per line over stdin/stdout; element
//! handles stay on the Node side and are referenced by numeric id.

use std::path::Path;
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command as TokioCommand};
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use crate::automation::{Automation, DomCondition, ElementHandle, WaitState};
use crate::config::SuiteConfig;
use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(format!("unknown browser '{}' (chromium, firefox, webkit)", other)),
        }
    }
}

impl std::fmt::Display for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub node_binary: String,
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub default_timeout: Duration,
    pub navigation_timeout: Duration,
    pub bridge_grace: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        PlaywrightConfig::from(&SuiteConfig::default())
    }
}

impl From<&SuiteConfig> for PlaywrightConfig {
    fn from(config: &SuiteConfig) -> Self {
        Self {
            node_binary: config.node_binary.clone(),
            browser: config.browser,
            headless: config.headless,
            viewport_width: config.viewport.width,
            viewport_height: config.viewport.height,
            default_timeout: config.timeouts.default_timeout(),
            navigation_timeout: config.timeouts.navigation(),
            bridge_grace: config.timeouts.bridge_grace(),
        }
    }
}

const DRIVER_SCRIPT: &str = r#"
const readline = require('readline');
const playwright = require(require.resolve('playwright', { paths: [process.cwd()] }));

const options = JSON.parse(process.argv[2]);
const handles = new Map();
let nextHandle = 1;
let browser;
let page;

const conditions = {
  all_interactable: (selector) =>
    Array.from(document.querySelectorAll(selector))
      .every((el) => el.isConnected && el.offsetParent !== null),
};

function register(handle) {
  const id = nextHandle++;
  handles.set(id, handle);
  return id;
}

function lookup(id) {
  const handle = handles.get(id);
  if (!handle) throw new Error(`stale element handle ${id}`);
  return handle;
}

function reply(message) {
  process.stdout.write(JSON.stringify(message) + '\n');
}

async function dispatch(req) {
  switch (req.cmd) {
    case 'goto':
      await page.goto(req.url, { timeout: req.timeout_ms });
      return null;
    case 'is_visible':
      return await page.isVisible(req.selector);
    case 'wait_for':
      await page.waitForSelector(req.selector, { state: req.state, timeout: req.timeout_ms });
      return null;
    case 'wait_for_condition':
      await page.waitForFunction(conditions[req.condition], req.arg, { timeout: req.timeout_ms });
      return null;
    case 'click':
      await page.click(req.selector, { timeout: req.timeout_ms });
      return null;
    case 'type':
      await page.type(req.selector, req.text, { timeout: req.timeout_ms });
      return null;
    case 'query_all':
      return (await page.$$(req.selector)).map(register);
    case 'element_text':
      return await lookup(req.handle).innerText();
    case 'element_attribute':
      return await lookup(req.handle).getAttribute(req.name);
    case 'element_click':
      await lookup(req.handle).click({ timeout: req.timeout_ms });
      return null;
    case 'element_child_text': {
      const child = await lookup(req.handle).$(req.selector);
      return child ? await child.innerText() : null;
    }
    case 'url':
      return page.url();
    case 'screenshot':
      await page.screenshot({ path: req.path, fullPage: true });
      return null;
    case 'close':
      await browser.close();
      return null;
    default:
      throw new Error(`unknown command: ${req.cmd}`);
  }
}

(async () => {
  browser = await playwright[options.browser].launch({ headless: options.headless });
  const context = await browser.newContext({ viewport: options.viewport });
  page = await context.newPage();
  reply({ ready: true });

  const lines = readline.createInterface({ input: process.stdin });
  for await (const line of lines) {
    if (!line.trim()) continue;
    const req = JSON.parse(line);
    try {
      reply({ id: req.id, ok: true, result: await dispatch(req) });
    } catch (error) {
      const kind = error.name === 'TimeoutError' ? 'timeout' : 'error';
      reply({ id: req.id, ok: false, error: { kind, message: error.message } });
    }
    if (req.cmd === 'close') break;
  }
  process.exit(0);
})().catch((error) => {
  reply({ ready: false, error: error.message });
  process.exit(1);
});
"#;

#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum BridgeCommand<'a> {
    Goto { url: &'a str, timeout_ms: u64 },
    IsVisible { selector: &'a str },
    WaitFor { selector: &'a str, state: WaitState, timeout_ms: u64 },
    WaitForCondition { condition: &'static str, arg: &'a str, timeout_ms: u64 },
    Click { selector: &'a str, timeout_ms: u64 },
    Type { selector: &'a str, text: &'a str, timeout_ms: u64 },
    QueryAll { selector: &'a str },
    ElementText { handle: u64 },
    ElementAttribute { handle: u64, name: &'a str },
    ElementClick { handle: u64, timeout_ms: u64 },
    ElementChildText { handle: u64, selector: &'a str },
    Url,
    Screenshot { path: &'a str },
    Close,
}

impl BridgeCommand<'_> {
    fn name(&self) -> &'static str {
        match self {
            BridgeCommand::Goto { .. } => "goto",
            BridgeCommand::IsVisible { .. } => "is_visible",
            BridgeCommand::WaitFor { .. } => "wait_for",
            BridgeCommand::WaitForCondition { .. } => "wait_for_condition",
            BridgeCommand::Click { .. } => "click",
            BridgeCommand::Type { .. } => "type",
            BridgeCommand::QueryAll { .. } => "query_all",
            BridgeCommand::ElementText { .. } => "element_text",
            BridgeCommand::ElementAttribute { .. } => "element_attribute",
            BridgeCommand::ElementClick { .. } => "element_click",
            BridgeCommand::ElementChildText { .. } => "element_child_text",
            BridgeCommand::Url => "url",
            BridgeCommand::Screenshot { .. } => "screenshot",
            BridgeCommand::Close => "close",
        }
    }

    /// Driver-side timeout carried by the command, if any
    fn timeout_ms(&self) -> Option<u64> {
        match self {
            BridgeCommand::Goto { timeout_ms, .. }
            | BridgeCommand::WaitFor { timeout_ms, .. }
            | BridgeCommand::WaitForCondition { timeout_ms, .. }
            | BridgeCommand::Click { timeout_ms, .. }
            | BridgeCommand::Type { timeout_ms, .. }
            | BridgeCommand::ElementClick { timeout_ms, .. } => Some(*timeout_ms),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    id: u64,
    #[serde(flatten)]
    command: &'a BridgeCommand<'a>,
}

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    id: u64,
    ok: bool,
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<BridgeFailure>,
}

#[derive(Debug, Deserialize)]
struct BridgeFailure {
    kind: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct DriverReady {
    ready: bool,
    #[serde(default)]
    error: Option<String>,
}

impl BridgeResponse {
    fn into_result<R: DeserializeOwned>(self, command: &str) -> E2eResult<R> {
        if self.ok {
            return serde_json::from_value(self.result).map_err(|e| {
                E2eError::Bridge(format!("Invalid '{}' result: {}", command, e))
            });
        }

        let failure = self.error.unwrap_or(BridgeFailure {
            kind: "error".to_string(),
            message: "no error detail".to_string(),
        });

        match failure.kind.as_str() {
            "timeout" => Err(E2eError::Timeout(format!("{}: {}", command, failure.message))),
            _ => Err(E2eError::Playwright(format!("{}: {}", command, failure.message))),
        }
    }
}

#[derive(Debug)]
struct BridgeIo {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl BridgeIo {
    /// Next JSON line from the driver, skipping anything else it prints
    async fn read_json_line(&mut self) -> E2eResult<String> {
        loop {
            let mut line = String::new();
            let n = self.stdout.read_line(&mut line).await?;
            if n == 0 {
                return Err(E2eError::Bridge("Playwright driver exited".to_string()));
            }

            let line = line.trim();
            if line.starts_with('{') {
                return Ok(line.to_string());
            }
            if !line.is_empty() {
                debug!(target: "playwright", "{}", line);
            }
        }
    }

    async fn exchange(&mut self, id: u64, request: &str) -> E2eResult<BridgeResponse> {
        self.stdin.write_all(request.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;

        loop {
            let line = self.read_json_line().await?;
            trace!("bridge <- {}", line);

            let response: BridgeResponse = serde_json::from_str(&line)
                .map_err(|e| E2eError::Bridge(format!("Invalid response: {}", e)))?;

            // Late replies to requests we already gave up on
            if response.id < id {
                warn!("Discarding stale driver reply {}", response.id);
                continue;
            }
            if response.id > id {
                return Err(E2eError::Bridge(format!(
                    "Reply id {} ahead of request {}",
                    response.id, id
                )));
            }

            return Ok(response);
        }
    }
}

#[derive(Debug)]
struct BridgeChannel {
    io: Mutex<BridgeIo>,
    next_id: AtomicU64,
    default_timeout: Duration,
    grace: Duration,
}

impl BridgeChannel {
    async fn call<R: DeserializeOwned>(&self, command: BridgeCommand<'_>) -> E2eResult<R> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let name = command.name();
        let limit = command
            .timeout_ms()
            .map(Duration::from_millis)
            .unwrap_or(self.default_timeout)
            + self.grace;

        let request = serde_json::to_string(&BridgeRequest { id, command: &command })?;
        trace!("bridge -> {}", request);

        let mut io = self.io.lock().await;
        let response = tokio::time::timeout(limit, io.exchange(id, &request))
            .await
            .map_err(|_| {
                E2eError::Timeout(format!("driver reply to '{}' after {:?}", name, limit))
            })??;

        response.into_result(name)
    }
}

fn millis(timeout: Duration) -> u64 {
    timeout.as_millis() as u64
}

/// A browser page driven through Playwright
#[derive(Debug)]
pub struct PlaywrightSession {
    channel: Arc<BridgeChannel>,
    child: Mutex<Child>,
    config: PlaywrightConfig,
    _script_dir: tempfile::TempDir,
}

impl PlaywrightSession {
    /// Start the driver process and open a fresh page
    pub async fn launch(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed(&config.node_binary)?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("driver.js");
        std::fs::write(&script_path, DRIVER_SCRIPT)?;

        let options = serde_json::json!({
            "browser": config.browser.as_str(),
            "headless": config.headless,
            "viewport": { "width": config.viewport_width, "height": config.viewport_height },
        });

        let mut child = TokioCommand::new(&config.node_binary)
            .arg(&script_path)
            .arg(options.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                E2eError::Bridge(format!("Failed to spawn {}: {}", config.node_binary, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Bridge("driver stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Bridge("driver stdout unavailable".to_string()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(stderr));
        }

        let mut io = BridgeIo {
            stdin,
            stdout: BufReader::new(stdout),
        };

        let launch_limit = config.navigation_timeout + config.bridge_grace;
        let line = tokio::time::timeout(launch_limit, io.read_json_line())
            .await
            .map_err(|_| E2eError::Timeout(format!("browser launch after {:?}", launch_limit)))??;

        let ready: DriverReady = serde_json::from_str(&line)
            .map_err(|e| E2eError::Bridge(format!("Invalid greeting: {}", e)))?;
        if !ready.ready {
            return Err(E2eError::Playwright(format!(
                "browser launch failed: {}",
                ready.error.unwrap_or_default()
            )));
        }

        info!(
            "Launched {} (headless: {}, viewport {}x{})",
            config.browser, config.headless, config.viewport_width, config.viewport_height
        );

        Ok(Self {
            channel: Arc::new(BridgeChannel {
                io: Mutex::new(io),
                next_id: AtomicU64::new(1),
                default_timeout: config.default_timeout,
                grace: config.bridge_grace,
            }),
            child: Mutex::new(child),
            config,
            _script_dir: script_dir,
        })
    }

    /// Check if Playwright is resolvable from the working directory
    fn check_playwright_installed(node: &str) -> E2eResult<()> {
        let status = Command::new(node)
            .args(["-e", "require.resolve('playwright', { paths: [process.cwd()] })"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Close the browser and stop the driver
    pub async fn close(&self) -> E2eResult<()> {
        if let Err(e) = self.channel.call::<()>(BridgeCommand::Close).await {
            warn!("Browser close failed: {}", e);
        }

        let mut child = self.child.lock().await;
        match tokio::time::timeout(self.config.bridge_grace, child.wait()).await {
            Ok(Ok(status)) => debug!("Playwright driver exited: {}", status),
            _ => {
                warn!("Playwright driver did not exit, killing it");
                child.kill().await?;
            }
        }

        Ok(())
    }
}

async fn forward_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(target: "playwright", "{}", line);
    }
}

#[async_trait]
impl Automation for PlaywrightSession {
    type Element = PlaywrightElement;

    async fn goto(&self, url: &str) -> E2eResult<()> {
        debug!("Navigating to {}", url);
        let timeout_ms = millis(self.config.navigation_timeout);
        self.channel.call(BridgeCommand::Goto { url, timeout_ms }).await
    }

    async fn is_visible(&self, selector: &str) -> E2eResult<bool> {
        self.channel.call(BridgeCommand::IsVisible { selector }).await
    }

    async fn wait_for(&self, selector: &str, state: WaitState, timeout: Duration) -> E2eResult<()> {
        let timeout_ms = millis(timeout);
        self.channel
            .call(BridgeCommand::WaitFor { selector, state, timeout_ms })
            .await
    }

    async fn wait_for_condition(
        &self,
        condition: &DomCondition,
        timeout: Duration,
    ) -> E2eResult<()> {
        debug!("Waiting for {}", condition);
        let timeout_ms = millis(timeout);
        let (name, arg) = match condition {
            DomCondition::AllInteractable { selector } => ("all_interactable", selector.as_str()),
        };
        self.channel
            .call(BridgeCommand::WaitForCondition { condition: name, arg, timeout_ms })
            .await
    }

    async fn click(&self, selector: &str) -> E2eResult<()> {
        let timeout_ms = millis(self.config.default_timeout);
        self.channel.call(BridgeCommand::Click { selector, timeout_ms }).await
    }

    async fn type_text(&self, selector: &str, text: &str) -> E2eResult<()> {
        let timeout_ms = millis(self.config.default_timeout);
        self.channel
            .call(BridgeCommand::Type { selector, text, timeout_ms })
            .await
    }

    async fn query_all(&self, selector: &str) -> E2eResult<Vec<PlaywrightElement>> {
        let ids: Vec<u64> = self.channel.call(BridgeCommand::QueryAll { selector }).await?;
        Ok(ids
            .into_iter()
            .map(|handle| PlaywrightElement {
                handle,
                channel: Arc::clone(&self.channel),
            })
            .collect())
    }

    async fn current_url(&self) -> E2eResult<String> {
        self.channel.call(BridgeCommand::Url).await
    }

    async fn screenshot(&self, path: &Path) -> E2eResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let path = path.to_string_lossy();
        self.channel.call(BridgeCommand::Screenshot { path: &path }).await
    }
}

/// An element handle held by the driver process
#[derive(Debug, Clone)]
pub struct PlaywrightElement {
    handle: u64,
    channel: Arc<BridgeChannel>,
}

#[async_trait]
impl ElementHandle for PlaywrightElement {
    async fn text(&self) -> E2eResult<String> {
        self.channel
            .call(BridgeCommand::ElementText { handle: self.handle })
            .await
    }

    async fn attribute(&self, name: &str) -> E2eResult<Option<String>> {
        self.channel
            .call(BridgeCommand::ElementAttribute { handle: self.handle, name })
            .await
    }

    async fn click(&self) -> E2eResult<()> {
        let timeout_ms = millis(self.channel.default_timeout);
        self.channel
            .call(BridgeCommand::ElementClick { handle: self.handle, timeout_ms })
            .await
    }

    async fn child_text(&self, selector: &str) -> E2eResult<Option<String>> {
        self.channel
            .call(BridgeCommand::ElementChildText { handle: self.handle, selector })
            .await
    }
}
