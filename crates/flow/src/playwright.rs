//! Playwright-backed driver
//!
//! One `node` process hosts a single Playwright page for the lifetime of the
//! driver and answers line-delimited JSON requests on stdin/stdout:
//!
//! ```text
//! -> {"id":3,"op":"click","selector":"#login-button","timeout":4000}
//! <- {"id":3,"ok":true,"value":null}
//! <- {"id":4,"ok":false,"kind":"timeout","message":"locator.click: Timeout 4000ms exceeded"}
//! ```
//!
//! Waiting happens inside Playwright, bounded by the `timeout` of each request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::driver::{Driver, ElementHandle};
use crate::error::{FlowError, FlowResult};

/// Extra time granted to the bridge on top of each request's own timeout
const RESPONSE_SLACK: Duration = Duration::from_secs(5);

/// Time allowed for node to launch the browser and report ready
const STARTUP_TIMEOUT: Duration = Duration::from_secs(60);

const BRIDGE_SCRIPT: &str = r#"
const readline = require('readline');
const playwright = require('playwright');

async function handle(page, req) {
  const loc = req.selector ? page.locator(req.selector) : null;
  const timeout = req.timeout;
  const attached = async () => {
    try {
      await loc.first().waitFor({ state: 'attached', timeout });
      return true;
    } catch (e) {
      if (e.name === 'TimeoutError') return false;
      throw e;
    }
  };
  switch (req.op) {
    case 'visit':
      await page.goto(req.url, { timeout });
      return null;
    case 'find':
      return (await attached()) ? await loc.count() : 0;
    case 'type':
      await loc.first().pressSequentially(req.text, { timeout });
      return null;
    case 'click':
      await loc.first().click({ timeout });
      return null;
    case 'click_text':
      await loc.filter({ hasText: req.text }).first().click({ timeout });
      return null;
    case 'select':
      await loc.first().selectOption({ label: req.label }, { timeout });
      return null;
    case 'text':
      return (await loc.first().textContent({ timeout })) || '';
    case 'texts':
      return (await attached()) ? await loc.allTextContents() : [];
    case 'count':
      await attached();
      return await loc.count();
    case 'visible':
      try {
        await loc.first().waitFor({ state: 'visible', timeout });
        return true;
      } catch (e) {
        if (e.name === 'TimeoutError') return false;
        throw e;
      }
    case 'url':
      return page.url();
    case 'close':
      return null;
    default:
      throw new Error('unknown op: ' + req.op);
  }
}

(async () => {
  const env = process.env;
  const browser = await playwright[env.FLOWCHECK_BROWSER].launch({
    headless: env.FLOWCHECK_HEADLESS === '1',
  });
  const context = await browser.newContext({
    baseURL: env.FLOWCHECK_BASE_URL,
    viewport: {
      width: Number(env.FLOWCHECK_VIEWPORT_WIDTH),
      height: Number(env.FLOWCHECK_VIEWPORT_HEIGHT),
    },
  });
  const page = await context.newPage();
  const reply = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');
  reply({ id: 0, ok: true, value: 'ready' });

  const rl = readline.createInterface({ input: process.stdin });
  for await (const line of rl) {
    let req;
    try {
      req = JSON.parse(line);
    } catch (e) {
      reply({ id: null, ok: false, kind: 'protocol', message: e.message });
      continue;
    }
    try {
      const value = await handle(page, req);
      reply({ id: req.id, ok: true, value: value === undefined ? null : value });
    } catch (e) {
      const kind = e.name === 'TimeoutError' ? 'timeout' : 'error';
      reply({ id: req.id, ok: false, kind, message: e.message });
    }
    if (req.op === 'close') break;
  }
  await browser.close();
})().catch((e) => {
  process.stderr.write(String((e && e.stack) || e) + '\n');
  process.exit(1);
});
"#;

#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    id: u64,
    op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    selector: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    timeout: u64,
}

impl<'a> BridgeRequest<'a> {
    fn new(op: &'static str, wait: Duration) -> Self {
        Self {
            id: 0,
            op,
            selector: None,
            text: None,
            label: None,
            url: None,
            timeout: wait.as_millis() as u64,
        }
    }

    fn on(mut self, selector: &'a str) -> Self {
        self.selector = Some(selector);
        self
    }

    /// What a failure of this request should be blamed on
    fn target(&self) -> String {
        self.selector
            .or(self.url)
            .map(str::to_string)
            .unwrap_or_else(|| format!("<{}>", self.op))
    }
}

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    id: Option<u64>,
    ok: bool,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Driver speaking to a Playwright page hosted by a node bridge process
pub struct PlaywrightDriver {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
}

impl PlaywrightDriver {
    /// Launch the bridge and wait until the page is ready
    pub async fn launch(config: &BrowserConfig, base_url: &str) -> FlowResult<Self> {
        info!(
            "Launching {} via {} (headless: {})",
            config.engine.as_str(),
            config.node_binary.display(),
            config.headless
        );

        // A missing working directory also spawns as NotFound
        if !config.project_dir.is_dir() {
            return Err(FlowError::InvalidConfig(format!(
                "browser.project_dir is not a directory: {}",
                config.project_dir.display()
            )));
        }

        let mut child = Command::new(&config.node_binary)
            .arg("-e")
            .arg(BRIDGE_SCRIPT)
            .current_dir(&config.project_dir)
            .env("FLOWCHECK_BROWSER", config.engine.as_str())
            .env("FLOWCHECK_HEADLESS", if config.headless { "1" } else { "0" })
            .env("FLOWCHECK_BASE_URL", base_url)
            .env("FLOWCHECK_VIEWPORT_WIDTH", config.viewport_width.to_string())
            .env("FLOWCHECK_VIEWPORT_HEIGHT", config.viewport_height.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FlowError::PlaywrightNotFound
                } else {
                    FlowError::bridge(format!(
                        "failed to spawn {}: {}",
                        config.node_binary.display(),
                        e
                    ))
                }
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FlowError::bridge("bridge stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FlowError::bridge("bridge stdout unavailable"))?;

        let mut driver = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
        };

        let ready = tokio::time::timeout(STARTUP_TIMEOUT, driver.read_response(0))
            .await
            .map_err(|_| FlowError::bridge("browser did not start in time"))??;
        if !ready.ok {
            return Err(FlowError::bridge(
                ready.message.unwrap_or_else(|| "bridge failed to start".to_string()),
            ));
        }

        debug!("Bridge ready");
        Ok(driver)
    }

    /// Check if Playwright is installed
    pub async fn is_available() -> bool {
        Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn call(&mut self, mut req: BridgeRequest<'_>) -> FlowResult<serde_json::Value> {
        req.id = self.next_id;
        self.next_id += 1;

        let mut line = serde_json::to_string(&req)?;
        line.push('\n');
        debug!("-> {}", line.trim_end());

        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let limit = Duration::from_millis(req.timeout) + RESPONSE_SLACK;
        let resp = tokio::time::timeout(limit, self.read_response(req.id))
            .await
            .map_err(|_| {
                FlowError::interaction(
                    req.target(),
                    format!("bridge gave no answer within {} ms", limit.as_millis()),
                )
            })??;

        if resp.ok {
            Ok(resp.value)
        } else {
            let kind = resp.kind.unwrap_or_else(|| "error".to_string());
            let message = resp.message.unwrap_or_default();
            Err(FlowError::interaction(req.target(), format!("{}: {}", kind, message)))
        }
    }

    /// Read lines until the response for `id` arrives, skipping anything else
    async fn read_response(&mut self, id: u64) -> FlowResult<BridgeResponse> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| FlowError::bridge("bridge exited"))?;

            match serde_json::from_str::<BridgeResponse>(&line) {
                Ok(resp) if resp.id == Some(id) => return Ok(resp),
                Ok(resp) if resp.id.is_none() => {
                    warn!("Bridge rejected a request: {:?}", resp.message);
                }
                Ok(resp) => debug!("Dropping stale response {:?}", resp.id),
                Err(_) => debug!("<- {}", line),
            }
        }
    }

    fn expect_str(value: serde_json::Value, target: &str) -> FlowResult<String> {
        match value {
            serde_json::Value::String(s) => Ok(s),
            serde_json::Value::Null => Ok(String::new()),
            other => Err(FlowError::interaction(target, format!("unexpected value: {}", other))),
        }
    }

    fn expect_count(value: serde_json::Value, target: &str) -> FlowResult<usize> {
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| FlowError::interaction(target, format!("unexpected count: {}", value)))
    }
}

#[async_trait]
impl Driver for PlaywrightDriver {
    async fn visit(&mut self, url: &str, wait: Duration) -> FlowResult<()> {
        let mut req = BridgeRequest::new("visit", wait);
        req.url = Some(url);
        self.call(req).await.map(|_| ())
    }

    async fn find(&mut self, selector: &str, wait: Duration) -> FlowResult<Vec<ElementHandle>> {
        let value = self.call(BridgeRequest::new("find", wait).on(selector)).await?;
        let count = Self::expect_count(value, selector)?;
        Ok(ElementHandle::all(selector, count))
    }

    async fn type_text(&mut self, selector: &str, text: &str, wait: Duration) -> FlowResult<()> {
        let mut req = BridgeRequest::new("type", wait).on(selector);
        req.text = Some(text);
        self.call(req).await.map(|_| ())
    }

    async fn click(&mut self, selector: &str, wait: Duration) -> FlowResult<()> {
        self.call(BridgeRequest::new("click", wait).on(selector))
            .await
            .map(|_| ())
    }

    async fn click_text(&mut self, selector: &str, text: &str, wait: Duration) -> FlowResult<()> {
        let mut req = BridgeRequest::new("click_text", wait).on(selector);
        req.text = Some(text);
        self.call(req).await.map(|_| ())
    }

    async fn select(&mut self, selector: &str, label: &str, wait: Duration) -> FlowResult<()> {
        let mut req = BridgeRequest::new("select", wait).on(selector);
        req.label = Some(label);
        self.call(req).await.map(|_| ())
    }

    async fn read_text(&mut self, selector: &str, wait: Duration) -> FlowResult<String> {
        let value = self.call(BridgeRequest::new("text", wait).on(selector)).await?;
        Self::expect_str(value, selector)
    }

    async fn read_texts(&mut self, selector: &str, wait: Duration) -> FlowResult<Vec<String>> {
        let value = self.call(BridgeRequest::new("texts", wait).on(selector)).await?;
        serde_json::from_value(value)
            .map_err(|e| FlowError::interaction(selector, format!("unexpected texts: {}", e)))
    }

    async fn read_count(&mut self, selector: &str, wait: Duration) -> FlowResult<usize> {
        let value = self.call(BridgeRequest::new("count", wait).on(selector)).await?;
        Self::expect_count(value, selector)
    }

    async fn read_visibility(&mut self, selector: &str, wait: Duration) -> FlowResult<bool> {
        let value = self.call(BridgeRequest::new("visible", wait).on(selector)).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn current_url(&mut self) -> FlowResult<String> {
        let value = self.call(BridgeRequest::new("url", RESPONSE_SLACK)).await?;
        Self::expect_str(value, "<url>")
    }

    async fn close(&mut self) -> FlowResult<()> {
        if let Err(e) = self.call(BridgeRequest::new("close", RESPONSE_SLACK)).await {
            warn!("Bridge close failed: {}", e);
        }
        match tokio::time::timeout(RESPONSE_SLACK, self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!("Bridge exited: {}", status);
            }
            Err(_) => {
                warn!("Bridge did not exit, killing it");
                self.child.kill().await?;
            }
        }
        Ok(())
    }
}
