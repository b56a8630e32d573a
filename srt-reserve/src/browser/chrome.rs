//! Chrome over the DevTools protocol.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogClosed, EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::driver::{OptionMatch, PageDriver};
use super::error::BrowserError;

/// How to obtain a Chrome instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromeConfig {
    /// Chrome binary. Detected from the usual install locations when `None`.
    pub executable: Option<PathBuf>,
    pub headless: bool,
    /// Attach to an already running Chrome (its `ws://` DevTools URL)
    /// instead of launching one.
    pub devtools_url: Option<String>,
    pub request_timeout: Duration,
    pub launch_timeout: Duration,
}

impl ChromeConfig {
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_devtools_url(mut self, url: impl Into<String>) -> Self {
        self.devtools_url = Some(url.into());
        self
    }

    fn browser_config(&self) -> Result<BrowserConfig, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(self.request_timeout)
            .launch_timeout(self.launch_timeout)
            .window_size(1280, 1024);
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder
            .build()
            .map_err(|message| BrowserError::Launch { message, source: None })
    }
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: false,
            devtools_url: None,
            request_timeout: Duration::from_secs(30),
            launch_timeout: Duration::from_secs(20),
        }
    }
}

/// A Chrome tab plus the tasks that service its DevTools connection.
///
/// Release with [`close`](Self::close). A launched browser is also killed
/// when this is dropped.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    /// Message of the dialog currently open on the page
    dialog: Arc<Mutex<Option<String>>>,
    handler: JoinHandle<()>,
    watcher: JoinHandle<()>,
    launched: bool,
}

impl ChromeSession {
    /// Launch (or attach to) Chrome and open a blank tab.
    pub async fn launch(config: &ChromeConfig) -> Result<Self, BrowserError> {
        let launched = config.devtools_url.is_none();
        let connected = match &config.devtools_url {
            Some(url) => Browser::connect(url.clone()).await,
            None => Browser::launch(config.browser_config()?).await,
        };
        let (mut browser, mut events) = connected.map_err(|e| BrowserError::Launch {
            message: e.to_string(),
            source: Some(e),
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "devtools event error");
                }
            }
            debug!("devtools connection closed");
        });

        let opened = match Self::open_page(&browser).await {
            Ok(opened) => opened,
            Err(e) => {
                if launched {
                    if let Err(close) = browser.close().await {
                        warn!(error = %close, "failed to close browser after page error");
                    }
                }
                handler.abort();
                return Err(e);
            }
        };
        let (page, dialog, watcher) = opened;

        info!(
            headless = config.headless,
            attached = !launched,
            "browser started"
        );

        Ok(Self {
            browser,
            page,
            dialog,
            handler,
            watcher,
            launched,
        })
    }

    async fn open_page(
        browser: &Browser,
    ) -> Result<(Page, Arc<Mutex<Option<String>>>, JoinHandle<()>), BrowserError> {
        let page = browser.new_page("about:blank").await?;
        let mut openings = page.event_listener::<EventJavascriptDialogOpening>().await?;
        let mut closings = page.event_listener::<EventJavascriptDialogClosed>().await?;

        let dialog = Arc::new(Mutex::new(None));
        let pending = Arc::clone(&dialog);
        let watcher = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(opened) = openings.next() => {
                        debug!(message = %opened.message, "dialog opened");
                        *pending.lock().await = Some(opened.message.clone());
                    }
                    Some(_) = closings.next() => {
                        *pending.lock().await = None;
                    }
                    else => break,
                }
            }
        });

        Ok((page, dialog, watcher))
    }

    /// Close the tab, and the browser if this session launched it.
    pub async fn close(mut self) -> Result<(), BrowserError> {
        self.watcher.abort();

        let closed = if self.launched {
            let closed = self.browser.close().await.map(|_| ());
            if let Err(e) = self.browser.wait().await {
                debug!(error = %e, "failed to reap browser process");
            }
            closed
        } else {
            self.page.close().await
        };

        self.handler.abort();
        closed?;
        Ok(())
    }

    async fn first(&self, selector: &str) -> Result<Option<Element>, BrowserError> {
        let mut found = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| BrowserError::classify(e, selector))?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        })
    }

    async fn call(&self, selector: &str, function: &str) -> Result<Option<bool>, BrowserError> {
        let Some(element) = self.first(selector).await? else {
            return Ok(None);
        };
        let returned = element
            .call_js_fn(function, false)
            .await
            .map_err(|e| BrowserError::classify(e, selector))?;

        if let Some(exception) = returned.exception_details {
            return Err(BrowserError::Script {
                selector: selector.to_string(),
                message: exception.text,
            });
        }
        Ok(Some(
            returned
                .result
                .value
                .and_then(|value| value.as_bool())
                .unwrap_or(true),
        ))
    }
}

/// Script choosing an option of the `<select>` it is called on.
///
/// Sets the value directly and fires `change`, since the site hides its
/// selects behind styled widgets that a mouse cannot reach.
fn choose_script(option: OptionMatch<'_>) -> Result<String, serde_json::Error> {
    let (wanted, by_text) = match option {
        OptionMatch::Value(value) => (value, false),
        OptionMatch::Text(text) => (text, true),
    };
    let wanted = serde_json::to_string(wanted)?;
    Ok(format!(
        "function() {{
            for (const option of this.options) {{
                const key = {by_text} ? option.text.trim() : option.value;
                if (key === {wanted}) {{
                    this.value = option.value;
                    this.dispatchEvent(new Event('change', {{ bubbles: true }}));
                    return true;
                }}
            }}
            return false;
        }}"
    ))
}

impl PageDriver for ChromeSession {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::classify(e, url))?;
        Ok(())
    }

    async fn back(&self) -> Result<(), BrowserError> {
        self.page.evaluate("history.back()").await?;
        Ok(())
    }

    async fn exists(&self, selector: &str) -> Result<bool, BrowserError> {
        Ok(self.first(selector).await?.is_some())
    }

    async fn text(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        let Some(element) = self.first(selector).await? else {
            return Ok(None);
        };
        let text = element
            .inner_text()
            .await
            .map_err(|e| BrowserError::classify(e, selector))?;
        Ok(Some(text.unwrap_or_default()))
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<bool, BrowserError> {
        if self.call(selector, "function() { this.value = ''; }").await?.is_none() {
            return Ok(false);
        }
        let Some(element) = self.first(selector).await? else {
            return Ok(false);
        };
        element
            .focus()
            .await
            .map_err(|e| BrowserError::classify(e, selector))?;
        element
            .type_str(text)
            .await
            .map_err(|e| BrowserError::classify(e, selector))?;
        Ok(true)
    }

    async fn choose(
        &self,
        selector: &str,
        option: OptionMatch<'_>,
    ) -> Result<bool, BrowserError> {
        let script = choose_script(option).map_err(|e| BrowserError::Script {
            selector: selector.to_string(),
            message: e.to_string(),
        })?;
        Ok(self.call(selector, &script).await? == Some(true))
    }

    async fn click(&self, selector: &str) -> Result<bool, BrowserError> {
        let Some(element) = self.first(selector).await? else {
            return Ok(false);
        };
        element
            .click()
            .await
            .map_err(|e| BrowserError::classify(e, selector))?;
        Ok(true)
    }

    async fn press_enter(&self, selector: &str) -> Result<bool, BrowserError> {
        let Some(element) = self.first(selector).await? else {
            return Ok(false);
        };
        element
            .focus()
            .await
            .map_err(|e| BrowserError::classify(e, selector))?;
        element
            .press_key("Enter")
            .await
            .map_err(|e| BrowserError::classify(e, selector))?;
        Ok(true)
    }

    async fn script_click(&self, selector: &str) -> Result<bool, BrowserError> {
        Ok(self.call(selector, "function() { this.click(); }").await?.is_some())
    }

    async fn pending_dialog(&self) -> Option<String> {
        self.dialog.lock().await.clone()
    }

    async fn accept_dialog(&self) -> Result<Option<String>, BrowserError> {
        let Some(message) = self.dialog.lock().await.take() else {
            return Ok(None);
        };

        // The page may have dismissed it already
        match self.page.execute(HandleJavaScriptDialogParams::new(true)).await {
            Ok(_) => Ok(Some(message)),
            Err(e) => {
                debug!(error = %e, "no dialog to accept");
                Ok(None)
            }
        }
    }
}
