use crate::screenshot::{stitch, DriverSurface};
use crate::{Driver, Error, Result};
use log::{debug, warn};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Goto(String, oneshot::Sender<Result<()>>),
    Eval(String, Vec<Value>, oneshot::Sender<Result<Value>>),
    Title(oneshot::Sender<Result<String>>),
    Screenshot(bool, Option<PathBuf>, oneshot::Sender<Result<Vec<u8>>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly session backed by a dedicated worker thread.
///
/// The worker thread owns the synchronous [`Driver`] and executes commands
/// sent from async tasks, so callers get an async interface without the
/// driver having to be `Send`.
#[derive(Clone)]
pub struct AsyncSession {
    cmd_tx: Sender<Command>,
}

impl AsyncSession {
    /// Spawn a worker that builds its driver with `factory` and serves commands.
    pub async fn spawn<D, F>(factory: F) -> Result<Self>
    where
        D: Driver + 'static,
        F: FnOnce() -> Result<D> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::spawn(move || {
            // Initialize driver on the worker thread
            let mut driver = match factory() {
                Ok(d) => d,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Goto(url, resp) => {
                        let _ = resp.send(driver.navigate(&url));
                    }
                    Command::Eval(script, args, resp) => {
                        let _ = resp.send(driver.execute_script(&script, &args));
                    }
                    Command::Title(resp) => {
                        let _ = resp.send(driver.title());
                    }
                    Command::Screenshot(full_page, path, resp) => {
                        let res = capture(&mut driver, full_page, path);
                        let _ = resp.send(res);
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(driver.close());
                        return;
                    }
                }
            }
            // All handles dropped without an explicit close
            debug!("Session handles dropped, closing driver");
            if let Err(e) = driver.close() {
                warn!("Closing driver failed: {}", e);
            }
        });

        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    /// Launch headless Chrome for `config` on the worker thread.
    #[cfg(feature = "cdp")]
    pub async fn launch(config: crate::SessionConfig) -> Result<Self> {
        Self::spawn(move || crate::cdp::CdpDriver::new(config)).await
    }

    async fn request<T>(&self, name: &str, make: impl FnOnce(oneshot::Sender<Result<T>>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .map_err(|_| Error::Other(format!("{}: session is closed", name)))?;
        rx.await
            .map_err(|e| Error::Other(format!("{} canceled: {}", name, e)))?
    }

    /// Navigate to an absolute URL
    pub async fn goto(&self, url: &str) -> Result<()> {
        let url = url.to_string();
        self.request("Goto", |tx| Command::Goto(url, tx)).await
    }

    /// Execute a script body and return its JSON result
    pub async fn eval(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        let script = script.to_string();
        self.request("Eval", |tx| Command::Eval(script, args, tx)).await
    }

    pub async fn title(&self) -> Result<String> {
        self.request("Title", Command::Title).await
    }

    /// Take a viewport or full-page screenshot; if `path` is Some, the PNG is
    /// also saved there.
    pub async fn screenshot(&self, full_page: bool, path: Option<PathBuf>) -> Result<Vec<u8>> {
        self.request("Screenshot", |tx| Command::Screenshot(full_page, path, tx))
            .await
    }

    /// Shut down the worker and close the browser.
    pub async fn close(self) -> Result<()> {
        self.request("Close", Command::Close).await
    }
}

fn capture<D: Driver>(driver: &mut D, full_page: bool, path: Option<PathBuf>) -> Result<Vec<u8>> {
    let png = if full_page {
        stitch(&mut DriverSurface::new(driver))?.to_png()?
    } else {
        driver.capture_viewport()?
    };
    if let Some(path) = path {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &png)?;
    }
    Ok(png)
}
