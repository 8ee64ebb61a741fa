//! Flow runner: executes steps in order against a driver and stops at the first failure

use chrono::Utc;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::driver::{Driver, ElementHandle};
use crate::error::{FlowError, FlowResult};
use crate::ordering::check_price_order;
use crate::report::{FailureKind, RunReport, RunState, StepFailure, StepResult, SuiteReport};
use crate::step::{Flow, Step};

/// Default bounded wait for an element to become actionable
pub const DEFAULT_WAIT: Duration = Duration::from_millis(4000);

pub struct FlowRunner<D: Driver> {
    driver: D,
    wait: Duration,
}

impl<D: Driver> FlowRunner<D> {
    pub fn new(driver: D) -> Self {
        Self::with_wait(driver, DEFAULT_WAIT)
    }

    pub fn with_wait(driver: D, wait: Duration) -> Self {
        Self { driver, wait }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Run a flow, honouring its wait override
    pub async fn run(&mut self, flow: &Flow) -> RunReport {
        let wait = flow.wait_ms.map(Duration::from_millis).unwrap_or(self.wait);
        self.run_steps_with_wait(&flow.name, &flow.steps, wait).await
    }

    pub async fn run_steps(&mut self, name: &str, steps: &[Step]) -> RunReport {
        self.run_steps_with_wait(name, steps, self.wait).await
    }

    async fn run_steps_with_wait(&mut self, name: &str, steps: &[Step], wait: Duration) -> RunReport {
        let start = Instant::now();
        let total = steps.len();
        let mut state = if total == 0 {
            RunState::Passed
        } else {
            RunState::Pending(0)
        };
        let mut results = Vec::with_capacity(total);
        let mut failure = None;

        debug!("Running flow {} ({} steps)", name, total);

        while let RunState::Pending(index) = state {
            let step = &steps[index];
            let step_name = step.name();
            let step_start = Instant::now();

            debug!("Step {}: {}", index, step_name);
            let outcome = self.execute(step, wait).await;
            let duration_ms = step_start.elapsed().as_millis() as u64;

            results.push(StepResult {
                index,
                step: step_name.clone(),
                success: outcome.is_ok(),
                duration_ms,
            });

            state = match outcome {
                Ok(()) => RunState::advance(index, total),
                Err(e) => {
                    error!("Step {} ({}) failed: {}", index, step_name, e);
                    failure = Some(StepFailure {
                        index,
                        step: step_name,
                        kind: FailureKind::from(&e),
                        message: e.to_string(),
                    });
                    RunState::Failed(index)
                }
            };
        }

        RunReport {
            name: name.to_string(),
            state,
            total_steps: total,
            steps_executed: results.len(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps: results,
            failure,
        }
    }

    /// Execute a single step
    pub async fn execute(&mut self, step: &Step, wait: Duration) -> FlowResult<()> {
        match step {
            Step::Navigate { url } => self.driver.visit(url, wait).await,
            Step::Type { selector, text } => {
                self.require_present(selector, wait).await?;
                self.driver.type_text(selector, text, wait).await
            }
            Step::Click { selector } => {
                self.require_present(selector, wait).await?;
                self.driver.click(selector, wait).await
            }
            Step::ClickText { selector, text } => {
                self.require_present(selector, wait).await?;
                self.driver.click_text(selector, text, wait).await
            }
            Step::Select { selector, label } => {
                self.require_present(selector, wait).await?;
                self.driver.select(selector, label, wait).await
            }
            Step::AssertText { selector, expected } => {
                let actual = self.driver.read_text(selector, wait).await?;
                if actual.contains(expected.as_str()) {
                    Ok(())
                } else {
                    Err(FlowError::assertion(format!(
                        "expected text of {} to contain {:?}, found {:?}",
                        selector, expected, actual
                    )))
                }
            }
            Step::AssertTextEquals { selector, expected } => {
                let actual = self.driver.read_text(selector, wait).await?;
                if actual.trim() == expected.trim() {
                    Ok(())
                } else {
                    Err(FlowError::assertion(format!(
                        "expected text of {} to equal {:?}, found {:?}",
                        selector, expected, actual
                    )))
                }
            }
            Step::AssertCount { selector, expected } => {
                let actual = self.driver.read_count(selector, wait).await?;
                if actual == *expected {
                    Ok(())
                } else {
                    Err(FlowError::assertion(format!(
                        "expected {} elements matching {}, found {}",
                        expected, selector, actual
                    )))
                }
            }
            Step::AssertVisible { selector } => {
                if self.driver.read_visibility(selector, wait).await? {
                    Ok(())
                } else {
                    Err(FlowError::assertion(format!("expected {} to be visible", selector)))
                }
            }
            Step::AssertUrl { contains } => {
                let url = self.driver.current_url().await?;
                if url.contains(contains.as_str()) {
                    Ok(())
                } else {
                    Err(FlowError::assertion(format!(
                        "expected URL to include {:?}, found {:?}",
                        contains, url
                    )))
                }
            }
            Step::AssertEachContains { selector, text } => {
                let texts = self.driver.read_texts(selector, wait).await?;
                if texts.is_empty() {
                    return Err(FlowError::assertion(format!(
                        "no elements matching {}",
                        selector
                    )));
                }
                match texts.iter().position(|t| !t.contains(text.as_str())) {
                    None => Ok(()),
                    Some(index) => Err(FlowError::assertion(format!(
                        "element {} of {} does not contain {:?}: {:?}",
                        index, selector, text, texts[index]
                    ))),
                }
            }
            Step::AssertSorted { selector, order } => {
                let prices = self.driver.read_texts(selector, wait).await?;
                check_price_order(&prices, *order)
            }
        }
    }

    async fn require_present(&mut self, selector: &str, wait: Duration) -> FlowResult<Vec<ElementHandle>> {
        let found = self.driver.find(selector, wait).await?;
        if found.is_empty() {
            return Err(FlowError::interaction(
                selector,
                format!("no element appeared within {} ms", wait.as_millis()),
            ));
        }
        Ok(found)
    }
}

/// Run flows one after another, each on a freshly connected driver.
///
/// A flow whose driver cannot be connected is reported as failed without
/// stopping the suite.
pub async fn run_suite<D, F, Fut>(flows: &[Flow], wait: Duration, mut connect: F) -> SuiteReport
where
    D: Driver,
    F: FnMut(&Flow) -> Fut,
    Fut: Future<Output = FlowResult<D>>,
{
    let started_at = Utc::now();
    let start = Instant::now();
    let mut results = Vec::with_capacity(flows.len());

    info!("Running {} flow(s)...", flows.len());

    for flow in flows {
        let report = match connect(flow).await {
            Ok(driver) => {
                let mut runner = FlowRunner::with_wait(driver, wait);
                let report = runner.run(flow).await;
                if let Err(e) = runner.driver.close().await {
                    error!("Failed to close driver for {}: {}", flow.name, e);
                }
                report
            }
            Err(e) => RunReport::aborted(&flow.name, flow.steps.len(), &e),
        };

        if report.passed() {
            info!("{}", report.summary());
        } else {
            error!("{}", report.summary());
        }
        results.push(report);
    }

    let suite = SuiteReport::new(started_at, results, start.elapsed().as_millis() as u64);
    info!(
        "Flow results: {} passed, {} failed ({} ms)",
        suite.passed, suite.failed, suite.duration_ms
    );
    suite
}
