use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, error, info, info_span, warn, Span};

use crate::actions::ActionRegistry;
use crate::load::GraphBuilder;
use crate::logic::LogicRegistry;
use crate::source::RuleSource;
use crate::{EngineStatus, LoadError, LoadReport, LogicError, PassReport, RuleGraph};

/// Configures and builds an [`Engine`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use criteria_engine::{EngineBuilder, InMemorySource, LogicRegistry};
///
/// let engine = EngineBuilder::new(Arc::new(InMemorySource::default()))
///     .logic_units(LogicRegistry::with_defaults())
///     .span(tracing::info_span!("triage"))
///     .build()
///     .unwrap();
/// assert!(engine.with_graph(|g| g.is_empty()));
/// ```
pub struct EngineBuilder {
    source: Arc<dyn RuleSource>,
    logic: LogicRegistry,
    actions: ActionRegistry,
    span: Option<Span>,
}

impl EngineBuilder {
    /// A builder over `source` with the default logic units and actions.
    #[must_use]
    pub fn new(source: Arc<dyn RuleSource>) -> Self {
        Self {
            source,
            logic: LogicRegistry::with_defaults(),
            actions: ActionRegistry::with_defaults(),
            span: None,
        }
    }

    #[must_use]
    pub fn logic_units(mut self, registry: LogicRegistry) -> Self {
        self.logic = registry;
        self
    }

    #[must_use]
    pub fn actions(mut self, registry: ActionRegistry) -> Self {
        self.actions = registry;
        self
    }

    /// Span every load and pass is recorded under. Defaults to
    /// `info_span!("criteria_engine")`.
    #[must_use]
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Perform the initial load and return the engine.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Source`] if the source cannot produce its rows.
    pub fn build(self) -> Result<Engine, LoadError> {
        let span = self.span.unwrap_or_else(|| info_span!("criteria_engine"));
        let (graph, report) = {
            let _entered = span.enter();
            GraphBuilder::new(&self.logic, &self.actions).load(&*self.source)?
        };
        Ok(Engine {
            source: self.source,
            logic: self.logic,
            actions: self.actions,
            span,
            graph: Mutex::new(graph),
            running: AtomicBool::new(false),
            loads: Mutex::new(LoadState {
                generation: 1,
                report,
            }),
        })
    }
}

impl fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("logic", &self.logic)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

struct LoadState {
    generation: u64,
    report: LoadReport,
}

/// Runs data records against the loaded rule graph.
///
/// One pass runs at a time: [`run`](Self::run) holds the graph for the whole
/// pass, so concurrent runs queue up and [`reload`](Self::reload) waits for
/// the engine to return to [`EngineStatus::Idle`] before swapping graphs.
pub struct Engine {
    source: Arc<dyn RuleSource>,
    logic: LogicRegistry,
    actions: ActionRegistry,
    span: Span,
    graph: Mutex<RuleGraph>,
    running: AtomicBool,
    loads: Mutex<LoadState>,
}

impl Engine {
    /// Shorthand for [`EngineBuilder::new`].
    #[must_use]
    pub fn builder(source: Arc<dyn RuleSource>) -> EngineBuilder {
        EngineBuilder::new(source)
    }

    /// Evaluate every criterion against `record`, then run the actions of
    /// every applicable rule.
    ///
    /// Nothing inside a pass is fatal: incompatible or failing criteria, rules
    /// depending on them, and failing actions are logged, recorded in the
    /// returned report, and skipped.
    pub fn run(&self, record: &dyn Any) -> PassReport {
        let _entered = self.span.enter();
        let started = Instant::now();
        let mut graph = self.graph.lock();
        let _running = RunningFlag::raise(&self.running);
        graph.reset();

        let mut report = PassReport::default();
        let RuleGraph {
            criteria,
            rules,
            generation,
        } = &mut *graph;

        for criterion in criteria.iter_mut() {
            match criterion.evaluate(record) {
                Ok(result) => {
                    debug!(criterion = %criterion.name(), result, "criterion evaluated");
                    report.evaluated.push(criterion.name().to_owned());
                }
                Err(err @ LogicError::IncompatibleDataType { .. }) => {
                    debug!(criterion = %criterion.name(), error = %err, "criterion does not apply");
                    report.incompatible.push(criterion.name().to_owned());
                }
                Err(err) => {
                    error!(criterion = %criterion.name(), error = %err, "criterion failed");
                    report.failed.push(criterion.name().to_owned());
                }
            }
        }

        for rule in rules.values_mut() {
            match rule.applicable(criteria) {
                Ok(true) => {
                    debug!(rule_id = rule.id(), rule = %rule.name(), "rule applicable");
                    report.applicable.push(rule.id());
                    if let Err(err) = rule.execute_actions() {
                        error!(
                            rule_id = rule.id(),
                            sequence = ?err.sequence(),
                            error = %err,
                            "action failed"
                        );
                        report.action_failures.push((rule.id(), err.to_string()));
                    }
                }
                Ok(false) => {}
                Err(err) => {
                    debug!(rule_id = rule.id(), error = %err, "skipping rule");
                    report.skipped.push(rule.id());
                }
            }
        }

        report.duration = started.elapsed();
        info!(
            generation = *generation,
            evaluated = report.evaluated.len(),
            applicable = report.applicable.len(),
            failed_actions = report.action_failures.len(),
            "pass complete"
        );
        report
    }

    #[must_use]
    pub fn status(&self) -> EngineStatus {
        EngineStatus::from_running(self.running.load(Ordering::Acquire))
    }

    /// Rebuild the graph from the source and replace the current one.
    ///
    /// The new graph is built without blocking passes; the swap then waits
    /// for any running pass to finish. Every criterion, rule and action in the
    /// new graph is a fresh instance.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Source`] if the source cannot produce its rows. The
    /// current graph is kept.
    pub fn reload(&self) -> Result<LoadReport, LoadError> {
        let _entered = self.span.enter();
        let mut loads = self.loads.lock();
        let generation = loads.generation + 1;

        let (fresh, report) = GraphBuilder::new(&self.logic, &self.actions)
            .generation(generation)
            .load(&*self.source)
            .inspect_err(|err| error!(error = %err, "reload failed, keeping current rule graph"))?;

        if self.running.load(Ordering::Acquire) {
            warn!(generation, "pass in progress, waiting to swap rule graph");
        }
        let stale = std::mem::replace(&mut *self.graph.lock(), fresh);
        drop(stale);

        info!(generation, rules = report.rules(), "rule graph replaced");
        loads.generation = generation;
        loads.report = report.clone();
        Ok(report)
    }

    /// Read the current graph. Blocks while a pass is running.
    pub fn with_graph<R>(&self, f: impl FnOnce(&RuleGraph) -> R) -> R {
        f(&*self.graph.lock())
    }

    /// Report of the most recent successful load.
    #[must_use]
    pub fn last_load(&self) -> LoadReport {
        self.loads.lock().report.clone()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("status", &self.status())
            .field("logic", &self.logic)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

/// Holds [`Engine::status`] at `Running` until dropped.
struct RunningFlag<'a>(&'a AtomicBool);

impl<'a> RunningFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
