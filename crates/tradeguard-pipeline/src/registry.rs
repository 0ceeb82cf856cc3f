use crate::ResilientService;
use std::collections::HashMap;

/// A caller-owned registry of wrapped services keyed by dependency name.
///
/// Built once at application startup and passed explicitly to whoever needs
/// it — there is no module-level default registry. Retrieving a pipeline
/// clones the service, and clones share circuit state, so every worker
/// fetching `"binance"` contributes to the same breaker.
///
/// ```
/// use tradeguard_pipeline::{PipelineRegistry, ResiliencePipeline};
/// use tradeguard_core::StructuredError;
/// use tower::service_fn;
///
/// # async fn example() {
/// let mut registry: PipelineRegistry<String, String> = PipelineRegistry::new();
/// registry.register(
///     ResiliencePipeline::api_call("binance").wrap(service_fn(|req: String| async move {
///         Ok::<_, StructuredError>(req)
///     })),
/// );
///
/// let mut venue = registry.get("binance").expect("registered at startup");
/// let _ = venue.execute("BTC/USD".to_string()).await;
/// # }
/// ```
pub struct PipelineRegistry<Req, Res> {
    pipelines: HashMap<String, ResilientService<Req, Res>>,
}

impl<Req, Res> Default for PipelineRegistry<Req, Res> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req, Res> PipelineRegistry<Req, Res> {
    pub fn new() -> Self {
        Self {
            pipelines: HashMap::new(),
        }
    }

    /// Registers a wrapped service under its pipeline name.
    pub fn register(&mut self, service: ResilientService<Req, Res>) {
        self.pipelines.insert(service.name().to_string(), service);
    }

    /// Returns a clone of the service registered under `name`. The clone
    /// shares circuit state with every other clone.
    pub fn get(&self, name: &str) -> Option<ResilientService<Req, Res>> {
        self.pipelines.get(name).cloned()
    }

    /// Returns the registered dependency names.
    pub fn names(&self) -> Vec<&str> {
        self.pipelines.keys().map(String::as_str).collect()
    }
}
