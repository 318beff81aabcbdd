// Mock CostSource Plugin
//
// *Le Simulacre* (The Mock) - Reference plugin used as the system under test
// for the harness itself. Every call first honours the configured
// unimplemented set, latency spike, delay, and injected error, in that order.

use crate::config::{MockConfig, SummaryScope};
use crate::{rates, synth};
use lecout::messages::{
    BudgetSummary, EstimateCostRequest, EstimateCostResponse, GetActualCostRequest,
    GetActualCostResponse, GetBudgetsRequest, GetBudgetsResponse, GetPricingSpecRequest,
    GetPricingSpecResponse, GetProjectedCostRequest, GetProjectedCostResponse,
    GetRecommendationsRequest, GetRecommendationsResponse, NameResponse, SupportsRequest,
    SupportsResponse,
};
use lecout::model::billing_mode;
use lecout::validate;
use lecout::{
    filter, paginate, summarize, CoutError, FallbackHint, PricingSpec, Recommendation, RpcMethod,
};
use lepasserelle::{CallContext, CostSourcePlugin, RpcResult, RpcStatus};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Attribute keys consulted for the SKU in `EstimateCost`, in order
const SKU_ATTRIBUTES: [&str; 5] = ["instanceType", "instanceClass", "vmSize", "machineType", "sku"];

/// Configurable reference plugin
#[derive(Debug, Clone)]
pub struct MockPlugin {
    config: Arc<MockConfig>,
    records: Arc<Vec<Recommendation>>,
    /// Calls seen per spiking method; shared across clones
    spike_calls: Arc<BTreeMap<RpcMethod, AtomicUsize>>,
}

impl MockPlugin {
    /// Plugin with default behaviour
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Plugin with explicit behaviour; the configuration is fixed from here on
    pub fn with_config(config: MockConfig) -> Self {
        let records = match config.recommendations() {
            Some(records) => records.to_vec(),
            None => synth::recommendations(config.recommendation_count(), config.reference_time()),
        };
        let spike_calls = RpcMethod::ALL
            .into_iter()
            .filter(|method| config.latency_spike(*method).is_some())
            .map(|method| (method, AtomicUsize::new(0)))
            .collect();
        Self {
            config: Arc::new(config),
            records: Arc::new(records),
            spike_calls: Arc::new(spike_calls),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    /// Unscoped, unfiltered recommendation universe
    pub fn recommendations(&self) -> &[Recommendation] {
        &self.records
    }

    fn enter(&self, ctx: &CallContext) -> RpcResult<()> {
        if self.config.is_unimplemented(ctx.method) {
            return Err(RpcStatus::unimplemented(ctx.method));
        }
        if let (Some((every, delay)), Some(calls)) = (
            self.config.latency_spike(ctx.method),
            self.spike_calls.get(&ctx.method),
        ) {
            let seen = calls.fetch_add(1, Ordering::Relaxed) + 1;
            if seen % every == 0 {
                ctx.sleep(delay)?;
            }
        }
        if let Some(delay) = self.config.delay(ctx.method) {
            ctx.sleep(delay)?;
        }
        if self.config.fails(ctx.method) {
            debug!(
                plugin_name = %self.config.name(),
                rpc_method = %ctx.method,
                trace_id = %ctx.trace_id,
                error_code = %self.config.error_code(),
                "injecting error"
            );
            return Err(RpcStatus::new(
                self.config.error_code(),
                format!("simulated {} failure", ctx.method),
            ));
        }
        Ok(())
    }

    fn not_implemented_spec(&self, provider: &str, resource_type: &str, sku: &str, region: &str) -> PricingSpec {
        PricingSpec {
            provider: provider.to_string(),
            resource_type: resource_type.to_string(),
            sku: sku.to_string(),
            region: region.to_string(),
            billing_mode: billing_mode::NOT_IMPLEMENTED.to_string(),
            rate_per_unit: 0.0,
            currency: rates::CURRENCY.to_string(),
            description: format!("{provider}/{resource_type} is not priced"),
            assumptions: vec![format!(
                "{} has no pricing data for {provider}/{resource_type}",
                self.config.name()
            )],
            plugin_name: self.config.name().to_string(),
            source: "mock".to_string(),
        }
    }
}

impl Default for MockPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl CostSourcePlugin for MockPlugin {
    fn name(&self, ctx: &CallContext) -> RpcResult<NameResponse> {
        self.enter(ctx)?;
        Ok(NameResponse {
            name: self.config.name().to_string(),
        })
    }

    fn supports(&self, ctx: &CallContext, req: SupportsRequest) -> RpcResult<SupportsResponse> {
        self.enter(ctx)?;
        let resource = validate::validate_resource(req.resource.as_ref())?;
        Ok(match rates::lookup(&resource.provider, &resource.resource_type) {
            Some(_) => SupportsResponse {
                supported: true,
                reason: String::new(),
            },
            None => SupportsResponse {
                supported: false,
                reason: format!(
                    "resource type {}/{} is not priced by {}",
                    resource.provider,
                    resource.resource_type,
                    self.config.name()
                ),
            },
        })
    }

    fn get_actual_cost(
        &self,
        ctx: &CallContext,
        req: GetActualCostRequest,
    ) -> RpcResult<GetActualCostResponse> {
        self.enter(ctx)?;
        if req.resource_id.trim().is_empty() {
            return Err(CoutError::validation("resource_id", "is required").into());
        }
        let (start, end) = validate::validate_time_range(req.start, req.end)?;
        let days = synth::day_count(start, end);
        if days > synth::MAX_COST_POINTS {
            return Err(CoutError::validation(
                "end",
                format!(
                    "range spans {days} days, limit is {}",
                    synth::MAX_COST_POINTS
                ),
            )
            .into());
        }

        let points = synth::cost_points(&req.resource_id, start, end);
        let page = paginate(&points, req.page_size, &req.page_token)?;
        let fallback_hint = if page.total == 0 {
            FallbackHint::Recommended
        } else {
            FallbackHint::None
        };

        Ok(GetActualCostResponse {
            results: page.items,
            total_count: page.total as u64,
            next_page_token: page.next_page_token,
            fallback_hint,
        })
    }

    fn get_projected_cost(
        &self,
        ctx: &CallContext,
        req: GetProjectedCostRequest,
    ) -> RpcResult<GetProjectedCostResponse> {
        self.enter(ctx)?;
        let resource = validate::validate_resource(req.resource.as_ref())?;
        let rate = rates::lookup(&resource.provider, &resource.resource_type).ok_or_else(|| {
            RpcStatus::not_found(format!(
                "no projection for {}/{}",
                resource.provider, resource.resource_type
            ))
        })?;

        Ok(GetProjectedCostResponse {
            unit_price: rate.unit_price(&resource.sku),
            currency: rates::CURRENCY.to_string(),
            cost_per_month: rate.monthly_cost(&resource.sku),
            billing_detail: rate.billing_detail(&resource.sku),
        })
    }

    fn get_pricing_spec(
        &self,
        ctx: &CallContext,
        req: GetPricingSpecRequest,
    ) -> RpcResult<GetPricingSpecResponse> {
        self.enter(ctx)?;
        let resource = validate::validate_resource(req.resource.as_ref())?;

        let spec = match rates::lookup(&resource.provider, &resource.resource_type) {
            Some(rate) => PricingSpec {
                provider: resource.provider.clone(),
                resource_type: resource.resource_type.clone(),
                sku: resource.sku.clone(),
                region: resource.region.clone(),
                billing_mode: rate.billing_mode.to_string(),
                rate_per_unit: rate.unit_price(&resource.sku),
                currency: rates::CURRENCY.to_string(),
                description: format!("{} {} on-demand", resource.provider, resource.resource_type),
                assumptions: vec![
                    format!("{} billing units per month", rate.monthly_units()),
                    "on-demand pricing, no commitments".to_string(),
                ],
                plugin_name: self.config.name().to_string(),
                source: "mock".to_string(),
            },
            None => self.not_implemented_spec(
                &resource.provider,
                &resource.resource_type,
                &resource.sku,
                &resource.region,
            ),
        };

        Ok(GetPricingSpecResponse { spec })
    }

    fn get_recommendations(
        &self,
        ctx: &CallContext,
        req: GetRecommendationsRequest,
    ) -> RpcResult<GetRecommendationsResponse> {
        self.enter(ctx)?;
        validate::validate_target_resources(&req.target_resources)?;
        if let Some(f) = &req.filter {
            validate::validate_filter(f)?;
        }

        let selected = filter::select(
            &self.records,
            &req.target_resources,
            req.filter.as_ref(),
            self.config.reference_time(),
        );
        let page = paginate(&selected, req.page_size, &req.page_token)?;

        let summary = match self.config.summary_scope() {
            SummaryScope::Page => summarize(&page.items, &req.projection_period),
            SummaryScope::Query => summarize(&selected, &req.projection_period),
        };

        debug!(
            plugin_name = %self.config.name(),
            trace_id = %ctx.trace_id,
            selected = selected.len(),
            returned = page.items.len(),
            "recommendations served"
        );

        Ok(GetRecommendationsResponse {
            recommendations: page.items,
            summary: Some(summary),
            next_page_token: page.next_page_token,
        })
    }

    fn get_budgets(
        &self,
        ctx: &CallContext,
        req: GetBudgetsRequest,
    ) -> RpcResult<GetBudgetsResponse> {
        self.enter(ctx)?;
        let budgets: Vec<_> = synth::budgets(req.include_status)
            .into_iter()
            .filter(|b| req.filter.as_ref().map_or(true, |f| f.matches(b)))
            .collect();
        let summary = BudgetSummary::from_budgets(&budgets);
        Ok(GetBudgetsResponse { budgets, summary })
    }

    fn estimate_cost(
        &self,
        ctx: &CallContext,
        req: EstimateCostRequest,
    ) -> RpcResult<EstimateCostResponse> {
        self.enter(ctx)?;
        if !validate::is_valid_resource_type_token(&req.resource_type) {
            return Err(CoutError::validation(
                "resource_type",
                format!(
                    "'{}' is not of the form provider:module/resource:Type",
                    req.resource_type
                ),
            )
            .into());
        }

        let (provider, module) = split_token(&req.resource_type);
        let rate = rate_key(provider, module)
            .and_then(|(provider, resource_type)| rates::lookup(provider, resource_type))
            .ok_or_else(|| {
                RpcStatus::not_found(format!("no estimate for {}", req.resource_type))
            })?;

        let sku = SKU_ATTRIBUTES
            .iter()
            .find_map(|key| req.attributes.get(*key).and_then(Value::as_str))
            .unwrap_or_default();

        Ok(EstimateCostResponse {
            cost_monthly: rate.monthly_cost(sku),
            currency: rates::CURRENCY.to_string(),
        })
    }
}

/// `aws:ec2/instance:Instance` -> (`aws`, `ec2`)
fn split_token(token: &str) -> (&str, &str) {
    let mut parts = token.splitn(2, ':');
    let provider = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default();
    let module = rest.split(|c| c == '/' || c == ':').next().unwrap_or_default();
    (provider, module)
}

/// Map a token's provider and module onto a rate table key
fn rate_key(provider: &str, module: &str) -> Option<(&'static str, &'static str)> {
    match (provider, module) {
        ("aws", "ec2") => Some(("aws", "ec2")),
        ("aws", "rds") => Some(("aws", "rds")),
        ("aws", "s3") => Some(("aws", "s3")),
        ("aws", "lambda") => Some(("aws", "lambda")),
        ("azure" | "azure-native", "compute") => Some(("azure", "vm")),
        ("gcp", "compute") => Some(("gcp", "compute_engine")),
        _ => None,
    }
}
