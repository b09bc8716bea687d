//! Tripsmith command implementations

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

use tripsmith_agent::tools::{AmapProvider, UnsplashProvider};
use tripsmith_agent::{AgentConfig, CompositeProvider, KeywordFilter, ToolProvider};
use tripsmith_config::paths::safe_filename;
use tripsmith_config::{self, Config};
use tripsmith_planner::{TripPlanner, TripRequest};
use tripsmith_provider::OpenAiCompatProvider;

use crate::PlanArgs;

/// Initialize config and plan directory
pub async fn init_command() -> Result<()> {
    println!("◆ Initializing Tripsmith...");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    tripsmith_config::init().await?;

    println!("Config: {}", tripsmith_config::config_path().display());
    println!("Plans:  {}", tripsmith_config::plans_dir().display());
    println!("\n◆ Tripsmith initialized");
    println!("\nNext steps:");
    println!("  1. Set provider.api_key in the config, or export LLM_API_KEY");
    println!("  2. Set toolkit.amap.api_key, or export AMAP_API_KEY");
    println!("  3. Optional: set toolkit.unsplash.access_key, or export UNSPLASH_ACCESS_KEY");
    println!("  4. Plan a trip: tripsmith plan -c 北京 -s 2025-06-01 -e 2025-06-03");

    Ok(())
}

fn marker(ok: bool, yes: &'static str, no: &'static str) -> &'static str {
    if ok {
        yes
    } else {
        no
    }
}

/// Show system status
pub async fn status_command() -> Result<()> {
    let config_path = tripsmith_config::config_path();
    let plans = tripsmith_config::plans_dir();

    println!("◆ Tripsmith Status");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "Config:   {} {}",
        config_path.display(),
        marker(config_path.exists(), "[OK]", "[Missing]")
    );
    println!(
        "Plans:    {} {}",
        plans.display(),
        marker(plans.exists(), "[OK]", "[Missing]")
    );

    let config = Config::load().await?;
    println!(
        "Model:    {}",
        config.model().unwrap_or_else(|| "[provider default]".to_string())
    );
    println!(
        "Base URL: {}",
        config.api_base().unwrap_or_else(|| "[provider default]".to_string())
    );
    println!(
        "API Key:  {}",
        marker(config.has_api_key(), "[Set]", "[Missing]")
    );
    println!(
        "Amap Key: {}",
        marker(config.amap_api_key().is_some(), "[Set]", "[Missing]")
    );
    println!(
        "Photo Key: {}",
        marker(config.unsplash_access_key().is_some(), "[Set]", "[Missing]")
    );
    println!("Max iterations: {}", config.agent.max_iterations);

    println!("\n◆ Ready");
    Ok(())
}

/// Map and photo services behind one provider
fn toolkit(config: &Config) -> (CompositeProvider, bool, bool) {
    let amap = AmapProvider::from_config(config);
    let unsplash = UnsplashProvider::from_config(config);
    let flags = (amap.is_configured(), unsplash.is_configured());
    let composite = CompositeProvider::new()
        .with(Arc::new(amap))
        .with(Arc::new(unsplash));
    (composite, flags.0, flags.1)
}

/// List the tools agents can use, optionally filtered by keyword
pub async fn tools_command(filter: Vec<String>) -> Result<()> {
    let config = Config::load().await?;
    let (provider, amap_ready, photos_ready) = toolkit(&config);
    let filter = KeywordFilter::new(filter);

    let descriptors = provider
        .list_descriptors()
        .await
        .map_err(|e| anyhow::anyhow!("tool discovery failed: {}", e))?;
    let matching: Vec<_> = descriptors
        .into_iter()
        .filter(|d| filter.matches(&d.name))
        .collect();

    if matching.is_empty() {
        println!("No tools match {:?}", filter.keywords());
        return Ok(());
    }

    println!("Tools:");
    for descriptor in matching {
        println!("  {} - {}", descriptor.name, descriptor.description);
    }
    if !amap_ready {
        println!("\nAmap key missing: tools will report an error until AMAP_API_KEY is set");
    }
    if !photos_ready {
        println!("Unsplash key missing: photo lookups return a stock picture");
    }
    Ok(())
}

/// Print a photo URL for a place
pub async fn photo_command(name: String) -> Result<()> {
    let config = Config::load().await?;
    let unsplash = UnsplashProvider::from_config(&config);
    if !unsplash.is_configured() {
        warn!("UNSPLASH_ACCESS_KEY not set, returning the stock picture");
    }
    println!("{}", unsplash.poi_photo(&name).await);
    Ok(())
}

/// Trip length from an inclusive date range
fn days_between(start: &str, end: &str) -> Result<u32> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .with_context(|| format!("start date '{}' must be YYYY-MM-DD", start))?;
    let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")
        .with_context(|| format!("end date '{}' must be YYYY-MM-DD", end))?;
    let days = (end - start).num_days() + 1;
    if days < 1 {
        bail!("end date is before start date");
    }
    Ok(u32::try_from(days)?)
}

async fn build_request(args: &PlanArgs) -> Result<TripRequest> {
    if let Some(path) = &args.request {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot read request file {}", path.display()))?;
        let request = serde_json::from_str(&content)
            .with_context(|| format!("invalid request file {}", path.display()))?;
        return Ok(request);
    }

    let (Some(city), Some(start), Some(end)) = (&args.city, &args.start, &args.end) else {
        bail!("--city, --start and --end are required without --request");
    };
    let travel_days = match args.days {
        Some(days) => days,
        None => days_between(start, end)?,
    };

    Ok(TripRequest {
        city: city.clone(),
        start_date: start.clone(),
        end_date: end.clone(),
        travel_days,
        transportation: args.transport.clone(),
        accommodation: args.accommodation.clone(),
        preferences: args.preferences.clone(),
        free_text_input: args.notes.clone().unwrap_or_default(),
    })
}

/// Plan a trip and print or save the result
pub async fn plan_command(args: PlanArgs) -> Result<()> {
    let request = build_request(&args).await?;
    request
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid request: {}", e))?;

    let config = Config::load().await?;
    let api_key = config
        .api_key()
        .context("No API key configured. Set provider.api_key in ~/.tripsmith/config.json or LLM_API_KEY")?;

    let provider = Arc::new(
        OpenAiCompatProvider::new(api_key, config.api_base(), config.model())
            .with_timeout(config.request_timeout()),
    );
    let (services, amap_ready, _) = toolkit(&config);
    if !amap_ready {
        warn!("AMAP_API_KEY not set, map tools will report errors to the agents");
    }
    let tools: Arc<dyn ToolProvider> = Arc::new(services);

    let mut planner = TripPlanner::new(provider, Some(tools), AgentConfig::from_config(&config))
        .await
        .context("failed to set up planning agents")?;

    let plan = planner.plan(&request).await?;
    let json = serde_json::to_string_pretty(&plan)?;

    let destination = if args.save {
        let name = format!("{}-{}.json", request.city, request.start_date);
        Some(tripsmith_config::plans_dir().join(safe_filename(&name)))
    } else {
        args.output.clone()
    };

    match &destination {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, &json).await?;
            info!("plan written to {}", path.display());
            println!("✓ Plan saved to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
